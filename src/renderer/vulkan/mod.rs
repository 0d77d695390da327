// =============================================================================
// VULKAN BACKEND
// =============================================================================
//
// OBJECT GRAPH (created top to bottom, destroyed bottom to top):
// ┌─────────────────────────────────────────────────────────────────┐
// │  Instance (+ debug messenger)                                   │
// │    └── Surface                                                  │
// │          └── Device + graphics queue                            │
// │                └── Swapchain -> image views -> framebuffers     │
// │                └── Render pass                                  │
// │                └── Command pool -> one command buffer per image │
// │                └── Sync objects (1 frame in flight)             │
// │                └── Shaders, pipelines, vertex buffers           │
// └─────────────────────────────────────────────────────────────────┘
//
// FRAME FLOW:
// 1. begin_frame: wait in-flight fence, acquire image, reset fence + cmd buffer
// 2. draw_triangle: record render pass with one draw
// 3. end_frame: submit (wait image-available, signal render-finished), present
//
// =============================================================================

mod buffer;
mod commands;
mod device;
mod pipeline;
mod shader;
mod swapchain;
mod sync;

use crate::critical;
use crate::platform::Window;
use crate::renderer::error::{InitStep, RendererError, ResourceKind, Result, VkResultExt};
use crate::renderer::frame::{FrameLoop, FramePhase};
use crate::renderer::handle::{
    BufferHandle, BufferKey, PipelineHandle, PipelineKey, RendererId, ResourceTable, ShaderHandle,
    ShaderKey,
};
use crate::renderer::{InitInfo, Renderer, ShaderStage, VertexPC};
use ash::extensions::khr;
use ash::{vk, Entry};
use buffer::VertexBuffer;
use commands::DrawCall;
use device::{DebugMessenger, PhysicalDeviceInfo};
use pipeline::GraphicsPipeline;
use shader::ShaderModule;
use swapchain::{Swapchain, SwapchainSupport};
use sync::FrameSync;

/// Renderer backed by Vulkan through `ash`.
///
/// Every GPU object is optional (or null) until its init step has run, so a
/// failed `initialize` can be unwound by `shutdown` one object at a time.
pub struct VulkanRenderer {
    // ─────────────────────────────────────────────────────────────────────────
    // RESOURCES (handles resolve only through these tables)
    // ─────────────────────────────────────────────────────────────────────────
    id: RendererId,
    shaders: ResourceTable<ShaderKey, ShaderModule>,
    pipelines: ResourceTable<PipelineKey, GraphicsPipeline>,
    buffers: ResourceTable<BufferKey, VertexBuffer>,

    // ─────────────────────────────────────────────────────────────────────────
    // VULKAN CORE
    // ─────────────────────────────────────────────────────────────────────────
    entry: Option<Entry>,
    instance: Option<ash::Instance>,
    debug_messenger: Option<DebugMessenger>,
    surface_loader: Option<khr::Surface>,
    surface: vk::SurfaceKHR,
    physical: Option<PhysicalDeviceInfo>,
    device: Option<ash::Device>,
    queue: vk::Queue,

    // ─────────────────────────────────────────────────────────────────────────
    // PRESENTATION
    // ─────────────────────────────────────────────────────────────────────────
    swapchain_loader: Option<khr::Swapchain>,
    swapchain: Option<Swapchain>,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,

    // ─────────────────────────────────────────────────────────────────────────
    // COMMANDS & SYNCHRONIZATION
    // ─────────────────────────────────────────────────────────────────────────
    command_pool: vk::CommandPool,
    /// One command buffer per swapchain image
    command_buffers: Vec<vk::CommandBuffer>,
    sync: Option<FrameSync>,
    frames: FrameLoop,

    // ─────────────────────────────────────────────────────────────────────────
    // STATE FLAGS
    // ─────────────────────────────────────────────────────────────────────────
    present_mode: vk::PresentModeKHR,
    /// Last known framebuffer size of the window
    requested_extent: vk::Extent2D,
    /// Swapchain no longer matches the surface; recreate before acquiring
    stale: bool,
    /// Window reported a zero size - skip rendering
    minimized: bool,
    initialized: bool,
    /// Abort `initialize` right after this step completes
    fail_init_after: Option<InitStep>,
}

/// Error for a step the caller asked `initialize` to stop after.
fn forced_init_failure(fail_after: Option<InitStep>, step: InitStep) -> Result<()> {
    if fail_after == Some(step) {
        return Err(RendererError::Vulkan {
            context: "Initialization stopped at requested step",
            result: vk::Result::ERROR_INITIALIZATION_FAILED,
        }
        .at(step));
    }
    Ok(())
}

impl VulkanRenderer {
    pub fn new() -> Self {
        let id = RendererId::next();
        Self {
            id,
            shaders: ResourceTable::new(id, ResourceKind::Shader),
            pipelines: ResourceTable::new(id, ResourceKind::Pipeline),
            buffers: ResourceTable::new(id, ResourceKind::Buffer),
            entry: None,
            instance: None,
            debug_messenger: None,
            surface_loader: None,
            surface: vk::SurfaceKHR::null(),
            physical: None,
            device: None,
            queue: vk::Queue::null(),
            swapchain_loader: None,
            swapchain: None,
            render_pass: vk::RenderPass::null(),
            framebuffers: Vec::new(),
            command_pool: vk::CommandPool::null(),
            command_buffers: Vec::new(),
            sync: None,
            frames: FrameLoop::default(),
            present_mode: vk::PresentModeKHR::FIFO,
            requested_extent: vk::Extent2D::default(),
            stale: false,
            minimized: false,
            initialized: false,
            fail_init_after: None,
        }
    }

    /// Make the next `initialize` fail once `step` has created its objects,
    /// leaving a partially built renderer for `shutdown` to unwind.
    #[doc(hidden)]
    pub fn fail_init_after(&mut self, step: Option<InitStep>) {
        self.fail_init_after = step;
    }

    /// Number of images handed to the presentation engine so far
    pub fn frames_presented(&self) -> u64 {
        self.frames.frames_presented()
    }

    pub fn frame_phase(&self) -> FramePhase {
        self.frames.phase()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Current swapchain extent, if there is a swapchain
    pub fn swapchain_extent(&self) -> Option<vk::Extent2D> {
        self.swapchain.as_ref().map(|s| s.extent)
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(RendererError::NotInitialized)
        }
    }

    fn device(&self) -> Result<&ash::Device> {
        self.ensure_initialized()?;
        self.device.as_ref().ok_or(RendererError::NotInitialized)
    }

    fn shader_module(&self, handle: ShaderHandle, expected: ShaderStage) -> Result<vk::ShaderModule> {
        let shader = self.shaders.get(handle)?;
        if shader.stage != expected {
            return Err(RendererError::ShaderStageMismatch {
                expected,
                found: shader.stage,
            });
        }
        Ok(shader.module)
    }

    // =========================================================================
    // INITIALIZATION
    // =========================================================================

    /// Run every init step in order. Each object is stored on `self` as soon
    /// as it exists.
    fn run_init_sequence(&mut self, info: &InitInfo, window: &dyn Window) -> Result<()> {
        self.adopt_window_size(window.framebuffer_size());
        self.present_mode = info.present_mode;
        let fail_after = self.fail_init_after;

        let handle = window.native_handle().ok_or_else(|| {
            RendererError::WindowHandle("window has no native handle".to_string())
                .at(InitStep::Instance)
        })?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 1: Instance (+ validation messenger)
        // ─────────────────────────────────────────────────────────────────────
        let entry = device::load_entry().map_err(|e| e.at(InitStep::Instance))?;
        let (instance, debug_utils) = device::create_instance(&entry, info, handle.display)
            .map_err(|e| e.at(InitStep::Instance))?;
        self.entry = Some(entry.clone());
        self.instance = Some(instance.clone());

        if debug_utils {
            match DebugMessenger::new(&entry, &instance) {
                Ok(messenger) => self.debug_messenger = Some(messenger),
                Err(e) => log::warn!("Validation messages will not be logged: {}", e),
            }
        }
        forced_init_failure(fail_after, InitStep::Instance)?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 2: Surface (platform-specific window connection)
        // ─────────────────────────────────────────────────────────────────────
        let surface_loader = khr::Surface::new(&entry, &instance);
        self.surface_loader = Some(surface_loader.clone());
        let surface = device::create_surface(&entry, &instance, handle)
            .map_err(|e| e.at(InitStep::Surface))?;
        self.surface = surface;
        forced_init_failure(fail_after, InitStep::Surface)?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 3: Physical device + logical device
        // ─────────────────────────────────────────────────────────────────────
        let physical = device::pick_physical_device(&instance, &surface_loader, surface)
            .map_err(|e| e.at(InitStep::PhysicalDevice))?;
        self.physical = Some(physical.clone());
        forced_init_failure(fail_after, InitStep::PhysicalDevice)?;

        let (device, queue) = device::create_logical_device(&instance, &physical)
            .map_err(|e| e.at(InitStep::LogicalDevice))?;
        self.device = Some(device.clone());
        self.queue = queue;
        forced_init_failure(fail_after, InitStep::LogicalDevice)?;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 4: Swapchain, image views, render pass, framebuffers
        // ─────────────────────────────────────────────────────────────────────
        let swapchain_loader = khr::Swapchain::new(&instance, &device);
        self.swapchain_loader = Some(swapchain_loader.clone());

        let support = SwapchainSupport::query(&surface_loader, physical.handle, surface)
            .map_err(|e| e.at(InitStep::Swapchain))?;
        let swapchain = Swapchain::new(
            &swapchain_loader,
            surface,
            &support,
            self.present_mode,
            self.requested_extent,
            vk::SwapchainKHR::null(),
        )
        .map_err(|e| e.at(InitStep::Swapchain))?;
        let swapchain = self.swapchain.insert(swapchain);
        forced_init_failure(fail_after, InitStep::Swapchain)?;

        swapchain
            .create_image_views(&device)
            .map_err(|e| e.at(InitStep::ImageViews))?;
        forced_init_failure(fail_after, InitStep::ImageViews)?;

        self.render_pass = pipeline::create_render_pass(&device, swapchain.format)
            .map_err(|e| e.at(InitStep::RenderPass))?;
        forced_init_failure(fail_after, InitStep::RenderPass)?;

        pipeline::create_framebuffers(
            &device,
            &swapchain.image_views,
            self.render_pass,
            swapchain.extent,
            &mut self.framebuffers,
        )
        .map_err(|e| e.at(InitStep::Framebuffers))?;
        forced_init_failure(fail_after, InitStep::Framebuffers)?;

        let image_count = swapchain.images.len() as u32;

        // ─────────────────────────────────────────────────────────────────────
        // STEP 5: Commands and synchronization
        // ─────────────────────────────────────────────────────────────────────
        self.command_pool = commands::create_command_pool(&device, physical.graphics_family)
            .map_err(|e| e.at(InitStep::CommandPool))?;
        forced_init_failure(fail_after, InitStep::CommandPool)?;

        self.command_buffers =
            commands::allocate_command_buffers(&device, self.command_pool, image_count)
                .map_err(|e| e.at(InitStep::CommandBuffers))?;
        forced_init_failure(fail_after, InitStep::CommandBuffers)?;

        self.sync = Some(FrameSync::new(&device).map_err(|e| e.at(InitStep::SyncObjects))?);
        forced_init_failure(fail_after, InitStep::SyncObjects)?;

        Ok(())
    }

    /// Take the window's current size as the target extent. Flags left by a
    /// `resize` before `initialize` do not carry over.
    fn adopt_window_size(&mut self, (width, height): (u32, u32)) {
        self.requested_extent = vk::Extent2D { width, height };
        self.stale = false;
        self.minimized = false;
    }

    // =========================================================================
    // SWAPCHAIN RECREATION
    // =========================================================================

    /// Rebuild everything that depends on the swapchain extent. The render
    /// pass and pipelines are kept. Returns `false` while the surface has no
    /// area; the swapchain then stays stale.
    fn recreate_swapchain(&mut self) -> Result<bool> {
        let (Some(device), Some(surface_loader), Some(swapchain_loader), Some(physical)) = (
            self.device.as_ref(),
            self.surface_loader.as_ref(),
            self.swapchain_loader.as_ref(),
            self.physical.as_ref(),
        ) else {
            return Err(RendererError::NotInitialized);
        };

        let support = SwapchainSupport::query(surface_loader, physical.handle, self.surface)?;
        let extent = swapchain::choose_extent(&support.capabilities, self.requested_extent);
        if extent.width == 0 || extent.height == 0 {
            log::trace!("Surface has no area, postponing swapchain recreation");
            return Ok(false);
        }

        unsafe { device.device_wait_idle() }.context("Failed to wait for device idle")?;

        // ─── Tear down extent-dependent objects ───
        if !self.command_buffers.is_empty() {
            unsafe { device.free_command_buffers(self.command_pool, &self.command_buffers) };
            self.command_buffers.clear();
        }
        for framebuffer in self.framebuffers.drain(..) {
            unsafe { device.destroy_framebuffer(framebuffer, None) };
        }

        let mut old = self.swapchain.take();
        if let Some(old) = old.as_mut() {
            old.destroy_image_views(device);
        }
        let old_handle = old.as_ref().map_or(vk::SwapchainKHR::null(), |s| s.handle);
        let old_format = old.as_ref().map(|s| s.format);

        // ─── Rebuild ───
        let created = Swapchain::new(
            swapchain_loader,
            self.surface,
            &support,
            self.present_mode,
            self.requested_extent,
            old_handle,
        );
        if let Some(mut old) = old {
            old.destroy(device, swapchain_loader);
        }
        let swapchain = self.swapchain.insert(created?);

        if let Some(old_format) = old_format {
            if old_format != swapchain.format {
                return Err(RendererError::SurfaceFormatChanged {
                    old: old_format,
                    new: swapchain.format,
                });
            }
        }

        swapchain.create_image_views(device)?;
        pipeline::create_framebuffers(
            device,
            &swapchain.image_views,
            self.render_pass,
            swapchain.extent,
            &mut self.framebuffers,
        )?;
        self.command_buffers = commands::allocate_command_buffers(
            device,
            self.command_pool,
            swapchain.images.len() as u32,
        )?;

        log::info!(
            "Swapchain recreated: {}x{}",
            swapchain.extent.width,
            swapchain.extent.height
        );
        self.stale = false;
        Ok(true)
    }

    // =========================================================================
    // COMMAND RECORDING
    // =========================================================================

    fn record_commands(&self, image_index: u32, draw: Option<DrawCall>) -> Result<()> {
        let device = self.device()?;
        let swapchain = self.swapchain.as_ref().ok_or(RendererError::NotInitialized)?;
        let index = image_index as usize;
        let (Some(&cmd), Some(&framebuffer)) =
            (self.command_buffers.get(index), self.framebuffers.get(index))
        else {
            return Err(RendererError::Vulkan {
                context: "Acquired image index has no command buffer",
                result: vk::Result::ERROR_UNKNOWN,
            });
        };

        commands::record_frame(
            device,
            cmd,
            self.render_pass,
            framebuffer,
            swapchain.extent,
            draw,
        )
    }
}

impl Default for VulkanRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for VulkanRenderer {
    fn initialize(&mut self, info: &InitInfo, window: &dyn Window) -> Result<()> {
        if self.initialized {
            return Err(RendererError::AlreadyInitialized);
        }

        log::info!("Initializing Vulkan...");

        match self.run_init_sequence(info, window) {
            Ok(()) => {
                self.initialized = true;
                if let Some(physical) = &self.physical {
                    log::info!("Vulkan initialized successfully on {}", physical.name);
                }
                Ok(())
            }
            Err(e) => {
                critical!("{}", e);
                self.shutdown();
                Err(e)
            }
        }
    }

    fn shutdown(&mut self) {
        if let Some(device) = self.device.as_ref() {
            log::info!("Shutting down Vulkan renderer...");

            // Wait for GPU to finish all work
            if let Err(e) = unsafe { device.device_wait_idle() } {
                log::error!("device_wait_idle failed during shutdown: {:?}", e);
            }

            // ─── Resources ───
            for vertex_buffer in self.buffers.drain() {
                vertex_buffer.destroy(device);
            }
            for pipeline in self.pipelines.drain() {
                pipeline.destroy(device);
            }
            for shader in self.shaders.drain() {
                unsafe { device.destroy_shader_module(shader.module, None) };
            }

            // ─── Sync objects, commands ───
            if let Some(sync) = self.sync.take() {
                sync.destroy(device);
            }
            if self.command_pool != vk::CommandPool::null() {
                unsafe {
                    if !self.command_buffers.is_empty() {
                        device.free_command_buffers(self.command_pool, &self.command_buffers);
                    }
                    device.destroy_command_pool(self.command_pool, None);
                }
                self.command_pool = vk::CommandPool::null();
            }
            self.command_buffers.clear();

            // ─── Presentation ───
            for framebuffer in self.framebuffers.drain(..) {
                unsafe { device.destroy_framebuffer(framebuffer, None) };
            }
            if self.render_pass != vk::RenderPass::null() {
                unsafe { device.destroy_render_pass(self.render_pass, None) };
                self.render_pass = vk::RenderPass::null();
            }
            if let (Some(mut swapchain), Some(loader)) =
                (self.swapchain.take(), self.swapchain_loader.as_ref())
            {
                swapchain.destroy(device, loader);
            }
        }
        self.swapchain_loader = None;

        if let Some(device) = self.device.take() {
            unsafe { device.destroy_device(None) };
        }
        self.queue = vk::Queue::null();
        self.physical = None;

        // ─── Instance-level objects ───
        if let Some(surface_loader) = self.surface_loader.take() {
            if self.surface != vk::SurfaceKHR::null() {
                unsafe { surface_loader.destroy_surface(self.surface, None) };
            }
        }
        self.surface = vk::SurfaceKHR::null();

        if let Some(messenger) = self.debug_messenger.take() {
            messenger.destroy();
        }

        if let Some(instance) = self.instance.take() {
            unsafe { instance.destroy_instance(None) };
            log::info!("Vulkan renderer shut down");
        }
        self.entry = None;

        self.frames.reset();
        self.stale = false;
        self.minimized = false;
        self.initialized = false;
    }

    fn begin_frame(&mut self) -> Result<bool> {
        self.ensure_initialized()?;
        self.frames.check_begin()?;

        if self.minimized {
            return Ok(false);
        }
        if self.stale && !self.recreate_swapchain()? {
            return Ok(false);
        }

        let (Some(device), Some(loader), Some(swapchain), Some(sync)) = (
            self.device.as_ref(),
            self.swapchain_loader.as_ref(),
            self.swapchain.as_ref(),
            self.sync.as_ref(),
        ) else {
            return Err(RendererError::NotInitialized);
        };

        // Wait for the previous frame to finish on the GPU
        unsafe { device.wait_for_fences(&[sync.in_flight_fence], true, u64::MAX) }
            .context("Failed to wait for in-flight fence")?;

        let Some((image_index, suboptimal)) =
            swapchain.acquire_next_image(loader, sync.image_available)?
        else {
            // Fence stays signaled so the next wait returns immediately
            log::trace!("Swapchain out of date on acquire");
            self.stale = true;
            return Ok(false);
        };
        if suboptimal {
            log::trace!("Swapchain suboptimal on acquire");
            self.stale = true;
        }

        let cmd = self
            .command_buffers
            .get(image_index as usize)
            .copied()
            .ok_or(RendererError::Vulkan {
                context: "Acquired image index has no command buffer",
                result: vk::Result::ERROR_UNKNOWN,
            })?;

        unsafe {
            device
                .reset_fences(&[sync.in_flight_fence])
                .context("Failed to reset in-flight fence")?;
            device
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .context("Failed to reset command buffer")?;
        }

        self.frames.acquired(image_index)?;
        Ok(true)
    }

    fn end_frame(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        let (image_index, recorded) = self.frames.finish()?;

        if !recorded {
            // Clear-only pass keeps the acquired image and semaphores balanced
            self.record_commands(image_index, None)?;
        }

        let (Some(device), Some(loader), Some(swapchain), Some(sync)) = (
            self.device.as_ref(),
            self.swapchain_loader.as_ref(),
            self.swapchain.as_ref(),
            self.sync.as_ref(),
        ) else {
            return Err(RendererError::NotInitialized);
        };

        let wait_semaphores = [sync.image_available];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let signal_semaphores = [sync.render_finished];
        let command_buffers = [self.command_buffers[image_index as usize]];

        let submit_info = vk::SubmitInfo::builder()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores)
            .build();

        unsafe { device.queue_submit(self.queue, &[submit_info], sync.in_flight_fence) }
            .context("Failed to submit draw command buffer")?;

        if swapchain.present(loader, self.queue, image_index, &signal_semaphores)? {
            log::trace!("Swapchain out of date or suboptimal on present");
            self.stale = true;
        }

        self.frames.presented();
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        log::debug!("Framebuffer resized to {}x{}", width, height);
        self.requested_extent = vk::Extent2D { width, height };
        self.minimized = width == 0 || height == 0;
        self.stale = true;
    }

    fn create_shader(&mut self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderHandle> {
        let words = shader::validate_spirv(bytecode)?;
        let module = shader::create_shader_module(self.device()?, &words)?;

        log::debug!("Created {:?} shader ({} bytes)", stage, bytecode.len());
        Ok(self.shaders.insert(ShaderModule { module, stage }))
    }

    fn create_triangle_pipeline(&mut self, vs: ShaderHandle, fs: ShaderHandle) -> Result<PipelineHandle> {
        self.ensure_initialized()?;
        let vert = self.shader_module(vs, ShaderStage::Vertex)?;
        let frag = self.shader_module(fs, ShaderStage::Fragment)?;

        let pipeline = pipeline::create_triangle_pipeline(self.device()?, self.render_pass, vert, frag)?;

        log::debug!("Created triangle pipeline");
        Ok(self.pipelines.insert(pipeline))
    }

    fn create_vertex_buffer(&mut self, vertices: &[VertexPC]) -> Result<BufferHandle> {
        if vertices.is_empty() {
            return Err(RendererError::EmptyVertexData);
        }
        let device = self.device()?;
        let physical = self.physical.as_ref().ok_or(RendererError::NotInitialized)?;

        let vertex_buffer = buffer::create_vertex_buffer(
            device,
            &physical.memory_properties,
            self.command_pool,
            self.queue,
            vertices,
        )?;
        Ok(self.buffers.insert(vertex_buffer))
    }

    fn draw_triangle(
        &mut self,
        pipeline: PipelineHandle,
        vertex_buffer: BufferHandle,
        vertex_count: u32,
    ) -> Result<()> {
        self.ensure_initialized()?;

        let pipeline = self.pipelines.get(pipeline)?.pipeline;
        let buffer = self.buffers.get(vertex_buffer)?;
        if vertex_count > buffer.vertex_count {
            return Err(RendererError::VertexCountOutOfRange {
                requested: vertex_count,
                available: buffer.vertex_count,
            });
        }
        let draw = DrawCall {
            pipeline,
            vertex_buffer: buffer.buffer,
            vertex_count,
        };

        let image_index = self.frames.record()?;
        self.record_commands(image_index, Some(draw))
    }
}

impl Drop for VulkanRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::NativeHandle;

    /// Window that was never shown
    struct Headless;

    impl Window for Headless {
        fn poll_events(&mut self) {}
        fn should_close(&self) -> bool {
            false
        }
        fn framebuffer_size(&self) -> (u32, u32) {
            (800, 600)
        }
        fn native_handle(&self) -> Option<NativeHandle> {
            None
        }
    }

    #[test]
    fn test_shutdown_without_initialize_twice() {
        let mut renderer = VulkanRenderer::new();
        renderer.shutdown();
        renderer.shutdown();
        assert!(!renderer.is_initialized());
    }

    #[test]
    fn test_empty_bytecode_leaves_table_untouched() {
        let mut renderer = VulkanRenderer::new();
        let err = renderer.create_shader(ShaderStage::Vertex, &[]).unwrap_err();
        assert!(matches!(err, RendererError::EmptyBytecode));
        assert!(renderer.shaders.is_empty());
    }

    #[test]
    fn test_valid_bytecode_needs_initialize() {
        let mut renderer = VulkanRenderer::new();
        let header: Vec<u8> = [shader::SPIRV_MAGIC, 0x0001_0000, 0, 1, 0]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        assert!(matches!(
            renderer.create_shader(ShaderStage::Fragment, &header),
            Err(RendererError::NotInitialized)
        ));
        assert!(renderer.shaders.is_empty());
    }

    #[test]
    fn test_frame_calls_need_initialize() {
        let mut renderer = VulkanRenderer::new();
        assert!(matches!(renderer.begin_frame(), Err(RendererError::NotInitialized)));
        assert!(matches!(renderer.end_frame(), Err(RendererError::NotInitialized)));
        assert!(matches!(
            renderer.draw_triangle(PipelineHandle::default(), BufferHandle::default(), 3),
            Err(RendererError::NotInitialized)
        ));
        assert!(matches!(
            renderer.create_triangle_pipeline(ShaderHandle::default(), ShaderHandle::default()),
            Err(RendererError::NotInitialized)
        ));
        assert_eq!(renderer.frame_phase(), FramePhase::Idle);
        assert_eq!(renderer.frames_presented(), 0);
    }

    #[test]
    fn test_empty_vertex_data() {
        let mut renderer = VulkanRenderer::new();
        assert!(matches!(
            renderer.create_vertex_buffer(&[]),
            Err(RendererError::EmptyVertexData)
        ));
        assert!(renderer.buffers.is_empty());
    }

    #[test]
    fn test_resize_before_initialize() {
        let mut renderer = VulkanRenderer::new();
        renderer.resize(0, 0);
        renderer.resize(1024, 768);
        assert!(matches!(renderer.begin_frame(), Err(RendererError::NotInitialized)));
        assert!(renderer.swapchain_extent().is_none());
    }

    #[test]
    fn test_initialize_without_native_handle_fails_cleanly() {
        let mut renderer = VulkanRenderer::new();
        let err = renderer
            .initialize(&InitInfo::default(), &Headless)
            .unwrap_err();
        match err {
            RendererError::Init { step, source } => {
                assert_eq!(step, InitStep::Instance);
                assert!(matches!(*source, RendererError::WindowHandle(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!renderer.is_initialized());
        renderer.shutdown();
    }

    #[test]
    fn test_initialize_forgets_resize_from_before() {
        let mut renderer = VulkanRenderer::new();
        renderer.resize(0, 0);
        assert!(renderer.minimized && renderer.stale);

        renderer.adopt_window_size(Headless.framebuffer_size());
        assert!(!renderer.minimized);
        assert!(!renderer.stale);
        assert_eq!(
            renderer.requested_extent,
            vk::Extent2D { width: 800, height: 600 }
        );
    }

    #[test]
    fn test_forced_init_failure_names_its_step() {
        assert!(forced_init_failure(None, InitStep::Swapchain).is_ok());
        assert!(forced_init_failure(Some(InitStep::SyncObjects), InitStep::Swapchain).is_ok());

        match forced_init_failure(Some(InitStep::Swapchain), InitStep::Swapchain) {
            Err(RendererError::Init { step, .. }) => assert_eq!(step, InitStep::Swapchain),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
