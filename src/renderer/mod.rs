// Renderer module - graphics capability
//
// The game depends only on the `Renderer` trait. Backends (currently Vulkan)
// implement it and are picked at build time by `create_renderer_backend`.

pub mod error;
pub mod frame;
pub mod handle;
#[cfg(feature = "vulkan")]
pub mod vulkan;

pub use error::{InitStep, RendererError, ResourceKind, Result};
pub use frame::{FramePhase, FRAMES_IN_FLIGHT};
pub use handle::{BufferHandle, PipelineHandle, ShaderHandle};

use crate::platform::Window;
use ash::vk::PresentModeKHR;
use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// Initialization parameters for the renderer
#[derive(Debug, Clone)]
pub struct InitInfo {
    pub app_name: String,
    /// Enable debug layers where supported (skipped if not installed)
    pub enable_validation: bool,
    /// Preferred present mode; FIFO is used when unsupported
    pub present_mode: PresentModeKHR,
}

impl Default for InitInfo {
    fn default() -> Self {
        Self {
            app_name: "Game_EX".to_string(),
            enable_validation: true,
            present_mode: PresentModeKHR::FIFO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Vertex format for the hello-triangle demo: 2D position + RGB color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct VertexPC {
    pub position: Vec2,
    pub color: Vec3,
}

impl VertexPC {
    pub const fn new(x: f32, y: f32, r: f32, g: f32, b: f32) -> Self {
        Self {
            position: Vec2::new(x, y),
            color: Vec3::new(r, g, b),
        }
    }
}

/// Operations every graphics backend provides.
///
/// Single-threaded: the owner drives all calls from one thread. Everything
/// except `shutdown` requires a successful `initialize` first.
pub trait Renderer {
    /// Create device, swapchain and frame sync state for `window`.
    fn initialize(&mut self, info: &InitInfo, window: &dyn Window) -> Result<()>;

    /// Release all GPU resources. Safe after a failed `initialize` and safe
    /// to call twice.
    fn shutdown(&mut self);

    /// Wait for the previous frame and acquire the next image.
    ///
    /// `Ok(false)` means skip this tick (minimized or stale surface).
    fn begin_frame(&mut self) -> Result<bool>;

    /// Submit the recorded frame and present it.
    fn end_frame(&mut self) -> Result<()>;

    /// The window's framebuffer changed size; zero means minimized.
    fn resize(&mut self, width: u32, height: u32);

    /// Create a shader from backend bytecode (SPIR-V for Vulkan).
    fn create_shader(&mut self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderHandle>;

    /// Fixed-function pipeline for a colored triangle.
    fn create_triangle_pipeline(&mut self, vs: ShaderHandle, fs: ShaderHandle) -> Result<PipelineHandle>;

    /// Upload an immutable, device-local vertex buffer.
    fn create_vertex_buffer(&mut self, vertices: &[VertexPC]) -> Result<BufferHandle>;

    /// Record one non-indexed draw. Only valid between `begin_frame` and `end_frame`.
    fn draw_triangle(
        &mut self,
        pipeline: PipelineHandle,
        vertex_buffer: BufferHandle,
        vertex_count: u32,
    ) -> Result<()>;
}

#[cfg(not(feature = "vulkan"))]
compile_error!("no renderer backend enabled; build with `--features vulkan`");

/// Create the renderer backend selected at build time.
#[cfg(feature = "vulkan")]
pub fn create_renderer_backend() -> Box<dyn Renderer> {
    Box::new(vulkan::VulkanRenderer::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_is_five_floats() {
        assert_eq!(std::mem::size_of::<VertexPC>(), 5 * std::mem::size_of::<f32>());
        assert_eq!(std::mem::offset_of!(VertexPC, position), 0);
        assert_eq!(std::mem::offset_of!(VertexPC, color), 8);
    }

    #[test]
    fn test_vertex_bytes_are_tightly_packed() {
        let vertices = [
            VertexPC::new(0.0, -0.5, 1.0, 0.2, 0.2),
            VertexPC::new(0.5, 0.5, 0.2, 1.0, 0.2),
        ];
        let floats: &[f32] = bytemuck::cast_slice(&vertices);
        assert_eq!(floats, &[0.0, -0.5, 1.0, 0.2, 0.2, 0.5, 0.5, 0.2, 1.0, 0.2]);
    }
}
