//! Test doubles for the window and renderer capabilities

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::PathBuf;
use triangle_engine::config::AssetsConfig;
use triangle_engine::platform::{NativeHandle, Window};
use triangle_engine::renderer::handle::{
    BufferKey, PipelineKey, RendererId, ResourceTable, ShaderKey,
};
use triangle_engine::renderer::{
    BufferHandle, InitInfo, PipelineHandle, Renderer, RendererError, ResourceKind, Result,
    ShaderHandle, ShaderStage, VertexPC,
};

/// Everything the game asked the renderer to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize,
    Shutdown,
    BeginFrame,
    EndFrame,
    Resize(u32, u32),
    CreateShader(ShaderStage),
    CreatePipeline,
    CreateVertexBuffer(usize),
    Draw(u32),
}

pub struct RecordingRenderer {
    pub calls: Vec<Call>,
    pub fail_initialize: bool,
    /// Results for upcoming begin_frame calls; empty means `true`
    pub begin_results: VecDeque<bool>,
    /// Make the Nth draw (0-based) fail
    pub fail_draw_at: Option<usize>,
    shaders: ResourceTable<ShaderKey, ShaderStage>,
    pipelines: ResourceTable<PipelineKey, ()>,
    buffers: ResourceTable<BufferKey, u32>,
    in_frame: bool,
    draws: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        let id = RendererId::next();
        Self {
            calls: Vec::new(),
            fail_initialize: false,
            begin_results: VecDeque::new(),
            fail_draw_at: None,
            shaders: ResourceTable::new(id, ResourceKind::Shader),
            pipelines: ResourceTable::new(id, ResourceKind::Pipeline),
            buffers: ResourceTable::new(id, ResourceKind::Buffer),
            in_frame: false,
            draws: 0,
        }
    }

    pub fn count(&self, call: &Call) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn draws(&self) -> Vec<u32> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Draw(n) => Some(*n),
                _ => None,
            })
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn initialize(&mut self, _info: &InitInfo, _window: &dyn Window) -> Result<()> {
        self.calls.push(Call::Initialize);
        if self.fail_initialize {
            return Err(RendererError::NoPhysicalDevice);
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        self.calls.push(Call::Shutdown);
    }

    fn begin_frame(&mut self) -> Result<bool> {
        self.calls.push(Call::BeginFrame);
        assert!(!self.in_frame, "begin_frame twice");
        let ok = self.begin_results.pop_front().unwrap_or(true);
        self.in_frame = ok;
        Ok(ok)
    }

    fn end_frame(&mut self) -> Result<()> {
        self.calls.push(Call::EndFrame);
        assert!(self.in_frame, "end_frame without begin_frame");
        self.in_frame = false;
        Ok(())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Resize(width, height));
    }

    fn create_shader(&mut self, stage: ShaderStage, bytecode: &[u8]) -> Result<ShaderHandle> {
        self.calls.push(Call::CreateShader(stage));
        if bytecode.is_empty() {
            return Err(RendererError::EmptyBytecode);
        }
        Ok(self.shaders.insert(stage))
    }

    fn create_triangle_pipeline(&mut self, vs: ShaderHandle, fs: ShaderHandle) -> Result<PipelineHandle> {
        self.calls.push(Call::CreatePipeline);
        assert_eq!(*self.shaders.get(vs)?, ShaderStage::Vertex);
        assert_eq!(*self.shaders.get(fs)?, ShaderStage::Fragment);
        Ok(self.pipelines.insert(()))
    }

    fn create_vertex_buffer(&mut self, vertices: &[VertexPC]) -> Result<BufferHandle> {
        self.calls.push(Call::CreateVertexBuffer(vertices.len()));
        if vertices.is_empty() {
            return Err(RendererError::EmptyVertexData);
        }
        Ok(self.buffers.insert(vertices.len() as u32))
    }

    fn draw_triangle(
        &mut self,
        pipeline: PipelineHandle,
        vertex_buffer: BufferHandle,
        vertex_count: u32,
    ) -> Result<()> {
        self.calls.push(Call::Draw(vertex_count));
        assert!(self.in_frame, "draw outside a frame");
        self.pipelines.get(pipeline)?;
        let available = *self.buffers.get(vertex_buffer)?;
        assert!(vertex_count <= available);

        let index = self.draws;
        self.draws += 1;
        if self.fail_draw_at == Some(index) {
            return Err(RendererError::Vulkan {
                context: "Failed to record draw",
                result: ash::vk::Result::ERROR_DEVICE_LOST,
            });
        }
        Ok(())
    }
}

/// Window driven by a script instead of a display server
pub struct ScriptedWindow {
    pub size: (u32, u32),
    /// Size to report after each poll, consumed front first
    pub resizes: VecDeque<(u32, u32)>,
    /// Request close after this many polls
    pub close_after: Option<u64>,
    pub polls: u64,
    closed: bool,
}

impl ScriptedWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            resizes: VecDeque::new(),
            close_after: None,
            polls: 0,
            closed: false,
        }
    }
}

impl Window for ScriptedWindow {
    fn poll_events(&mut self) {
        self.polls += 1;
        if let Some(size) = self.resizes.pop_front() {
            self.size = size;
        }
        if self.close_after.is_some_and(|n| self.polls >= n) {
            self.closed = true;
        }
    }

    fn should_close(&self) -> bool {
        self.closed
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.size
    }

    fn native_handle(&self) -> Option<NativeHandle> {
        None
    }
}

/// Writes stand-in shader files and removes them on drop
pub struct ShaderFiles {
    pub dir: PathBuf,
    pub assets: AssetsConfig,
}

impl ShaderFiles {
    pub fn new(name: &str) -> Self {
        let dir = std::env::temp_dir().join(format!(
            "triangle-engine-{}-{}",
            name,
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();

        let header: Vec<u8> = [0x0723_0203u32, 0x0001_0000, 0, 1, 0]
            .iter()
            .flat_map(|w| w.to_le_bytes())
            .collect();
        let assets = AssetsConfig {
            vertex_shader: dir.join("tri.vert.spv"),
            fragment_shader: dir.join("tri.frag.spv"),
        };
        std::fs::write(&assets.vertex_shader, &header).unwrap();
        std::fs::write(&assets.fragment_shader, &header).unwrap();

        Self { dir, assets }
    }
}

impl Drop for ShaderFiles {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}
