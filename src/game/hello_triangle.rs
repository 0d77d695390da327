// Hello triangle - two shaders, one pipeline, one vertex buffer, one draw

use super::Game;
use crate::config::AssetsConfig;
use crate::renderer::{BufferHandle, PipelineHandle, Renderer, ShaderStage, VertexPC};
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

/// Red top, green bottom-right, blue bottom-left (Vulkan clip space, +y down)
pub const TRIANGLE: [VertexPC; 3] = [
    VertexPC::new(0.0, -0.5, 1.0, 0.2, 0.2),
    VertexPC::new(0.5, 0.5, 0.2, 1.0, 0.2),
    VertexPC::new(-0.5, 0.5, 0.2, 0.2, 1.0),
];

pub struct HelloTriangleGame {
    vertex_shader: PathBuf,
    fragment_shader: PathBuf,
    pipeline: Option<PipelineHandle>,
    vertex_buffer: Option<BufferHandle>,
    frames_drawn: u64,
    frames_skipped: u64,
}

impl HelloTriangleGame {
    pub fn new(assets: &AssetsConfig) -> Self {
        Self {
            vertex_shader: assets.vertex_shader.clone(),
            fragment_shader: assets.fragment_shader.clone(),
            pipeline: None,
            vertex_buffer: None,
            frames_drawn: 0,
            frames_skipped: 0,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Ticks where the renderer asked to skip (minimized, swapchain stale)
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}

fn read_shader(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| {
        format!(
            "Failed to read shader {:?}. Compile the GLSL sources with glslc first.",
            path
        )
    })
}

impl Game for HelloTriangleGame {
    fn initialize(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let vert_code = read_shader(&self.vertex_shader)?;
        let frag_code = read_shader(&self.fragment_shader)?;

        let vs = renderer
            .create_shader(ShaderStage::Vertex, &vert_code)
            .with_context(|| format!("Failed to create vertex shader from {:?}", self.vertex_shader))?;
        let fs = renderer
            .create_shader(ShaderStage::Fragment, &frag_code)
            .with_context(|| format!("Failed to create fragment shader from {:?}", self.fragment_shader))?;

        let pipeline = renderer
            .create_triangle_pipeline(vs, fs)
            .context("Failed to create triangle pipeline")?;
        let vertex_buffer = renderer
            .create_vertex_buffer(&TRIANGLE)
            .context("Failed to create vertex buffer")?;

        self.pipeline = Some(pipeline);
        self.vertex_buffer = Some(vertex_buffer);

        log::info!("Hello triangle ready");
        Ok(())
    }

    fn tick(&mut self, renderer: &mut dyn Renderer) -> Result<()> {
        let (Some(pipeline), Some(vertex_buffer)) = (self.pipeline, self.vertex_buffer) else {
            bail!("tick called before initialize");
        };

        if !renderer.begin_frame()? {
            self.frames_skipped += 1;
            return Ok(());
        }

        renderer.draw_triangle(pipeline, vertex_buffer, TRIANGLE.len() as u32)?;
        renderer.end_frame()?;

        self.frames_drawn += 1;
        Ok(())
    }

    fn shutdown(&mut self, _renderer: &mut dyn Renderer) {
        self.pipeline = None;
        self.vertex_buffer = None;
        log::info!(
            "Hello triangle finished: {} frames drawn, {} skipped",
            self.frames_drawn,
            self.frames_skipped
        );
    }
}
