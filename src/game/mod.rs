// Game module - logic that only sees the renderer capability
//
// A game never touches Vulkan or winit. It gets a `&mut dyn Renderer` for
// setup, once per tick and once at teardown.

mod hello_triangle;

pub use hello_triangle::{HelloTriangleGame, TRIANGLE};

use crate::renderer::Renderer;
use anyhow::Result;

pub trait Game {
    /// Create shaders, pipelines and buffers. Called once after the renderer
    /// is initialized.
    fn initialize(&mut self, renderer: &mut dyn Renderer) -> Result<()>;

    /// Advance and draw one frame.
    fn tick(&mut self, renderer: &mut dyn Renderer) -> Result<()>;

    /// Called before the renderer shuts down. The renderer owns every GPU
    /// resource, so most games only drop their handles here.
    fn shutdown(&mut self, renderer: &mut dyn Renderer);
}
