// triangle-engine: a game loop that only sees `Window` and `Renderer`
// capabilities, with winit and Vulkan (ash) behind them.

pub mod app;
pub mod config;
pub mod game;
pub mod logging;
pub mod platform;
pub mod renderer;
