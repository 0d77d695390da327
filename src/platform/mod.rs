// Platform module - window capability
//
// The renderer and the game never see winit directly: they get a `Window`
// that can be polled and queried for the native handles a graphics backend
// needs to create its surface.

mod winit_window;

pub use winit_window::WinitWindow;

use crate::config::WindowConfig;
use anyhow::Result;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// Native handle bundle for the active platform backend.
#[derive(Debug, Clone, Copy)]
pub struct NativeHandle {
    /// e.g. HWND, NSView, xlib Window, wl_surface
    pub window: RawWindowHandle,
    /// e.g. X11 Display*, wl_display; empty on Windows
    pub display: RawDisplayHandle,
}

/// Window capability consumed by the application loop and renderer backends.
pub trait Window {
    /// Pump pending window/input events without blocking.
    fn poll_events(&mut self);

    /// Whether the user asked the window to close.
    fn should_close(&self) -> bool;

    /// Drawable size in physical pixels (not DPI-scaled points).
    fn framebuffer_size(&self) -> (u32, u32);

    /// Native handles for surface creation; `None` once the window is gone.
    fn native_handle(&self) -> Option<NativeHandle>;
}

/// Create the platform window selected at build time.
pub fn create_platform_window(config: &WindowConfig) -> Result<Box<dyn Window>> {
    Ok(Box::new(WinitWindow::new(config)?))
}
