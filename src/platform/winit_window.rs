// winit-backed window
//
// winit 0.30 wants to own the loop (`run_app`). The game loop here is
// caller-driven, so events are pumped with a zero timeout once per tick.

use super::{NativeHandle, Window};
use crate::config::WindowConfig;
use anyhow::{anyhow, bail, Result};
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};
use std::time::Duration;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{WindowAttributes, WindowId},
};

/// Pumps allowed for the platform to deliver `resumed` at startup
const STARTUP_PUMPS: usize = 64;

/// Event handler state, separate from the event loop so the loop can be
/// pumped with `&mut` access to it.
struct WindowState {
    attributes: WindowAttributes,
    window: Option<winit::window::Window>,
    create_error: Option<String>,
    close_requested: bool,
    framebuffer_size: (u32, u32),
}

impl ApplicationHandler for WindowState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        match event_loop.create_window(self.attributes.clone()) {
            Ok(window) => {
                let size = window.inner_size();
                log::info!("Window created: {}x{} pixels", size.width, size.height);
                self.framebuffer_size = (size.width, size.height);
                self.window = Some(window);
            }
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                self.create_error = Some(e.to_string());
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                log::info!("Close requested");
                self.close_requested = true;
            }

            WindowEvent::Resized(size) => {
                log::debug!("Window resized to {}x{}", size.width, size.height);
                self.framebuffer_size = (size.width, size.height);
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state.is_pressed() && event.physical_key == PhysicalKey::Code(KeyCode::Escape) {
                    log::info!("ESC pressed, closing window");
                    self.close_requested = true;
                }
            }

            _ => {}
        }
    }
}

pub struct WinitWindow {
    // Dropped before the event loop
    state: WindowState,
    event_loop: EventLoop<()>,
}

impl WinitWindow {
    pub fn new(config: &WindowConfig) -> Result<Self> {
        let mut event_loop =
            EventLoop::new().map_err(|e| anyhow!("Failed to create event loop: {}", e))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let attributes = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        let mut state = WindowState {
            attributes,
            window: None,
            create_error: None,
            close_requested: false,
            framebuffer_size: (config.width, config.height),
        };

        for _ in 0..STARTUP_PUMPS {
            let status = event_loop.pump_app_events(Some(Duration::ZERO), &mut state);
            if state.window.is_some() || state.create_error.is_some() {
                break;
            }
            if let PumpStatus::Exit(code) = status {
                bail!("Event loop exited during startup (code {})", code);
            }
        }

        if let Some(e) = state.create_error.take() {
            bail!("Failed to create window: {}", e);
        }
        if state.window.is_none() {
            bail!("Platform never resumed the application; no window was created");
        }

        Ok(Self { state, event_loop })
    }
}

impl Window for WinitWindow {
    fn poll_events(&mut self) {
        let status = self
            .event_loop
            .pump_app_events(Some(Duration::ZERO), &mut self.state);

        if let PumpStatus::Exit(code) = status {
            log::debug!("Event loop exited with code {}", code);
            self.state.close_requested = true;
        }
    }

    fn should_close(&self) -> bool {
        self.state.close_requested
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        self.state.framebuffer_size
    }

    fn native_handle(&self) -> Option<NativeHandle> {
        self.state.window.as_ref().map(|window| NativeHandle {
            window: window.raw_window_handle(),
            display: window.raw_display_handle(),
        })
    }
}
