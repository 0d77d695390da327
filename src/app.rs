// =============================================================================
// APPLICATION LOOP
// =============================================================================
//
// FRAME FLOW:
// 1. Pump window events
// 2. Forward framebuffer size changes to the renderer
// 3. Game tick (begin frame -> draw -> end frame)
//
// The loop owns nothing: window, renderer and game are created by the
// factories in main and borrowed here.
//
// =============================================================================

use crate::critical;
use crate::game::Game;
use crate::platform::Window;
use crate::renderer::{InitInfo, Renderer};
use anyhow::Context;

/// Clean shutdown
pub const EXIT_OK: i32 = 0;
/// A frame failed after startup
pub const EXIT_RUNTIME_FAILURE: i32 = 1;
/// Window, renderer or game failed to initialize (-1 as a process status)
pub const EXIT_INIT_FAILURE: i32 = 255;

/// Result of one `run`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit_code: i32,
    pub ticks: u64,
}

/// Optional limits for a run; `None` means run until the window closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub max_ticks: Option<u64>,
}

/// Initialize renderer and game, drive the loop, then tear both down.
///
/// The renderer is always shut down before returning, whatever failed.
pub fn run(
    window: &mut dyn Window,
    renderer: &mut dyn Renderer,
    game: &mut dyn Game,
    info: &InitInfo,
    options: RunOptions,
) -> RunSummary {
    // ─────────────────────────────────────────────────────────────────────────
    // STARTUP
    // ─────────────────────────────────────────────────────────────────────────
    if let Err(e) = renderer.initialize(info, &*window).context("Renderer initialization failed") {
        critical!("{:#}", e);
        renderer.shutdown();
        return RunSummary {
            exit_code: EXIT_INIT_FAILURE,
            ticks: 0,
        };
    }

    if let Err(e) = game.initialize(renderer).context("Game initialization failed") {
        critical!("{:#}", e);
        game.shutdown(renderer);
        renderer.shutdown();
        return RunSummary {
            exit_code: EXIT_INIT_FAILURE,
            ticks: 0,
        };
    }

    log::info!("Entering main loop");

    // ─────────────────────────────────────────────────────────────────────────
    // MAIN LOOP
    // ─────────────────────────────────────────────────────────────────────────
    let mut last_size = window.framebuffer_size();
    let mut ticks = 0u64;
    let mut exit_code = EXIT_OK;

    while !window.should_close() {
        if options.max_ticks.is_some_and(|max| ticks >= max) {
            break;
        }

        window.poll_events();
        if window.should_close() {
            break;
        }

        let size = window.framebuffer_size();
        if size != last_size {
            renderer.resize(size.0, size.1);
            last_size = size;
        }

        if let Err(e) = game.tick(renderer) {
            log::error!("Frame {} failed: {:#}", ticks, e);
            exit_code = EXIT_RUNTIME_FAILURE;
            break;
        }
        ticks += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // TEARDOWN
    // ─────────────────────────────────────────────────────────────────────────
    log::info!("Main loop finished after {} ticks", ticks);
    game.shutdown(renderer);
    renderer.shutdown();

    RunSummary { exit_code, ticks }
}
