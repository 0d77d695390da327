// =============================================================================
// TRIANGLE ENGINE - Game / renderer / window separation demo
// =============================================================================
//
// ARCHITECTURE OVERVIEW:
// ┌─────────────────────────────────────────────────────────────────┐
// │  main: config -> logging -> factories                           │
// │    └── app::run (loop)                                          │
// │          ├── Window   (winit, pumped once per tick)             │
// │          ├── Game     (HelloTriangleGame)                       │
// │          └── Renderer (VulkanRenderer)                          │
// └─────────────────────────────────────────────────────────────────┘
//
// Exit status: 0 on clean shutdown, 255 when anything fails to initialize.
//
// =============================================================================

use triangle_engine::app::{self, RunOptions, EXIT_INIT_FAILURE};
use triangle_engine::config::Config;
use triangle_engine::game::HelloTriangleGame;
use triangle_engine::renderer::{self, InitInfo};
use triangle_engine::{critical, logging, platform};

const CONFIG_PATH: &str = "config.toml";

// =============================================================================
// ENTRY POINT
// =============================================================================

fn main() {
    let code = run();
    // process::exit skips destructors; everything is dropped inside `run`
    std::process::exit(code);
}

fn run() -> i32 {
    // ─────────────────────────────────────────────────────────────────────────
    // STEP 1: Configuration + logging
    // ─────────────────────────────────────────────────────────────────────────
    let (config, config_error) = Config::load_or_default(CONFIG_PATH);

    let _log_guard = match logging::init_logging(&config.debug) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {:#}", e);
            return EXIT_INIT_FAILURE;
        }
    };

    if let Some(e) = config_error {
        log::warn!("Failed to load {}: {:#}. Using defaults.", CONFIG_PATH, e);
    }

    log::info!("Game starting...");
    log::info!(
        "Window: {}x{} \"{}\"",
        config.window.width,
        config.window.height,
        config.window.title
    );
    log::info!("Present mode: {}", config.graphics.present_mode);

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 2: Window
    // ─────────────────────────────────────────────────────────────────────────
    let mut window = match platform::create_platform_window(&config.window) {
        Ok(window) => window,
        Err(e) => {
            critical!("Failed to create window: {:#}", e);
            return EXIT_INIT_FAILURE;
        }
    };

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 3: Renderer + game
    // ─────────────────────────────────────────────────────────────────────────
    let mut renderer = renderer::create_renderer_backend();
    let mut game = HelloTriangleGame::new(&config.assets);

    let info = InitInfo {
        app_name: config.window.title.clone(),
        enable_validation: config.graphics.enable_validation,
        present_mode: config.present_mode(),
    };

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 4: Run until the window closes
    // ─────────────────────────────────────────────────────────────────────────
    let summary = app::run(
        window.as_mut(),
        renderer.as_mut(),
        &mut game,
        &info,
        RunOptions::default(),
    );

    log::info!("Exiting with code {}", summary.exit_code);
    summary.exit_code
}
