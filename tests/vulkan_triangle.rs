//! End-to-end checks against a real window and Vulkan driver.
//!
//! winit allows one event loop per process, created on the main thread, so
//! this target runs without the libtest harness and drives every scenario
//! from `main` on a single window. Skipped unless `TRIANGLE_ENGINE_GPU_TESTS`
//! is set:
//!
//! ```text
//! TRIANGLE_ENGINE_GPU_TESTS=1 cargo test --test vulkan_triangle
//! ```

use anyhow::{bail, ensure, Context, Result};
use triangle_engine::app::{self, RunOptions, EXIT_OK};
use triangle_engine::config::{AssetsConfig, WindowConfig};
use triangle_engine::game::{HelloTriangleGame, TRIANGLE};
use triangle_engine::platform::{self, Window};
use triangle_engine::renderer::vulkan::VulkanRenderer;
use triangle_engine::renderer::{
    FramePhase, InitInfo, InitStep, Renderer, RendererError, ShaderHandle, ShaderStage,
};

const GPU_TESTS_VAR: &str = "TRIANGLE_ENGINE_GPU_TESTS";

fn main() {
    if std::env::var_os(GPU_TESTS_VAR).is_none() {
        println!("vulkan_triangle: skipped (set {} to run)", GPU_TESTS_VAR);
        return;
    }

    let assets = AssetsConfig::default();
    if !assets.vertex_shader.exists() || !assets.fragment_shader.exists() {
        println!("vulkan_triangle: skipped (compiled shaders not found; is glslc installed?)");
        return;
    }

    let config = WindowConfig {
        title: "triangle-engine e2e".to_string(),
        width: 800,
        height: 600,
        resizable: false,
    };
    let mut window = match platform::create_platform_window(&config) {
        Ok(window) => window,
        Err(e) => {
            println!("vulkan_triangle: skipped (no display: {:#})", e);
            return;
        }
    };

    let info = InitInfo {
        app_name: "triangle-engine e2e".to_string(),
        ..InitInfo::default()
    };

    let scenarios: [(&str, fn(&mut dyn Window, &InitInfo, &AssetsConfig) -> Result<()>); 5] = [
        ("sixty_frames_presented", sixty_frames_presented),
        ("shutdown_is_idempotent", shutdown_is_idempotent),
        ("shutdown_after_partial_initialize", shutdown_after_partial_initialize),
        ("contract_violations_are_errors", contract_violations_are_errors),
        ("pipelines_get_distinct_handles", pipelines_get_distinct_handles),
    ];

    let mut failed = 0;
    for (name, scenario) in scenarios {
        match scenario(window.as_mut(), &info, &assets) {
            Ok(()) => println!("test {} ... ok", name),
            Err(e) => {
                println!("test {} ... FAILED: {:#}", name, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
}

fn read_shaders(assets: &AssetsConfig) -> Result<(Vec<u8>, Vec<u8>)> {
    Ok((
        std::fs::read(&assets.vertex_shader).context("vertex shader")?,
        std::fs::read(&assets.fragment_shader).context("fragment shader")?,
    ))
}

/// 800x600 window, 3 vertices, 60 ticks: 60 images presented, clean exit
fn sixty_frames_presented(window: &mut dyn Window, info: &InitInfo, assets: &AssetsConfig) -> Result<()> {
    let mut renderer = VulkanRenderer::new();
    let mut game = HelloTriangleGame::new(assets);

    let summary = app::run(
        window,
        &mut renderer,
        &mut game,
        info,
        RunOptions { max_ticks: Some(60) },
    );

    ensure!(summary.exit_code == EXIT_OK, "exit code {}", summary.exit_code);
    ensure!(summary.ticks == 60, "ran {} ticks", summary.ticks);
    // Fixed-size window: nothing should be skipped
    ensure!(
        renderer.frames_presented() == 60 && game.frames_skipped() == 0,
        "{} presented, {} skipped",
        renderer.frames_presented(),
        game.frames_skipped()
    );
    ensure!(!renderer.is_initialized(), "renderer still initialized after run");
    Ok(())
}

fn shutdown_is_idempotent(window: &mut dyn Window, info: &InitInfo, _assets: &AssetsConfig) -> Result<()> {
    let mut renderer = VulkanRenderer::new();
    renderer.initialize(info, window)?;
    ensure!(renderer.swapchain_extent().is_some(), "no swapchain after initialize");

    renderer.shutdown();
    renderer.shutdown();
    ensure!(!renderer.is_initialized(), "still initialized");

    // A fresh initialize after shutdown works
    renderer.initialize(info, window)?;
    renderer.shutdown();
    Ok(())
}

/// Device live, later steps missing: shutdown unwinds what exists
fn shutdown_after_partial_initialize(window: &mut dyn Window, info: &InitInfo, _assets: &AssetsConfig) -> Result<()> {
    for stop_at in [InitStep::Swapchain, InitStep::Framebuffers, InitStep::SyncObjects] {
        let mut renderer = VulkanRenderer::new();
        renderer.fail_init_after(Some(stop_at));

        match renderer.initialize(info, window) {
            Err(RendererError::Init { step, .. }) if step == stop_at => {}
            Err(e) => bail!("stopping at {} failed with the wrong error: {}", stop_at, e),
            Ok(()) => bail!("initialize succeeded despite stopping at {}", stop_at),
        }
        ensure!(!renderer.is_initialized(), "initialized after failing at {}", stop_at);
        ensure!(renderer.swapchain_extent().is_none(), "swapchain left behind after {}", stop_at);

        renderer.shutdown();
        renderer.shutdown();

        // Same renderer recovers once the failure is lifted
        renderer.fail_init_after(None);
        renderer.initialize(info, window)?;
        renderer.shutdown();
    }
    Ok(())
}

fn contract_violations_are_errors(window: &mut dyn Window, info: &InitInfo, assets: &AssetsConfig) -> Result<()> {
    let mut renderer = VulkanRenderer::new();
    renderer.initialize(info, window)?;

    if !matches!(renderer.initialize(info, window), Err(RendererError::AlreadyInitialized)) {
        bail!("second initialize was accepted");
    }
    if !matches!(renderer.create_shader(ShaderStage::Vertex, &[]), Err(RendererError::EmptyBytecode)) {
        bail!("empty bytecode was accepted");
    }

    let (vert, frag) = read_shaders(assets)?;
    let vs = renderer.create_shader(ShaderStage::Vertex, &vert)?;
    let fs = renderer.create_shader(ShaderStage::Fragment, &frag)?;

    if !matches!(
        renderer.create_triangle_pipeline(fs, vs),
        Err(RendererError::ShaderStageMismatch { .. })
    ) {
        bail!("swapped shader stages were accepted");
    }
    if !matches!(
        renderer.create_triangle_pipeline(ShaderHandle::default(), fs),
        Err(RendererError::UnknownHandle(_))
    ) {
        bail!("null shader handle was accepted");
    }

    let pipeline = renderer.create_triangle_pipeline(vs, fs)?;
    let buffer = renderer.create_vertex_buffer(&TRIANGLE)?;

    // Wait until a frame is actually acquired
    let mut acquired = false;
    for _ in 0..10 {
        window.poll_events();
        if renderer.begin_frame()? {
            acquired = true;
            break;
        }
    }
    ensure!(acquired, "no frame could be acquired");

    for _ in 0..3 {
        if !matches!(renderer.begin_frame(), Err(RendererError::FrameProtocol { .. })) {
            bail!("double begin_frame was accepted");
        }
    }
    if !matches!(
        renderer.draw_triangle(pipeline, buffer, 4),
        Err(RendererError::VertexCountOutOfRange { requested: 4, available: 3 })
    ) {
        bail!("oversized draw was accepted");
    }

    renderer.draw_triangle(pipeline, buffer, 3)?;
    if !matches!(renderer.draw_triangle(pipeline, buffer, 3), Err(RendererError::FrameProtocol { .. })) {
        bail!("second draw in one frame was accepted");
    }
    renderer.end_frame()?;
    ensure!(renderer.frame_phase() == FramePhase::Idle, "frame not finished");

    // Acquired but nothing drawn: still presents a cleared image
    if renderer.begin_frame()? {
        renderer.end_frame()?;
    }

    renderer.shutdown();
    Ok(())
}

fn pipelines_get_distinct_handles(window: &mut dyn Window, info: &InitInfo, assets: &AssetsConfig) -> Result<()> {
    let mut renderer = VulkanRenderer::new();
    let mut other = VulkanRenderer::new();
    renderer.initialize(info, window)?;

    let (vert, frag) = read_shaders(assets)?;
    let vs = renderer.create_shader(ShaderStage::Vertex, &vert)?;
    let fs = renderer.create_shader(ShaderStage::Fragment, &frag)?;

    let a = renderer.create_triangle_pipeline(vs, fs)?;
    let b = renderer.create_triangle_pipeline(vs, fs)?;
    ensure!(a != b, "pipelines share a handle");

    // One swapchain per window: release it before the second renderer starts
    renderer.shutdown();

    // Handles from one renderer mean nothing to another
    other.initialize(info, window)?;
    if !matches!(
        other.create_triangle_pipeline(vs, fs),
        Err(RendererError::ForeignHandle(_))
    ) {
        bail!("foreign shader handle was accepted");
    }
    other.shutdown();
    Ok(())
}
