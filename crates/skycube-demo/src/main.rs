//! Headless demo: drives a background renderer with a simulated texture
//! loader while the camera turns and zooms in.
//!
//! Run with `cargo run -p skycube-demo -- --frames 300 --level-max 8`.

mod simulation;

use std::path::PathBuf;

use clap::Parser;
use skycube_config::{BackgroundKind as ConfiguredBackground, CliArgs, Config, ConfigError, PyramidConfig};
use skycube_pyramid::{
    Background, BackgroundKind, BackgroundRenderer, PanoramaCamera, PyramidError, PyramidSettings,
    texture_channel,
};
use tracing::{error, info};

use crate::simulation::{CountingScene, simulated_textures};

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Pyramid(#[from] PyramidError),
}

fn settings(config: &PyramidConfig) -> Result<PyramidSettings, ConfigError> {
    config.validate()?;
    Ok(PyramidSettings {
        levels: config.level_range()?,
        depth_far: config.depth_far,
        prefetch_children: config.prefetch_children,
        max_tiles_per_level: config.max_tiles_per_level,
    })
}

fn background_kind(kind: ConfiguredBackground) -> BackgroundKind {
    match kind {
        ConfiguredBackground::Pyramid => BackgroundKind::Pyramid,
        ConfiguredBackground::Cubemap => BackgroundKind::Cubemap,
    }
}

/// Camera pose at `t` in `[0, 1]`: half a turn of yaw, a gentle pitch
/// oscillation, and a geometric zoom so levels change at an even pace.
fn pose(config: &Config, t: f32) -> (f32, f32, f32) {
    let demo = &config.demo;
    let fov = demo.start_fov * (demo.end_fov / demo.start_fov).powf(t);
    let yaw = 180.0 * t;
    let pitch = 20.0 * (t * std::f32::consts::TAU).sin();
    (fov, yaw, pitch)
}

fn run(config: &Config) -> Result<(), DemoError> {
    let settings = settings(&config.pyramid)?;
    let (sender, events) = texture_channel();
    let (store, mut loader) = simulated_textures(
        config.demo.texture_latency_frames,
        config.demo.failure_every,
        sender,
    );
    let mut background = Background::new(
        background_kind(config.background),
        settings,
        CountingScene::default(),
        store,
        events,
    );

    let (fov, yaw, pitch) = pose(config, 0.0);
    let mut camera = PanoramaCamera::new(fov, 16.0 / 9.0);
    camera.set_yaw_pitch(yaw, pitch);
    background.boot(&mut camera)?;
    info!(
        "Booted {:?} background, {} tiles registered",
        background.kind(),
        background.scene().registered
    );

    let frames = config.demo.frames.max(1);
    for i in 0..frames {
        let t = if frames > 1 { i as f32 / (frames - 1) as f32 } else { 0.0 };
        let (fov, yaw, pitch) = pose(config, t);
        camera.set_fov(fov);
        camera.set_yaw_pitch(yaw, pitch);

        loader.tick(u64::from(i));
        let stats = background.render(&camera)?;
        info!(
            frame = stats.frame,
            level = stats.level,
            fov,
            visible = stats.visible,
            drawn = stats.drawn,
            added = stats.added,
            removed = stats.removed,
            pending = stats.pending,
            failed = stats.failed,
            cached = stats.cached,
            "Rendered frame"
        );
    }

    info!(
        "Finished {frames} frames, {} textures still loading, {} presents",
        loader.outstanding(),
        background.scene().presented
    );
    background.destroy(&mut camera);
    Ok(())
}

fn main() {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args
        .config
        .clone()
        .or_else(skycube_config::default_config_dir)
        .unwrap_or_else(|| PathBuf::from(".skycube"));

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    skycube_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    if let Err(e) = run(&config) {
        error!("Demo failed: {e}");
        std::process::exit(1);
    }
}
