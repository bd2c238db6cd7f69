#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Alchemy sandbox.

mod settings;
mod simulation;

use std::{path::PathBuf, sync::Arc};

use alchemy_catalog::{CatalogDocument, DEFAULT_CATALOG_PATH};
use alchemy_core::WINDOW_TITLE;
use alchemy_rendering::{Color, Presentation, RenderingBackend, Scene};
use alchemy_rendering_macroquad::{MacroquadBackend, DEFAULT_ICON_DIRECTORY};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use glam::Vec2;
use tracing::info;
use tracing_subscriber::EnvFilter;

use self::{settings::Settings, simulation::Simulation};

/// Command-line arguments accepted by the Alchemy executable.
#[derive(Debug, Parser)]
#[command(name = "alchemy", about = "Combine elements to discover new ones.")]
struct CliArgs {
    /// Element catalog; created with the default elements when missing.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CATALOG_PATH)]
    catalog: PathBuf,
    /// Directory holding the icon textures.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_ICON_DIRECTORY)]
    icons: PathBuf,
    /// Optional TOML settings file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for the placement jitter of crafted elements.
    #[arg(long)]
    seed: Option<u64>,
    /// Controls whether presentation waits for the display refresh.
    #[arg(long, value_enum)]
    vsync: Option<VsyncMode>,
    /// Logs frame timing once per second.
    #[arg(long)]
    show_fps: bool,
    /// Play area width in world units.
    #[arg(long)]
    width: Option<u32>,
    /// Play area height in world units.
    #[arg(long)]
    height: Option<u32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VsyncMode {
    On,
    Off,
}

/// Entry point for the Alchemy command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let settings = Settings::load(args.config.as_deref())
        .context("failed to load settings")?
        .with_overrides(args.width, args.height, args.seed)
        .context("invalid command-line overrides")?;

    let registry = CatalogDocument::load_or_create(&args.catalog)
        .with_context(|| format!("failed to load catalog {}", args.catalog.display()))?;
    info!(
        path = %args.catalog.display(),
        elements = registry.elements().len(),
        combinations = registry.combination_count(),
        "catalog loaded"
    );

    let play_area = settings.play_area();
    let mut simulation = Simulation::new(Arc::new(registry), settings.interaction_config());
    let mut scene = Scene::new(Vec2::new(play_area.width(), play_area.height()));
    simulation.populate_scene(&mut scene);

    let mut backend = MacroquadBackend::new()
        .with_show_fps(args.show_fps)
        .with_icon_directory(args.icons);
    if let Some(mode) = args.vsync {
        backend = backend.with_vsync(mode == VsyncMode::On);
    }

    let presentation = Presentation::new(WINDOW_TITLE, Color::new(0.0, 0.0, 0.0, 1.0), scene);
    backend.run(presentation, move |dt, input, scene| {
        simulation.advance(dt, &input);
        simulation.populate_scene(scene);
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
