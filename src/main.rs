// src/main.rs
mod app;
mod config;
mod error;
mod insights;
mod playback;
mod session;
mod signals;
mod ui;
mod video;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use tracing_subscriber::EnvFilter;

use crate::config::{DashboardConfig, FrameStrategy, FrameTiming};
use crate::error::DashboardError;
use crate::playback::EndBehavior;
use crate::session::Session;

#[derive(Parser, Debug)]
#[command(author, version, about = "Synchronized gait video and joint angle dashboard", long_about = None)]
struct Cli {
    /// JSON configuration file; flags below override its values.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Original (primary) video.
    #[arg(long)]
    primary: Option<PathBuf>,

    /// Motion overlay video.
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Length of the analysed action in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Seek the decoder per frame instead of decoding everything up front.
    #[arg(long)]
    lazy: bool,

    /// Use the videos' own frame rate instead of stretching them over the duration.
    #[arg(long)]
    native_rate: bool,

    /// Restart from the beginning when playback reaches the end.
    #[arg(long = "loop")]
    looping: bool,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<DashboardConfig> {
        let mut config = match &self.config {
            Some(path) => DashboardConfig::load(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?,
            None => DashboardConfig::default(),
        };

        if let Some(primary) = &self.primary {
            config.primary_video = primary.clone();
        }
        if let Some(overlay) = &self.overlay {
            config.overlay_video = overlay.clone();
        }
        if let Some(duration) = self.duration {
            config.duration = duration;
        }
        if self.lazy {
            config.frame_strategy = FrameStrategy::Lazy;
        }
        if self.native_rate {
            config.frame_timing = FrameTiming::Native;
        }
        if self.looping {
            config.end_behavior = EndBehavior::Loop;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<DashboardError>().is_some_and(DashboardError::is_startup) {
                tracing::error!("startup halted: {e:#}");
            } else {
                tracing::error!("{e:#}");
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;

    // Both videos must resolve before the first cycle.
    let (primary, overlay) = video::open_pair(&config).context("video files are not available")?;
    let session = Session::from_config(&config, primary, overlay)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1500.0, 950.0])
            .with_min_inner_size([1200.0, 800.0]),
        centered: true,
        ..Default::default()
    };

    let repaint_interval = config.repaint_interval();
    let output_directory = config.output_directory.clone();
    eframe::run_native(
        "Gait Analysis Dashboard",
        options,
        Box::new(move |cc| {
            Box::new(app::GaitDashboardApp::new(
                cc,
                session,
                repaint_interval,
                output_directory,
            ))
        }),
    )
    .map_err(|e| anyhow::anyhow!("error running application: {e}"))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
