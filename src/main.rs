//! MyTarot - tarot reading desktop app
//!
//! Main entry point for the MyTarot application.

use anyhow::Context;
use clap::Parser;
use eframe::egui;
use mytarot::testconfig::Scenario;
use mytarot::ui::TarotApp;
use mytarot::TarotConfig;
use std::path::PathBuf;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mytarot", version, about = "Three-card tarot readings")]
struct Args {
    /// TOML configuration file
    #[arg(long, env = "MYTAROT_CONFIG")]
    config: Option<PathBuf>,

    /// Run a scripted scenario and exit with its result
    #[arg(long)]
    scenario: Option<PathBuf>,

    /// Directory holding the card images (overrides ui.assets_dir)
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Whisper model for voice questions (overrides voice.model_path)
    #[arg(long)]
    speech_model: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mytarot=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!("Starting MyTarot");

    let mut config = TarotConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(assets) = args.assets {
        config.ui.assets_dir = assets;
    }
    if let Some(model) = args.speech_model {
        config.voice = config.voice.with_model_path(model);
    }
    if config.oracle.resolve_api_key().is_none() {
        warn!("No API key configured; readings will fail until one is set");
    }

    let scenario = args
        .scenario
        .as_deref()
        .map(Scenario::load)
        .transpose()
        .context("loading scenario")?;

    let exit_code = Arc::new(AtomicI32::new(0));
    let app_exit_code = Arc::clone(&exit_code);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([480.0, 480.0])
            .with_title("MyTarot"),
        ..Default::default()
    };

    eframe::run_native(
        "MyTarot",
        options,
        Box::new(move |cc| {
            let app = TarotApp::new(cc, &config, scenario, app_exit_code)?;
            Ok(Box::new(app))
        }),
    )
    .map_err(|e| anyhow::anyhow!("window error: {}", e))?;

    let code = exit_code.load(Ordering::SeqCst);
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
