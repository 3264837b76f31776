mod app;
mod color;
mod config;
mod data;
mod session;
mod ui;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use app::ContinuumApp;
use clap::Parser;
use eframe::egui;
use env_logger::Env;

use config::Settings;
use session::Session;

/// Interactive continuum normalization of a 1-D spectrum.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Two-column text file: wavelength and flux per line (`.csv` for comma separated)
    input: PathBuf,

    /// JSON settings file (fit kind, extrapolation, anchor snapping, output format)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let spectrum = data::loader::load_file(&cli.input).context("cannot load spectrum")?;

    let title = format!(
        "Rusty Continuum – {}",
        cli.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    );
    for line in app::usage() {
        log::info!("{line}");
    }
    let session = Session::new(cli.input, spectrum, settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        &title,
        options,
        Box::new(|_cc| Ok(Box::new(ContinuumApp::new(session)))),
    )
    .map_err(|e| anyhow!("window closed with an error: {e}"))
}
