use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use eframe::egui_wgpu;

use oxideviews::app::OxideViewsApp;
use oxideviews::config::ViewerConfig;
use oxideviews::processing::normalize::NormalizationStyle;

/// Linked scatterplot viewer for multivariate tables.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// CSV, whitespace-delimited text or spreadsheet file to open.
    input: Option<PathBuf>,

    /// JSON configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Plot grid rows.
    #[arg(long)]
    rows: Option<usize>,

    /// Plot grid columns.
    #[arg(long)]
    cols: Option<usize>,

    /// Histogram bins per axis.
    #[arg(long)]
    nbins: Option<usize>,

    /// Read at most this many rows (0 = all).
    #[arg(long, short = 'n')]
    max_points: Option<usize>,

    /// Default normalization for new axes (minmax, zeromax, rank, gaussianize, ...).
    #[arg(long)]
    normalization: Option<NormalizationStyle>,

    /// Write the effective configuration to this path and exit.
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn build_config(args: &Args) -> oxideviews::error::Result<ViewerConfig> {
    let mut config = match &args.config {
        Some(path) => ViewerConfig::load(path)?,
        None => ViewerConfig::default(),
    };
    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.cols = cols;
    }
    if let Some(nbins) = args.nbins {
        config.default_nbins = nbins;
    }
    if let Some(max_points) = args.max_points {
        config.max_points = max_points;
    }
    if let Some(style) = args.normalization {
        config.default_normalization = style;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            std::process::exit(2);
        }
    };

    if let Some(path) = &args.save_config {
        if let Err(e) = config.save(path) {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
        return Ok(());
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("OxideViews")
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        wgpu_options: egui_wgpu::WgpuConfiguration {
            present_mode: eframe::wgpu::PresentMode::AutoVsync,
            ..Default::default()
        },
        ..Default::default()
    };

    let input = args.input;
    eframe::run_native(
        "OxideViews",
        options,
        Box::new(move |cc| Ok(Box::new(OxideViewsApp::new(cc, config, input)))),
    )
}
