//! Attention classifier demo: runs the detection loop on synthetic or recorded
//! landmarks and prints attention state transitions.

use anyhow::{Context, Result};
use attention_classifier::{
    app::{AppConfig, AttentionApp, FaceSource},
    config::{Config, EXAMPLE_CONFIG},
};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Replay a YAML landmark recording instead of the synthetic script
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Landmark jitter for the synthetic script, in pixels
    #[arg(long, default_value = "0")]
    noise: f64,

    /// Random seed for the synthetic jitter
    #[arg(long, default_value = "0")]
    seed: u64,

    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Simulate the host going hidden after this many seconds
    #[arg(long)]
    hide_after: Option<f64>,

    /// Trigger a recalibration after this many seconds
    #[arg(long)]
    recalibrate_at: Option<f64>,

    /// Print every classified cycle, not only transitions
    #[arg(short, long)]
    verbose: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn seconds(value: Option<f64>, name: &str) -> Result<Option<Duration>> {
    value
        .map(|secs| Duration::try_from_secs_f64(secs).with_context(|| format!("Invalid --{name}: {secs}")))
        .transpose()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Attention Classifier");

    // Load configuration if provided
    let engine = match &args.config {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Config::from_file(path).with_context(|| format!("Failed to load config file {}", path.display()))?
        }
        None => Config::default(),
    };

    let config = AppConfig {
        engine,
        face_source: match args.replay {
            Some(path) => FaceSource::Replay(path),
            None => FaceSource::Scripted {
                noise: args.noise,
                seed: args.seed,
            },
        },
        duration: seconds(args.duration, "duration")?,
        hide_after: seconds(args.hide_after, "hide-after")?,
        recalibrate_at: seconds(args.recalibrate_at, "recalibrate-at")?,
        verbose: args.verbose,
    };

    // Create and run application
    let app = AttentionApp::new(config)?;
    let summary = app.run().await?;

    println!(
        "{} cycles ({} away), {} transitions: {}",
        summary.cycles,
        summary.away,
        summary.transitions,
        summary
            .counts
            .iter()
            .map(|(state, count)| format!("{state}={count}"))
            .collect::<Vec<_>>()
            .join(", ")
    );

    Ok(())
}
