//! trackfetch - interactive music track acquisition.
//!
//! Reads requests (free text or service URLs) from the command line or an
//! interactive prompt and hands each one to the acquisition orchestrator.

mod prompt;
mod report;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackfetch_core::{
    load_config, load_default_config, metrics, validate_config, AcquisitionOrchestrator, Config,
};

/// Config file used when `--config` is not given; may be absent.
const DEFAULT_CONFIG_PATH: &str = "trackfetch.toml";

/// Command-line arguments for trackfetch
#[derive(Parser, Debug)]
#[command(name = "trackfetch")]
#[command(about = "Download music tracks by search query or service URL")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TRACKFETCH_CONFIG")]
    config: Option<PathBuf>,

    /// Directory for downloaded files (overrides the config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Log backend output at debug level instead of info
    #[arg(short, long)]
    quiet: bool,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Check that both backends are installed, then exit
    #[arg(long)]
    check: bool,

    /// Request to run once (free text or URL); starts the prompt if omitted
    request: Option<String>,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match run(args).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether the session ended without a failure that should set the
/// exit code.
async fn run(args: Args) -> Result<bool> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = load(&args)?;
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    if args.quiet {
        config.logging.verbose = false;
    }
    validate_config(&config).context("Configuration validation failed")?;

    info!("Output directory: {}", config.output.dir.display());
    info!(
        "Backends: primary {}, secondary {}",
        config.primary.program.display(),
        config.secondary.program.display()
    );

    let orchestrator =
        AcquisitionOrchestrator::from_config(&config).context("Failed to create HTTP client")?;

    if args.check {
        let statuses = orchestrator.check_backends().await;
        println!("{}", report::render_check(&statuses));
        return Ok(statuses.iter().all(|s| s.available));
    }

    let ok = match &args.request {
        Some(input) => {
            let request = orchestrator.classify(input);
            tokio::select! {
                result = orchestrator.acquire(request) => {
                    println!("{}", report::render(&result, args.json)?);
                    result.success
                }
                _ = signal::ctrl_c() => {
                    warn!("Interrupted, backend stopped");
                    false
                }
            }
        }
        None => {
            prompt::run_interactive(&orchestrator, args.json).await?;
            true
        }
    };

    println!("{}", report::render_summary(&metrics::session_summary()));
    Ok(ok)
}

/// Loads the config file, falling back to defaults when the default path
/// does not exist. An explicitly named file must exist.
fn load(args: &Args) -> Result<Config> {
    let path = match &args.config {
        Some(path) => path.clone(),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if !path.exists() {
                info!("No {} found, using defaults", DEFAULT_CONFIG_PATH);
                return load_default_config().context("Failed to load default config");
            }
            path
        }
    };

    info!("Loading configuration from {:?}", path);
    load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
}
