use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use backend_infrastructure::{AppConfig, CONFIG_ENV};

#[derive(Parser, Debug)]
#[command(name = "checkin-backend")]
#[command(about = "HackAI check-in scan backend", long_about = None)]
struct Args {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(config) = args.config {
        std::env::set_var(CONFIG_ENV, config);
    }

    let config = AppConfig::load().await?;
    let _log_guard = backend_bootstrap::logging::init_logging(config.log_dir.as_deref())?;

    let config_path = AppConfig::config_path();
    if Path::new(&config_path).exists() {
        info!(path = %config_path, "configuration loaded");
    } else {
        warn!(path = %config_path, "config file not found, using defaults");
    }

    backend_bootstrap::run_standalone(config).await
}
