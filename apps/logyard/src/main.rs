//! logyard entry point.

mod app;
mod capture;
mod config;
mod demo;
mod logging;

use anyhow::Context;
use clap::Parser;

use crate::config::{Cli, Config};
use crate::logging::Destination;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;

    let capture_root = config.capture_root()?;
    if config.capture || config.log_to_capture {
        std::fs::create_dir_all(&capture_root).with_context(|| {
            format!("failed to create capture directory {}", capture_root.display())
        })?;
    }

    logging::init(
        &Destination::from_config(&config, &capture_root),
        config.chunk_mb,
    )?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        args = ?std::env::args().collect::<Vec<_>>(),
        "starting logyard"
    );
    if config.capture || config.log_to_capture {
        tracing::info!(path = %capture_root.display(), "capture path");
    }

    // Build and run the tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(&config, &capture_root))?;

    tracing::info!("logyard exited cleanly");
    Ok(())
}
