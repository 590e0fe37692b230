//! Mode selection and the server lifecycle.

use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use logyard_protocol::constants::SHUTDOWN_TIMEOUT;
use logyard_server::{LogServer, ServerConfig, ServerError};
use logyard_sources::{Catalog, parse_source_list};
use tokio_util::sync::CancellationToken;

use crate::capture::{self, CaptureTarget};
use crate::config::Config;
use crate::demo;

/// Runs the selected mode to completion.
pub async fn run(config: &Config, capture_root: &Path) -> anyhow::Result<()> {
    tracing::info!(home = %config.home_dir.display(), "resources initialized");

    if let Some(lines) = config.demo_lines() {
        let cancel = CancellationToken::new();
        spawn_ctrl_c(cancel.clone());
        demo::run(
            lines,
            Duration::from_millis(config.max_demo_interval_ms),
            cancel,
        )
        .await;
        return Ok(());
    }

    if config.capture {
        tracing::info!(
            id = %config.id,
            path = %capture_root.display(),
            "starting capture mode"
        );
        let target = CaptureTarget::new(capture_root, &config.id, config.rolling, config.chunk_mb);
        return capture::run(target).await;
    }

    tracing::info!("starting server mode");
    run_server(config).await
}

async fn run_server(config: &Config) -> anyhow::Result<()> {
    let raw_sources = parse_source_list(&config.sources, &config.home_dir);
    let catalog = Catalog::build(&raw_sources);
    tracing::info!(
        roots = catalog.sources().len(),
        files = catalog.leaves().count(),
        skipped = catalog.diagnostics().len(),
        "catalog built"
    );

    let server_config = ServerConfig {
        port: config.port,
        poll_interval: Duration::from_millis(config.polling_ms),
        shutdown_timeout: SHUTDOWN_TIMEOUT,
    };
    let server = LogServer::new(server_config, &catalog);
    spawn_ctrl_c(server.cancel_token());

    match server.run().await {
        Ok(()) => {
            tracing::info!("server shut down cleanly");
            Ok(())
        }
        Err(e @ ServerError::ShutdownTimeout(_)) => {
            // Sessions may still hold files; do not wait on them.
            tracing::error!("{e}; exiting");
            eprintln!("logyard: {e}");
            std::process::exit(1);
        }
        Err(e) => Err(e).context("server failed"),
    }
}

/// Cancels `cancel` on Ctrl-C. The watcher exits once `cancel` fires for
/// any other reason.
fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                match result {
                    Ok(()) => tracing::info!("SIGINT received, shutting down"),
                    Err(e) => {
                        tracing::warn!("cannot listen for Ctrl-C: {e}");
                        return;
                    }
                }
                cancel.cancel();
            }
            _ = cancel.cancelled() => {}
        }
    });
}
