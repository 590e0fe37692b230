//! Self-logging setup.
//!
//! Logging is off unless `-l` (stderr) or `--cl` (a file in the capture
//! directory) is given. With `--rl` the file is rotated through a
//! [`RollingWriter`].

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::Context;
use logyard_protocol::constants::APP_NAME;
use logyard_rolling::RollingWriter;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use crate::config::Config;

/// Where logyard's own log events go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Disabled,
    Stderr,
    File(PathBuf),
    Rolling(PathBuf),
}

impl Destination {
    /// Picks the destination; a capture file wins over stderr.
    pub fn from_config(config: &Config, capture_root: &Path) -> Self {
        if config.log_to_capture {
            let path = self_log_path(capture_root, &config.id);
            if config.rolling {
                Self::Rolling(path)
            } else {
                Self::File(path)
            }
        } else if config.log_to_stderr {
            Self::Stderr
        } else {
            Self::Disabled
        }
    }
}

/// `<capture root>/<id>-logyard.log`
pub fn self_log_path(capture_root: &Path, id: &str) -> PathBuf {
    capture_root.join(format!("{id}-{APP_NAME}.log"))
}

/// Opens the destination's writer. `None` means logging is disabled.
fn make_writer(destination: &Destination, chunk_mb: u64) -> anyhow::Result<Option<BoxMakeWriter>> {
    let writer = match destination {
        Destination::Disabled => return Ok(None),
        Destination::Stderr => BoxMakeWriter::new(std::io::stderr),
        Destination::File(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        Destination::Rolling(path) => {
            BoxMakeWriter::new(Mutex::new(RollingWriter::with_megabytes(path, chunk_mb)))
        }
    };
    Ok(Some(writer))
}

/// Installs the global subscriber for the chosen destination.
pub fn init(destination: &Destination, chunk_mb: u64) -> anyhow::Result<()> {
    let Some(writer) = make_writer(destination, chunk_mb)? else {
        // No subscriber: events are discarded.
        return Ok(());
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(matches!(destination, Destination::Stderr))
        .with_writer(writer)
        .init();
    Ok(())
}
