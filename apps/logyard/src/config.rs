//! Command line and configuration file handling.
//!
//! Settings come from an optional TOML file (`--config`) with every field
//! defaulted, then explicit command line flags override the file. The
//! merged [`Config`] is built once at startup and never mutated after.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Timelike, Utc};
use clap::Parser;
use logyard_protocol::constants::{
    DEFAULT_CAPTURE_DIR, DEFAULT_CHUNK_MB, DEFAULT_POLL_INTERVAL, DEFAULT_PORT,
};
use serde::{Deserialize, Serialize};

/// Browse and live-tail log files from a browser.
///
/// Runs a web server by default. `-c` captures stdin into a log file
/// instead, and `--demo` prints fabricated log lines.
#[derive(Debug, Default, Parser)]
#[command(name = "logyard", version)]
pub struct Cli {
    /// TOML file with default settings; flags override its values.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Unique identifier for generated files. Defaults to the UTC second
    /// of the current year.
    #[arg(long)]
    pub id: Option<String>,

    /// Home directory, aliased as "app://" in other paths. Defaults to
    /// the directory of the executable.
    #[arg(long)]
    pub hdir: Option<PathBuf>,

    /// Write logyard's own logs to stderr.
    #[arg(short = 'l')]
    pub log_to_stderr: bool,

    /// Write logyard's own logs into a file in the capture directory.
    #[arg(long = "cl")]
    pub log_to_capture: bool,

    /// Rotate log files. Applies to captures too; does not enable
    /// logging by itself.
    #[arg(long = "rl")]
    pub rolling: bool,

    /// Maximum rolling file size, in megabytes.
    #[arg(long)]
    pub chunkmb: Option<u64>,

    /// Port for the web UI. Server mode only.
    #[arg(long)]
    pub port: Option<u16>,

    /// Interval between size checks of a streamed file, in milliseconds.
    /// Server mode only.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub polling: Option<u64>,

    /// Comma-separated list of files and directories to scan for log
    /// files. Directories are scanned recursively. Server mode only.
    #[arg(long)]
    pub src: Option<String>,

    /// Capture stdin into a log file.
    #[arg(short = 'c')]
    pub capture: bool,

    /// Directory where capture files are created.
    #[arg(long)]
    pub cdir: Option<String>,

    /// Print this many demo lines (0 = forever). Negative disables demo
    /// mode.
    #[arg(long, allow_negative_numbers = true)]
    pub demo: Option<i64>,

    /// Maximum sleep between demo lines, in milliseconds.
    #[arg(long = "max-demo-interval", alias = "maxDemoInterval")]
    pub max_demo_interval: Option<u64>,
}

/// Merged runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identifier used to name capture and self-log files.
    #[serde(default = "default_id")]
    pub id: String,

    /// Home directory. Empty means the executable's directory; after
    /// [`Config::load`] it is always absolute.
    #[serde(default)]
    pub home_dir: PathBuf,

    #[serde(default)]
    pub log_to_stderr: bool,

    #[serde(default)]
    pub log_to_capture: bool,

    #[serde(default)]
    pub rolling: bool,

    #[serde(default = "default_chunk_mb")]
    pub chunk_mb: u64,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_polling_ms")]
    pub polling_ms: u64,

    /// Comma-separated source list, may use the home marker.
    #[serde(default = "default_capture_dir")]
    pub sources: String,

    #[serde(default)]
    pub capture: bool,

    /// Capture directory, may use the home marker.
    #[serde(default = "default_capture_dir")]
    pub capture_dir: String,

    /// Demo line count; negative disables demo mode, 0 runs forever.
    #[serde(default = "default_demo")]
    pub demo: i64,

    #[serde(default = "default_max_demo_interval")]
    pub max_demo_interval_ms: u64,
}

/// The UTC second of the current year.
fn default_id() -> String {
    let now = Utc::now();
    let secs = u64::from(now.ordinal0()) * 86_400 + u64::from(now.num_seconds_from_midnight());
    secs.to_string()
}

fn default_chunk_mb() -> u64 {
    DEFAULT_CHUNK_MB
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_polling_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

fn default_capture_dir() -> String {
    DEFAULT_CAPTURE_DIR.into()
}

fn default_demo() -> i64 {
    -1
}

fn default_max_demo_interval() -> u64 {
    500
}

impl Default for Config {
    fn default() -> Self {
        Self {
            id: default_id(),
            home_dir: PathBuf::new(),
            log_to_stderr: false,
            log_to_capture: false,
            rolling: false,
            chunk_mb: default_chunk_mb(),
            port: default_port(),
            polling_ms: default_polling_ms(),
            sources: default_capture_dir(),
            capture: false,
            capture_dir: default_capture_dir(),
            demo: default_demo(),
            max_demo_interval_ms: default_max_demo_interval(),
        }
    }
}

impl Config {
    /// Builds the configuration from the optional file and the flags,
    /// and resolves the home directory.
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply(cli);
        anyhow::ensure!(
            config.polling_ms >= 1,
            "polling interval must be at least 1 ms, got {}",
            config.polling_ms
        );
        config.home_dir = resolve_home(&config.home_dir)?;
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Overrides file values with the flags that were given.
    fn apply(&mut self, cli: &Cli) {
        if let Some(id) = &cli.id {
            self.id = id.clone();
        }
        if let Some(hdir) = &cli.hdir {
            self.home_dir = hdir.clone();
        }
        self.log_to_stderr |= cli.log_to_stderr;
        self.log_to_capture |= cli.log_to_capture;
        self.rolling |= cli.rolling;
        self.capture |= cli.capture;
        if let Some(mb) = cli.chunkmb {
            self.chunk_mb = mb;
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if let Some(ms) = cli.polling {
            self.polling_ms = ms;
        }
        if let Some(src) = &cli.src {
            self.sources = src.clone();
        }
        if let Some(cdir) = &cli.cdir {
            self.capture_dir = cdir.clone();
        }
        if let Some(demo) = cli.demo {
            self.demo = demo;
        }
        if let Some(ms) = cli.max_demo_interval {
            self.max_demo_interval_ms = ms;
        }
    }

    /// Absolute capture directory.
    pub fn capture_root(&self) -> anyhow::Result<PathBuf> {
        logyard_sources::resolve(&self.capture_dir, &self.home_dir)
            .with_context(|| format!("failed to resolve capture path {:?}", self.capture_dir))
    }

    /// Number of demo lines to print, if demo mode is on.
    pub fn demo_lines(&self) -> Option<u64> {
        u64::try_from(self.demo).ok()
    }
}

fn resolve_home(home: &Path) -> anyhow::Result<PathBuf> {
    if !home.as_os_str().is_empty() {
        return std::path::absolute(home)
            .with_context(|| format!("failed to resolve home path {}", home.display()));
    }

    let exe = std::env::current_exe().context("failed to read home path")?;
    let dir = exe
        .parent()
        .with_context(|| format!("executable {} has no parent directory", exe.display()))?;
    std::path::absolute(dir).context("failed to resolve home path")
}
