//! Source catalog: stats the resolved roots and walks directory roots.

use std::ffi::OsStr;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use logyard_protocol::constants::LOG_SUFFIX;
use walkdir::WalkDir;

use crate::resolve::RawSource;

/// A source that passed validation at catalog-build time.
#[derive(Debug, Clone)]
pub struct ValidSource {
    /// Absolute path to the file or directory.
    pub path: PathBuf,
    /// Whether the source is a directory root.
    pub is_dir: bool,
    /// Metadata snapshot taken when the catalog was built.
    pub metadata: Metadata,
    /// For directory roots, every log file found beneath it in walk order.
    /// Intermediate directories are not recorded. `None` for files.
    pub children: Option<Vec<ValidSource>>,
}

impl ValidSource {
    fn leaf(path: PathBuf, metadata: Metadata) -> Self {
        Self {
            path,
            is_dir: false,
            metadata,
            children: None,
        }
    }
}

/// Why a source, or part of one, was left out of the catalog.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("unresolved source path {raw:?}")]
    Unresolved { raw: String },

    #[error("failed stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a log file or directory {}", .path.display())]
    Unsupported { path: PathBuf },

    #[error("walk of {} aborted at {}: {source}", .root.display(), .path.display())]
    Walk {
        root: PathBuf,
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

impl ScanError {
    /// Unsupported sources are expected input, not failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }
}

/// The immutable two-level catalog of log sources.
#[derive(Debug, Default)]
pub struct Catalog {
    sources: Vec<ValidSource>,
    diagnostics: Vec<ScanError>,
}

impl Catalog {
    /// Builds the catalog from resolved raw sources.
    ///
    /// Never fails: every skipped root, unreadable subtree or failed stat
    /// is recorded in [`diagnostics`](Self::diagnostics) and logged.
    /// Roots keep the input order; children keep walk order. Overlapping
    /// roots are not deduplicated.
    pub fn build(raw_sources: &[RawSource]) -> Self {
        let mut catalog = Self::default();

        for raw in raw_sources {
            let Some(abs) = raw.abs_path.as_deref() else {
                catalog.report(ScanError::Unresolved {
                    raw: raw.raw_path.clone(),
                });
                continue;
            };

            let metadata = match std::fs::metadata(abs) {
                Ok(m) => m,
                Err(source) => {
                    catalog.report(ScanError::Stat {
                        path: abs.to_path_buf(),
                        source,
                    });
                    continue;
                }
            };

            if !metadata.is_dir() {
                if !abs.file_name().is_some_and(has_log_suffix) {
                    catalog.report(ScanError::Unsupported {
                        path: abs.to_path_buf(),
                    });
                    continue;
                }
                tracing::info!(path = %abs.display(), "confirmed source");
                catalog
                    .sources
                    .push(ValidSource::leaf(abs.to_path_buf(), metadata));
                continue;
            }

            tracing::info!(path = %abs.display(), "walking");
            let children = catalog.walk(abs);
            tracing::info!(
                path = %abs.display(),
                count = children.len(),
                "confirmed source"
            );
            catalog.sources.push(ValidSource {
                path: abs.to_path_buf(),
                is_dir: true,
                metadata,
                children: Some(children),
            });
        }

        catalog
    }

    /// Root sources in input order.
    pub fn sources(&self) -> &[ValidSource] {
        &self.sources
    }

    /// Everything that was skipped while building.
    pub fn diagnostics(&self) -> &[ScanError] {
        &self.diagnostics
    }

    /// Every tailable file: file roots and the children of directory roots.
    pub fn leaves(&self) -> impl Iterator<Item = &ValidSource> {
        self.sources.iter().flat_map(|src| match &src.children {
            Some(children) => children.as_slice(),
            None => std::slice::from_ref(src),
        })
    }

    /// Collects log files under `root`.
    ///
    /// An unreadable entry stops the descent into that entry only; files
    /// already found and sibling subtrees are kept.
    fn walk(&mut self, root: &Path) -> Vec<ValidSource> {
        let mut children = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(e) => e,
                Err(source) => {
                    let path = source
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| root.to_path_buf());
                    self.report(ScanError::Walk {
                        root: root.to_path_buf(),
                        path,
                        source,
                    });
                    continue;
                }
            };

            if entry.file_type().is_dir() || !has_log_suffix(entry.file_name()) {
                continue;
            }

            match std::fs::metadata(entry.path()) {
                Ok(metadata) if metadata.is_file() => {
                    tracing::debug!(path = %entry.path().display(), "found sub-source");
                    children.push(ValidSource::leaf(entry.path().to_path_buf(), metadata));
                }
                Ok(_) => {}
                Err(source) => self.report(ScanError::Stat {
                    path: entry.path().to_path_buf(),
                    source,
                }),
            }
        }

        children
    }

    fn report(&mut self, err: ScanError) {
        if err.is_warning() {
            tracing::warn!("{err}");
        } else {
            tracing::error!("{err}");
        }
        self.diagnostics.push(err);
    }
}

/// Returns `true` if a file name carries the log suffix.
pub fn has_log_suffix(name: &OsStr) -> bool {
    name.to_string_lossy().ends_with(LOG_SUFFIX)
}
