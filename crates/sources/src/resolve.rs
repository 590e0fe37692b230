//! User path resolution with `app://` home expansion.

use std::path::{Component, Path, PathBuf};

use logyard_protocol::constants::HOME_DIR_MARKER;

use crate::ResolveError;

/// A source path exactly as the user typed it, plus its resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSource {
    /// The token as provided by the user.
    pub raw_path: String,
    /// The resolved absolute path, or `None` when resolution failed.
    pub abs_path: Option<PathBuf>,
}

impl RawSource {
    /// Resolves a single token against `home`.
    pub fn new(raw_path: &str, home: &Path) -> Self {
        let abs_path = match resolve(raw_path, home) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(raw = raw_path, error = %e, "failed to resolve source path");
                None
            }
        };
        Self {
            raw_path: raw_path.to_string(),
            abs_path,
        }
    }

    /// Returns `true` if the token resolved to an absolute path.
    pub fn is_valid(&self) -> bool {
        self.abs_path.is_some()
    }
}

/// Splits a comma-separated source list and resolves every token.
///
/// Input order is preserved and failed tokens are kept (marked invalid)
/// so callers can report them.
pub fn parse_source_list(list: &str, home: &Path) -> Vec<RawSource> {
    list.split(',').map(|tok| RawSource::new(tok, home)).collect()
}

/// Resolves a user path into an absolute, lexically normalized path.
///
/// A leading `app://` is replaced with `home`. The filesystem is never
/// consulted, so the result may not exist.
pub fn resolve(raw: &str, home: &Path) -> Result<PathBuf, ResolveError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::Empty);
    }

    let path = match trimmed.strip_prefix(HOME_DIR_MARKER) {
        Some(rest) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(trimmed),
    };

    let abs = std::path::absolute(&path).map_err(|source| ResolveError::Absolute {
        raw: raw.to_string(),
        source,
    })?;

    Ok(normalize(&abs))
}

/// Renders an absolute path in its home-relative form when possible.
///
/// Paths under `home` come back as `app://<rest>`; anything else is
/// returned as-is. Feeding the result to [`resolve`] yields the input.
pub fn to_display(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) => format!(
            "{HOME_DIR_MARKER}{}",
            rest.to_string_lossy().replace('\\', "/")
        ),
        Err(_) => path.display().to_string(),
    }
}

/// Folds `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root.
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
