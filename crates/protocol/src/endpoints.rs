//! Deterministic mapping from a source path to its HTTP routes.

use std::path::Path;

use crate::constants::{SOURCE_ROUTE_PREFIX, STREAM_ROUTE_SUFFIX};

/// Returns the viewer route for a source file.
///
/// One leading `/` is dropped and Windows separators are folded into
/// `/`, so `/var/log/app.log` becomes `/src/var/log/app.log` and
/// `C:\logs\app.log` becomes `/src/C:/logs/app.log`.
pub fn source_endpoint(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let trimmed = raw.strip_prefix('/').unwrap_or(&raw);
    format!("{SOURCE_ROUTE_PREFIX}{}", trimmed.replace('\\', "/"))
}

/// Returns the WebSocket route for a source file.
pub fn stream_endpoint(path: &Path) -> String {
    format!("{}{STREAM_ROUTE_SUFFIX}", source_endpoint(path))
}
