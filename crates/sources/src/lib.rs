//! Path resolution and log source discovery.
//!
//! Turns the user-supplied, comma-separated source list into a catalog of
//! tailable files. Resolution is purely lexical; the filesystem is only
//! touched when the catalog is built, and every failure there is reported
//! as a diagnostic instead of aborting the build.

mod catalog;
mod resolve;

pub use catalog::{Catalog, ScanError, ValidSource, has_log_suffix};
pub use resolve::{RawSource, parse_source_list, resolve, to_display};

/// Errors produced while resolving a user-supplied path.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("empty path")]
    Empty,

    #[error("cannot make {raw:?} absolute: {source}")]
    Absolute {
        raw: String,
        #[source]
        source: std::io::Error,
    },
}
