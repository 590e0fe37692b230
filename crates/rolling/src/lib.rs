//! Size-bounded rotating file writer.
//!
//! Used for logyard's own log file and for rotated stdin captures.

mod writer;

pub use writer::RollingWriter;

/// Bytes per megabyte for chunk size settings.
pub const MEGABYTE: u64 = 1024 * 1024;

/// Errors produced by the rolling writer.
#[derive(Debug, thiserror::Error)]
pub enum RollingError {
    #[error("failed to create chunk {}: {source}", .path.display())]
    CreateChunk {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writer closed after a previous chunk failure")]
    Closed,
}

impl From<RollingError> for std::io::Error {
    fn from(err: RollingError) -> Self {
        std::io::Error::other(err)
    }
}
