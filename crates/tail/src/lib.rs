//! Live tail sessions.
//!
//! A [`TailSession`] follows one file on behalf of one viewer: it delivers
//! every complete line already in the file, then polls for growth and
//! delivers newly completed lines as they appear. Lines are handed to a
//! [`LineSink`] one at a time, without their terminator.

mod reader;
mod session;

pub use reader::{LineReader, ReadFailure, ReadOutcome};
pub use session::{LineSink, SendError, SinkFuture, TailSession};

use std::path::PathBuf;

/// Errors that end a tail session.
#[derive(Debug, thiserror::Error)]
pub enum TailError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to stat {}: {source}", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Send(#[from] SendError),
}
