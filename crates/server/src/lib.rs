//! HTTP listing and WebSocket live-tail server.
//!
//! Serves a cached listing of every catalogued source, one viewer page per
//! log file, and a WebSocket endpoint per file that streams the file's
//! lines through a [`logyard_tail::TailSession`]. Visiting the shutdown
//! route stops the listener, drains connections and ends every session.

mod cache;
mod connection;
mod page;
mod registry;
mod server;

pub use cache::PageCache;
pub use page::{escape_html, render_listing, render_viewer, source_href};
pub use registry::{SourceEntry, SourceRegistry};
pub use server::{LogServer, ServerConfig};

use std::time::Duration;

/// Errors produced by the log server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server did not shut down within {0:?}")]
    ShutdownTimeout(Duration),
}
