//! Shared constants and endpoint naming for logyard.
//!
//! Everything that the server, the tail engine and the binary must agree
//! on lives here: default values, the home-relative path marker, the
//! log-file suffix and the mapping from a source path to its URL.

pub mod constants;
pub mod endpoints;

pub use endpoints::{source_endpoint, stream_endpoint};
