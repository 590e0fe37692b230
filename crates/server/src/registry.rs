//! Endpoint registry: maps viewer routes to catalogued log files.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::body::Bytes;
use logyard_protocol::source_endpoint;
use logyard_sources::Catalog;

use crate::page::render_viewer;

/// A registered log file and its prerendered viewer page.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    pub path: PathBuf,
    pub viewer: Bytes,
}

/// Route table for per-source endpoints, built once at startup.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    entries: HashMap<String, SourceEntry>,
}

impl SourceRegistry {
    /// Registers every leaf of the catalog.
    pub fn from_catalog(catalog: &Catalog) -> Self {
        let mut registry = Self::default();
        for leaf in catalog.leaves() {
            registry.register(&leaf.path);
        }
        registry
    }

    /// Registers a file and returns its viewer route.
    ///
    /// Registering the same file twice keeps a single route.
    pub fn register(&mut self, path: &Path) -> String {
        let endpoint = source_endpoint(path);
        tracing::info!(endpoint = %endpoint, "endpoint");
        self.entries.insert(
            endpoint.clone(),
            SourceEntry {
                path: path.to_path_buf(),
                viewer: render_viewer(path),
            },
        );
        endpoint
    }

    /// Looks up a viewer route.
    pub fn get(&self, endpoint: &str) -> Option<&SourceEntry> {
        self.entries.get(endpoint)
    }

    /// All registered viewer routes, in no particular order.
    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
