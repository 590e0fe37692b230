//! Atomically swappable cache of the rendered listing page.

use std::sync::{PoisonError, RwLock};

use axum::body::Bytes;

/// Holds the current listing page.
///
/// The page is replaced as a whole; readers get a cheap clone of the
/// snapshot that was current when they asked and never see a partial
/// buffer.
#[derive(Debug, Default)]
pub struct PageCache {
    current: RwLock<Bytes>,
}

impl PageCache {
    pub fn new(page: Bytes) -> Self {
        Self {
            current: RwLock::new(page),
        }
    }

    /// Returns the current snapshot.
    pub fn current(&self) -> Bytes {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replaces the snapshot, returning the previous one.
    pub fn swap(&self, page: Bytes) -> Bytes {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, page)
    }
}
