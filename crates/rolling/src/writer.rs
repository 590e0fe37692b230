use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::{MEGABYTE, RollingError};

/// A [`Write`] sink that starts a new chunk file once the current one
/// would grow past `max_bytes_per_chunk`.
///
/// Chunks are named `<stem>.<index>.<ext>` next to the base path, with
/// the index counting up from 0. Indices already present on disk are
/// skipped. A single write is never split across chunks; a write larger
/// than the limit lands whole in a fresh chunk.
pub struct RollingWriter {
    base_path: PathBuf,
    max_bytes_per_chunk: u64,
    current: Option<File>,
    current_size: u64,
    next_index: u64,
    chunks: Vec<PathBuf>,
    failed: bool,
}

impl RollingWriter {
    /// Creates a writer rooted at `base_path`. No file is created until
    /// the first write.
    ///
    /// A limit of 0 disables rotation.
    pub fn new(base_path: impl Into<PathBuf>, max_bytes_per_chunk: u64) -> Self {
        Self {
            base_path: base_path.into(),
            max_bytes_per_chunk,
            current: None,
            current_size: 0,
            next_index: 0,
            chunks: Vec::new(),
            failed: false,
        }
    }

    /// Creates a writer with the limit given in megabytes.
    pub fn with_megabytes(base_path: impl Into<PathBuf>, chunk_mb: u64) -> Self {
        Self::new(base_path, chunk_mb.saturating_mul(MEGABYTE))
    }

    /// The base path chunk names are derived from.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Chunk files opened so far, oldest first.
    pub fn chunk_paths(&self) -> &[PathBuf] {
        &self.chunks
    }

    /// Bytes written to the current chunk.
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    fn needs_rotation(&self, incoming: usize) -> bool {
        match self.current {
            None => true,
            Some(_) => {
                self.max_bytes_per_chunk > 0
                    && self.current_size > 0
                    && self.current_size.saturating_add(incoming as u64) > self.max_bytes_per_chunk
            }
        }
    }

    fn chunk_path(&self, index: u64) -> PathBuf {
        let stem = self
            .base_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .base_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_else(|| "log".into());
        self.base_path.with_file_name(format!("{stem}.{index}.{ext}"))
    }

    /// Closes the current chunk and opens the next free index.
    fn rotate(&mut self) -> Result<(), RollingError> {
        if let Some(mut old) = self.current.take() {
            let _ = old.flush();
        }

        if let Some(parent) = self.base_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| RollingError::CreateChunk {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        loop {
            let path = self.chunk_path(self.next_index);
            self.next_index += 1;

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => {
                    tracing::debug!(path = %path.display(), "opened chunk");
                    self.current = Some(file);
                    self.current_size = 0;
                    self.chunks.push(path);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(source) => return Err(RollingError::CreateChunk { path, source }),
            }
        }
    }
}

impl Write for RollingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.failed {
            return Err(RollingError::Closed.into());
        }

        if self.needs_rotation(buf.len()) {
            if let Err(e) = self.rotate() {
                self.failed = true;
                return Err(e.into());
            }
        }

        let Some(file) = self.current.as_mut() else {
            return Err(RollingError::Closed.into());
        };
        let n = write_whole(file, buf)?;
        self.current_size += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self.current.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Writes all of `buf`, so one logical write never straddles a rotation.
fn write_whole<W: Write>(out: &mut W, buf: &[u8]) -> std::io::Result<usize> {
    out.write_all(buf)?;
    Ok(buf.len())
}
