//! Per-viewer tail session: open, poll for growth, deliver lines.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::time::Duration;

use logyard_protocol::constants::READ_BUFFER_SIZE;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::TailError;
use crate::reader::{LineReader, ReadOutcome};

/// A boxed future returned by [`LineSink::send_line`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SendError>> + Send + 'a>>;

/// Error returned when the viewer can no longer receive lines.
#[derive(Debug, thiserror::Error)]
#[error("send failed: {0}")]
pub struct SendError(pub String);

/// Destination of delivered lines, one discrete message per line.
pub trait LineSink: Send {
    fn send_line(&mut self, line: Vec<u8>) -> SinkFuture<'_>;
}

impl<T: LineSink + ?Sized> LineSink for &mut T {
    fn send_line(&mut self, line: Vec<u8>) -> SinkFuture<'_> {
        (**self).send_line(line)
    }
}

impl LineSink for mpsc::Sender<Vec<u8>> {
    fn send_line(&mut self, line: Vec<u8>) -> SinkFuture<'_> {
        Box::pin(async move {
            self.send(line)
                .await
                .map_err(|_| SendError("receiver dropped".into()))
        })
    }
}

/// Follows one file for one viewer.
///
/// The session reads from the start of the file, then every poll
/// interval checks whether the file grew and, if so, reads until it runs
/// out of complete lines again. It owns its file handle and carry-over
/// buffer; nothing is shared with other sessions on the same file.
pub struct TailSession<S> {
    path: PathBuf,
    sink: S,
    poll_interval: Duration,
    cancel: CancellationToken,
}

impl<S: LineSink> TailSession<S> {
    pub fn new(
        path: impl Into<PathBuf>,
        sink: S,
        poll_interval: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            path: path.into(),
            sink,
            poll_interval,
            cancel,
        }
    }

    /// Runs until cancelled or until an error ends the session.
    ///
    /// Returns `Ok(())` on cancellation. On a read error the pending
    /// fragment (if any) is sent as a last message before returning.
    pub async fn run(self) -> Result<(), TailError> {
        let file = tokio::fs::File::open(&self.path)
            .await
            .map_err(|source| TailError::Open {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), "tail session opened");
        self.follow(BufReader::with_capacity(READ_BUFFER_SIZE, file))
            .await
    }

    /// Runs the session over an already-open reader of the file's
    /// contents. The path is still stat'ed to detect growth.
    pub async fn follow<R>(mut self, reader: R) -> Result<(), TailError>
    where
        R: AsyncBufRead + Unpin + Send,
    {
        let mut lines = LineReader::new(reader);

        let mut last_known_size = 0u64;
        let mut eof = true;

        loop {
            let size = stat_len(&self.path).await?;
            if size > last_known_size {
                last_known_size = size;
                eof = false;
            }

            while !eof {
                if self.cancel.is_cancelled() {
                    return Ok(());
                }
                match lines.next_line().await {
                    Ok(ReadOutcome::Line(line)) => {
                        if !self.deliver(line).await? {
                            return Ok(());
                        }
                    }
                    Ok(ReadOutcome::Eof) => eof = true,
                    Err(failure) => {
                        tracing::warn!(path = %self.path.display(), error = %failure.source, "reader error");
                        if !failure.pending.is_empty() {
                            if let Err(e) = self.deliver(failure.pending).await {
                                tracing::warn!(path = %self.path.display(), "write error: {e}");
                            }
                        }
                        return Err(TailError::Read {
                            path: self.path,
                            source: failure.source,
                        });
                    }
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }
    }

    /// Sends one line; `Ok(false)` means the session was cancelled meanwhile.
    async fn deliver(&mut self, line: Vec<u8>) -> Result<bool, TailError> {
        tokio::select! {
            _ = self.cancel.cancelled() => Ok(false),
            sent = self.sink.send_line(line) => {
                sent?;
                Ok(true)
            }
        }
    }
}

async fn stat_len(path: &Path) -> Result<u64, TailError> {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .map_err(|source| TailError::Stat {
            path: path.to_path_buf(),
            source,
        })
}
