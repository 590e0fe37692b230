//! Capture mode: copy stdin byte-for-byte into a log file.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use logyard_rolling::RollingWriter;

/// Where captured bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureTarget {
    /// `<root>/<id>.log`, truncated on open.
    Single(PathBuf),
    /// Rolling chunks based at `<root>/<id>/<id>.log`.
    Rolling { base: PathBuf, chunk_mb: u64 },
}

impl CaptureTarget {
    pub fn new(capture_root: &Path, id: &str, rolling: bool, chunk_mb: u64) -> Self {
        if rolling {
            Self::Rolling {
                base: capture_root.join(id).join(format!("{id}.log")),
                chunk_mb,
            }
        } else {
            Self::Single(capture_root.join(format!("{id}.log")))
        }
    }

    fn open(&self) -> anyhow::Result<Box<dyn Write + Send>> {
        match self {
            Self::Single(path) => {
                tracing::info!(path = %path.display(), "creating capture file");
                let file = File::create(path)
                    .with_context(|| format!("failed to create capture file {}", path.display()))?;
                Ok(Box::new(file))
            }
            Self::Rolling { base, chunk_mb } => {
                tracing::info!(base = %base.display(), chunk_mb, "capturing into rolling files");
                Ok(Box::new(RollingWriter::with_megabytes(base, *chunk_mb)))
            }
        }
    }
}

/// Copies `input` into the target until end of input. Returns the byte
/// count.
pub fn capture<R: Read>(input: &mut R, target: &CaptureTarget) -> anyhow::Result<u64> {
    let mut output = target.open()?;
    let copied = io::copy(input, &mut output).context("capture failed")?;
    output.flush().context("failed to flush capture")?;
    tracing::info!(bytes = copied, "capture finished");
    Ok(copied)
}

/// Captures the process's stdin on a blocking thread.
pub async fn run(target: CaptureTarget) -> anyhow::Result<()> {
    tokio::task::spawn_blocking(move || capture(&mut io::stdin().lock(), &target))
        .await
        .context("capture task panicked")??;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_paths() {
        let root = Path::new("/captures");
        assert_eq!(
            CaptureTarget::new(root, "99", false, 10),
            CaptureTarget::Single(PathBuf::from("/captures/99.log"))
        );
        assert_eq!(
            CaptureTarget::new(root, "99", true, 10),
            CaptureTarget::Rolling {
                base: PathBuf::from("/captures/99/99.log"),
                chunk_mb: 10
            }
        );
    }

    #[test]
    fn single_file_capture_is_byte_exact() {
        let tmp = tempfile::tempdir().unwrap();
        let target = CaptureTarget::new(tmp.path(), "run", false, 1);
        let input: Vec<u8> = b"line one\r\nno newline at end \xff\x00".to_vec();

        let copied = capture(&mut input.as_slice(), &target).unwrap();

        assert_eq!(copied, input.len() as u64);
        assert_eq!(std::fs::read(tmp.path().join("run.log")).unwrap(), input);
    }

    #[test]
    fn rolling_capture_lands_in_id_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let target = CaptureTarget::new(tmp.path(), "run", true, 1);

        capture(&mut &b"captured\n"[..], &target).unwrap();

        let chunk = tmp.path().join("run").join("run.0.log");
        assert_eq!(std::fs::read_to_string(chunk).unwrap(), "captured\n");
    }

    #[test]
    fn missing_directory_fails_single_capture() {
        let tmp = tempfile::tempdir().unwrap();
        let target = CaptureTarget::Single(tmp.path().join("nope").join("x.log"));
        assert!(capture(&mut &b"x"[..], &target).is_err());
    }
}
