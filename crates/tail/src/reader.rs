//! Line reassembly over an append-only byte stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Result of one [`LineReader::next_line`] call.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A complete line, terminator stripped.
    Line(Vec<u8>),
    /// No complete line is available yet. Any trailing fragment has been
    /// moved into the carry-over buffer.
    Eof,
}

/// An unrecoverable read error, with everything that was pending.
#[derive(Debug, thiserror::Error)]
#[error("read failed with {} pending bytes: {source}", .pending.len())]
pub struct ReadFailure {
    /// Carry-over plus the bytes read before the error.
    pub pending: Vec<u8>,
    #[source]
    pub source: std::io::Error,
}

/// Reads `\n`-terminated lines, carrying unterminated fragments over
/// end-of-file until their terminator shows up.
pub struct LineReader<R> {
    reader: R,
    partial: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
        }
    }

    /// Bytes of the current incomplete line.
    pub fn pending(&self) -> &[u8] {
        &self.partial
    }

    /// Reads up to the next terminator.
    ///
    /// A fragment cut off by end-of-file is never returned as a line; it
    /// is kept and prefixed to the line that eventually completes it.
    pub async fn next_line(&mut self) -> Result<ReadOutcome, ReadFailure> {
        let mut buf = Vec::new();
        match self.reader.read_until(b'\n', &mut buf).await {
            Ok(0) => Ok(ReadOutcome::Eof),
            Ok(_) if buf.last() == Some(&b'\n') => {
                buf.pop();
                if self.partial.is_empty() {
                    Ok(ReadOutcome::Line(buf))
                } else {
                    let mut line = std::mem::take(&mut self.partial);
                    line.extend_from_slice(&buf);
                    Ok(ReadOutcome::Line(line))
                }
            }
            Ok(_) => {
                self.partial.extend_from_slice(&buf);
                Ok(ReadOutcome::Eof)
            }
            Err(source) => {
                let mut pending = std::mem::take(&mut self.partial);
                pending.extend_from_slice(&buf);
                Err(ReadFailure { pending, source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tokio::io::BufReader;

    use super::*;

    fn line(s: &str) -> ReadOutcome {
        ReadOutcome::Line(s.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn lines_split_across_reads_are_joined() {
        let mock = tokio_test::io::Builder::new()
            .read(b"line A\nli")
            .read(b"ne B\n")
            .build();
        let mut reader = LineReader::new(BufReader::new(mock));

        assert_eq!(reader.next_line().await.unwrap(), line("line A"));
        assert_eq!(reader.next_line().await.unwrap(), line("line B"));
        assert_eq!(reader.next_line().await.unwrap(), ReadOutcome::Eof);
    }

    #[tokio::test]
    async fn small_reads_match_a_single_read() {
        let input = b"alpha\n\nbeta gamma\ndelta\n";

        let whole = tokio_test::io::Builder::new().read(input).build();
        let mut a = LineReader::new(BufReader::new(whole));

        let mut builder = tokio_test::io::Builder::new();
        for piece in input.chunks(3) {
            builder.read(piece);
        }
        let mut b = LineReader::new(BufReader::new(builder.build()));

        let mut expected = Vec::new();
        while let ReadOutcome::Line(l) = a.next_line().await.unwrap() {
            expected.push(l);
        }
        let mut got = Vec::new();
        while let ReadOutcome::Line(l) = b.next_line().await.unwrap() {
            got.push(l);
        }

        assert_eq!(got, expected);
        assert_eq!(
            got,
            vec![
                b"alpha".to_vec(),
                Vec::new(),
                b"beta gamma".to_vec(),
                b"delta".to_vec()
            ]
        );
    }

    #[tokio::test]
    async fn fragment_waits_for_terminator_across_eof() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"line A\nli").unwrap();
        tmp.flush().unwrap();

        let file = tokio::fs::File::open(tmp.path()).await.unwrap();
        let mut reader = LineReader::new(BufReader::new(file));

        assert_eq!(reader.next_line().await.unwrap(), line("line A"));
        assert_eq!(reader.next_line().await.unwrap(), ReadOutcome::Eof);
        assert_eq!(reader.pending(), b"li");
        assert_eq!(reader.next_line().await.unwrap(), ReadOutcome::Eof);

        tmp.write_all(b"ne").unwrap();
        tmp.flush().unwrap();
        assert_eq!(reader.next_line().await.unwrap(), ReadOutcome::Eof);
        assert_eq!(reader.pending(), b"line");

        tmp.write_all(b" B\n").unwrap();
        tmp.flush().unwrap();
        assert_eq!(reader.next_line().await.unwrap(), line("line B"));
        assert!(reader.pending().is_empty());
    }

    #[tokio::test]
    async fn read_error_returns_pending_bytes() {
        let mock = tokio_test::io::Builder::new()
            .read(b"ok\npart")
            .read_error(std::io::Error::other("boom"))
            .build();
        let mut reader = LineReader::new(BufReader::new(mock));

        assert_eq!(reader.next_line().await.unwrap(), line("ok"));
        let failure = reader.next_line().await.unwrap_err();
        assert_eq!(failure.pending, b"part");
        assert_eq!(failure.source.to_string(), "boom");
        assert!(reader.pending().is_empty());
    }

    #[tokio::test]
    async fn carriage_returns_are_kept() {
        let mock = tokio_test::io::Builder::new().read(b"dos\r\n").build();
        let mut reader = LineReader::new(BufReader::new(mock));
        assert_eq!(reader.next_line().await.unwrap(), line("dos\r"));
    }
}
