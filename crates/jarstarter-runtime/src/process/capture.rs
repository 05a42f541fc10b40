//! Child output capture.
//!
//! The payload may write non-UTF-8 bytes and ANSI colour codes despite being
//! asked not to. Lines are read as bytes, decoded lossily, stripped of escape
//! sequences and appended to the log sink in arrival order. stdout and stderr
//! feed one channel so a single consumer owns the sink.

use std::borrow::Cow;
use std::sync::{Arc, LazyLock};

use jarstarter_core::ports::LogSinkPort;
use regex::Regex;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const ANSI_SGR_PATTERN: &str = r"\x1B\[[0-9;]*m";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ANSI_SGR_PATTERN).expect("valid ansi escape regex"));

/// Remove ANSI escape sequences from `line`.
pub fn strip_ansi(line: &str) -> Cow<'_, str> {
    if line.contains('\x1B') {
        ANSI_ESCAPE.replace_all(line, "")
    } else {
        Cow::Borrowed(line)
    }
}

/// Which pipe a line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

/// Handle on the capture tasks of one child.
///
/// Dropping it does not stop the tasks; they end at EOF of both pipes.
#[derive(Debug)]
pub struct OutputCapture {
    forwarder: JoinHandle<usize>,
}

impl OutputCapture {
    /// Start readers on the given pipes and a forwarder into `sink`.
    pub fn spawn<O, E>(stdout: Option<O>, stderr: Option<E>, sink: Arc<dyn LogSinkPort>) -> Self
    where
        O: AsyncRead + Unpin + Send + 'static,
        E: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();

        if let Some(stdout) = stdout {
            spawn_line_reader(stdout, StreamKind::Stdout, tx.clone());
        }
        if let Some(stderr) = stderr {
            spawn_line_reader(stderr, StreamKind::Stderr, tx.clone());
        }
        drop(tx);

        let forwarder = tokio::spawn(async move {
            let mut forwarded = 0;
            while let Some(line) = rx.recv().await {
                sink.append(strip_ansi(&line).into_owned());
                forwarded += 1;
            }
            debug!(lines = forwarded, "Output capture finished");
            forwarded
        });

        Self { forwarder }
    }

    /// Wait until both pipes reached EOF and every line was forwarded.
    ///
    /// Returns the number of lines forwarded.
    pub async fn finished(self) -> usize {
        self.forwarder.await.unwrap_or_default()
    }
}

fn spawn_line_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    kind: StreamKind,
    tx: mpsc::UnboundedSender<String>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    let line = String::from_utf8_lossy(&buf).into_owned();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(stream = kind.as_str(), error = %e, "Output reader exiting on read error");
                    break;
                }
            }
        }

        debug!(stream = kind.as_str(), "Output reader finished");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogBuffer;

    #[test]
    fn strips_colour_codes() {
        assert_eq!(
            strip_ansi("\x1B[32mINFO\x1B[0m started on port 10001"),
            "INFO started on port 10001"
        );
        assert_eq!(strip_ansi("\x1B[1;31mERROR\x1B[m"), "ERROR");
        assert_eq!(strip_ansi("\u{1b}[0;32mHello\u{1b}[0m"), "Hello");
    }

    #[test]
    fn sgr_pattern_compiles() {
        assert!(Regex::new(ANSI_SGR_PATTERN).is_ok());
        assert!(ANSI_ESCAPE.is_match("\x1B[0m"));
        assert!(!ANSI_ESCAPE.is_match("[0m"));
    }

    #[test]
    fn plain_lines_are_borrowed() {
        assert!(matches!(strip_ansi("plain"), Cow::Borrowed("plain")));
    }

    #[tokio::test]
    async fn forwards_both_streams_lossily() {
        let buffer = Arc::new(LogBuffer::default());
        let stdout: &[u8] = b"first\r\n\x1B[33mcolored\x1B[0m\nno newline";
        let stderr: &[u8] = b"bad \xFF byte\n";

        let capture = OutputCapture::spawn(Some(stdout), Some(stderr), buffer.clone());
        assert_eq!(capture.finished().await, 4);

        let lines = buffer.lines();
        assert!(lines.contains(&"first".to_string()));
        assert!(lines.contains(&"colored".to_string()));
        assert!(lines.contains(&"no newline".to_string()));
        assert!(lines.contains(&"bad \u{FFFD} byte".to_string()));

        let first = lines.iter().position(|l| l == "first").unwrap();
        let colored = lines.iter().position(|l| l == "colored").unwrap();
        assert!(first < colored);
    }
}
