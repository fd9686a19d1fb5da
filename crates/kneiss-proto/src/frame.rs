//! Splitting raw transport chunks into protocol lines.
//!
//! Reads from a socket return whatever bytes happen to be available, so a
//! chunk can hold several lines, part of one, or both. [`FrameSplitter`]
//! keeps the unterminated tail between calls and only emits lines once
//! their `\n` has arrived.

use bytes::BytesMut;
use tracing::warn;

/// Default upper bound for a single inbound line in bytes.
///
/// 512 characters with room for four-byte UTF-8 sequences.
pub const DEFAULT_MAX_LINE_LEN: usize = 512 * 4;

/// Incremental line splitter with a persistent fragment buffer.
#[derive(Debug)]
pub struct FrameSplitter {
    buf: BytesMut,
    /// Index of next byte to check for newline
    next_index: usize,
    max_len: usize,
    /// Set while skipping the rest of an overlong line
    discarding: bool,
    dropped: u64,
}

impl FrameSplitter {
    /// Create a splitter with [`DEFAULT_MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a splitter with a custom line length bound.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            buf: BytesMut::new(),
            next_index: 0,
            max_len,
            discarding: false,
            dropped: 0,
        }
    }

    /// Feed one chunk and collect every line it completes.
    ///
    /// Lines come back without their delimiter, with a trailing `\r` and NUL
    /// padding trimmed. Empty lines are skipped. Invalid UTF-8 is replaced
    /// rather than rejected. A line longer than the bound is dropped along
    /// with the rest of its bytes up to the next `\n`.
    pub fn split(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buf[self.next_index..].iter().position(|b| *b == b'\n') {
            let end = self.next_index + offset;
            let frame = self.buf.split_to(end + 1);
            self.next_index = 0;

            if std::mem::take(&mut self.discarding) {
                continue;
            }

            let raw = &frame[..end];
            let len = content_len(raw);
            if len > self.max_len {
                self.drop_line(len);
                continue;
            }

            if let Some(line) = decode(raw) {
                lines.push(line);
            }
        }

        let pending = content_len(&self.buf);
        if pending > self.max_len {
            if !self.discarding {
                self.drop_line(pending);
                self.discarding = true;
            }
            self.buf.clear();
        }
        self.next_index = self.buf.len();

        lines
    }

    /// Bytes of an unterminated line waiting for more input.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Number of overlong lines discarded so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Configured line length bound.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    fn drop_line(&mut self, len: usize) {
        self.dropped += 1;
        warn!(len, limit = self.max_len, "dropping overlong line");
    }
}

impl Default for FrameSplitter {
    fn default() -> Self {
        Self::new()
    }
}

/// Length of `raw` without a trailing `\r`, which belongs to the delimiter.
fn content_len(raw: &[u8]) -> usize {
    raw.strip_suffix(b"\r").map_or(raw.len(), <[u8]>::len)
}

fn decode(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let line = text
        .trim_start_matches('\0')
        .trim_end_matches(['\r', '\0']);
    if line.is_empty() {
        None
    } else {
        Some(line.to_owned())
    }
}
