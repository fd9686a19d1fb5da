//! Outbound line codec for tokio.
//!
//! Inbound framing is handled by [`crate::FrameSplitter`], which works on
//! raw chunks and never fails. This codec covers the other direction: it
//! turns one outbound line into `line\r\n` bytes.

use bytes::BytesMut;
use tokio_util::codec::Encoder;

use crate::error;
use crate::frame::DEFAULT_MAX_LINE_LEN;

/// Line-based encoder that appends `\r\n`.
///
/// Anything after the first line break (or NUL) is cut off so that a single
/// call can never smuggle a second command onto the wire.
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Maximum line length, excluding the terminator
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with [`DEFAULT_MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self { max_len }
    }

    /// Configured maximum line length.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Cut `line` at its first line break and check it against `max_len`.
    ///
    /// Shared by the byte-stream encoder and the WebSocket writer, which
    /// sends the same text without a terminator.
    pub fn sanitize(line: &str, max_len: usize) -> error::Result<&str> {
        let end = line.find(['\r', '\n', '\0']).unwrap_or(line.len());
        let line = &line[..end];

        if line.is_empty() {
            return Err(error::ProtocolError::EmptyLine);
        }
        if line.len() > max_len {
            return Err(error::ProtocolError::MessageTooLong {
                actual: line.len(),
                limit: max_len,
            });
        }
        Ok(line)
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        <Self as Encoder<&str>>::encode(self, msg.as_str(), dst)
    }
}

impl Encoder<&str> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: &str, dst: &mut BytesMut) -> error::Result<()> {
        let line = Self::sanitize(msg, self.max_len)?;
        dst.reserve(line.len() + 2);
        dst.extend_from_slice(line.as_bytes());
        dst.extend_from_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PONG :tmi.twitch.tv".to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :tmi.twitch.tv\r\n");
    }

    #[test]
    fn test_encode_does_not_double_terminate() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec.encode("PONG :test\r\n", &mut buf).unwrap();
        assert_eq!(&buf[..], b"PONG :test\r\n");
    }

    #[test]
    fn test_encode_truncates_at_first_newline() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode("PRIVMSG #a :hi\nPRIVMSG #b :injected", &mut buf)
            .unwrap();
        assert_eq!(&buf[..], b"PRIVMSG #a :hi\r\n");
    }

    #[test]
    fn test_encode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::new();

        let result = codec.encode("this is way too long", &mut buf);
        assert!(matches!(
            result,
            Err(error::ProtocolError::MessageTooLong {
                actual: 20,
                limit: 10
            })
        ));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_encode_empty_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        assert!(matches!(
            codec.encode("\r\n", &mut buf),
            Err(error::ProtocolError::EmptyLine)
        ));
    }

    #[test]
    fn test_sanitize_without_terminator() {
        assert_eq!(LineCodec::sanitize("JOIN #a\r\n", 512).unwrap(), "JOIN #a");
    }
}
