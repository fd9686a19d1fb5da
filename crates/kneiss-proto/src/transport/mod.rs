//! Chat transports for async I/O.
//!
//! A [`Transport`] is one duplex connection to a chat server over TCP, TLS,
//! or WebSocket. It carries raw bytes, not messages: the reader hands out
//! chunks exactly as they arrive and leaves framing to
//! [`crate::FrameSplitter`], and the writer takes one line at a time.
//!
//! ```ignore
//! use kneiss_proto::{Endpoint, FrameSplitter, Transport};
//!
//! let endpoint = Endpoint::parse(kneiss_proto::TWITCH_WEBSOCKET)?;
//! let (mut reader, mut writer) = Transport::connect(&endpoint).await?.split();
//! writer.write_line("NICK justinfan123").await?;
//!
//! let mut splitter = FrameSplitter::new();
//! while let Some(chunk) = reader.read_chunk().await? {
//!     for line in splitter.split(&chunk) {
//!         println!("{}", kneiss_proto::parse(&line));
//!     }
//! }
//! ```

mod endpoint;
mod error;
mod stream;
mod websocket;

use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, ReadHalf, WriteHalf};
use tokio_util::codec::FramedWrite;

use crate::frame::DEFAULT_MAX_LINE_LEN;
use crate::line::LineCodec;

pub use self::endpoint::{Endpoint, Scheme, TWITCH_WEBSOCKET};
pub use self::error::{CloseError, ConnectionError, ReadError, WriteError};
pub use self::stream::{AsyncStream, BoxedStream};

use self::websocket::{WsSink, WsSource, WsStream};

/// Bytes requested from the socket per read.
const READ_CHUNK: usize = 4096;

/// A duplex connection to a chat server.
#[non_exhaustive]
pub enum Transport {
    /// Line-oriented byte stream (TCP or TLS).
    Stream(BoxedStream),
    /// WebSocket, one text frame per outbound line.
    WebSocket(Box<WsStream>),
}

impl Transport {
    /// Connect to an endpoint, running the TLS and WebSocket handshakes its
    /// scheme requires.
    pub async fn connect(endpoint: &Endpoint) -> Result<Self, ConnectionError> {
        let stream = stream::open(endpoint).await?;
        if endpoint.scheme().is_websocket() {
            let ws = websocket::handshake(endpoint.url().as_str(), stream).await?;
            Ok(Self::WebSocket(Box::new(ws)))
        } else {
            Ok(Self::Stream(stream))
        }
    }

    /// Wrap an already connected byte stream.
    pub fn stream<S: AsyncStream + 'static>(stream: S) -> Self {
        Self::Stream(Box::new(stream))
    }

    /// Run a WebSocket client handshake over an already connected stream.
    pub async fn websocket<S: AsyncStream + 'static>(
        url: &str,
        stream: S,
    ) -> Result<Self, ConnectionError> {
        let ws = websocket::handshake(url, Box::new(stream)).await?;
        Ok(Self::WebSocket(Box::new(ws)))
    }

    /// Check if this transport uses WebSocket framing.
    pub fn is_websocket(&self) -> bool {
        matches!(self, Self::WebSocket(_))
    }

    /// Split into halves that can be driven from separate tasks.
    pub fn split(self) -> (TransportReader, TransportWriter) {
        match self {
            Self::Stream(stream) => {
                let (read, write) = tokio::io::split(stream);
                (
                    TransportReader {
                        inner: ReadInner::Stream {
                            half: read,
                            buf: BytesMut::with_capacity(READ_CHUNK),
                        },
                    },
                    TransportWriter {
                        inner: WriteInner::Stream(FramedWrite::new(write, LineCodec::new())),
                    },
                )
            }
            Self::WebSocket(ws) => {
                let (sink, source) = (*ws).split();
                (
                    TransportReader {
                        inner: ReadInner::WebSocket(source),
                    },
                    TransportWriter {
                        inner: WriteInner::WebSocket {
                            sink,
                            max_len: DEFAULT_MAX_LINE_LEN,
                        },
                    },
                )
            }
        }
    }
}

/// Read half of a [`Transport`].
pub struct TransportReader {
    inner: ReadInner,
}

enum ReadInner {
    Stream {
        half: ReadHalf<BoxedStream>,
        buf: BytesMut,
    },
    WebSocket(WsSource),
}

impl TransportReader {
    /// Read whatever the peer has sent since the last call.
    ///
    /// Returns exactly the bytes received, which may end mid-line. `Ok(None)`
    /// means the peer closed the connection. Cancel safe.
    pub async fn read_chunk(&mut self) -> Result<Option<Bytes>, ReadError> {
        match &mut self.inner {
            ReadInner::Stream { half, buf } => {
                buf.reserve(READ_CHUNK);
                let n = half.read_buf(buf).await?;
                if n == 0 {
                    return Ok(None);
                }
                Ok(Some(buf.split().freeze()))
            }
            ReadInner::WebSocket(source) => websocket::read_frame(source).await,
        }
    }
}

/// Write half of a [`Transport`].
pub struct TransportWriter {
    inner: WriteInner,
}

enum WriteInner {
    Stream(FramedWrite<WriteHalf<BoxedStream>, LineCodec>),
    WebSocket { sink: WsSink, max_len: usize },
}

impl TransportWriter {
    /// Change the outbound line length bound.
    pub fn set_max_line_len(&mut self, len: usize) {
        match &mut self.inner {
            WriteInner::Stream(framed) => *framed.encoder_mut() = LineCodec::with_max_len(len),
            WriteInner::WebSocket { max_len, .. } => *max_len = len,
        }
    }

    /// Write one line and flush it.
    ///
    /// Anything after the first line break is dropped. Byte streams get a
    /// `\r\n` terminator; WebSocket frames are sent without one.
    pub async fn write_line(&mut self, line: &str) -> Result<(), WriteError> {
        match &mut self.inner {
            WriteInner::Stream(framed) => framed.send(line).await?,
            WriteInner::WebSocket { sink, max_len } => {
                websocket::write_line(sink, line, *max_len).await?
            }
        }
        Ok(())
    }

    /// Flush and shut down the write side.
    pub async fn close(&mut self) -> Result<(), CloseError> {
        match &mut self.inner {
            WriteInner::Stream(framed) => SinkExt::<&str>::close(framed).await?,
            WriteInner::WebSocket { sink, .. } => sink.close().await?,
        }
        Ok(())
    }
}
