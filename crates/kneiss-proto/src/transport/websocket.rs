//! WebSocket framing for chat lines.
//!
//! Each text frame carries one or more lines; the frame payload is handed to
//! the reader as a chunk so the usual [`crate::FrameSplitter`] applies.

use bytes::Bytes;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;
use tracing::trace;

use crate::line::LineCodec;

use super::error::{ConnectionError, ReadError, WriteError};
use super::stream::BoxedStream;

pub(crate) type WsStream = WebSocketStream<BoxedStream>;
pub(crate) type WsSink = SplitSink<WsStream, WsMessage>;
pub(crate) type WsSource = SplitStream<WsStream>;

/// Run the client upgrade over an established byte stream.
pub(crate) async fn handshake(url: &str, stream: BoxedStream) -> Result<WsStream, ConnectionError> {
    let (ws, response) = tokio_tungstenite::client_async(url, stream)
        .await
        .map_err(|e| ConnectionError::WebSocket(Box::new(e)))?;
    trace!(status = %response.status(), "websocket upgraded");
    Ok(ws)
}

/// Next data frame as a chunk, or `None` once the peer closed.
pub(crate) async fn read_frame(source: &mut WsSource) -> Result<Option<Bytes>, ReadError> {
    loop {
        match source.next().await {
            Some(Ok(WsMessage::Text(text))) => return Ok(Some(Bytes::from(text))),
            Some(Ok(WsMessage::Binary(data))) => return Ok(Some(Bytes::from(data))),
            Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_))) => continue,
            Some(Ok(WsMessage::Close(_))) | None => return Ok(None),
            Some(Err(e)) => return Err(e.into()),
        }
    }
}

/// Send one line as a text frame, without a terminator.
pub(crate) async fn write_line(sink: &mut WsSink, line: &str, max_len: usize) -> Result<(), WriteError> {
    let line = LineCodec::sanitize(line, max_len)?;
    sink.send(WsMessage::Text(line.to_owned())).await?;
    Ok(())
}
