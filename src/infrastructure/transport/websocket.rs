//! WebSocket transport over tokio-tungstenite

use std::io::ErrorKind;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use super::Transport;
use crate::support::errors::TransportError;

/// Close reasons must fit a control frame together with the 2-byte code.
const MAX_CLOSE_REASON: usize = 123;

pub struct WsTransport<S> {
    stream: WebSocketStream<S>,
}

/// Transport of an outbound (charge point) connection
pub type ClientTransport = WsTransport<MaybeTlsStream<TcpStream>>;

impl<S> WsTransport<S> {
    pub fn new(stream: WebSocketStream<S>) -> Self {
        Self { stream }
    }
}

impl ClientTransport {
    /// Connect to `url`. `Sec-WebSocket-Protocol` is sent only when a
    /// subprotocol is given, since the handshake then fails unless the
    /// server echoes it.
    pub async fn connect(url: &str, subprotocol: Option<&str>) -> Result<Self, TransportError> {
        let mut request = url.into_client_request().map_err(ws_error)?;
        if let Some(protocol) = subprotocol {
            let value = HeaderValue::from_str(protocol)
                .map_err(|e| TransportError::WebSocket(format!("invalid subprotocol: {e}")))?;
            request.headers_mut().insert("Sec-WebSocket-Protocol", value);
        }

        let (stream, response) = connect_async(request).await.map_err(connect_error)?;
        debug!(url, status = %response.status(), "WebSocket connected");
        Ok(Self::new(stream))
    }
}

#[async_trait]
impl<S> Transport for WsTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream.send(Message::Text(text)).await.map_err(ws_error)
    }

    async fn receive(&mut self) -> Result<String, TransportError> {
        while let Some(msg) = self.stream.next().await {
            match msg.map_err(ws_error)? {
                Message::Text(text) => return Ok(text),
                Message::Close(frame) => {
                    debug!(?frame, "Close frame received");
                    return Err(TransportError::ConnectionClosed);
                }
                Message::Binary(data) => {
                    debug!(bytes = data.len(), "Binary message received, decoding as text");
                    return Ok(String::from_utf8_lossy(&data).into_owned());
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Err(TransportError::ConnectionClosed)
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        let frame = CloseFrame {
            code: CloseCode::from(code),
            reason: truncate_reason(reason).to_owned().into(),
        };
        match self.stream.close(Some(frame)).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(ws_error(e)),
        }
    }
}

fn truncate_reason(reason: &str) -> &str {
    if reason.len() <= MAX_CLOSE_REASON {
        return reason;
    }
    let mut end = MAX_CLOSE_REASON;
    while !reason.is_char_boundary(end) {
        end -= 1;
    }
    &reason[..end]
}

fn connect_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::Io(io) if io.kind() == ErrorKind::ConnectionRefused => {
            TransportError::ConnectionRefused(io.to_string())
        }
        other => ws_error(other),
    }
}

fn ws_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
            TransportError::ConnectionClosed
        }
        other => TransportError::WebSocket(other.to_string()),
    }
}
