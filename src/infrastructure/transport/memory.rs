//! In-process transport backed by channels

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::Transport;
use crate::support::errors::TransportError;

#[derive(Debug)]
enum Envelope {
    Text(String),
    Close { code: u16, reason: String },
}

/// One end of an in-memory connection; see [`MemoryTransport::pair`].
#[derive(Debug)]
pub struct MemoryTransport {
    tx: mpsc::UnboundedSender<Envelope>,
    rx: mpsc::UnboundedReceiver<Envelope>,
    closed: bool,
    peer_close: Option<(u16, String)>,
}

impl MemoryTransport {
    /// Two connected ends. Dropping one end closes the connection for the other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, a_rx), Self::new(b_tx, b_rx))
    }

    fn new(tx: mpsc::UnboundedSender<Envelope>, rx: mpsc::UnboundedReceiver<Envelope>) -> Self {
        Self {
            tx,
            rx,
            closed: false,
            peer_close: None,
        }
    }

    /// Close code and reason sent by the peer, once received.
    pub fn peer_close(&self) -> Option<(u16, &str)> {
        self.peer_close
            .as_ref()
            .map(|(code, reason)| (*code, reason.as_str()))
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        self.tx
            .send(Envelope::Text(text))
            .map_err(|_| TransportError::ConnectionClosed)
    }

    async fn receive(&mut self) -> Result<String, TransportError> {
        if self.closed {
            return Err(TransportError::ConnectionClosed);
        }
        match self.rx.recv().await {
            Some(Envelope::Text(text)) => Ok(text),
            Some(Envelope::Close { code, reason }) => {
                self.closed = true;
                self.peer_close = Some((code, reason));
                Err(TransportError::ConnectionClosed)
            }
            None => {
                self.closed = true;
                Err(TransportError::ConnectionClosed)
            }
        }
    }

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError> {
        if !self.closed {
            self.closed = true;
            let _ = self.tx.send(Envelope::Close {
                code,
                reason: reason.to_string(),
            });
        }
        Ok(())
    }
}
