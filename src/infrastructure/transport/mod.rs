//! Message transport between charge point and central system
//!
//! An ordered, reliable, bidirectional text channel. The protocol engine
//! only talks to [`Transport`]; WebSocket and in-memory backends plug in
//! underneath.

pub mod memory;
pub mod websocket;

use async_trait::async_trait;

use crate::support::errors::TransportError;

pub use memory::MemoryTransport;
pub use websocket::{ClientTransport, WsTransport};

/// WebSocket close code for protocol errors.
pub const CLOSE_PROTOCOL_ERROR: u16 = 1002;

#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// Next text message. Fails with [`TransportError::ConnectionClosed`]
    /// once the peer has closed.
    async fn receive(&mut self) -> Result<String, TransportError>;

    async fn close(&mut self, code: u16, reason: &str) -> Result<(), TransportError>;
}
