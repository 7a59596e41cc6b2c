//! OCPP 1.6 protocol types
//!
//! Action names and the typed payload records exchanged for them.

pub mod action;
pub mod messages;

pub use action::Action;

/// WebSocket subprotocol negotiated for OCPP 1.6-J.
pub const OCPP16_SUBPROTOCOL: &str = "ocpp1.6";
