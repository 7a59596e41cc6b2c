//! Charge point session - the client side of the protocol
//!
//! A [`ChargePoint`] drives the fixed boot → status → transaction
//! sequence over one connection while a background heartbeat loop shares
//! the same [`SerializedConnection`].

pub mod charge_point;
pub mod connection;
pub mod heartbeat;
pub mod state;

pub use charge_point::{ChargePoint, RunReport, DEFAULT_HEARTBEAT_INTERVAL};
pub use connection::SerializedConnection;
pub use heartbeat::heartbeat_loop;
pub use state::{SessionState, SessionStatus};
