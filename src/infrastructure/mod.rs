//! Infrastructure layer - network transports and the central-system server

pub mod server;
pub mod transport;

pub use server::{extract_charge_point_id, serve_connection, OcppServer};
pub use transport::{ClientTransport, MemoryTransport, Transport, WsTransport};
