//! OCPP central-system server

mod connection;
mod websocket;

pub use connection::serve_connection;
pub use websocket::{extract_charge_point_id, OcppServer};
