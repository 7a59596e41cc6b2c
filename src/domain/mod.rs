//! Domain layer: OCPP 1.6 payload records and the transaction entity.

pub mod ocpp;
pub mod transaction;

pub use ocpp::{Action, OCPP16_SUBPROTOCOL};
pub use transaction::Transaction;
