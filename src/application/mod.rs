//! Application layer: message handling and the transaction registry.

pub mod handlers;
pub mod registry;

pub use handlers::{HandlerOutcome, OcppHandler};
pub use registry::{SharedTransactionRegistry, TransactionRegistry};
