//! # OCPP 1.6 minimal profile
//!
//! A central system and a charge-point client speaking the OCPP-J 1.6
//! subset BootNotification, Heartbeat, StatusNotification,
//! StartTransaction and StopTransaction.
//!
//! ## Architecture
//!
//! - **support**: frame codec, envelope validation, ids, time, errors, shutdown
//! - **domain**: action names, typed payload records, the transaction entity
//! - **application**: transaction registry and per-action handlers
//! - **infrastructure**: transports (WebSocket, in-memory) and the WebSocket server
//! - **session**: charge point run, heartbeat loop, serialized connection
//! - **config**: TOML configuration
//! - **server**: server runtime handle, tracing and metrics setup

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod server;
pub mod session;
pub mod support;

pub use application::{OcppHandler, SharedTransactionRegistry, TransactionRegistry};
pub use config::{default_config_path, AppConfig};
pub use infrastructure::{MemoryTransport, OcppServer, Transport};
pub use session::{ChargePoint, RunReport};
