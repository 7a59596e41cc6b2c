//! OCPP 1.6 action handlers
//!
//! One decision function per supported action. Each returns the
//! CALLRESULT payload or the error that closes the connection.

mod handle_boot_notification;
mod handle_heartbeat;
mod handle_start_transaction;
mod handle_status_notification;
mod handle_stop_transaction;

use serde_json::Value;

use crate::domain::ocpp::messages::Payload;
use crate::domain::Action;
use crate::support::errors::HandlerError;

use super::OcppHandler;

pub use handle_boot_notification::handle_boot_notification;
pub use handle_heartbeat::handle_heartbeat;
pub use handle_start_transaction::handle_start_transaction;
pub use handle_status_notification::handle_status_notification;
pub use handle_stop_transaction::handle_stop_transaction;

pub fn action_matcher(
    handler: &OcppHandler,
    action: Action,
    payload: &Payload,
) -> Result<Value, HandlerError> {
    match action {
        Action::BootNotification => handle_boot_notification(handler, payload),
        Action::Heartbeat => Ok(handle_heartbeat(handler, payload)),
        Action::StatusNotification => handle_status_notification(handler, payload),
        Action::StartTransaction => handle_start_transaction(handler, payload),
        Action::StopTransaction => handle_stop_transaction(handler, payload),
    }
}
