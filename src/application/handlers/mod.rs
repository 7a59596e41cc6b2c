//! Central-system message handling
//!
//! Turns one raw inbound text into either a reply frame or an error-close.

pub mod ocpp_v16;

use tracing::{info, warn};

use crate::application::registry::SharedTransactionRegistry;
use crate::domain::Action;
use crate::support::ocpp_frame::{encode_result, parse_message, OcppFrame};
use crate::support::validations::validate_call;

pub use ocpp_v16::action_matcher;

/// Error code for actions outside the dispatch table.
pub const NOT_SUPPORTED: &str = "NotSupported";

const NOT_SUPPORTED_DESCRIPTION: &str = "Only BootNotification, Heartbeat, StatusNotification, \
     StartTransaction, and StopTransaction are supported";

/// What the connection loop must do with a handled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Send this frame and keep reading.
    Reply(String),
    /// Send this text, then close the connection with a protocol error.
    Close(String),
}

/// Handler for the messages of one charge point connection
pub struct OcppHandler {
    pub charge_point_id: String,
    pub registry: SharedTransactionRegistry,
    /// Heartbeat interval advertised in BootNotification responses (seconds)
    pub heartbeat_interval: u32,
}

impl OcppHandler {
    pub fn new(
        charge_point_id: impl Into<String>,
        registry: SharedTransactionRegistry,
        heartbeat_interval: u32,
    ) -> Self {
        Self {
            charge_point_id: charge_point_id.into(),
            registry,
            heartbeat_interval,
        }
    }

    pub fn handle(&self, text: &str) -> HandlerOutcome {
        let value = match parse_message(text) {
            Ok(v) => v,
            Err(e) => return self.reject(e),
        };

        let call = match validate_call(&value) {
            Ok(call) => call,
            Err(e) => return self.reject(e),
        };

        info!(
            charge_point_id = self.charge_point_id.as_str(),
            action = call.action.as_str(),
            unique_id = call.unique_id.as_str(),
            "Parsed CALL"
        );

        let Some(action) = Action::from_name(&call.action) else {
            warn!(
                charge_point_id = self.charge_point_id.as_str(),
                action = call.action.as_str(),
                "Unsupported action"
            );
            metrics::counter!("ocpp_unsupported_actions_total").increment(1);
            let error = OcppFrame::error_response(
                &call.unique_id,
                NOT_SUPPORTED,
                NOT_SUPPORTED_DESCRIPTION,
            );
            return HandlerOutcome::Reply(error.serialize());
        };

        metrics::counter!("ocpp_messages_received_total", "action" => action.as_str()).increment(1);

        match action_matcher(self, action, &call.payload) {
            Ok(payload) => HandlerOutcome::Reply(encode_result(&call.unique_id, payload)),
            Err(e) => self.reject(e),
        }
    }

    fn reject(&self, reason: impl std::fmt::Display) -> HandlerOutcome {
        let text = format!("ERROR: {reason}");
        warn!(
            charge_point_id = self.charge_point_id.as_str(),
            reason = text.as_str(),
            "Protocol violation, closing connection"
        );
        metrics::counter!("ocpp_protocol_errors_total").increment(1);
        HandlerOutcome::Close(text)
    }
}

// ── Tests ──────────────────────────────────────────────────────
