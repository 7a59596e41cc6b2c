//! Heartbeat handler

use serde_json::Value;
use tracing::debug;

use crate::application::handlers::OcppHandler;
use crate::domain::ocpp::messages::{to_payload, HeartbeatResponse, Payload};
use crate::support::time::utc_now_seconds;

pub fn handle_heartbeat(handler: &OcppHandler, _payload: &Payload) -> Value {
    debug!(charge_point_id = handler.charge_point_id.as_str(), "Heartbeat");

    Value::Object(to_payload(&HeartbeatResponse {
        current_time: utc_now_seconds(),
    }))
}
