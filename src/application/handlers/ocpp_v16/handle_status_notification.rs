//! StatusNotification handler

use serde_json::Value;
use tracing::info;

use crate::application::handlers::OcppHandler;
use crate::domain::ocpp::messages::{
    to_payload, FromPayload, Payload, StatusNotificationRequest, StatusNotificationResponse,
};
use crate::support::errors::HandlerError;

pub fn handle_status_notification(
    handler: &OcppHandler,
    payload: &Payload,
) -> Result<Value, HandlerError> {
    let req = StatusNotificationRequest::from_payload(payload)?;

    info!(
        charge_point_id = handler.charge_point_id.as_str(),
        connector_id = req.connector_id,
        status = ?req.status,
        "StatusNotification"
    );

    Ok(Value::Object(to_payload(&StatusNotificationResponse {})))
}
