//! BootNotification handler

use serde_json::Value;
use tracing::info;

use crate::application::handlers::OcppHandler;
use crate::domain::ocpp::messages::{
    to_payload, BootNotificationRequest, BootNotificationResponse, FromPayload, Payload,
    RegistrationStatus,
};
use crate::support::errors::HandlerError;
use crate::support::time::utc_now_seconds;

/// Always accepted in this profile.
pub fn handle_boot_notification(
    handler: &OcppHandler,
    payload: &Payload,
) -> Result<Value, HandlerError> {
    let req = BootNotificationRequest::from_payload(payload)?;

    info!(
        charge_point_id = handler.charge_point_id.as_str(),
        vendor = req.charge_point_vendor.as_str(),
        model = req.charge_point_model.as_str(),
        firmware = req.firmware_version.as_deref().unwrap_or("-"),
        "BootNotification"
    );

    let response = BootNotificationResponse {
        current_time: utc_now_seconds(),
        interval: i32::try_from(handler.heartbeat_interval).unwrap_or(i32::MAX) as u32,
        status: RegistrationStatus::Accepted,
    };
    Ok(Value::Object(to_payload(&response)))
}
