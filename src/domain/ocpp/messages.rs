//! OCPP 1.6 payload records
//!
//! Enumerations and the fixed-width records come from `rust_ocpp`. The
//! transaction requests and the StartTransaction response are our own:
//! meter values and transaction IDs are 64-bit and request timestamps are
//! kept as the opaque strings the charge point sent.
//!
//! Inbound payloads are read by [`FromPayload`], which checks required
//! fields in declaration order and reports the first violation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use rust_ocpp::v1_6::messages::boot_notification::{
    BootNotificationRequest, BootNotificationResponse,
};
pub use rust_ocpp::v1_6::messages::heart_beat::HeartbeatResponse;
pub use rust_ocpp::v1_6::messages::status_notification::{
    StatusNotificationRequest, StatusNotificationResponse,
};
pub use rust_ocpp::v1_6::messages::stop_transaction::StopTransactionResponse;
pub use rust_ocpp::v1_6::types::{
    AuthorizationStatus, ChargePointErrorCode, ChargePointStatus, IdTagInfo, RegistrationStatus,
};

use crate::support::errors::PayloadError;

pub type Payload = Map<String, Value>;

/// Serialize a record into a payload object. Absent optional fields are
/// left out rather than sent as `null`.
pub fn to_payload<T: Serialize>(message: &T) -> Payload {
    match serde_json::to_value(message) {
        Ok(Value::Object(map)) => without_nulls(map),
        _ => Payload::new(),
    }
}

fn without_nulls(map: Payload) -> Payload {
    map.into_iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(key, value)| match value {
            Value::Object(inner) => (key, Value::Object(without_nulls(inner))),
            other => (key, other),
        })
        .collect()
}

pub fn accepted_id_tag() -> IdTagInfo {
    IdTagInfo {
        expiry_date: None,
        parent_id_tag: None,
        status: AuthorizationStatus::Accepted,
    }
}

/// Typed view of an inbound CALL payload.
pub trait FromPayload: Sized {
    fn from_payload(payload: &Payload) -> Result<Self, PayloadError>;
}

// ── Field readers ──────────────────────────────────────────────

fn connector_id(payload: &Payload) -> Result<u32, PayloadError> {
    match payload.get("connectorId").and_then(Value::as_u64) {
        Some(id @ (0 | 1)) => Ok(id as u32),
        _ => Err(PayloadError::ConnectorId),
    }
}

fn integer(payload: &Payload, key: &str, err: PayloadError) -> Result<i64, PayloadError> {
    payload.get(key).and_then(Value::as_i64).ok_or(err)
}

fn non_empty_string(payload: &Payload, key: &str, err: PayloadError) -> Result<String, PayloadError> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(err)
}

fn optional_string(payload: &Payload, key: &str) -> Option<String> {
    payload.get(key).and_then(Value::as_str).map(str::to_string)
}

fn optional_instant(payload: &Payload, key: &str) -> Option<DateTime<Utc>> {
    payload
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}

fn enum_field<T: for<'de> Deserialize<'de>>(payload: &Payload, key: &str) -> Option<T> {
    payload
        .get(key)
        .and_then(|v| serde_json::from_value(v.clone()).ok())
}

// ── BootNotification ───────────────────────────────────────────

/// Nothing beyond object-ness is enforced; unknown or mistyped fields
/// read as absent.
impl FromPayload for BootNotificationRequest {
    fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        Ok(Self {
            charge_box_serial_number: optional_string(payload, "chargeBoxSerialNumber"),
            charge_point_model: optional_string(payload, "chargePointModel").unwrap_or_default(),
            charge_point_serial_number: optional_string(payload, "chargePointSerialNumber"),
            charge_point_vendor: optional_string(payload, "chargePointVendor").unwrap_or_default(),
            firmware_version: optional_string(payload, "firmwareVersion"),
            iccid: optional_string(payload, "iccid"),
            imsi: optional_string(payload, "imsi"),
            meter_serial_number: optional_string(payload, "meterSerialNumber"),
            meter_type: optional_string(payload, "meterType"),
        })
    }
}

// ── StatusNotification ─────────────────────────────────────────

/// Only `Available` / `NoError` notifications are accepted. A timestamp
/// that is not RFC 3339 reads as absent.
impl FromPayload for StatusNotificationRequest {
    fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        let connector_id = connector_id(payload)?;
        let status = match enum_field(payload, "status") {
            Some(ChargePointStatus::Available) => ChargePointStatus::Available,
            _ => return Err(PayloadError::Status),
        };
        let error_code = match enum_field(payload, "errorCode") {
            Some(ChargePointErrorCode::NoError) => ChargePointErrorCode::NoError,
            _ => return Err(PayloadError::ErrorCode),
        };
        Ok(Self {
            connector_id,
            error_code,
            info: optional_string(payload, "info"),
            status,
            timestamp: optional_instant(payload, "timestamp"),
            vendor_id: optional_string(payload, "vendorId"),
            vendor_error_code: optional_string(payload, "vendorErrorCode"),
        })
    }
}

// ── StartTransaction ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionRequest {
    pub connector_id: u32,
    pub id_tag: String,
    pub meter_start: i64,
    pub timestamp: String,
}

impl FromPayload for StartTransactionRequest {
    fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        Ok(Self {
            connector_id: connector_id(payload)?,
            id_tag: non_empty_string(payload, "idTag", PayloadError::IdTag)?,
            meter_start: integer(payload, "meterStart", PayloadError::MeterStart)?,
            timestamp: non_empty_string(payload, "timestamp", PayloadError::Timestamp)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTransactionResponse {
    pub transaction_id: i64,
    pub id_tag_info: IdTagInfo,
}

// ── StopTransaction ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StopTransactionRequest {
    pub transaction_id: i64,
    pub meter_stop: i64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl FromPayload for StopTransactionRequest {
    fn from_payload(payload: &Payload) -> Result<Self, PayloadError> {
        Ok(Self {
            transaction_id: integer(payload, "transactionId", PayloadError::TransactionId)?,
            meter_stop: integer(payload, "meterStop", PayloadError::MeterStop)?,
            timestamp: non_empty_string(payload, "timestamp", PayloadError::Timestamp)?,
            id_tag: optional_string(payload, "idTag"),
            reason: optional_string(payload, "reason"),
        })
    }
}
