//! Envelope validation for decoded OCPP-J frames.

use serde_json::{Map, Value};

use super::errors::ValidationError;
use super::ocpp_frame::{MSG_TYPE_CALL, MSG_TYPE_CALL_RESULT};

/// A CALL whose envelope passed every shape check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCall {
    pub unique_id: String,
    pub action: String,
    pub payload: Map<String, Value>,
}

/// Validate a CALL envelope, stopping at the first violation.
pub fn validate_call(value: &Value) -> Result<ValidatedCall, ValidationError> {
    let arr = value.as_array().ok_or(ValidationError::NotAList)?;
    let [message_type, unique_id, action, payload] = arr.as_slice() else {
        return Err(ValidationError::WrongLength);
    };

    if message_type.as_u64() != Some(MSG_TYPE_CALL) {
        return Err(ValidationError::WrongMessageType);
    }
    let unique_id = non_empty_str(unique_id).ok_or(ValidationError::EmptyUid)?;
    let action = non_empty_str(action).ok_or(ValidationError::EmptyAction)?;
    let payload = payload
        .as_object()
        .ok_or(ValidationError::PayloadNotObject)?;

    Ok(ValidatedCall {
        unique_id: unique_id.to_string(),
        action: action.to_string(),
        payload: payload.clone(),
    })
}

/// Extract the payload object of a CALLRESULT.
pub fn extract_result_payload(value: &Value) -> Result<&Map<String, Value>, ValidationError> {
    let arr = value
        .as_array()
        .filter(|arr| arr.len() >= 3 && arr[0].as_u64() == Some(MSG_TYPE_CALL_RESULT))
        .ok_or(ValidationError::NotACallResult)?;
    arr[2]
        .as_object()
        .ok_or(ValidationError::ResultPayloadNotObject)
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}
