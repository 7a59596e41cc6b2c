//! OCPP-J message framing
//!
//! The three envelope shapes carried over the WebSocket:
//!
//! - **Call**       `[2, "<uniqueId>", "<action>", {<payload>}]`
//! - **CallResult** `[3, "<uniqueId>", {<payload>}]`
//! - **CallError**  `[4, "<uniqueId>", "<errorCode>", "<errorDescription>", {<errorDetails>}]`
//!
//! Decoding here only assigns the variant. Shape checks live in
//! [`crate::support::validations`].

use serde_json::{Map, Value};

use super::errors::FrameError;

// ── Message-type constants ─────────────────────────────────────

pub const MSG_TYPE_CALL: u64 = 2;
pub const MSG_TYPE_CALL_RESULT: u64 = 3;
pub const MSG_TYPE_CALL_ERROR: u64 = 4;

// ── Classification ─────────────────────────────────────────────

/// Frame kind as seen from the leading discriminant and array length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Call,
    CallResult,
    CallError,
    Unknown,
}

/// Classify a decoded value without failing.
///
/// Call needs exactly 4 elements, CallResult at least 3, CallError at least 5.
pub fn classify(value: &Value) -> FrameKind {
    let Some(arr) = value.as_array() else {
        return FrameKind::Unknown;
    };
    match (arr.first().and_then(Value::as_u64), arr.len()) {
        (Some(MSG_TYPE_CALL), 4) => FrameKind::Call,
        (Some(MSG_TYPE_CALL_RESULT), n) if n >= 3 => FrameKind::CallResult,
        (Some(MSG_TYPE_CALL_ERROR), n) if n >= 5 => FrameKind::CallError,
        _ => FrameKind::Unknown,
    }
}

/// Decode raw text into structured data.
pub fn parse_message(text: &str) -> Result<Value, FrameError> {
    Ok(serde_json::from_str(text)?)
}

// ── OcppFrame ──────────────────────────────────────────────────

/// A decoded OCPP-J frame.
#[derive(Debug, Clone, PartialEq)]
pub enum OcppFrame {
    /// `[2, uniqueId, action, payload]`
    Call {
        unique_id: String,
        action: String,
        payload: Value,
    },
    /// `[3, uniqueId, payload]`
    CallResult { unique_id: String, payload: Value },
    /// `[4, uniqueId, errorCode, errorDescription, errorDetails]`
    CallError {
        unique_id: String,
        error_code: String,
        error_description: String,
        error_details: Value,
    },
}

impl OcppFrame {
    // ── Parsing ────────────────────────────────────────────

    /// Parse raw text into a frame.
    pub fn decode(text: &str) -> Result<Self, FrameError> {
        Self::from_value(&parse_message(text)?)
    }

    /// Assign a variant to an already decoded value.
    ///
    /// Non-string ids and names decode as empty strings; the validator
    /// rejects them later.
    pub fn from_value(value: &Value) -> Result<Self, FrameError> {
        let kind = classify(value);
        let arr = match value.as_array() {
            Some(arr) if kind != FrameKind::Unknown => arr,
            _ => return Err(FrameError::Unclassified),
        };
        let text_at = |i: usize| arr[i].as_str().unwrap_or_default().to_string();

        Ok(match kind {
            FrameKind::Call => Self::Call {
                unique_id: text_at(1),
                action: text_at(2),
                payload: arr[3].clone(),
            },
            FrameKind::CallResult => Self::CallResult {
                unique_id: text_at(1),
                payload: arr[2].clone(),
            },
            FrameKind::CallError => Self::CallError {
                unique_id: text_at(1),
                error_code: text_at(2),
                error_description: text_at(3),
                error_details: arr[4].clone(),
            },
            FrameKind::Unknown => return Err(FrameError::Unclassified),
        })
    }

    // ── Serialization ──────────────────────────────────────

    pub fn to_value(&self) -> Value {
        match self {
            Self::Call {
                unique_id,
                action,
                payload,
            } => Value::Array(vec![
                MSG_TYPE_CALL.into(),
                unique_id.as_str().into(),
                action.as_str().into(),
                payload.clone(),
            ]),
            Self::CallResult { unique_id, payload } => Value::Array(vec![
                MSG_TYPE_CALL_RESULT.into(),
                unique_id.as_str().into(),
                payload.clone(),
            ]),
            Self::CallError {
                unique_id,
                error_code,
                error_description,
                error_details,
            } => Value::Array(vec![
                MSG_TYPE_CALL_ERROR.into(),
                unique_id.as_str().into(),
                error_code.as_str().into(),
                error_description.as_str().into(),
                error_details.clone(),
            ]),
        }
    }

    /// Serialize this frame to its wire text.
    pub fn serialize(&self) -> String {
        self.to_value().to_string()
    }

    // ── Helpers ────────────────────────────────────────────

    pub fn unique_id(&self) -> &str {
        match self {
            Self::Call { unique_id, .. }
            | Self::CallResult { unique_id, .. }
            | Self::CallError { unique_id, .. } => unique_id,
        }
    }

    /// Create a `CallError` with empty details.
    pub fn error_response(
        unique_id: impl Into<String>,
        error_code: impl Into<String>,
        error_description: impl Into<String>,
    ) -> Self {
        Self::CallError {
            unique_id: unique_id.into(),
            error_code: error_code.into(),
            error_description: error_description.into(),
            error_details: Value::Object(Map::new()),
        }
    }

    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Call { .. } => FrameKind::Call,
            Self::CallResult { .. } => FrameKind::CallResult,
            Self::CallError { .. } => FrameKind::CallError,
        }
    }
}

// ── Encoders ───────────────────────────────────────────────────

pub fn encode_call(unique_id: &str, action: &str, payload: Map<String, Value>) -> String {
    OcppFrame::Call {
        unique_id: unique_id.to_string(),
        action: action.to_string(),
        payload: Value::Object(payload),
    }
    .serialize()
}

pub fn encode_result(unique_id: &str, payload: Value) -> String {
    OcppFrame::CallResult {
        unique_id: unique_id.to_string(),
        payload,
    }
    .serialize()
}

pub fn encode_error(unique_id: &str, code: &str, description: &str, details: Value) -> String {
    OcppFrame::CallError {
        unique_id: unique_id.to_string(),
        error_code: code.to_string(),
        error_description: description.to_string(),
        error_details: details,
    }
    .serialize()
}
