use thiserror::Error;

use super::ocpp_frame::FrameKind;

/// Raw text could not be decoded into structured data.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("invalid JSON ({0})")]
    InvalidJson(String),

    #[error("unrecognised frame: expected [2,..], [3,..] or [4,..] array")]
    Unclassified,
}

impl From<serde_json::Error> for FrameError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidJson(e.to_string())
    }
}

/// Envelope shape violations.
///
/// The display strings are sent verbatim to the peer after `ERROR: `.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("frame must be a JSON list")]
    NotAList,

    #[error("CALL frame must have length 4")]
    WrongLength,

    #[error("MessageTypeId must be 2 (CALL)")]
    WrongMessageType,

    #[error("CALL uid must be a non-empty string")]
    EmptyUid,

    #[error("CALL action must be a non-empty string")]
    EmptyAction,

    #[error("CALL payload must be an object")]
    PayloadNotObject,

    #[error("CALLRESULT frame expected")]
    NotACallResult,

    #[error("CALLRESULT payload must be an object")]
    ResultPayloadNotObject,
}

/// Action payload violations, checked field by field in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    #[error("connectorId must be 0 or 1")]
    ConnectorId,

    #[error("status must be Available")]
    Status,

    #[error("errorCode must be NoError")]
    ErrorCode,

    #[error("idTag must be a non-empty string")]
    IdTag,

    #[error("meterStart must be an integer")]
    MeterStart,

    #[error("meterStop must be an integer")]
    MeterStop,

    #[error("transactionId must be an integer")]
    TransactionId,

    #[error("timestamp must be a string")]
    Timestamp,
}

/// Why a supported CALL closes the connection instead of getting a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Payload(#[from] PayloadError),

    #[error("transaction ids exhausted")]
    TransactionIdsExhausted,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection refused: {0}")]
    ConnectionRefused(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("websocket error: {0}")]
    WebSocket(String),
}

/// Failures of a charge point run. Every variant aborts the run.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Decode(#[from] FrameError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{action}: expected CALLRESULT, got {kind:?}")]
    UnexpectedFrame { action: &'static str, kind: FrameKind },

    #[error("{action}: response uid {received} does not match request uid {expected}")]
    CorrelationMismatch {
        action: &'static str,
        expected: String,
        received: String,
    },

    #[error("{action} not accepted: {status}")]
    Rejected { action: &'static str, status: String },

    #[error("StartTransaction: missing transactionId")]
    MissingTransactionId,

    #[error("heartbeat task failed: {0}")]
    HeartbeatTask(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}
