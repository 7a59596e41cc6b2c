//! Request/response exchange over a shared connection

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::ocpp::messages::Payload;
use crate::domain::Action;
use crate::infrastructure::transport::Transport;
use crate::support::errors::{SessionError, TransportError, ValidationError};
use crate::support::id::new_uid;
use crate::support::ocpp_frame::{encode_call, OcppFrame};

/// A connection on which at most one CALL is outstanding at a time.
///
/// Clones share the underlying transport. Every [`call`](Self::call) holds
/// the lock across its send and the matching receive, so a response can
/// only ever belong to the request that was just sent.
#[derive(Clone)]
pub struct SerializedConnection {
    transport: Arc<Mutex<Box<dyn Transport>>>,
}

impl SerializedConnection {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
        }
    }

    /// Send one CALL and return the payload of its CALLRESULT.
    pub async fn call(&self, action: Action, payload: Payload) -> Result<Payload, SessionError> {
        let unique_id = new_uid();
        let request = encode_call(&unique_id, action.as_str(), payload);

        let response = {
            let mut transport = self.transport.lock().await;
            debug!(action = action.as_str(), raw = request.as_str(), "Sending");
            transport.send(request).await?;
            transport.receive().await?
        };
        info!(action = action.as_str(), raw = response.as_str(), "Response");

        let frame = OcppFrame::decode(&response)?;
        debug!(
            action = action.as_str(),
            kind = ?frame.kind(),
            unique_id = frame.unique_id(),
            "Decoded"
        );

        let payload = match frame {
            OcppFrame::CallResult {
                unique_id: received,
                payload,
            } => {
                if received != unique_id {
                    return Err(SessionError::CorrelationMismatch {
                        action: action.as_str(),
                        expected: unique_id,
                        received,
                    });
                }
                payload
            }
            other => {
                return Err(SessionError::UnexpectedFrame {
                    action: action.as_str(),
                    kind: other.kind(),
                })
            }
        };

        let Value::Object(payload) = payload else {
            return Err(ValidationError::ResultPayloadNotObject.into());
        };
        info!(action = action.as_str(), payload = %serde_json::Value::Object(payload.clone()), "Parsed");
        Ok(payload)
    }

    pub async fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.transport.lock().await.close(code, reason).await
    }
}
