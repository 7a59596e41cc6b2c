//! Charge point run - the fixed client sequence
//!
//! 1. BootNotification, must be `Accepted`
//! 2. StatusNotification (connector 0, Available)
//! 3. StartTransaction, must carry a transaction ID and `Accepted` idTagInfo
//! 4. Heartbeat loop in the background
//! 5. StopTransaction after the session dwell
//! 6. Join the heartbeat loop

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::connection::SerializedConnection;
use super::heartbeat::heartbeat_loop;
use super::state::{SessionState, SessionStatus};
use crate::config::ChargePointConfig;
use crate::domain::ocpp::messages::{
    to_payload, BootNotificationRequest, ChargePointErrorCode, ChargePointStatus, Payload,
    StartTransactionRequest, StatusNotificationRequest, StopTransactionRequest,
};
use crate::domain::Action;
use crate::infrastructure::transport::{ClientTransport, Transport};
use crate::support::errors::SessionError;
use crate::support::time::{utc_now_iso_z, utc_now_seconds};

/// Heartbeat interval used when the BootNotification response carries no
/// usable one (seconds).
pub const DEFAULT_HEARTBEAT_INTERVAL: u32 = 10;

const CLOSE_NORMAL: u16 = 1000;

/// Outcome of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub transaction_id: i64,
    /// Interval adopted from the BootNotification response (seconds)
    pub heartbeat_interval: u32,
    pub heartbeats_requested: u32,
    pub heartbeats_completed: u32,
}

impl RunReport {
    /// Whether the heartbeat loop ran every iteration.
    pub fn heartbeats_complete(&self) -> bool {
        self.heartbeats_completed == self.heartbeats_requested
    }
}

pub struct ChargePoint {
    conn: SerializedConnection,
    options: ChargePointConfig,
    state: SessionState,
}

impl ChargePoint {
    /// Connect to `<server_url>/<charge_point_id>` over WebSocket,
    /// offering `subprotocol` only when one is configured.
    pub async fn connect(options: ChargePointConfig) -> Result<Self, SessionError> {
        let url = options.endpoint();
        info!(
            url = url.as_str(),
            subprotocol = options.subprotocol.as_deref().unwrap_or("-"),
            "Connecting to central system"
        );
        let transport = ClientTransport::connect(&url, options.subprotocol.as_deref()).await?;
        Ok(Self::new(transport, options))
    }

    pub fn new(transport: impl Transport + 'static, options: ChargePointConfig) -> Self {
        Self {
            conn: SerializedConnection::new(Box::new(transport)),
            options,
            state: SessionState::new(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run the full sequence once. Fails on the first step the central
    /// system does not accept.
    pub async fn run(&mut self) -> Result<RunReport, SessionError> {
        let heartbeat_interval = self.boot().await?;
        self.report_available().await?;
        let transaction_id = self.start_transaction().await?;

        let requested = self.options.heartbeat_count;
        let heartbeat = tokio::spawn(heartbeat_loop(
            self.conn.clone(),
            Duration::from_secs(u64::from(heartbeat_interval)),
            requested,
        ));

        tokio::time::sleep(Duration::from_secs(self.options.session_secs)).await;
        if let Err(e) = self.stop_transaction(transaction_id).await {
            heartbeat.abort();
            return Err(e);
        }

        let completed = heartbeat
            .await
            .map_err(|e| SessionError::HeartbeatTask(e.to_string()))?;
        if completed < requested {
            warn!(completed, requested, "Heartbeat loop ended early");
        }

        if let Err(e) = self.conn.close(CLOSE_NORMAL, "session complete").await {
            debug!(error = %e, "Close after run failed");
        }

        Ok(RunReport {
            transaction_id,
            heartbeat_interval,
            heartbeats_requested: requested,
            heartbeats_completed: completed,
        })
    }

    async fn boot(&mut self) -> Result<u32, SessionError> {
        let request = BootNotificationRequest {
            charge_box_serial_number: None,
            charge_point_model: self.options.model.clone(),
            charge_point_serial_number: None,
            charge_point_vendor: self.options.vendor.clone(),
            firmware_version: Some(self.options.firmware_version.clone()),
            iccid: None,
            imsi: None,
            meter_serial_number: None,
            meter_type: Some(self.options.meter_type.clone()),
        };
        let response = self
            .conn
            .call(Action::BootNotification, to_payload(&request))
            .await?;

        require_accepted(Action::BootNotification, response.get("status"))?;
        let interval = adopted_interval(&response);
        info!(interval, "Boot accepted");
        self.state.transition(SessionStatus::Available);
        Ok(interval)
    }

    async fn report_available(&mut self) -> Result<(), SessionError> {
        let request = StatusNotificationRequest {
            connector_id: 0,
            error_code: ChargePointErrorCode::NoError,
            info: None,
            status: ChargePointStatus::Available,
            timestamp: Some(utc_now_seconds()),
            vendor_id: None,
            vendor_error_code: None,
        };
        self.conn
            .call(Action::StatusNotification, to_payload(&request))
            .await?;
        Ok(())
    }

    async fn start_transaction(&mut self) -> Result<i64, SessionError> {
        let request = StartTransactionRequest {
            connector_id: self.options.connector_id,
            id_tag: self.options.id_tag.clone(),
            meter_start: self.options.meter_start,
            timestamp: utc_now_iso_z(),
        };
        let response = self
            .conn
            .call(Action::StartTransaction, to_payload(&request))
            .await?;

        let transaction_id = started_transaction_id(&response)?;
        self.state
            .open_transaction(transaction_id, request.connector_id, request.meter_start);
        info!(transaction_id, "Transaction started");
        Ok(transaction_id)
    }

    async fn stop_transaction(&mut self, transaction_id: i64) -> Result<(), SessionError> {
        let request = StopTransactionRequest {
            transaction_id,
            meter_stop: self.options.meter_stop,
            timestamp: utc_now_iso_z(),
            id_tag: Some(self.options.id_tag.clone()),
            reason: Some("Local".to_string()),
        };
        let response = self
            .conn
            .call(Action::StopTransaction, to_payload(&request))
            .await?;

        require_accepted(Action::StopTransaction, id_tag_status(&response))?;
        self.state.close_transaction(request.meter_stop);
        info!(transaction_id, meter_stop = request.meter_stop, "Transaction stopped");
        Ok(())
    }
}

fn require_accepted(action: Action, status: Option<&Value>) -> Result<(), SessionError> {
    match status.and_then(Value::as_str) {
        Some("Accepted") => Ok(()),
        other => Err(SessionError::Rejected {
            action: action.as_str(),
            status: other.unwrap_or("missing").to_string(),
        }),
    }
}

fn id_tag_status(payload: &Payload) -> Option<&Value> {
    payload.get("idTagInfo").and_then(|info| info.get("status"))
}

/// `interval` when it is a positive integer, otherwise the default.
fn adopted_interval(payload: &Payload) -> u32 {
    payload
        .get("interval")
        .and_then(Value::as_u64)
        .filter(|&secs| secs > 0)
        .and_then(|secs| u32::try_from(secs).ok())
        .unwrap_or(DEFAULT_HEARTBEAT_INTERVAL)
}

fn started_transaction_id(payload: &Payload) -> Result<i64, SessionError> {
    let transaction_id = payload
        .get("transactionId")
        .and_then(Value::as_i64)
        .ok_or(SessionError::MissingTransactionId)?;
    require_accepted(Action::StartTransaction, id_tag_status(payload))?;
    Ok(transaction_id)
}
