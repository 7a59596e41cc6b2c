//! Client-side session state

use std::fmt;

use tracing::info;

/// Registration status of the charge point with the central system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Booting,
    Available,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Booting => "BOOTING",
            SessionStatus::Available => "AVAILABLE",
        })
    }
}

/// State of one client run. Transaction fields are set only after the
/// central system accepted the StartTransaction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub status: SessionStatus,
    pub transaction_id: Option<i64>,
    pub connector_id: u32,
    pub meter_start: i64,
    pub meter_stop: Option<i64>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transition(&mut self, to: SessionStatus) {
        if self.status != to {
            info!("Session state {} -> {}", self.status, to);
            self.status = to;
        }
    }

    pub fn open_transaction(&mut self, transaction_id: i64, connector_id: u32, meter_start: i64) {
        self.transaction_id = Some(transaction_id);
        self.connector_id = connector_id;
        self.meter_start = meter_start;
        self.meter_stop = None;
    }

    pub fn close_transaction(&mut self, meter_stop: i64) {
        self.meter_stop = Some(meter_stop);
    }
}
