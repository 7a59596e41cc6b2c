//! Transaction domain entity

use chrono::{DateTime, Utc};

/// One charging session as tracked by the central system.
///
/// Only open sessions exist; stopping removes the entity from the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// Registry-assigned transaction ID, starting at 1
    pub id: i64,
    /// Charge point that started the session
    pub charge_point_id: String,
    /// Connector ID (0 or 1)
    pub connector_id: u32,
    /// ID tag that started the transaction
    pub id_tag: String,
    /// Meter value at start (Wh)
    pub meter_start: i64,
    /// When the central system accepted the start
    pub started_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        id: i64,
        charge_point_id: impl Into<String>,
        connector_id: u32,
        id_tag: impl Into<String>,
        meter_start: i64,
    ) -> Self {
        Self {
            id,
            charge_point_id: charge_point_id.into(),
            connector_id,
            id_tag: id_tag.into(),
            meter_start,
            started_at: Utc::now(),
        }
    }

    /// Energy delivered in Wh given the closing meter value.
    pub fn energy_consumed(&self, meter_stop: i64) -> i64 {
        meter_stop.saturating_sub(self.meter_start)
    }
}

// ── Tests ──────────────────────────────────────────────────────
