//! Supported OCPP 1.6 actions

use std::fmt;

/// Actions a charge point may invoke on the central system in this profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    BootNotification,
    Heartbeat,
    StatusNotification,
    StartTransaction,
    StopTransaction,
}

impl Action {
    pub const ALL: &'static [Action] = &[
        Self::BootNotification,
        Self::Heartbeat,
        Self::StatusNotification,
        Self::StartTransaction,
        Self::StopTransaction,
    ];

    /// Action name as carried in the CALL frame.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BootNotification => "BootNotification",
            Self::Heartbeat => "Heartbeat",
            Self::StatusNotification => "StatusNotification",
            Self::StartTransaction => "StartTransaction",
            Self::StopTransaction => "StopTransaction",
        }
    }

    /// Look up an action by its exact (case-sensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.as_str() == name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
