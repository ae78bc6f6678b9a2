//! Status and direction enums stored on ledger rows.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle of a ledger row.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[sea_orm(string_value = "running")]
    #[default]
    Running,
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "error")]
    Error,
    /// Stopped by an operator pause or a deadline before finishing.
    /// Never used as an incremental cutoff.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl SyncStatus {
    /// Whether the run has reached a terminal state.
    pub fn is_finished(self) -> bool {
        !matches!(self, SyncStatus::Running)
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncStatus::Running => write!(f, "running"),
            SyncStatus::Completed => write!(f, "completed"),
            SyncStatus::Error => write!(f, "error"),
            SyncStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Direction of data flow for a run.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "lowercase")]
pub enum SyncDirection {
    /// Upstream gallery API into the local mirror.
    #[sea_orm(string_value = "pull")]
    #[default]
    Pull,
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::Pull => write!(f, "pull"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_status_is_running() {
        assert_eq!(SyncStatus::default(), SyncStatus::Running);
        assert!(!SyncStatus::Running.is_finished());
        assert!(SyncStatus::Cancelled.is_finished());
    }

    #[test]
    fn display_outputs_expected_strings() {
        assert_eq!(SyncStatus::Completed.to_string(), "completed");
        assert_eq!(SyncStatus::Error.to_string(), "error");
        assert_eq!(SyncDirection::Pull.to_string(), "pull");
    }
}
