//! Moderation state shared by users, groups and memberships.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tri-state moderation flag.
///
/// Persisted as a small integer; the numeric values are part of the schema and
/// must not change.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "camelCase")]
pub enum WorkflowStatus {
    /// Waiting for an administrator.
    #[default]
    #[sea_orm(num_value = 0)]
    Pending,
    /// Accepted.
    #[sea_orm(num_value = 1)]
    Approved,
    /// Declined. Terminal.
    #[sea_orm(num_value = 2)]
    Rejected,
}

impl WorkflowStatus {
    /// Stored integer value.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Pending => 0,
            Self::Approved => 1,
            Self::Rejected => 2,
        }
    }

    /// Human readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending for approval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Outcome of an administrator's decision.
    #[must_use]
    pub const fn from_decision(approve: bool) -> Self {
        if approve { Self::Approved } else { Self::Rejected }
    }

    /// Whether the record still awaits a decision.
    #[must_use]
    pub const fn is_pending(self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
