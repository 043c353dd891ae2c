//! Quota violation types.
//!
//! A [`QuotaViolation`] names the cap an upload would exceed together with the
//! configured limit and the value the upload would have produced. Its
//! `Display` output is the message shown to the uploader.

use std::fmt;

use serde::Serialize;

/// Bytes per (decimal) megabyte.
pub const BYTES_PER_MB: f64 = 1_000_000.0;

/// Convert a byte count to decimal megabytes.
#[must_use]
pub fn bytes_to_mb(bytes: i64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

/// The cap an upload ran into.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum QuotaKind {
    /// Number of items owned by the uploader.
    UserItemCount,
    /// Cumulative size of the uploader's items.
    UserItemSpace,
    /// Number of items in the target group.
    GroupItemCount,
    /// Cumulative size of the target group's items.
    GroupItemSpace,
    /// Single-file ceiling for an item type.
    ItemTypeFileSize {
        /// Display name of the item type.
        #[serde(rename = "itemType")]
        item_type: String,
    },
}

/// An upload rejected by the quota evaluator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaViolation {
    /// Which cap was hit.
    #[serde(flatten)]
    pub kind: QuotaKind,
    /// The configured cap (items or MB).
    pub limit: f64,
    /// The value the upload would have produced (items or MB).
    pub attempted: f64,
}

impl QuotaViolation {
    /// Create a new violation.
    #[must_use]
    pub const fn new(kind: QuotaKind, limit: f64, attempted: f64) -> Self {
        Self {
            kind,
            limit,
            attempted,
        }
    }
}

impl fmt::Display for QuotaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            QuotaKind::UserItemCount => {
                write!(f, "User is limited to {} items", self.limit)
            }
            QuotaKind::UserItemSpace => write!(
                f,
                "User is limited to {:.3} MB of space for uploads",
                self.limit
            ),
            QuotaKind::GroupItemCount => {
                write!(f, "Only {} items can be uploaded in the group", self.limit)
            }
            QuotaKind::GroupItemSpace => write!(
                f,
                "The group is limited to {:.3} MB of space for uploads",
                self.limit
            ),
            QuotaKind::ItemTypeFileSize { item_type } => write!(
                f,
                "Maximum allowed file size for item-type '{item_type}' is {:.3} MB",
                self.limit
            ),
        }
    }
}
