//! Inputs shared by the limit administration screens.

use serde::Deserialize;
use validator::Validate;

/// New quota caps for a user or a group.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLimitsInput {
    #[validate(range(min = 0, message = "Max item count cannot be negative"))]
    pub max_item_count: i32,

    #[validate(range(exclusive_min = 0.0, message = "Max item space must be greater than 0"))]
    pub max_item_space: f64,
}
