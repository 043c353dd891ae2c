//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::workflow::WorkflowStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Login name, always lowercase.
    #[sea_orm(unique)]
    pub username: String,

    pub first_name: String,

    pub last_name: String,

    pub email: String,

    /// Argon2 PHC string.
    #[serde(skip_serializing)]
    pub password: String,

    /// Bearer token for API access.
    #[sea_orm(unique, nullable)]
    #[serde(skip_serializing)]
    pub token: Option<String>,

    #[sea_orm(default_value = false)]
    pub is_admin: bool,

    pub workflow_status: WorkflowStatus,

    /// Items this user may own.
    pub max_item_count: i32,

    /// Space (MB) this user's items may take.
    pub max_item_space: f64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Display name.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::group_member::Entity")]
    Memberships,

    #[sea_orm(has_many = "super::item::Entity")]
    Items,
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
