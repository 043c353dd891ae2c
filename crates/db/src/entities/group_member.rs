//! Group member entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::workflow::WorkflowStatus;

/// Membership of a user in a group.
///
/// One row per (user, group). A row is `Pending` only while a leadership
/// request awaits an administrator.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group_member")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,

    #[sea_orm(primary_key, auto_increment = false)]
    pub group_id: i64,

    /// Leader flag as stored. Use [`Model::is_effective_leader`] for checks.
    #[sea_orm(default_value = false)]
    pub is_leader: bool,

    /// User who created the row.
    pub created_by: i64,

    pub workflow_status: WorkflowStatus,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Leader with an approved row; a pending leadership request does not count.
    #[must_use]
    pub fn is_effective_leader(&self) -> bool {
        self.is_leader && self.workflow_status == WorkflowStatus::Approved
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
