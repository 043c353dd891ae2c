//! Group entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::workflow::WorkflowStatus;

/// A group of users sharing media.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "group")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Group name, unique.
    #[sea_orm(unique)]
    pub name: String,

    /// User who requested the group.
    #[sea_orm(indexed)]
    pub created_by: i64,

    /// Moderation state; new groups start pending.
    pub workflow_status: WorkflowStatus,

    /// Items the group may hold.
    pub max_item_count: i32,

    /// Space (MB) the group's items may take.
    pub max_item_space: f64,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
    #[sea_orm(has_many = "super::group_member::Entity")]
    Members,
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::group_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
