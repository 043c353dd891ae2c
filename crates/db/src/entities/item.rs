//! Item entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::item_type::ItemKind;

/// Metadata of one uploaded picture or video.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// References `item_type.id`.
    pub item_type_id: ItemKind,

    /// Size of the stored bytes.
    pub size: i64,

    #[sea_orm(indexed)]
    pub group_id: i64,

    /// Storage path relative to the storage root, e.g. `uploads/<hash>`.
    pub path: String,

    /// Lowercase extension of the original file.
    pub extension: String,

    /// Set once the bytes are durably written. Only uploaded items count
    /// toward quotas or are shown.
    #[sea_orm(default_value = false)]
    pub uploaded: bool,

    #[sea_orm(indexed)]
    pub created_by: i64,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::group::Entity",
        from = "Column::GroupId",
        to = "super::group::Column::Id",
        on_delete = "Cascade"
    )]
    Group,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::CreatedBy",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Creator,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::group::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Group.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Creator.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
