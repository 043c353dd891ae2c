//! Create item and comment tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Item::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Item::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Item::Name).string_len(30).not_null())
                    .col(ColumnDef::new(Item::Description).text().not_null())
                    .col(ColumnDef::new(Item::ItemTypeId).integer().not_null())
                    .col(ColumnDef::new(Item::Size).big_integer().not_null())
                    .col(ColumnDef::new(Item::GroupId).big_integer().not_null())
                    .col(ColumnDef::new(Item::Path).string_len(256).not_null())
                    .col(ColumnDef::new(Item::Extension).string_len(8).not_null())
                    .col(ColumnDef::new(Item::Uploaded).boolean().not_null().default(false))
                    .col(ColumnDef::new(Item::CreatedBy).big_integer().not_null())
                    .col(
                        ColumnDef::new(Item::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_item_type")
                            .from(Item::Table, Item::ItemTypeId)
                            .to(ItemType::Table, ItemType::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_group")
                            .from(Item::Table, Item::GroupId)
                            .to(Group::Table, Group::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_created_by")
                            .from(Item::Table, Item::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Quota aggregation filters by owner or group plus the uploaded flag
        manager
            .create_index(
                Index::create()
                    .name("idx_item_created_by_uploaded")
                    .table(Item::Table)
                    .col(Item::CreatedBy)
                    .col(Item::Uploaded)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_group_id_uploaded")
                    .table(Item::Table)
                    .col(Item::GroupId)
                    .col(Item::Uploaded)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::ItemId).big_integer().not_null())
                    .col(ColumnDef::new(Comment::CreatedBy).big_integer().not_null())
                    .col(ColumnDef::new(Comment::Body).text().not_null())
                    .col(
                        ColumnDef::new(Comment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_item")
                            .from(Comment::Table, Comment::ItemId)
                            .to(Item::Table, Item::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_created_by")
                            .from(Comment::Table, Comment::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comment_item_id_created_at")
                    .table(Comment::Table)
                    .col(Comment::ItemId)
                    .col(Comment::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Item::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Item {
    Table,
    Id,
    Name,
    Description,
    ItemTypeId,
    Size,
    GroupId,
    Path,
    Extension,
    Uploaded,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    ItemId,
    CreatedBy,
    Body,
    CreatedAt,
}

#[derive(Iden)]
enum ItemType {
    Table,
    Id,
}

#[derive(Iden)]
enum Group {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
