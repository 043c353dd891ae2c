//! Create `item_type` table and seed the supported media kinds.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (id, name, max item count, max single-file size in MB)
const SEED: [(i32, &str, i32, f64); 2] = [(1, "Picture", 1000, 10.0), (2, "Video", 100, 100.0)];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ItemType::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ItemType::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ItemType::Name).string_len(32).not_null())
                    .col(ColumnDef::new(ItemType::MaxItemCount).integer().not_null())
                    .col(ColumnDef::new(ItemType::MaxItemSpace).double().not_null())
                    .to_owned(),
            )
            .await?;

        let mut insert = Query::insert();
        insert.into_table(ItemType::Table).columns([
            ItemType::Id,
            ItemType::Name,
            ItemType::MaxItemCount,
            ItemType::MaxItemSpace,
        ]);
        for (id, name, max_item_count, max_item_space) in SEED {
            insert
                .values([
                    id.into(),
                    name.into(),
                    max_item_count.into(),
                    max_item_space.into(),
                ])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }
        insert.on_conflict(OnConflict::column(ItemType::Id).do_nothing().to_owned());

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ItemType::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ItemType {
    Table,
    Id,
    Name,
    MaxItemCount,
    MaxItemSpace,
}
