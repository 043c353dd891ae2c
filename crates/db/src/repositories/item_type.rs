//! Item type repository.

use std::sync::Arc;

use crate::entities::{ItemKind, ItemType, item_type};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, sea_query::Expr,
};
use spshare_common::{AppError, AppResult};

/// Repository for per-type upload ceilings.
#[derive(Clone)]
pub struct ItemTypeRepository {
    db: Arc<DatabaseConnection>,
}

impl ItemTypeRepository {
    /// Create a new item type repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Limits row for a kind.
    pub async fn get(&self, kind: ItemKind) -> AppResult<item_type::Model> {
        ItemType::find_by_id(kind.id())
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotFound(format!("Item type '{}' not found", kind.name())))
    }

    /// All item types ordered by id.
    pub async fn list(&self) -> AppResult<Vec<item_type::Model>> {
        ItemType::find()
            .order_by_asc(item_type::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Set the single-file ceiling (MB) of a kind.
    pub async fn update_max_item_space(&self, kind: ItemKind, max_item_space: f64) -> AppResult<u64> {
        let result = ItemType::update_many()
            .col_expr(item_type::Column::MaxItemSpace, Expr::value(max_item_space))
            .filter(item_type::Column::Id.eq(kind.id()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }
}
