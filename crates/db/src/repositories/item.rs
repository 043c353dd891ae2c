//! Item repository.

use std::sync::Arc;

use crate::entities::{Item, item};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, QuerySelect, sea_query::Expr,
};
use spshare_common::{AppError, AppResult};

/// Count and byte total of uploaded items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromQueryResult)]
pub struct Usage {
    pub count: i64,
    pub total_bytes: i64,
}

/// Item repository for database operations.
#[derive(Clone)]
pub struct ItemRepository {
    db: Arc<DatabaseConnection>,
}

impl ItemRepository {
    /// Create a new item repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an item by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<item::Model>> {
        Item::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an item by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<item::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item {id} not found")))
    }

    /// Create a new item row.
    pub async fn create(&self, model: item::ActiveModel) -> AppResult<item::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the `uploaded` flag.
    pub async fn set_uploaded(&self, id: i64, uploaded: bool) -> AppResult<u64> {
        let result = Item::update_many()
            .col_expr(item::Column::Uploaded, Expr::value(uploaded))
            .filter(item::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Delete an item row.
    pub async fn delete(&self, id: i64) -> AppResult<()> {
        Item::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Uploaded items created by a user.
    pub async fn usage_by_user(&self, user_id: i64) -> AppResult<Usage> {
        self.usage(item::Column::CreatedBy.eq(user_id)).await
    }

    /// Uploaded items held by a group.
    pub async fn usage_by_group(&self, group_id: i64) -> AppResult<Usage> {
        self.usage(item::Column::GroupId.eq(group_id)).await
    }

    async fn usage(&self, condition: sea_orm::sea_query::SimpleExpr) -> AppResult<Usage> {
        let usage = Item::find()
            .select_only()
            .column_as(Expr::cust("COUNT(*)"), "count")
            .column_as(
                Expr::cust("CAST(COALESCE(SUM(size), 0) AS BIGINT)"),
                "total_bytes",
            )
            .filter(condition)
            .filter(item::Column::Uploaded.eq(true))
            .into_model::<Usage>()
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(usage.unwrap_or_default())
    }

    /// Uploaded items in the given groups, newest first.
    pub async fn find_uploaded_in_groups(&self, group_ids: &[i64]) -> AppResult<Vec<item::Model>> {
        if group_ids.is_empty() {
            return Ok(vec![]);
        }

        Item::find()
            .filter(item::Column::GroupId.is_in(group_ids.to_vec()))
            .filter(item::Column::Uploaded.eq(true))
            .order_by_desc(item::Column::CreatedAt)
            .order_by_desc(item::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
