//! Comment repository.

use std::sync::Arc;

use crate::entities::{Comment, comment};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use spshare_common::{AppError, AppResult};

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a comment.
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on an item, oldest first.
    pub async fn list_for_item(&self, item_id: i64) -> AppResult<Vec<comment::Model>> {
        Comment::find()
            .filter(comment::Column::ItemId.eq(item_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, Set};

    fn create_test_comment(id: i64, body: &str) -> comment::Model {
        comment::Model {
            id,
            item_id: 1,
            created_by: 2,
            body: body.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_create() {
        let stored = create_test_comment(1, "Nice shot");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[stored.clone()]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let created = repo
            .create(comment::ActiveModel {
                item_id: Set(1),
                created_by: Set(2),
                body: Set("Nice shot".to_string()),
                created_at: Set(stored.created_at),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(created, stored);
    }

    #[tokio::test]
    async fn test_list_for_item() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![
                    create_test_comment(1, "first"),
                    create_test_comment(2, "second"),
                ]])
                .into_connection(),
        );

        let repo = CommentRepository::new(db);
        let comments = repo.list_for_item(1).await.unwrap();

        assert_eq!(comments[0].body, "first");
        assert_eq!(comments[1].body, "second");
    }
}
