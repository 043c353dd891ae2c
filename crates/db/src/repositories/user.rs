//! User repository.

use std::sync::Arc;

use crate::entities::{User, WorkflowStatus, user};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, OnConflict},
};
use spshare_common::{AppError, AppResult};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by token.
    pub async fn find_by_token(&self, token: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Token.eq(token))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a user unless the username is taken.
    ///
    /// Returns `false` when the row already existed and nothing was written.
    pub async fn insert_if_absent(&self, model: user::ActiveModel) -> AppResult<bool> {
        let inserted = User::insert(model)
            .on_conflict(
                OnConflict::column(user::Column::Username)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the user's token.
    pub async fn set_token(&self, id: i64, token: &str) -> AppResult<u64> {
        let result = User::update_many()
            .col_expr(user::Column::Token, Expr::value(token))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Move a pending user to `status`.
    ///
    /// Returns the number of rows changed; zero means the user was no longer
    /// pending.
    pub async fn set_workflow_status(&self, id: i64, status: WorkflowStatus) -> AppResult<u64> {
        let result = User::update_many()
            .col_expr(user::Column::WorkflowStatus, Expr::value(status.code()))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .filter(user::Column::WorkflowStatus.eq(WorkflowStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Overwrite the user's quota caps.
    pub async fn update_limits(
        &self,
        id: i64,
        max_item_count: i32,
        max_item_space: f64,
    ) -> AppResult<u64> {
        let result = User::update_many()
            .col_expr(user::Column::MaxItemCount, Expr::value(max_item_count))
            .col_expr(user::Column::MaxItemSpace, Expr::value(max_item_space))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Users waiting for account approval, oldest first.
    pub async fn find_pending(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::WorkflowStatus.eq(WorkflowStatus::Pending))
            .order_by_asc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved non-admin users, ordered by name.
    pub async fn find_approved_members(&self) -> AppResult<Vec<user::Model>> {
        User::find()
            .filter(user::Column::WorkflowStatus.eq(WorkflowStatus::Approved))
            .filter(user::Column::IsAdmin.eq(false))
            .order_by_asc(user::Column::FirstName)
            .order_by_asc(user::Column::LastName)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_user(id: i64, username: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            email: format!("{username}@example.com"),
            password: "hash".to_string(),
            token: Some("token123".to_string()),
            is_admin: false,
            workflow_status: WorkflowStatus::Approved,
            max_item_count: 20,
            max_item_space: 100.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_username() {
        let user = create_test_user(1, "alice");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_username("Alice").await.unwrap();

        assert_eq!(result.unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id(42).await;

        assert!(matches!(result, Err(AppError::UserNotFound(id)) if id == "42"));
    }

    #[tokio::test]
    async fn test_set_workflow_status_reports_rows() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert_eq!(
            repo.set_workflow_status(1, WorkflowStatus::Approved)
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            repo.set_workflow_status(1, WorkflowStatus::Rejected)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_find_by_ids_empty_skips_query() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = UserRepository::new(db);
        assert!(repo.find_by_ids(&[]).await.unwrap().is_empty());
    }
}
