//! Group and membership repository.

use std::sync::Arc;

use crate::entities::{Group, GroupMember, User, WorkflowStatus, group, group_member, user};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::{Expr, OnConflict},
};
use spshare_common::{AppError, AppResult};

/// Repository for groups and their member rows.
#[derive(Clone)]
pub struct GroupRepository {
    db: Arc<DatabaseConnection>,
}

impl GroupRepository {
    /// Create a new group repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ==================== Groups ====================

    /// Find a group by ID.
    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<group::Model>> {
        Group::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i64) -> AppResult<group::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group {id} not found")))
    }

    /// Find groups by IDs.
    pub async fn find_by_ids(&self, ids: &[i64]) -> AppResult<Vec<group::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Group::find()
            .filter(group::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a group by its unique name.
    pub async fn find_by_name(&self, name: &str) -> AppResult<Option<group::Model>> {
        Group::find()
            .filter(group::Column::Name.eq(name))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a group unless the name is taken.
    ///
    /// Returns `false` when a group with that name already existed.
    pub async fn insert_if_absent(&self, model: group::ActiveModel) -> AppResult<bool> {
        let inserted = Group::insert(model)
            .on_conflict(
                OnConflict::column(group::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// All groups ordered by name.
    pub async fn find_all(&self) -> AppResult<Vec<group::Model>> {
        Group::find()
            .order_by_asc(group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Groups in the given state ordered by name.
    pub async fn find_by_status(&self, status: WorkflowStatus) -> AppResult<Vec<group::Model>> {
        Group::find()
            .filter(group::Column::WorkflowStatus.eq(status))
            .order_by_asc(group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Approved groups the user has a member row in, ordered by name.
    pub async fn find_approved_for_user(&self, user_id: i64) -> AppResult<Vec<group::Model>> {
        Group::find()
            .inner_join(GroupMember)
            .filter(group_member::Column::UserId.eq(user_id))
            .filter(group::Column::WorkflowStatus.eq(WorkflowStatus::Approved))
            .order_by_asc(group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Move a pending group to `status`. Returns the rows changed.
    pub async fn set_workflow_status(&self, id: i64, status: WorkflowStatus) -> AppResult<u64> {
        let result = Group::update_many()
            .col_expr(group::Column::WorkflowStatus, Expr::value(status.code()))
            .col_expr(group::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(group::Column::Id.eq(id))
            .filter(group::Column::WorkflowStatus.eq(WorkflowStatus::Pending))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Overwrite the group's quota caps.
    pub async fn update_limits(
        &self,
        id: i64,
        max_item_count: i32,
        max_item_space: f64,
    ) -> AppResult<u64> {
        let result = Group::update_many()
            .col_expr(group::Column::MaxItemCount, Expr::value(max_item_count))
            .col_expr(group::Column::MaxItemSpace, Expr::value(max_item_space))
            .col_expr(group::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(group::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    // ==================== Members ====================

    /// Member row for a (user, group) pair.
    pub async fn get_member(
        &self,
        user_id: i64,
        group_id: i64,
    ) -> AppResult<Option<group_member::Model>> {
        GroupMember::find_by_id((user_id, group_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a member row unless the pair already exists.
    pub async fn insert_member_if_absent(
        &self,
        model: group_member::ActiveModel,
    ) -> AppResult<bool> {
        let inserted = GroupMember::insert(model)
            .on_conflict(
                OnConflict::columns([group_member::Column::UserId, group_member::Column::GroupId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(inserted > 0)
    }

    /// Overwrite the leader flag and state of a member row.
    pub async fn set_member_state(
        &self,
        user_id: i64,
        group_id: i64,
        is_leader: bool,
        status: WorkflowStatus,
    ) -> AppResult<u64> {
        let result = GroupMember::update_many()
            .col_expr(group_member::Column::IsLeader, Expr::value(is_leader))
            .col_expr(group_member::Column::WorkflowStatus, Expr::value(status.code()))
            .col_expr(group_member::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(group_member::Column::UserId.eq(user_id))
            .filter(group_member::Column::GroupId.eq(group_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(result.rows_affected)
    }

    /// Members of a group with their user records.
    pub async fn list_members(
        &self,
        group_id: i64,
    ) -> AppResult<Vec<(group_member::Model, Option<user::Model>)>> {
        GroupMember::find()
            .filter(group_member::Column::GroupId.eq(group_id))
            .find_also_related(User)
            .order_by_asc(user::Column::FirstName)
            .order_by_asc(user::Column::LastName)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Every member row of a user with its group, ordered by group name.
    pub async fn list_memberships_for_user(
        &self,
        user_id: i64,
    ) -> AppResult<Vec<(group_member::Model, Option<group::Model>)>> {
        GroupMember::find()
            .filter(group_member::Column::UserId.eq(user_id))
            .find_also_related(Group)
            .order_by_asc(group::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Pending member rows, excluding the creator rows of their groups.
    pub async fn find_pending_members(
        &self,
    ) -> AppResult<Vec<(group_member::Model, Option<group::Model>)>> {
        GroupMember::find()
            .filter(group_member::Column::WorkflowStatus.eq(WorkflowStatus::Pending))
            .find_also_related(Group)
            .filter(
                Expr::col((group::Entity, group::Column::CreatedBy))
                    .ne(Expr::col((group_member::Entity, group_member::Column::UserId))),
            )
            .order_by_asc(group_member::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
