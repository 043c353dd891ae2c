//! Group service: creation, listings, details, review and group limits.

use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use spshare_common::{AppError, AppResult, config::LimitsConfig};
use spshare_db::{
    entities::{WorkflowStatus, group, group_member, user},
    repositories::GroupRepository,
};
use tracing::{info, warn};
use validator::Validate;

use super::limits::UpdateLimitsInput;

/// Shown when a user asks for content of a group they cannot view.
pub const VIEW_DENIED: &str =
    "Unauthorized! You do not have enough permissions to view the content";

#[allow(clippy::expect_used)]
static GROUP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.' ]+$").expect("valid group name pattern"));

/// Input for requesting a new group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupInput {
    #[validate(length(min = 1, max = 60, message = "Group name should be less than 60 characters"))]
    pub name: String,
}

/// A group as listed for one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyGroup {
    pub group: group::Model,
    /// Effective leadership of the viewer.
    pub is_leader: bool,
    /// State of the viewer's member row, if any.
    pub membership_status: Option<WorkflowStatus>,
}

/// Id/name pair used by group pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupOption {
    pub id: i64,
    pub name: String,
}

/// One member row of a group.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub is_leader: bool,
    pub workflow_status: WorkflowStatus,
    pub added_by: i64,
}

/// A group with its members, as seen by one user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetails {
    pub group: group::Model,
    pub is_leader: bool,
    pub members: Vec<MemberView>,
}

/// Group service.
#[derive(Clone)]
pub struct GroupService {
    group_repo: GroupRepository,
    limits: LimitsConfig,
}

impl GroupService {
    /// Create a new group service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository, limits: LimitsConfig) -> Self {
        Self { group_repo, limits }
    }

    /// Request a new group. The creator becomes its approved leader; the
    /// group itself waits for an admin.
    pub async fn create(
        &self,
        creator: &user::Model,
        input: CreateGroupInput,
    ) -> AppResult<group::Model> {
        input.validate()?;
        let name = input.name.trim().to_string();
        if !GROUP_NAME_RE.is_match(&name) {
            return Err(AppError::Validation(
                "Group name should start with an alphabet and must include only alphabets (a-z, A-Z), numbers (0-9) and symbols (. and _)"
                    .to_string(),
            ));
        }

        let now = Utc::now();
        let model = group::ActiveModel {
            name: Set(name.clone()),
            created_by: Set(creator.id),
            workflow_status: Set(WorkflowStatus::Pending),
            max_item_count: Set(self.limits.group_max_item_count),
            max_item_space: Set(self.limits.group_max_item_space),
            created_at: Set(now.into()),
            updated_at: Set(None),
            ..Default::default()
        };

        if !self.group_repo.insert_if_absent(model).await? {
            return Err(AppError::Conflict(format!("Group '{name}' already exists")));
        }

        let group = self
            .group_repo
            .find_by_name(&name)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Group {name} vanished after insert")))?;

        // Not atomic with the group insert; a failure here leaves a leaderless group.
        let leader = group_member::ActiveModel {
            user_id: Set(creator.id),
            group_id: Set(group.id),
            is_leader: Set(true),
            created_by: Set(creator.id),
            workflow_status: Set(WorkflowStatus::Approved),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        if let Err(e) = self.group_repo.insert_member_if_absent(leader).await {
            warn!(group_id = group.id, error = %e, "Group created without leader membership");
            return Err(e);
        }

        info!(group_id = group.id, name = %group.name, creator = creator.id, "Group requested");
        Ok(group)
    }

    /// Every group the viewer has a member row in. Admins see all groups as leader.
    pub async fn list_for_user(&self, viewer: &user::Model) -> AppResult<Vec<MyGroup>> {
        if viewer.is_admin {
            let groups = self.group_repo.find_all().await?;
            return Ok(groups
                .into_iter()
                .map(|group| MyGroup {
                    group,
                    is_leader: true,
                    membership_status: None,
                })
                .collect());
        }

        let rows = self.group_repo.list_memberships_for_user(viewer.id).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(member, group)| {
                group.map(|group| MyGroup {
                    group,
                    is_leader: member.is_effective_leader(),
                    membership_status: Some(member.workflow_status),
                })
            })
            .collect())
    }

    /// Approved groups the viewer may see and upload into, ordered by name.
    pub async fn list_approved_for_user(&self, viewer: &user::Model) -> AppResult<Vec<GroupOption>> {
        let groups = if viewer.is_admin {
            self.group_repo.find_by_status(WorkflowStatus::Approved).await?
        } else {
            self.group_repo.find_approved_for_user(viewer.id).await?
        };

        Ok(groups
            .into_iter()
            .map(|g| GroupOption {
                id: g.id,
                name: g.name,
            })
            .collect())
    }

    /// Load a group the viewer may see content of.
    pub async fn ensure_viewable(
        &self,
        viewer: &user::Model,
        group_id: i64,
    ) -> AppResult<group::Model> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if group.workflow_status != WorkflowStatus::Approved {
            return Err(AppError::Forbidden(VIEW_DENIED.to_string()));
        }
        if viewer.is_admin || self.group_repo.get_member(viewer.id, group_id).await?.is_some() {
            Ok(group)
        } else {
            Err(AppError::Forbidden(VIEW_DENIED.to_string()))
        }
    }

    /// Group, the viewer's leadership and the tagged members.
    pub async fn details(&self, viewer: &user::Model, group_id: i64) -> AppResult<GroupDetails> {
        let group = self.group_repo.get_by_id(group_id).await?;

        let is_leader = if viewer.is_admin {
            true
        } else {
            self.group_repo
                .get_member(viewer.id, group_id)
                .await?
                .ok_or_else(|| {
                    AppError::Forbidden(format!(
                        "You do not have access to group '{}'",
                        group.name
                    ))
                })?
                .is_effective_leader()
        };

        let members = self
            .group_repo
            .list_members(group_id)
            .await?
            .into_iter()
            .filter_map(|(member, user)| {
                user.map(|user| MemberView {
                    user_id: user.id,
                    full_name: user.full_name(),
                    username: user.username,
                    is_leader: member.is_effective_leader(),
                    workflow_status: member.workflow_status,
                    added_by: member.created_by,
                })
            })
            .collect();

        Ok(GroupDetails {
            group,
            is_leader,
            members,
        })
    }

    /// Groups waiting for review.
    pub async fn list_pending(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_by_status(WorkflowStatus::Pending).await
    }

    /// Approve or reject a pending group.
    pub async fn approve_or_reject(&self, group_id: i64, approve: bool) -> AppResult<group::Model> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if !group.workflow_status.is_pending() {
            return Err(already_reviewed(&group.name));
        }

        let status = WorkflowStatus::from_decision(approve);
        if self.group_repo.set_workflow_status(group_id, status).await? == 0 {
            return Err(already_reviewed(&group.name));
        }

        info!(group_id, name = %group.name, status = %status, "Reviewed group request");
        self.group_repo.get_by_id(group_id).await
    }

    /// Approved groups, for limit administration.
    pub async fn list_approved(&self) -> AppResult<Vec<group::Model>> {
        self.group_repo.find_by_status(WorkflowStatus::Approved).await
    }

    /// A single group with its current caps.
    pub async fn get_limits(&self, group_id: i64) -> AppResult<group::Model> {
        self.group_repo.get_by_id(group_id).await
    }

    /// Overwrite a group's caps.
    pub async fn update_limits(
        &self,
        group_id: i64,
        input: UpdateLimitsInput,
    ) -> AppResult<group::Model> {
        input.validate()?;

        if self
            .group_repo
            .update_limits(group_id, input.max_item_count, input.max_item_space)
            .await?
            == 0
        {
            return Err(AppError::NotFound(format!("Group {group_id} not found")));
        }

        info!(
            group_id,
            max_item_count = input.max_item_count,
            max_item_space = input.max_item_space,
            "Updated group limits"
        );
        self.group_repo.get_by_id(group_id).await
    }
}

fn already_reviewed(name: &str) -> AppError {
    AppError::BadRequest(format!(
        "The request for group '{name}' has already been reviewed"
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: i64, is_admin: bool) -> user::Model {
        user::Model {
            id,
            username: format!("user{id}"),
            first_name: "Test".to_string(),
            last_name: format!("User{id}"),
            email: format!("user{id}@example.com"),
            password: "hash".to_string(),
            token: None,
            is_admin,
            workflow_status: WorkflowStatus::Approved,
            max_item_count: 20,
            max_item_space: 100.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_group(id: i64, status: WorkflowStatus) -> group::Model {
        group::Model {
            id,
            name: "hikers".to_string(),
            created_by: 1,
            workflow_status: status,
            max_item_count: 100,
            max_item_space: 500.0,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_member(
        user_id: i64,
        is_leader: bool,
        status: WorkflowStatus,
    ) -> group_member::Model {
        group_member::Model {
            user_id,
            group_id: 1,
            is_leader,
            created_by: 1,
            workflow_status: status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn service(db: MockDatabase) -> GroupService {
        let db = Arc::new(db.into_connection());
        GroupService::new(GroupRepository::new(db), LimitsConfig::default())
    }

    #[tokio::test]
    async fn test_create_enrolls_creator_as_leader() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([exec(1), exec(1)])
                .append_query_results([[create_test_group(1, WorkflowStatus::Pending)]])
                .into_connection(),
        );
        let groups = GroupService::new(GroupRepository::new(db.clone()), LimitsConfig::default());

        let group = groups
            .create(
                &create_test_user(1, false),
                CreateGroupInput {
                    name: "hikers".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(group.workflow_status, WorkflowStatus::Pending);
        drop(groups);

        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert_eq!(log.matches("INSERT INTO").count(), 2);
        assert!(log.contains("group_member"));
    }

    #[tokio::test]
    async fn test_create_duplicate_name() {
        let groups = service(MockDatabase::new(DatabaseBackend::Postgres).append_exec_results([exec(0)]));

        let err = groups
            .create(
                &create_test_user(1, false),
                CreateGroupInput {
                    name: "hikers".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_name() {
        let groups = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = groups
            .create(
                &create_test_user(1, false),
                CreateGroupInput {
                    name: "_hikers".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_details_hides_pending_leadership() {
        let requester = create_test_user(2, false);
        let groups = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group(1, WorkflowStatus::Approved)]])
                .append_query_results([[create_test_member(2, true, WorkflowStatus::Pending)]])
                .append_query_results([vec![
                    (
                        create_test_member(1, true, WorkflowStatus::Approved),
                        create_test_user(1, false),
                    ),
                    (
                        create_test_member(2, true, WorkflowStatus::Pending),
                        create_test_user(2, false),
                    ),
                ]]),
        );

        let details = groups.details(&requester, 1).await.unwrap();

        assert!(!details.is_leader);
        assert!(details.members[0].is_leader);
        assert!(!details.members[1].is_leader);
    }

    #[tokio::test]
    async fn test_details_requires_membership() {
        let groups = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_group(1, WorkflowStatus::Approved)]])
                .append_query_results([Vec::<group_member::Model>::new()]),
        );

        let err = groups.details(&create_test_user(5, false), 1).await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_ensure_viewable() {
        let groups = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [create_test_group(1, WorkflowStatus::Pending)],
                    [create_test_group(1, WorkflowStatus::Approved)],
                    [create_test_group(1, WorkflowStatus::Approved)],
                ])
                .append_query_results([Vec::<group_member::Model>::new()]),
        );

        let member = create_test_user(2, false);
        let err = groups.ensure_viewable(&member, 1).await.unwrap_err();
        assert_eq!(err.to_string(), format!("Forbidden: {VIEW_DENIED}"));

        assert!(groups.ensure_viewable(&create_test_user(9, true), 1).await.is_ok());
        assert!(groups.ensure_viewable(&member, 1).await.is_err());
    }

    #[tokio::test]
    async fn test_approve_or_reject_group() {
        let groups = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([
                    [create_test_group(1, WorkflowStatus::Pending)],
                    [create_test_group(1, WorkflowStatus::Rejected)],
                    [create_test_group(1, WorkflowStatus::Rejected)],
                ])
                .append_exec_results([exec(1)]),
        );

        let group = groups.approve_or_reject(1, false).await.unwrap();
        assert_eq!(group.workflow_status, WorkflowStatus::Rejected);

        let err = groups.approve_or_reject(1, true).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_list_for_admin_marks_leader() {
        let groups = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
            vec![
                create_test_group(1, WorkflowStatus::Approved),
                create_test_group(2, WorkflowStatus::Pending),
            ],
        ]));

        let mine = groups.list_for_user(&create_test_user(9, true)).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|g| g.is_leader));
    }
}
