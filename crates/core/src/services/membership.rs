//! Membership service: tagging members and the leadership-upgrade workflow.
//!
//! A member row is normally `Approved`. A member asking to lead a group flips
//! their own row to `Pending` with `is_leader` set; the flag only takes effect
//! once an admin approves (see `group_member::Model::is_effective_leader`).
//! Rejecting such a request demotes the row back to an approved plain member.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use spshare_common::{AppError, AppResult};
use spshare_db::{
    entities::{WorkflowStatus, group_member, user},
    repositories::{GroupRepository, UserRepository},
};
use tracing::{info, warn};
use validator::Validate;

#[allow(clippy::expect_used)]
static MEMBER_USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_.]+$").expect("valid username pattern"));

/// Input for tagging a user to a group.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberInput {
    pub group_id: i64,

    #[validate(length(min = 1, max = 12, message = "Username should be 12 characters or less"))]
    pub username: String,
}

/// A leadership request waiting for an admin.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMembership {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub group_id: i64,
    pub group_name: String,
    pub is_leader: bool,
    pub requested_at: DateTime<FixedOffset>,
}

/// Membership service.
#[derive(Clone)]
pub struct MembershipService {
    group_repo: GroupRepository,
    user_repo: UserRepository,
}

impl MembershipService {
    /// Create a new membership service.
    #[must_use]
    pub const fn new(group_repo: GroupRepository, user_repo: UserRepository) -> Self {
        Self {
            group_repo,
            user_repo,
        }
    }

    /// Tag an existing user to a group the caller leads.
    pub async fn add_member(
        &self,
        caller: &user::Model,
        input: AddMemberInput,
    ) -> AppResult<group_member::Model> {
        input.validate()?;
        if !MEMBER_USERNAME_RE.is_match(&input.username) {
            return Err(AppError::Validation(
                "Username should start with an alphabet and must include only alphabets (a-z, A-Z), numbers (0-9) and symbols (. and _)"
                    .to_string(),
            ));
        }
        let username = input.username.to_lowercase();

        let group = self.group_repo.get_by_id(input.group_id).await?;
        if !caller.is_admin {
            let leads = self
                .group_repo
                .get_member(caller.id, group.id)
                .await?
                .is_some_and(|m| m.is_effective_leader());
            if !leads {
                return Err(AppError::Forbidden(format!(
                    "Only leaders of group '{}' can add members",
                    group.name
                )));
            }
        }

        let target = self
            .user_repo
            .find_by_username(&username)
            .await?
            .ok_or_else(|| AppError::UserNotFound(username.clone()))?;

        let row = group_member::ActiveModel {
            user_id: Set(target.id),
            group_id: Set(group.id),
            is_leader: Set(false),
            created_by: Set(caller.id),
            workflow_status: Set(WorkflowStatus::Approved),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        if !self.group_repo.insert_member_if_absent(row).await? {
            return Err(AppError::Conflict(format!(
                "User '{username}' is already a member of group '{}'",
                group.name
            )));
        }

        info!(group_id = group.id, user_id = target.id, added_by = caller.id, "Member added");
        self.group_repo
            .get_member(target.id, group.id)
            .await?
            .ok_or_else(|| AppError::Internal("Member row vanished after insert".to_string()))
    }

    /// Ask to become a leader of a group the caller is an approved member of.
    pub async fn request_lead_access(&self, caller: &user::Model, group_id: i64) -> AppResult<()> {
        let group = self.group_repo.get_by_id(group_id).await?;
        let member = self
            .group_repo
            .get_member(caller.id, group_id)
            .await?
            .ok_or_else(|| {
                AppError::Forbidden(format!("You are not a member of group '{}'", group.name))
            })?;

        if member.workflow_status != WorkflowStatus::Approved {
            return Err(AppError::BadRequest(format!(
                "A request for group '{}' is already awaiting review",
                group.name
            )));
        }
        if member.is_leader {
            return Err(AppError::BadRequest(format!(
                "You are already a leader of group '{}'",
                group.name
            )));
        }

        self.group_repo
            .set_member_state(caller.id, group_id, true, WorkflowStatus::Pending)
            .await?;

        info!(group_id, user_id = caller.id, "Leadership requested");
        Ok(())
    }

    /// Admin disposition of a leadership request.
    pub async fn approve_or_reject(
        &self,
        user_id: i64,
        group_id: i64,
        approve: bool,
    ) -> AppResult<()> {
        let group = self.group_repo.get_by_id(group_id).await?;
        if group.created_by == user_id {
            return Err(AppError::BadRequest(
                "This request belongs to Create Group workflow; please check the 'Create Group' requests"
                    .to_string(),
            ));
        }

        let member = self
            .group_repo
            .get_member(user_id, group_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "The given user does not have access to group '{}'",
                    group.name
                ))
            })?;

        if !member.workflow_status.is_pending() {
            return Err(AppError::BadRequest(format!(
                "The request for group '{}' has already been reviewed",
                group.name
            )));
        }

        if approve {
            self.group_repo
                .set_member_state(user_id, group_id, member.is_leader, WorkflowStatus::Approved)
                .await?;
            info!(group_id, user_id, "Leadership request approved");
        } else if member.is_leader {
            self.group_repo
                .set_member_state(user_id, group_id, false, WorkflowStatus::Approved)
                .await?;
            info!(group_id, user_id, "Leadership request rejected; member demoted");
        } else {
            warn!(group_id, user_id, "Rejected a pending row without leader flag; left unchanged");
        }

        Ok(())
    }

    /// Pending leadership requests with user and group names.
    pub async fn list_pending(&self) -> AppResult<Vec<PendingMembership>> {
        let rows = self.group_repo.find_pending_members().await?;

        let user_ids: Vec<i64> = rows.iter().map(|(m, _)| m.user_id).collect();
        let users: HashMap<i64, user::Model> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|(member, group)| {
                let group = group?;
                let user = users.get(&member.user_id)?;
                Some(PendingMembership {
                    user_id: user.id,
                    username: user.username.clone(),
                    full_name: user.full_name(),
                    group_id: group.id,
                    group_name: group.name,
                    is_leader: member.is_leader,
                    requested_at: member.updated_at.unwrap_or(member.created_at),
                })
            })
            .collect())
    }
}
