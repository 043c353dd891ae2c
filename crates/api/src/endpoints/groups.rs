//! Group endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use spshare_common::AppResult;
use spshare_core::{AddMemberInput, CreateGroupInput, GroupDetails, GroupOption, MemberView, MyGroup};
use spshare_db::entities::{WorkflowStatus, group, group_member};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

// ==================== Request/Response Types ====================

/// Group response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResponse {
    pub id: i64,
    pub name: String,
    pub created_by: i64,
    pub workflow_status: WorkflowStatus,
    pub max_item_count: i32,
    pub max_item_space: f64,
    pub created_at: String,
}

impl From<group::Model> for GroupResponse {
    fn from(g: group::Model) -> Self {
        Self {
            id: g.id,
            name: g.name,
            created_by: g.created_by,
            workflow_status: g.workflow_status,
            max_item_count: g.max_item_count,
            max_item_space: g.max_item_space,
            created_at: g.created_at.to_rfc3339(),
        }
    }
}

/// A group in the caller's list.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyGroupResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub is_leader: bool,
    pub membership_status: Option<WorkflowStatus>,
}

impl From<MyGroup> for MyGroupResponse {
    fn from(g: MyGroup) -> Self {
        Self {
            group: g.group.into(),
            is_leader: g.is_leader,
            membership_status: g.membership_status,
        }
    }
}

/// Member row response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberResponse {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub is_leader: bool,
    pub workflow_status: WorkflowStatus,
    pub added_by: i64,
}

impl From<MemberView> for MemberResponse {
    fn from(m: MemberView) -> Self {
        Self {
            user_id: m.user_id,
            username: m.username,
            full_name: m.full_name,
            is_leader: m.is_leader,
            workflow_status: m.workflow_status,
            added_by: m.added_by,
        }
    }
}

/// Group detail response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDetailResponse {
    #[serde(flatten)]
    pub group: GroupResponse,
    pub is_leader: bool,
    pub members: Vec<MemberResponse>,
}

impl From<GroupDetails> for GroupDetailResponse {
    fn from(d: GroupDetails) -> Self {
        Self {
            group: d.group.into(),
            is_leader: d.is_leader,
            members: d.members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Membership row created by an add.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub user_id: i64,
    pub group_id: i64,
    pub is_leader: bool,
    pub workflow_status: WorkflowStatus,
    pub created_by: i64,
}

impl From<group_member::Model> for MembershipResponse {
    fn from(m: group_member::Model) -> Self {
        Self {
            user_id: m.user_id,
            group_id: m.group_id,
            is_leader: m.is_leader,
            workflow_status: m.workflow_status,
            created_by: m.created_by,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIdRequest {
    pub group_id: i64,
}

// ==================== Handlers ====================

/// Request a new group.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateGroupInput>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.create(&user, input).await?;
    Ok(ApiResponse::ok(group.into()))
}

/// Groups the caller belongs to.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<MyGroupResponse>>> {
    let groups = state.group_service.list_for_user(&user).await?;
    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

/// Approved groups the caller can upload into.
async fn approved(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GroupOption>>> {
    let groups = state.group_service.list_approved_for_user(&user).await?;
    Ok(ApiResponse::ok(groups))
}

async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<GroupIdRequest>,
) -> AppResult<ApiResponse<GroupDetailResponse>> {
    let details = state.group_service.details(&user, req.group_id).await?;
    Ok(ApiResponse::ok(details.into()))
}

/// Tag a user to a group the caller leads.
async fn add_member(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<AddMemberInput>,
) -> AppResult<ApiResponse<MembershipResponse>> {
    let member = state.membership_service.add_member(&user, input).await?;
    Ok(ApiResponse::ok(member.into()))
}

/// Ask to become a leader of a group.
async fn request_lead(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<GroupIdRequest>,
) -> AppResult<ApiResponse<Done>> {
    state
        .membership_service
        .request_lead_access(&user, req.group_id)
        .await?;
    Ok(Done::new("Lead access requested"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create))
        .route("/list", post(list))
        .route("/approved", post(approved))
        .route("/show", post(show))
        .route("/members/add", post(add_member))
        .route("/request-lead", post(request_lead))
}
