//! Admin endpoints: pending requests and limit administration.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use spshare_common::AppResult;
use spshare_core::{PendingMembership, UpdateItemTypeLimitInput, UpdateLimitsInput};

use super::{auth::UserResponse, groups::GroupResponse, items::ItemTypeResponse};
use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

// ==================== Request/Response Types ====================

/// Pending leadership request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequestResponse {
    pub user_id: i64,
    pub username: String,
    pub full_name: String,
    pub group_id: i64,
    pub group_name: String,
    pub is_leader: bool,
    pub requested_at: String,
}

impl From<PendingMembership> for MembershipRequestResponse {
    fn from(p: PendingMembership) -> Self {
        Self {
            user_id: p.user_id,
            username: p.username,
            full_name: p.full_name,
            group_id: p.group_id,
            group_name: p.group_name,
            is_leader: p.is_leader,
            requested_at: p.requested_at.to_rfc3339(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleUserRequest {
    pub user_id: i64,
    pub approve: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleGroupRequest {
    pub group_id: i64,
    pub approve: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandleMembershipRequest {
    pub user_id: i64,
    pub group_id: i64,
    pub approve: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdRequest {
    pub user_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIdRequest {
    pub group_id: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserLimitsRequest {
    pub user_id: i64,
    #[serde(flatten)]
    pub limits: UpdateLimitsInput,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupLimitsRequest {
    pub group_id: i64,
    #[serde(flatten)]
    pub limits: UpdateLimitsInput,
}

fn disposition(approve: bool) -> &'static str {
    if approve { "Approved" } else { "Rejected" }
}

// ==================== Requests ====================

/// Groups waiting for approval.
async fn pending_groups(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GroupResponse>>> {
    let groups = state.group_service.list_pending().await?;
    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

async fn handle_group(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<HandleGroupRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state
        .group_service
        .approve_or_reject(req.group_id, req.approve)
        .await?;
    Ok(ApiResponse::ok(group.into()))
}

/// Accounts waiting for approval.
async fn pending_users(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state.user_service.list_pending().await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

async fn handle_user(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<HandleUserRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .approve_or_reject(req.user_id, req.approve)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Leadership requests waiting for approval.
async fn pending_memberships(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<MembershipRequestResponse>>> {
    let requests = state.membership_service.list_pending().await?;
    Ok(ApiResponse::ok(requests.into_iter().map(Into::into).collect()))
}

async fn handle_membership(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<HandleMembershipRequest>,
) -> AppResult<ApiResponse<Done>> {
    state
        .membership_service
        .approve_or_reject(req.user_id, req.group_id, req.approve)
        .await?;
    Ok(Done::new(format!(
        "{} lead access request",
        disposition(req.approve)
    )))
}

// ==================== Limits ====================

/// Approved non-admin accounts.
async fn user_limits(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    let users = state.user_service.list_approved_members().await?;
    Ok(ApiResponse::ok(users.into_iter().map(Into::into).collect()))
}

async fn show_user_limits(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UserIdRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get_limits(req.user_id).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn update_user_limits(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateUserLimitsRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .update_limits(req.user_id, req.limits)
        .await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Approved groups.
async fn group_limits(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<GroupResponse>>> {
    let groups = state.group_service.list_approved().await?;
    Ok(ApiResponse::ok(groups.into_iter().map(Into::into).collect()))
}

async fn show_group_limits(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<GroupIdRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state.group_service.get_limits(req.group_id).await?;
    Ok(ApiResponse::ok(group.into()))
}

async fn update_group_limits(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateGroupLimitsRequest>,
) -> AppResult<ApiResponse<GroupResponse>> {
    let group = state
        .group_service
        .update_limits(req.group_id, req.limits)
        .await?;
    Ok(ApiResponse::ok(group.into()))
}

/// Change the single-file ceiling of an item type.
async fn update_item_type_limit(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateItemTypeLimitInput>,
) -> AppResult<ApiResponse<ItemTypeResponse>> {
    let item_type = state.item_service.update_item_type_limit(input).await?;
    Ok(ApiResponse::ok(item_type.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Requests
        .route("/requests/groups", post(pending_groups))
        .route("/requests/groups/handle", post(handle_group))
        .route("/requests/users", post(pending_users))
        .route("/requests/users/handle", post(handle_user))
        .route("/requests/memberships", post(pending_memberships))
        .route("/requests/memberships/handle", post(handle_membership))
        // Limits
        .route("/limits/users", post(user_limits))
        .route("/limits/users/show", post(show_user_limits))
        .route("/limits/users/update", post(update_user_limits))
        .route("/limits/groups", post(group_limits))
        .route("/limits/groups/show", post(show_group_limits))
        .route("/limits/groups/update", post(update_group_limits))
        .route("/limits/item-types/update", post(update_item_type_limit))
}
