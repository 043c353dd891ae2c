//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use spshare_common::AppResult;
use spshare_core::{RegisterInput, SignInInput};
use spshare_db::entities::{WorkflowStatus, user};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

/// Account response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub workflow_status: WorkflowStatus,
    pub max_item_count: i32,
    pub max_item_space: f64,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            is_admin: u.is_admin,
            workflow_status: u.workflow_status,
            max_item_count: u.max_item_count,
            max_item_space: u.max_item_space,
            created_at: u.created_at.to_rfc3339(),
        }
    }
}

/// Create a new account awaiting approval.
async fn signup(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.register(input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Signin response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub token: String,
    pub workflow_status: WorkflowStatus,
    pub user: UserResponse,
}

/// Sign in to an existing account.
///
/// Pending and rejected accounts still get a token; the status tells the
/// client which page to show.
async fn signin(
    State(state): State<AppState>,
    Json(input): Json<SignInInput>,
) -> AppResult<ApiResponse<SigninResponse>> {
    let session = state.user_service.sign_in(input).await?;

    Ok(ApiResponse::ok(SigninResponse {
        token: session.token,
        workflow_status: session.workflow_status,
        user: session.user.into(),
    }))
}

/// Sign out by rotating the token.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Done>> {
    state.user_service.regenerate_token(user.id).await?;
    Ok(Done::new("Signed out"))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
}
