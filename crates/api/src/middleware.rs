//! API middleware.

#![allow(missing_docs)]

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use spshare_common::AppError;
use spshare_core::{GroupService, ItemService, MembershipService, UserService};
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
    pub membership_service: MembershipService,
    pub item_service: ItemService,
}

/// Reason a valid token was refused, kept for the extractors.
#[derive(Debug, Clone)]
pub struct AccessDenied(pub String);

/// Authentication middleware.
///
/// Resolves `Authorization: Bearer <token>` to an approved user. Requests
/// without a usable token pass through unauthenticated; the extractors decide
/// whether the route needs one. A store failure during the lookup ends the
/// request with a server error.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate_by_token(token).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(AppError::Forbidden(reason)) => {
                req.extensions_mut().insert(AccessDenied(reason));
            }
            Err(e) if e.is_server_error() => return e.into_response(),
            Err(e) => debug!(error = %e, "Token rejected"),
        }
    }

    next.run(req).await
}
