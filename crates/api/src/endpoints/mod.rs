//! API endpoints.

mod admin;
mod auth;
mod groups;
mod items;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/groups", groups::router())
        .nest("/items", items::router())
        .nest("/admin", admin::router())
}
