//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Success envelope: `{"data": ...}`.
///
/// Failures never go through this type; they render from
/// [`spshare_common::AppError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Body of operations that only acknowledge.
#[derive(Debug, Serialize)]
pub struct Done {
    pub message: String,
}

impl Done {
    /// Wrap an acknowledgement message.
    pub fn new(message: impl Into<String>) -> ApiResponse<Self> {
        ApiResponse::ok(Self {
            message: message.into(),
        })
    }
}
