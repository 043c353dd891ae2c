//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use spshare_common::AppError;
use spshare_db::entities::user;

use crate::middleware::AccessDenied;

/// Authenticated, approved user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by the auth middleware
        if let Some(user) = parts.extensions.get::<user::Model>() {
            return Ok(Self(user.clone()));
        }
        match parts.extensions.get::<AccessDenied>() {
            Some(AccessDenied(reason)) => Err(AppError::Forbidden(reason.clone())),
            None => Err(AppError::Unauthorized),
        }
    }
}

/// Authenticated administrator.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl<S> FromRequestParts<S> for AdminUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden(
                "Only administrators can access this page".to_string(),
            ));
        }
        Ok(Self(user))
    }
}
