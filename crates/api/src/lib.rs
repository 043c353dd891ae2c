//! HTTP API layer for spshare.
//!
//! - **Endpoints**: accounts, groups, items and the admin console
//! - **Extractors**: authenticated and admin users
//! - **Middleware**: bearer-token authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
