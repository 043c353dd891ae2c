//! API integration tests.
//!
//! These tests drive the full router, auth middleware included, against a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
use serde_json::Value;
use spshare_api::{AppState, auth_middleware, router as api_router};
use spshare_common::{GENERIC_FAILURE_MESSAGE, config::LimitsConfig};
use spshare_core::{
    GroupService, ItemService, LocalStorage, MembershipService, QuotaService, StorageService,
    UserService,
};
use spshare_db::{
    entities::{WorkflowStatus, item, item_type, user},
    repositories::{
        CommentRepository, GroupRepository, ItemRepository, ItemTypeRepository, UserRepository,
    },
};
use tower::ServiceExt;

const TOKEN: &str = "test-token";

fn user_model(status: WorkflowStatus, is_admin: bool) -> user::Model {
    user::Model {
        id: 7,
        username: "alice".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Smith".to_string(),
        email: "alice@example.com".to_string(),
        password: "hash".to_string(),
        token: Some(TOKEN.to_string()),
        is_admin,
        workflow_status: status,
        max_item_count: 20,
        max_item_space: 100.0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Create test app state over the given connection.
fn create_test_state(db: DatabaseConnection) -> AppState {
    let db = Arc::new(db);
    let limits = LimitsConfig::default();

    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let item_repo = ItemRepository::new(Arc::clone(&db));
    let item_type_repo = ItemTypeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));

    let storage: StorageService = Arc::new(LocalStorage::new(
        std::env::temp_dir().join("spshare-api-tests"),
    ));

    let user_service = UserService::new(user_repo.clone(), limits.clone());
    let group_service = GroupService::new(group_repo.clone(), limits);
    let membership_service = MembershipService::new(group_repo, user_repo.clone());
    let quota = QuotaService::new(item_repo.clone(), item_type_repo.clone());
    let item_service = ItemService::new(
        item_repo,
        item_type_repo,
        comment_repo,
        user_repo,
        group_service.clone(),
        quota,
        storage,
        "uploads",
    );

    AppState {
        user_service,
        group_service,
        membership_service,
        item_service,
    }
}

/// Create the test router.
fn create_test_router(db: DatabaseConnection) -> Router {
    let state = create_test_state(db);
    api_router()
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> DatabaseConnection {
    MockDatabase::new(DatabaseBackend::Postgres).into_connection()
}

fn post_json(uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .uri(uri)
        .method("POST")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_protected_route_without_token_is_unauthorized() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post_json("/groups/list", "{}", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_pending_account_is_forbidden() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(WorkflowStatus::Pending, false)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/items/home", "{}", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = json_body(response).await;
    assert!(
        body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("pending approval")
    );
}

#[tokio::test]
async fn test_token_lookup_failure_is_a_server_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_errors([DbErr::Custom("connection refused".to_string())])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/groups/list", "{}", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "DATABASE_ERROR");
    assert_eq!(body["error"]["message"], GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn test_signup_password_mismatch_is_rejected() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post_json(
            "/signup",
            r#"{"firstName":"Alice","lastName":"Smith","email":"alice@example.com","username":"alice","password":"Secret1!x","confirmPassword":"Secret1!y"}"#,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_signup_with_invalid_json_returns_error() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(post_json("/signup", "invalid json", None))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_signin_unknown_user_is_unauthorized() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<user::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json(
            "/signin",
            r#"{"username":"nobody","password":"whatever"}"#,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_route_requires_admin() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(WorkflowStatus::Approved, false)]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/admin/requests/users", "{}", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_item_types_are_listed() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(WorkflowStatus::Approved, false)]])
        .append_query_results([vec![
            item_type::Model {
                id: 1,
                name: "Picture".to_string(),
                max_item_count: 0,
                max_item_space: 10.0,
            },
            item_type::Model {
                id: 2,
                name: "Video".to_string(),
                max_item_count: 0,
                max_item_space: 100.0,
            },
        ]])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(post_json("/items/types", "{}", Some(TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let types = body["data"].as_array().unwrap();
    assert_eq!(types.len(), 2);
    assert_eq!(types[0]["name"], "Picture");
    assert_eq!(types[1]["maxItemSpace"], 100.0);
}

#[tokio::test]
async fn test_missing_item_content_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user_model(WorkflowStatus::Approved, false)]])
        .append_query_results([Vec::<item::Model>::new()])
        .into_connection();
    let app = create_test_router(db);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/items/42/content")
                .method("GET")
                .header("Authorization", format!("Bearer {TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/nonexistent/endpoint")
                .method("GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
