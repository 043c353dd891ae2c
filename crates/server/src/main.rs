//! spshare server entry point.

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, middleware};
use spshare_api::{AppState, auth_middleware, router as api_router};
use spshare_common::Config;
use spshare_core::{
    GroupService, ItemService, LocalStorage, MembershipService, QuotaService, StorageService,
    UserService,
};
use spshare_db::repositories::{
    CommentRepository, GroupRepository, ItemRepository, ItemTypeRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spshare=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting spshare server...");

    let config = Config::load()?;

    let db = spshare_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    spshare_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let item_repo = ItemRepository::new(Arc::clone(&db));
    let item_type_repo = ItemTypeRepository::new(Arc::clone(&db));
    let comment_repo = CommentRepository::new(Arc::clone(&db));

    let local_storage = LocalStorage::new(config.storage.root.clone());
    info!(root = %local_storage.root().display(), "Using local storage");
    let storage: StorageService = Arc::new(local_storage);

    // Initialize services
    let user_service = UserService::new(user_repo.clone(), config.limits.clone());
    let group_service = GroupService::new(group_repo.clone(), config.limits.clone());
    let membership_service = MembershipService::new(group_repo, user_repo.clone());
    let quota_service = QuotaService::new(item_repo.clone(), item_type_repo.clone());
    let item_service = ItemService::new(
        item_repo,
        item_type_repo,
        comment_repo,
        user_repo,
        group_service.clone(),
        quota_service,
        storage,
        config.storage.uploads_dir.clone(),
    );

    if let Some(admin) = &config.admin {
        let admin = user_service.ensure_admin(admin).await?;
        info!(user_id = admin.id, username = %admin.username, "Administrator available");
    }

    let body_limit = item_service
        .upload_body_limit(config.storage.max_upload_bytes)
        .await?;
    info!(body_limit, "Upload body limit");

    let state = AppState {
        user_service,
        group_service,
        membership_service,
        item_service,
    };

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
