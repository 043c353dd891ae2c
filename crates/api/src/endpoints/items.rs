//! Item endpoints.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use spshare_common::{AppError, AppResult};
use spshare_core::{
    CommentInput, CommentView, FeedItem, HomeFeed, ItemPreview, UploadItemInput, UploadedFile,
};
use spshare_db::entities::{ItemKind, comment, item, item_type};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

// ==================== Request/Response Types ====================

/// Item response. The storage path stays server-side.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemResponse {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub item_type: ItemKind,
    pub size: i64,
    pub group_id: i64,
    pub extension: String,
    pub created_by: i64,
    pub created_at: String,
}

impl From<item::Model> for ItemResponse {
    fn from(i: item::Model) -> Self {
        Self {
            id: i.id,
            name: i.name,
            description: i.description,
            item_type: i.item_type_id,
            size: i.size,
            group_id: i.group_id,
            extension: i.extension,
            created_by: i.created_by,
            created_at: i.created_at.to_rfc3339(),
        }
    }
}

/// Comment response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub author_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    pub text: String,
    pub created_at: String,
}

impl From<CommentView> for CommentResponse {
    fn from(c: CommentView) -> Self {
        Self {
            id: c.id,
            author_id: c.author_id,
            author_name: Some(c.author_name),
            text: c.body,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

impl From<comment::Model> for CommentResponse {
    fn from(c: comment::Model) -> Self {
        Self {
            id: c.id,
            author_id: c.created_by,
            author_name: None,
            text: c.body,
            created_at: c.created_at.to_rfc3339(),
        }
    }
}

/// Item page response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPreviewResponse {
    pub item: ItemResponse,
    pub item_type_name: &'static str,
    pub group_name: String,
    pub creator_name: String,
    pub can_delete: bool,
    pub comments: Vec<CommentResponse>,
}

impl From<ItemPreview> for ItemPreviewResponse {
    fn from(p: ItemPreview) -> Self {
        Self {
            item: p.item.into(),
            item_type_name: p.item_type,
            group_name: p.group_name,
            creator_name: p.creator_name,
            can_delete: p.can_delete,
            comments: p.comments.into_iter().map(Into::into).collect(),
        }
    }
}

/// Feed entry response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItemResponse {
    #[serde(flatten)]
    pub item: ItemResponse,
    pub group_name: String,
}

impl From<FeedItem> for FeedItemResponse {
    fn from(f: FeedItem) -> Self {
        Self {
            item: f.item.into(),
            group_name: f.group_name,
        }
    }
}

/// Home feed response.
#[derive(Serialize)]
pub struct HomeFeedResponse {
    pub pictures: Vec<FeedItemResponse>,
    pub videos: Vec<FeedItemResponse>,
}

impl From<HomeFeed> for HomeFeedResponse {
    fn from(f: HomeFeed) -> Self {
        Self {
            pictures: f.pictures.into_iter().map(Into::into).collect(),
            videos: f.videos.into_iter().map(Into::into).collect(),
        }
    }
}

/// Item type ceiling response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemTypeResponse {
    pub id: i32,
    pub name: String,
    pub max_item_space: f64,
}

impl From<item_type::Model> for ItemTypeResponse {
    fn from(t: item_type::Model) -> Self {
        Self {
            id: t.id,
            name: t.name,
            max_item_space: t.max_item_space,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemIdRequest {
    pub item_id: i64,
}

// ==================== Handlers ====================

/// Upload a picture or video via multipart form.
///
/// Fields: `name`, `description`, `groupId` and `file`.
async fn upload(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<ItemResponse>> {
    let mut file: Option<UploadedFile> = None;
    let mut name = String::new();
    let mut description = String::new();
    let mut group_id: Option<i64> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some(UploadedFile { file_name, data });
            }
            "name" => {
                name = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
            }
            "groupId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                group_id = Some(
                    text.trim()
                        .parse()
                        .map_err(|_| AppError::Validation("Group is invalid".to_string()))?,
                );
            }
            _ => {}
        }
    }

    let file = file.ok_or_else(|| AppError::Validation("File is required".to_string()))?;
    let group_id = group_id.ok_or_else(|| AppError::Validation("Group is required".to_string()))?;

    let input = UploadItemInput {
        name,
        description,
        group_id,
    };
    let item = state.item_service.upload(&user, input, file).await?;

    Ok(ApiResponse::ok(item.into()))
}

/// Show an item with its comments.
async fn show(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ItemIdRequest>,
) -> AppResult<ApiResponse<ItemPreviewResponse>> {
    let preview = state.item_service.preview(&user, req.item_id).await?;
    Ok(ApiResponse::ok(preview.into()))
}

/// Serve the stored bytes of an item.
async fn content(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(item_id): Path<i64>,
) -> AppResult<Response> {
    let content = state.item_service.download(&user, item_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", content.file_name),
            ),
        ],
        content.data,
    )
        .into_response())
}

async fn comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.item_service.add_comment(&user, input).await?;
    Ok(ApiResponse::ok(comment.into()))
}

/// Delete an item the caller created.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ItemIdRequest>,
) -> AppResult<ApiResponse<Done>> {
    state.item_service.delete(&user, req.item_id).await?;
    Ok(Done::new("Item deleted"))
}

/// Pictures and videos from the caller's groups.
async fn home(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<HomeFeedResponse>> {
    let feed = state.item_service.home_feed(&user).await?;
    Ok(ApiResponse::ok(feed.into()))
}

/// Per-type file size ceilings.
async fn types(
    AuthUser(_user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ItemTypeResponse>>> {
    let types = state.item_service.list_item_types().await?;
    Ok(ApiResponse::ok(types.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .route("/show", post(show))
        .route("/comment", post(comment))
        .route("/delete", post(delete))
        .route("/home", post(home))
        .route("/types", post(types))
        .route("/{id}/content", get(content))
}
