//! Item service: uploads, viewing, comments, deletion and the home feed.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, FixedOffset, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use spshare_common::{AppError, AppResult, BYTES_PER_MB, IdGenerator};
use spshare_db::{
    entities::{ItemKind, comment, item, item_type, user},
    repositories::{CommentRepository, ItemRepository, ItemTypeRepository, UserRepository},
};
use tracing::{info, warn};
use validator::Validate;

use super::{
    group::{GroupService, VIEW_DENIED},
    quota::QuotaService,
    storage::StorageService,
};

/// Room left in an upload request for the form fields around the file.
const UPLOAD_FORM_OVERHEAD: usize = 1024 * 1024;

#[allow(clippy::expect_used)]
static ITEM_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]+$").expect("valid item name pattern"));

/// Metadata accompanying an uploaded file.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadItemInput {
    #[validate(length(min = 1, max = 30, message = "Item name should be less than 30 characters"))]
    pub name: String,

    #[validate(length(
        min = 1,
        max = 400,
        message = "Description should be less than 400 characters"
    ))]
    pub description: String,

    pub group_id: i64,
}

/// The uploaded file itself.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Name as sent by the client; only its extension is kept.
    pub file_name: String,
    pub data: Bytes,
}

/// Input for commenting on an item.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommentInput {
    pub item_id: i64,

    #[validate(length(min = 1, max = 1000, message = "Comment should be 1 to 1000 characters"))]
    pub text: String,
}

/// New single-file ceiling for an item type.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemTypeLimitInput {
    pub item_type: ItemKind,

    #[validate(range(exclusive_min = 0.0, message = "Max item space must be greater than 0"))]
    pub max_item_space: f64,
}

/// A comment with its author's name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub body: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Everything shown on an item's page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPreview {
    pub item: item::Model,
    pub item_type: &'static str,
    pub group_name: String,
    pub creator_name: String,
    pub can_delete: bool,
    pub comments: Vec<CommentView>,
}

/// Stored bytes ready to be served.
#[derive(Debug, Clone)]
pub struct ItemContent {
    pub data: Bytes,
    pub content_type: &'static str,
    pub file_name: String,
}

/// An item in the home feed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub item: item::Model,
    pub group_name: String,
}

/// Uploaded items the viewer can see, newest first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HomeFeed {
    pub pictures: Vec<FeedItem>,
    pub videos: Vec<FeedItem>,
}

/// Item service.
#[derive(Clone)]
pub struct ItemService {
    item_repo: ItemRepository,
    item_type_repo: ItemTypeRepository,
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    groups: GroupService,
    quota: QuotaService,
    storage: StorageService,
    id_gen: IdGenerator,
    uploads_dir: String,
}

impl ItemService {
    /// Create a new item service.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        item_repo: ItemRepository,
        item_type_repo: ItemTypeRepository,
        comment_repo: CommentRepository,
        user_repo: UserRepository,
        groups: GroupService,
        quota: QuotaService,
        storage: StorageService,
        uploads_dir: impl Into<String>,
    ) -> Self {
        Self {
            item_repo,
            item_type_repo,
            comment_repo,
            user_repo,
            groups,
            quota,
            storage,
            id_gen: IdGenerator::new(),
            uploads_dir: uploads_dir.into(),
        }
    }

    /// Store a new picture or video in a group.
    ///
    /// The row is written with `uploaded = false` before the bytes and only
    /// flipped once the storage write succeeded.
    pub async fn upload(
        &self,
        uploader: &user::Model,
        input: UploadItemInput,
        file: UploadedFile,
    ) -> AppResult<item::Model> {
        input.validate()?;
        if !ITEM_NAME_RE.is_match(&input.name) {
            return Err(AppError::Validation(
                "Item name should start with an alphabet and must include only alphabets (a-z, A-Z), numbers (0-9) and symbols (_)"
                    .to_string(),
            ));
        }
        if file.data.is_empty() {
            return Err(AppError::Validation("File is required".to_string()));
        }

        let (kind, extension) = ItemKind::detect(&file.file_name)?;
        let group = self.groups.ensure_viewable(uploader, input.group_id).await?;

        let size = i64::try_from(file.data.len())
            .map_err(|_| AppError::BadRequest("File is too large".to_string()))?;
        self.quota.check_upload(uploader, &group, kind, size).await?;

        let now = Utc::now();
        let path = format!(
            "{}/{}",
            self.uploads_dir,
            self.id_gen.upload_file_name(&file.file_name, now.timestamp())
        );

        let mut item = self
            .item_repo
            .create(item::ActiveModel {
                name: Set(input.name),
                description: Set(input.description),
                item_type_id: Set(kind),
                size: Set(size),
                group_id: Set(group.id),
                path: Set(path.clone()),
                extension: Set(extension),
                uploaded: Set(false),
                created_by: Set(uploader.id),
                created_at: Set(now.into()),
                ..Default::default()
            })
            .await?;

        if let Err(e) = self.storage.save(&path, &file.data).await {
            warn!(item_id = item.id, path = %path, error = %e, "Storing upload failed; row left unflagged");
            return Err(e);
        }

        self.item_repo.set_uploaded(item.id, true).await?;
        item.uploaded = true;

        info!(
            item_id = item.id,
            group_id = group.id,
            user_id = uploader.id,
            size,
            "Item uploaded"
        );
        Ok(item)
    }

    async fn viewable_item(&self, viewer: &user::Model, item_id: i64) -> AppResult<(item::Model, String)> {
        let item = self.item_repo.get_by_id(item_id).await?;
        if !item.uploaded {
            return Err(AppError::Forbidden(VIEW_DENIED.to_string()));
        }
        let group = self.groups.ensure_viewable(viewer, item.group_id).await?;
        Ok((item, group.name))
    }

    /// An item with its comments.
    pub async fn preview(&self, viewer: &user::Model, item_id: i64) -> AppResult<ItemPreview> {
        let (item, group_name) = self.viewable_item(viewer, item_id).await?;
        let comments = self.comment_repo.list_for_item(item.id).await?;

        let mut user_ids: Vec<i64> = comments.iter().map(|c| c.created_by).collect();
        user_ids.push(item.created_by);
        user_ids.sort_unstable();
        user_ids.dedup();
        let names: HashMap<i64, String> = self
            .user_repo
            .find_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name()))
            .collect();
        let name_of = |id: i64| names.get(&id).cloned().unwrap_or_default();

        Ok(ItemPreview {
            item_type: item.item_type_id.name(),
            creator_name: name_of(item.created_by),
            can_delete: viewer.is_admin || viewer.id == item.created_by,
            comments: comments
                .into_iter()
                .map(|c| CommentView {
                    id: c.id,
                    author_id: c.created_by,
                    author_name: name_of(c.created_by),
                    body: c.body,
                    created_at: c.created_at,
                })
                .collect(),
            group_name,
            item,
        })
    }

    /// The stored bytes of an item.
    pub async fn download(&self, viewer: &user::Model, item_id: i64) -> AppResult<ItemContent> {
        let (item, _) = self.viewable_item(viewer, item_id).await?;
        let data = self.storage.read(&item.path).await?;

        Ok(ItemContent {
            data,
            content_type: item.item_type_id.content_type(&item.extension),
            file_name: format!("{}.{}", item.name, item.extension),
        })
    }

    /// Append a comment to an item.
    pub async fn add_comment(
        &self,
        author: &user::Model,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        input.validate()?;
        let (item, _) = self.viewable_item(author, input.item_id).await?;

        self.comment_repo
            .create(comment::ActiveModel {
                item_id: Set(item.id),
                created_by: Set(author.id),
                body: Set(input.text),
                created_at: Set(Utc::now().into()),
                ..Default::default()
            })
            .await
    }

    /// Remove an item: unflag it, delete the bytes, then the row.
    ///
    /// If the byte deletion fails the row stays behind with `uploaded = false`.
    pub async fn delete(&self, caller: &user::Model, item_id: i64) -> AppResult<()> {
        let item = self.item_repo.get_by_id(item_id).await?;
        if !caller.is_admin && caller.id != item.created_by {
            return Err(AppError::Forbidden(
                "Only the creator of an item or an admin can delete it".to_string(),
            ));
        }

        self.item_repo.set_uploaded(item.id, false).await?;

        if let Err(e) = self.storage.delete(&item.path).await {
            warn!(item_id = item.id, path = %item.path, error = %e, "Deleting stored bytes failed");
            return Err(e);
        }

        self.item_repo.delete(item.id).await?;

        info!(item_id = item.id, user_id = caller.id, "Item deleted");
        Ok(())
    }

    /// Uploaded items from every group the viewer can see.
    pub async fn home_feed(&self, viewer: &user::Model) -> AppResult<HomeFeed> {
        let groups = self.groups.list_approved_for_user(viewer).await?;
        let ids: Vec<i64> = groups.iter().map(|g| g.id).collect();
        let names: HashMap<i64, String> = groups.into_iter().map(|g| (g.id, g.name)).collect();

        let mut feed = HomeFeed::default();
        for item in self.item_repo.find_uploaded_in_groups(&ids).await? {
            let entry = FeedItem {
                group_name: names.get(&item.group_id).cloned().unwrap_or_default(),
                item,
            };
            match entry.item.item_type_id {
                ItemKind::Picture => feed.pictures.push(entry),
                ItemKind::Video => feed.videos.push(entry),
            }
        }
        Ok(feed)
    }

    /// Per-type ceilings, shown on the upload form.
    pub async fn list_item_types(&self) -> AppResult<Vec<item_type::Model>> {
        self.item_type_repo.list().await
    }

    /// Request body size that lets every item type reach its own ceiling.
    ///
    /// Never below `configured`. Read once at startup, so a ceiling raised
    /// later only widens the transport limit after a restart.
    pub async fn upload_body_limit(&self, configured: usize) -> AppResult<usize> {
        let largest_file = self
            .item_type_repo
            .list()
            .await?
            .iter()
            .map(|t| (t.max_item_space * BYTES_PER_MB).ceil() as usize)
            .max()
            .unwrap_or(0);

        Ok(configured.max(largest_file + UPLOAD_FORM_OVERHEAD))
    }

    /// Change the single-file ceiling of a type.
    pub async fn update_item_type_limit(
        &self,
        input: UpdateItemTypeLimitInput,
    ) -> AppResult<item_type::Model> {
        input.validate()?;

        self.item_type_repo
            .update_max_item_space(input.item_type, input.max_item_space)
            .await?;

        info!(
            item_type = input.item_type.name(),
            max_item_space = input.max_item_space,
            "Updated item type limit"
        );
        self.item_type_repo.get(input.item_type).await
    }
}
