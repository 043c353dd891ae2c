//! Item type entity and media kind detection.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use spshare_common::{AppError, AppResult};

/// Extensions accepted as pictures.
pub const PICTURE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Extensions accepted as videos.
pub const VIDEO_EXTENSIONS: [&str; 1] = ["mp4"];

/// Kind of uploaded media. Stored as the `item_type` row id.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "camelCase")]
pub enum ItemKind {
    /// jpg, jpeg or png.
    #[sea_orm(num_value = 1)]
    Picture,
    /// mp4.
    #[sea_orm(num_value = 2)]
    Video,
}

impl ItemKind {
    /// Primary key of the matching `item_type` row.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Picture => 1,
            Self::Video => 2,
        }
    }

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Picture => "Picture",
            Self::Video => "Video",
        }
    }

    /// Kind for a (lowercase) file extension.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        if PICTURE_EXTENSIONS.contains(&extension) {
            Some(Self::Picture)
        } else if VIDEO_EXTENSIONS.contains(&extension) {
            Some(Self::Video)
        } else {
            None
        }
    }

    /// Detect the kind of an uploaded file from its name.
    ///
    /// Returns the kind together with the normalized extension.
    pub fn detect(file_name: &str) -> AppResult<(Self, String)> {
        let extension = match file_name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext.to_lowercase(),
            _ => {
                return Err(AppError::Validation(
                    "Invalid file type. File extension not available".to_string(),
                ));
            }
        };

        Self::from_extension(&extension)
            .map(|kind| (kind, extension.clone()))
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Invalid file type - '{extension}'. Supported types - pictures ('jpg', 'jpeg' and 'png') and videos ('mp4')"
                ))
            })
    }

    /// MIME type for a stored file of this kind.
    #[must_use]
    pub fn content_type(self, extension: &str) -> &'static str {
        match (self, extension) {
            (Self::Picture, "png") => "image/png",
            (Self::Picture, _) => "image/jpeg",
            (Self::Video, _) => "video/mp4",
        }
    }
}

/// Per-type upload ceiling.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "item_type")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,

    pub name: String,

    /// Unused by the evaluator; kept for administration.
    pub max_item_count: i32,

    /// Largest single file (MB) of this type.
    pub max_item_space: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_supported_extensions() {
        assert_eq!(
            ItemKind::detect("holiday.jpg").unwrap(),
            (ItemKind::Picture, "jpg".to_string())
        );
        assert_eq!(ItemKind::detect("scan.JPEG").unwrap().0, ItemKind::Picture);
        assert_eq!(ItemKind::detect("logo.png").unwrap().0, ItemKind::Picture);
        assert_eq!(ItemKind::detect("clip.mp4").unwrap().0, ItemKind::Video);
        assert_eq!(ItemKind::detect("my.trip.mp4").unwrap().0, ItemKind::Video);
    }

    #[test]
    fn test_detect_rejects_unsupported_extension() {
        let err = ItemKind::detect("movie.mov").unwrap_err();
        let message = err.to_string();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(message.contains("Invalid file type - 'mov'"));
        assert!(message.contains("pictures ('jpg', 'jpeg' and 'png')"));
        assert!(message.contains("videos ('mp4')"));
    }

    #[test]
    fn test_detect_requires_extension() {
        for name in ["README", "trailing.", ".hidden"] {
            let err = ItemKind::detect(name).unwrap_err();
            assert!(
                err.to_string()
                    .contains("Invalid file type. File extension not available"),
                "{name}"
            );
        }
    }

    #[test]
    fn test_ids_and_content_types() {
        assert_eq!(ItemKind::Picture.id(), 1);
        assert_eq!(ItemKind::Video.id(), 2);
        assert_eq!(ItemKind::Picture.content_type("png"), "image/png");
        assert_eq!(ItemKind::Picture.content_type("jpg"), "image/jpeg");
        assert_eq!(ItemKind::Video.content_type("mp4"), "video/mp4");
    }
}
