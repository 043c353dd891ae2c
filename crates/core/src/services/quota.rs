//! Upload quota evaluation.
//!
//! Before an item row or its bytes are written, the candidate upload is
//! checked against, in order:
//!
//! 1. the uploader's item count and cumulative space,
//! 2. the target group's item count and cumulative space,
//! 3. the single-file ceiling of the item's type.
//!
//! The first failing check is reported. Usage is aggregated fresh from the
//! item table on every call and only counts items whose bytes were stored.

use spshare_common::{AppResult, QuotaKind, QuotaViolation, bytes_to_mb};
use spshare_db::{
    entities::{ItemKind, group, user},
    repositories::{ItemRepository, ItemTypeRepository, Usage},
};
use tracing::debug;

/// Fail unless `existing` items leave room for one more under `max`.
pub fn check_cumulative_count(
    kind: QuotaKind,
    existing: i64,
    max: i32,
) -> Result<(), QuotaViolation> {
    if existing < i64::from(max) {
        Ok(())
    } else {
        Err(QuotaViolation::new(
            kind,
            f64::from(max),
            (existing + 1) as f64,
        ))
    }
}

/// Fail unless the stored bytes plus the candidate stay strictly below `max_mb`.
pub fn check_cumulative_space(
    kind: QuotaKind,
    existing_bytes: i64,
    candidate_bytes: i64,
    max_mb: f64,
) -> Result<(), QuotaViolation> {
    let total = bytes_to_mb(existing_bytes) + bytes_to_mb(candidate_bytes);
    if total < max_mb {
        Ok(())
    } else {
        Err(QuotaViolation::new(kind, max_mb, total))
    }
}

/// Fail if a single file exceeds the ceiling of its type.
pub fn check_file_size(
    item_type: &str,
    candidate_bytes: i64,
    max_mb: f64,
) -> Result<(), QuotaViolation> {
    let size = bytes_to_mb(candidate_bytes);
    if size <= max_mb {
        Ok(())
    } else {
        Err(QuotaViolation::new(
            QuotaKind::ItemTypeFileSize {
                item_type: item_type.to_string(),
            },
            max_mb,
            size,
        ))
    }
}

fn check_usage(
    usage: Usage,
    candidate_bytes: i64,
    max_count: i32,
    max_space: f64,
    count_kind: QuotaKind,
    space_kind: QuotaKind,
) -> Result<(), QuotaViolation> {
    check_cumulative_count(count_kind, usage.count, max_count)?;
    check_cumulative_space(space_kind, usage.total_bytes, candidate_bytes, max_space)
}

/// Quota evaluator backed by the item store.
#[derive(Clone)]
pub struct QuotaService {
    item_repo: ItemRepository,
    item_type_repo: ItemTypeRepository,
}

impl QuotaService {
    /// Create a new quota service.
    #[must_use]
    pub const fn new(item_repo: ItemRepository, item_type_repo: ItemTypeRepository) -> Self {
        Self {
            item_repo,
            item_type_repo,
        }
    }

    /// Decide whether `uploader` may add a `size_bytes` file of `kind` to `group`.
    ///
    /// Group and type data are only read once the earlier checks passed.
    pub async fn check_upload(
        &self,
        uploader: &user::Model,
        group: &group::Model,
        kind: ItemKind,
        size_bytes: i64,
    ) -> AppResult<()> {
        let usage = self.item_repo.usage_by_user(uploader.id).await?;
        check_usage(
            usage,
            size_bytes,
            uploader.max_item_count,
            uploader.max_item_space,
            QuotaKind::UserItemCount,
            QuotaKind::UserItemSpace,
        )?;

        let usage = self.item_repo.usage_by_group(group.id).await?;
        check_usage(
            usage,
            size_bytes,
            group.max_item_count,
            group.max_item_space,
            QuotaKind::GroupItemCount,
            QuotaKind::GroupItemSpace,
        )?;

        let item_type = self.item_type_repo.get(kind).await?;
        check_file_size(&item_type.name, size_bytes, item_type.max_item_space)?;

        debug!(
            user_id = uploader.id,
            group_id = group.id,
            size_bytes,
            "Upload within quota"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use spshare_common::AppError;
    use spshare_db::entities::{WorkflowStatus, item_type};
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn usage_row(count: i64, bytes: i64) -> BTreeMap<&'static str, Value> {
        btreemap! {
            "count" => Value::BigInt(Some(count)),
            "total_bytes" => Value::BigInt(Some(bytes)),
        }
    }

    fn uploader(max_item_count: i32, max_item_space: f64) -> user::Model {
        user::Model {
            id: 1,
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            email: "alice@example.com".to_string(),
            password: "hash".to_string(),
            token: None,
            is_admin: false,
            workflow_status: WorkflowStatus::Approved,
            max_item_count,
            max_item_space,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn target_group(max_item_count: i32, max_item_space: f64) -> group::Model {
        group::Model {
            id: 9,
            name: "hikers".to_string(),
            created_by: 1,
            workflow_status: WorkflowStatus::Approved,
            max_item_count,
            max_item_space,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service(db: MockDatabase) -> QuotaService {
        let db = Arc::new(db.into_connection());
        QuotaService::new(ItemRepository::new(db.clone()), ItemTypeRepository::new(db))
    }

    #[test]
    fn test_count_is_strict() {
        assert!(check_cumulative_count(QuotaKind::UserItemCount, 19, 20).is_ok());
        let err = check_cumulative_count(QuotaKind::UserItemCount, 20, 20).unwrap_err();
        assert_eq!(err.limit, 20.0);
        assert_eq!(err.attempted, 21.0);
    }

    #[test]
    fn test_space_is_strict_and_decimal() {
        // 60 MB stored + 39.999999 MB candidate stays under 100 MB.
        assert!(
            check_cumulative_space(QuotaKind::UserItemSpace, 60_000_000, 39_999_999, 100.0).is_ok()
        );
        // Landing exactly on the cap is rejected.
        let err = check_cumulative_space(QuotaKind::UserItemSpace, 60_000_000, 40_000_000, 100.0)
            .unwrap_err();
        assert_eq!(err.kind, QuotaKind::UserItemSpace);
        assert_eq!(
            err.to_string(),
            "User is limited to 100.000 MB of space for uploads"
        );
    }

    #[test]
    fn test_file_size_is_inclusive() {
        assert!(check_file_size("Picture", 10_000_000, 10.0).is_ok());
        let err = check_file_size("Picture", 10_000_001, 10.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Maximum allowed file size for item-type 'Picture' is 10.000 MB"
        );
    }

    #[test]
    fn test_admission_is_monotonic_in_size() {
        // If a size is rejected, every larger size is rejected too.
        let cap = 100.0;
        let mut rejected = false;
        for step in 0..=200 {
            let size = step * 1_000_000;
            let ok = check_cumulative_space(QuotaKind::GroupItemSpace, 0, size, cap).is_ok();
            if rejected {
                assert!(!ok, "size {size} admitted after a smaller size was rejected");
            }
            rejected |= !ok;
        }
        assert!(rejected);
    }

    #[tokio::test]
    async fn test_user_count_short_circuits_remaining_checks() {
        // Only the user aggregate is queued; a group or type lookup would fail.
        let quota = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[usage_row(1, 50_000_000)]]),
        );

        let err = quota
            .check_upload(&uploader(1, 100.0), &target_group(100, 500.0), ItemKind::Picture, 1)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User is limited to 1 items");
        assert!(matches!(err, AppError::QuotaExceeded(_)));
    }

    #[tokio::test]
    async fn test_group_space_failure() {
        let quota = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([
                [usage_row(0, 0)],
                [usage_row(10, 499_000_000)],
            ]),
        );

        let err = quota
            .check_upload(
                &uploader(20, 100.0),
                &target_group(100, 500.0),
                ItemKind::Video,
                2_000_000,
            )
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "The group is limited to 500.000 MB of space for uploads"
        );
    }

    #[tokio::test]
    async fn test_item_type_ceiling_and_success() {
        let picture = item_type::Model {
            id: 1,
            name: "Picture".to_string(),
            max_item_count: 1000,
            max_item_space: 10.0,
        };

        let quota = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[usage_row(0, 0)], [usage_row(0, 0)]])
                .append_query_results([[picture.clone()]])
                .append_query_results([[usage_row(0, 0)], [usage_row(0, 0)]])
                .append_query_results([[picture]]),
        );

        let err = quota
            .check_upload(
                &uploader(20, 100.0),
                &target_group(100, 500.0),
                ItemKind::Picture,
                12_000_000,
            )
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Maximum allowed file size for item-type 'Picture' is 10.000 MB"
        );

        quota
            .check_upload(
                &uploader(20, 100.0),
                &target_group(100, 500.0),
                ItemKind::Picture,
                9_000_000,
            )
            .await
            .unwrap();
    }
}
