//! Run orchestration: reader → transformer → writer, one record at a time.

use futures::{Stream, StreamExt};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::{EtlError, Result};
use crate::source::{SeedRecord, UserRow, UserSource};
use crate::storage::dynamodb::item_from_json;
use crate::storage::{to_user_item, ItemWriter, RoleCache};

/// Progress is logged every this many migrated users
pub const PROGRESS_INTERVAL: u64 = 100;

/// Per-run tallies
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    pub succeeded: u64,
    pub failed: u64,
}

impl RunStats {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }

    pub fn log_summary(&self, title: &str) {
        info!("{}", "=".repeat(60));
        info!("{title}");
        info!("{}", "=".repeat(60));
        info!(total = self.total(), "Total processed: {}", self.total());
        info!(succeeded = self.succeeded, "Succeeded: {}", self.succeeded);
        if self.failed > 0 {
            warn!(failed = self.failed, "Failed: {}", self.failed);
        } else {
            info!(failed = 0, "Failed: 0");
        }
    }
}

/// Migrate every row of `rows`.
///
/// Record-level errors are logged and counted; any other error from the
/// stream ends the run.
pub async fn migrate_users<S>(
    mut rows: S,
    roles: &RoleCache,
    writer: &dyn ItemWriter,
) -> Result<RunStats>
where
    S: Stream<Item = Result<UserRow>> + Unpin,
{
    let mut stats = RunStats::default();

    while let Some(next) = rows.next().await {
        let outcome = match next {
            Ok(row) => migrate_one(&row, roles, writer).await.map_err(|err| (row.id, err)),
            Err(err) if err.is_record_level() => Err((record_of(&err), err)),
            Err(err) => return Err(err),
        };

        match outcome {
            Ok(()) => {
                stats.succeeded += 1;
                if stats.succeeded % PROGRESS_INTERVAL == 0 {
                    info!("Migrated {} users...", stats.succeeded);
                }
            }
            Err((user_id, err)) => {
                stats.failed += 1;
                error!(user_id = %user_id, error = %err, "Error migrating user {user_id}");
            }
        }
    }

    Ok(stats)
}

async fn migrate_one(row: &UserRow, roles: &RoleCache, writer: &dyn ItemWriter) -> Result<()> {
    let item = to_user_item(row, roles)?.to_item()?;
    writer.put_item(item).await
}

fn record_of(err: &EtlError) -> String {
    match err {
        EtlError::DataShape { record, .. } => record.clone(),
        _ => "<unknown>".to_string(),
    }
}

/// Full migration against an open source connection.
///
/// The connection is closed once the run is over, whatever its outcome.
pub async fn run_migration(mut source: UserSource, writer: &dyn ItemWriter) -> Result<RunStats> {
    let outcome = migrate_from(&mut source, writer).await;
    source.close().await;
    outcome
}

async fn migrate_from(source: &mut UserSource, writer: &dyn ItemWriter) -> Result<RunStats> {
    info!("Building role cache...");
    let roles = RoleCache::from_source(source.role_rows().await);

    info!("Migrating users...");
    let total = source.count_users().await?;
    info!(total, "Found {total} users to migrate");

    migrate_users(source.users(), &roles, writer).await
}

/// Insert every seed entry as is
pub async fn seed_users(entries: Vec<Value>, writer: &dyn ItemWriter) -> RunStats {
    let mut stats = RunStats::default();

    for (position, entry) in entries.into_iter().enumerate() {
        let record = match SeedRecord::from_value(position, entry) {
            Ok(record) => record,
            Err(err) => {
                stats.failed += 1;
                error!(record = %record_of(&err), error = %err, "Skipping seed entry");
                continue;
            }
        };

        match writer.put_item(item_from_json(record.item)).await {
            Ok(()) => {
                stats.succeeded += 1;
                info!(
                    username = %record.username,
                    "  ✓ Inserted user: {} ({})",
                    record.username,
                    record.email
                );
            }
            Err(err) => {
                stats.failed += 1;
                error!(
                    username = %record.username,
                    error = %err,
                    "  ✗ Failed to insert {}",
                    record.username
                );
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceFlag, SourceTime};
    use crate::storage::writer::{writer_for, MockItemWriter};
    use aws_sdk_dynamodb::types::AttributeValue;
    use chrono::{TimeZone, Utc};
    use futures::stream;
    use serde_json::json;

    fn user(id: u32) -> UserRow {
        let created: SourceTime = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap().into();
        UserRow {
            id: id.to_string(),
            first_name: Some("Ana".to_string()),
            last_name: None,
            email: Some(format!("user{id}@x.com")),
            phone: None,
            profile_image: None,
            password: Some("h".to_string()),
            role_id: Some(3),
            is_active: SourceFlag::Bool(true),
            last_login: None,
            is_verified: SourceFlag::Bool(false),
            token_verification: None,
            token_expiration: None,
            created_at: Some(created.clone()),
            updated_at: Some(created),
        }
    }

    fn user_id_of(item: &crate::storage::Item) -> String {
        match &item["userId"] {
            AttributeValue::S(id) => id.clone(),
            other => panic!("unexpected userId attribute {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_write_failure_does_not_stop_run() {
        let mut writer = MockItemWriter::new();
        writer.expect_put_item().times(3).returning(|item| {
            if user_id_of(&item) == "2" {
                Err(EtlError::Store("ValidationException".into()))
            } else {
                Ok(())
            }
        });

        let rows = stream::iter(vec![Ok(user(1)), Ok(user(2)), Ok(user(3))]);
        let stats = migrate_users(rows, &RoleCache::canonical(), &writer)
            .await
            .unwrap();

        assert_eq!(stats, RunStats { succeeded: 2, failed: 1 });
    }

    #[tokio::test]
    async fn test_malformed_rows_are_counted() {
        let mut writer = MockItemWriter::new();
        writer.expect_put_item().times(1).returning(|_| Ok(()));

        let mut no_created_at = user(2);
        no_created_at.created_at = None;
        let rows = stream::iter(vec![
            Ok(user(1)),
            Ok(no_created_at),
            Err(EtlError::data_shape("3", "column role_id: mismatched types")),
        ]);

        let stats = migrate_users(rows, &RoleCache::canonical(), &writer)
            .await
            .unwrap();
        assert_eq!(stats, RunStats { succeeded: 1, failed: 2 });
    }

    #[tokio::test]
    async fn test_source_failure_aborts_run() {
        let mut writer = MockItemWriter::new();
        writer.expect_put_item().times(1).returning(|_| Ok(()));

        let rows = stream::iter(vec![
            Ok(user(1)),
            Err(EtlError::Source(sqlx::Error::PoolClosed)),
            Ok(user(3)),
        ]);

        let result = migrate_users(rows, &RoleCache::canonical(), &writer).await;
        assert!(matches!(result, Err(EtlError::Source(_))));
    }

    #[tokio::test]
    async fn test_dry_run_counts_without_writing() {
        let mut store = MockItemWriter::new();
        store.expect_put_item().times(0);
        let writer = writer_for(true, Box::new(store));

        let rows = stream::iter((1..=250).map(|id| Ok(user(id))).collect::<Vec<_>>());
        let stats = migrate_users(rows, &RoleCache::canonical(), writer.as_ref())
            .await
            .unwrap();

        assert_eq!(stats, RunStats { succeeded: 250, failed: 0 });
    }

    #[tokio::test]
    async fn test_same_source_produces_same_items() {
        let mut writer = MockItemWriter::new();
        let written = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = written.clone();
        writer.expect_put_item().times(4).returning(move |item| {
            let mut keys: Vec<_> = item.keys().cloned().collect();
            keys.sort();
            sink.lock().unwrap().push((user_id_of(&item), keys, item));
            Ok(())
        });

        for _ in 0..2 {
            let rows = stream::iter(vec![Ok(user(1)), Ok(user(2))]);
            migrate_users(rows, &RoleCache::canonical(), &writer).await.unwrap();
        }

        let written = written.lock().unwrap();
        assert_eq!(written[0], written[2]);
        assert_eq!(written[1], written[3]);
    }

    #[tokio::test]
    async fn test_seed_entries_pass_through() {
        let mut writer = MockItemWriter::new();
        writer
            .expect_put_item()
            .withf(|item| item.get("level") == Some(&AttributeValue::N("3".to_string())))
            .times(1)
            .returning(|_| Ok(()));

        let entries = vec![
            json!({"userId": "u-1", "username": "ana", "email": "ana@x.com", "level": 3}),
            json!({"userId": "u-2", "email": "no-username@x.com"}),
        ];

        let stats = seed_users(entries, &writer).await;
        assert_eq!(stats, RunStats { succeeded: 1, failed: 1 });
        assert_eq!(stats.total(), 2);
    }

    #[tokio::test]
    async fn test_seed_write_failure_is_counted() {
        let mut writer = MockItemWriter::new();
        writer
            .expect_put_item()
            .times(2)
            .returning(|_| Err(EtlError::Store("ProvisionedThroughputExceededException".into())));

        let entries = vec![
            json!({"userId": "u-1", "username": "ana", "email": "ana@x.com"}),
            json!({"userId": "u-2", "username": "bob", "email": "bob@x.com"}),
        ];

        let stats = seed_users(entries, &writer).await;
        assert_eq!(stats, RunStats { succeeded: 0, failed: 2 });
    }
}
