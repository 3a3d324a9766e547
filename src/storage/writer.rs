use async_trait::async_trait;

use crate::error::Result;
use crate::storage::dynamodb::Item;

/// Destination of the pipelines: an unconditional overwrite keyed by the
/// item's primary key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemWriter: Send + Sync {
    async fn put_item(&self, item: Item) -> Result<()>;
}

/// Writer used by `--dry-run`: accepts every item, writes nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunWriter;

#[async_trait]
impl ItemWriter for DryRunWriter {
    async fn put_item(&self, item: Item) -> Result<()> {
        tracing::debug!(attributes = item.len(), "Dry run, skipping write");
        Ok(())
    }
}

/// Pick the writer for a run. In dry-run mode the store is never used.
pub fn writer_for(dry_run: bool, store: Box<dyn ItemWriter>) -> Box<dyn ItemWriter> {
    if dry_run {
        Box::new(DryRunWriter)
    } else {
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_dry_run_never_touches_store() {
        let mut store = MockItemWriter::new();
        store.expect_put_item().times(0);

        let writer = writer_for(true, Box::new(store));
        tokio_test::assert_ok!(writer.put_item(HashMap::new()).await);
    }

    #[tokio::test]
    async fn test_live_mode_uses_store() {
        let mut store = MockItemWriter::new();
        store.expect_put_item().times(1).returning(|_| Ok(()));

        let writer = writer_for(false, Box::new(store));
        tokio_test::assert_ok!(writer.put_item(HashMap::new()).await);
    }
}
