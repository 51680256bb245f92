//! Bulk upload of seed items in bounded batches.

use stockroom_core::{Item, ItemStore};

use crate::csv_import::SeedItem;
use crate::error::{Result, SeedError};

/// Largest batch the hosted store accepts in one commit.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub items: usize,
    pub batches: usize,
}

/// Create every seed item under a fresh id, `batch_size` items per write.
///
/// Each batch is all-or-nothing. A failing batch stops the upload; batches
/// already written stay written.
pub fn upload_seed<S>(store: &S, items: Vec<SeedItem>, batch_size: usize) -> Result<UploadReport>
where
    S: ItemStore + ?Sized,
{
    let items: Vec<Item> = items.into_iter().map(SeedItem::into_item).collect();
    upload_items(store, items, batch_size)
}

/// Same as [`upload_seed`] for fully formed items, such as generated ones.
pub fn upload_items<S>(store: &S, items: Vec<Item>, batch_size: usize) -> Result<UploadReport>
where
    S: ItemStore + ?Sized,
{
    if batch_size == 0 {
        return Err(SeedError::InvalidOption(
            "batch size must be positive".to_string(),
        ));
    }

    let mut report = UploadReport::default();
    let mut pending = items.into_iter().peekable();
    while pending.peek().is_some() {
        let batch: Vec<Item> = pending.by_ref().take(batch_size).collect();
        let len = batch.len();
        if let Err(e) = store.upsert_batch(batch) {
            tracing::error!(error = %e, batch = report.batches + 1, "batch upload failed");
            return Err(e.into());
        }
        report.items += len;
        report.batches += 1;
        tracing::debug!(batch = report.batches, len, "uploaded batch");
    }

    tracing::info!(items = report.items, batches = report.batches, "upload complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_core::{LocationPath, MemoryItemStore, StoreError};

    fn seeds(n: usize) -> Vec<SeedItem> {
        (0..n)
            .map(|i| SeedItem {
                name: format!("item-{}", i),
                location: LocationPath::main_only("sales"),
            })
            .collect()
    }

    #[test]
    fn test_batches_of_at_most_batch_size() {
        let store = MemoryItemStore::new();
        let sub = store.subscribe().unwrap();
        sub.recv().unwrap();

        let report = upload_seed(&store, seeds(1203), DEFAULT_BATCH_SIZE).unwrap();
        assert_eq!(report, UploadReport { items: 1203, batches: 3 });
        assert_eq!(store.list().unwrap().len(), 1203);

        let sizes: Vec<usize> = std::iter::from_fn(|| sub.try_recv().unwrap())
            .map(|s| s.items.len())
            .collect();
        assert_eq!(sizes, vec![500, 1000, 1203]);
    }

    #[test]
    fn test_every_item_gets_an_id() {
        let store = MemoryItemStore::new();
        upload_seed(&store, seeds(3), 2).unwrap();
        let items = store.list().unwrap();
        assert!(items.iter().all(|i| !i.id.is_empty() && !i.low_stock));
    }

    #[test]
    fn test_failure_stops_upload() {
        let store = MemoryItemStore::new();
        store.fail_next_write("quota");
        let err = upload_seed(&store, seeds(3), 2).unwrap_err();
        assert!(matches!(err, SeedError::Store(StoreError::Storage(_))));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_empty_input_and_zero_batch() {
        let store = MemoryItemStore::new();
        assert_eq!(upload_seed(&store, Vec::new(), 10).unwrap(), UploadReport::default());
        assert!(upload_seed(&store, seeds(1), 0).is_err());
    }
}
