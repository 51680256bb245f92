//! One-time rewrite of legacy location documents.
//!
//! Early documents stored `location` with numeric keys (`"0"`, `"1"`, ...)
//! left over from an array, sometimes next to partial `main/sub/final`
//! fields. Normalized documents carry exactly `main`, `sub` and `final`
//! as strings, with `""` for an unset level.

use serde_json::{Map, Value};
use stockroom_core::ItemId;

/// Legacy array-index keys that are dropped from `location`.
const NUMERIC_KEYS: [&str; 7] = ["0", "1", "2", "3", "4", "5", "6"];
const LEVEL_KEYS: [&str; 3] = ["main", "sub", "final"];

/// Normalize the `location` object of one item document in place.
///
/// Documents whose `location` is missing or not an object are left alone.
/// Returns whether anything changed.
pub fn normalize_location(doc: &mut Value) -> bool {
    let Some(location) = doc.get_mut("location").and_then(Value::as_object_mut) else {
        return false;
    };

    let mut changed = false;
    for key in NUMERIC_KEYS {
        changed |= location.remove(key).is_some();
    }
    for key in LEVEL_KEYS {
        changed |= normalize_level(location, key);
    }
    changed
}

fn normalize_level(location: &mut Map<String, Value>, key: &str) -> bool {
    let normalized = match location.get(key) {
        Some(Value::String(_)) => return false,
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    };
    location.insert(key.to_string(), Value::String(normalized));
    true
}

/// Normalize every document and return only the ones that changed.
pub fn migrate_documents(docs: Vec<(ItemId, Value)>) -> Vec<(ItemId, Value)> {
    docs.into_iter()
        .filter_map(|(id, mut doc)| normalize_location(&mut doc).then_some((id, doc)))
        .collect()
}

/// Rewrite every legacy document in the store in one batch.
///
/// Returns the number of documents rewritten.
#[cfg(feature = "sqlite")]
pub fn migrate_store(store: &stockroom_core::SqliteItemStore) -> crate::error::Result<usize> {
    let docs = store.raw_documents()?;
    let total = docs.len();
    let changed = migrate_documents(docs);
    if changed.is_empty() {
        tracing::info!(total, "no documents need migration");
        return Ok(0);
    }
    let count = store.replace_documents(changed)?;
    tracing::info!(total, migrated = count, "migrated location documents");
    Ok(count)
}
