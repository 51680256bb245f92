//! CSV → JSON → store → migration, on disk
#![cfg(feature = "sqlite")]

use std::fs::File;

use serde_json::json;
use stockroom_core::{ItemStore, LocationCatalog, LocationPath, SqliteItemStore};
use stockroom_seed::{
    convert, migrate_store, read_json, upload_seed, write_json, DEFAULT_BATCH_SIZE,
};

const EXPORT: &str = "\u{feff}상품명,위치명
Bandage,sales red a
Aspirin,preparation left la
Gauze,storage ss
";

#[test]
fn test_csv_to_store() {
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("data.csv");
    let json_path = dir.path().join("inventory_data.json");
    std::fs::write(&csv_path, EXPORT).unwrap();

    let items = convert(File::open(&csv_path).unwrap()).unwrap();
    assert_eq!(items[0].name, "Bandage");
    assert_eq!(items[0].location, LocationPath::new("sales", "red", "a"));
    write_json(&items, File::create(&json_path).unwrap()).unwrap();

    let loaded = read_json(File::open(&json_path).unwrap()).unwrap();
    assert_eq!(loaded, items);

    let store = SqliteItemStore::open(&dir.path().join("items.db")).unwrap();
    let report = upload_seed(&store, loaded, DEFAULT_BATCH_SIZE).unwrap();
    assert_eq!(report.items, 3);
    assert_eq!(report.batches, 1);

    let stored = store.list().unwrap();
    assert_eq!(stored.len(), 3);
    assert!(stored.iter().all(|i| !i.id.is_empty() && i.status_consistent()));

    // "a" is not a final under red; imported paths are stored as written.
    let catalog = LocationCatalog::builtin();
    assert!(catalog.validate(&stored[0].location).is_err());
    assert!(catalog.validate(&stored[1].location).is_ok());
}

#[test]
fn test_migrate_legacy_documents() {
    let store = SqliteItemStore::open_in_memory().unwrap();
    let seeds = read_json(
        r#"[{"name":"A","location":{"main":"sales","sub":"","final":""}},
            {"name":"B","location":{"main":"storage","sub":"ss","final":""}}]"#
            .as_bytes(),
    )
    .unwrap();
    upload_seed(&store, seeds, DEFAULT_BATCH_SIZE).unwrap();
    let ids: Vec<String> = store.list().unwrap().into_iter().map(|i| i.id).collect();

    store
        .replace_documents(vec![(
            ids[0].clone(),
            json!({"name": "A", "location": {"0": "s", "1": "a", "main": "sales"}}),
        )])
        .unwrap();

    assert_eq!(migrate_store(&store).unwrap(), 1);
    assert_eq!(migrate_store(&store).unwrap(), 0);

    let docs = store.raw_documents().unwrap();
    let migrated = &docs.iter().find(|(id, _)| *id == ids[0]).unwrap().1;
    assert_eq!(
        migrated["location"],
        json!({"main": "sales", "sub": "", "final": ""})
    );
    assert_eq!(store.get(&ids[0]).unwrap().unwrap().name, "A");
}
