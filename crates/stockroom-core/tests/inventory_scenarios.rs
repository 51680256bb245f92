//! End-to-end inventory scenarios over the in-memory store

mod common;

use std::time::Duration;

use common::{fixed_now, inventory, new_item};
use stockroom_core::{
    DeleteOutcome, EditorState, InventoryView, ItemStore, LocationEditor, LocationLevel,
    LocationTarget, StatusKind, StorageLocation,
};

#[test]
fn test_created_item_appears_in_live_list() {
    let inv = inventory();
    let sub = inv.subscribe().unwrap();
    assert!(sub.recv().unwrap().items.is_empty());

    let id = inv.add_item(new_item("Aspirin", "sales", "", "")).unwrap();
    assert!(!id.is_empty());

    let snapshot = sub.recv().unwrap();
    let item = snapshot.get(&id).unwrap();
    assert_eq!(item.name, "Aspirin");
    assert_eq!(item.location.main, "sales");
    assert!(!item.low_stock);
    assert!(!item.order_placed);
}

#[test]
fn test_status_toggle_round_trip() {
    let inv = inventory();
    let id = inv.add_item(new_item("Aspirin", "sales", "red", "red-1")).unwrap();

    let item = inv.set_status(&id, StatusKind::LowStock, true).unwrap();
    assert_eq!(item.low_stock_time, Some(fixed_now()));
    let json = serde_json::to_value(&item).unwrap();
    assert!(json["lowStockTime"].as_str().unwrap().starts_with("2024-06-01T09:15:00"));

    let item = inv.set_status(&id, StatusKind::LowStock, false).unwrap();
    let json = serde_json::to_value(&item).unwrap();
    assert!(json["lowStockTime"].is_null());
}

#[test]
fn test_declined_delete_issues_no_store_call() {
    let inv = inventory();
    let id = inv.add_item(new_item("Aspirin", "sales", "", "")).unwrap();
    let sub = inv.subscribe().unwrap();
    let before = sub.recv().unwrap().version;

    let outcome = inv.delete_with_confirmation(&id, &|_: &str| false).unwrap();
    assert_eq!(outcome, DeleteOutcome::Cancelled);
    assert_eq!(sub.recv_timeout(Duration::from_millis(20)).unwrap(), None);
    assert_eq!(inv.snapshot().unwrap().version, before);
    assert_eq!(inv.store().list().unwrap().len(), 1);
}

#[test]
fn test_location_editor_commits_through_inventory() {
    let inv = inventory();
    let id = inv.add_item(new_item("Bandage", "sales", "red", "red-a")).unwrap();
    let item = inv.get(&id).unwrap();

    let mut editor = LocationEditor::new(inv.catalog().clone());
    editor.open(&item).unwrap();
    editor
        .select(LocationTarget::Sales, LocationLevel::Main, "preparation")
        .unwrap();
    editor
        .select(LocationTarget::Sales, LocationLevel::Sub, "right")
        .unwrap();
    editor
        .select(LocationTarget::Sales, LocationLevel::Final, "rb")
        .unwrap();
    editor
        .select(LocationTarget::Storage, LocationLevel::Main, "storage")
        .unwrap();
    editor
        .select(LocationTarget::Storage, LocationLevel::Sub, "sd")
        .unwrap();
    let change = editor.save().unwrap();
    let updated = inv.apply_location_change(change).unwrap();
    editor.close();

    assert_eq!(editor.state(), EditorState::Closed);
    assert_eq!(updated.location.to_string(), "preparation right rb");
    assert_eq!(updated.storage_location, StorageLocation::new("storage", "sd", ""));
    inv.catalog().validate(&updated.location).unwrap();
}

#[test]
fn test_swap_twice_restores_locations() {
    let inv = inventory();
    let mut new = new_item("Gauze", "sales", "dp", "dpc");
    new.storage_location = StorageLocation::new("storage", "sl", "");
    let id = inv.add_item(new).unwrap();
    let original = inv.get(&id).unwrap();

    let swapped = inv.swap_locations(&id).unwrap();
    assert_eq!(swapped.location.main, "storage");
    assert_eq!(swapped.storage_location.storage_final, "dpc");

    let restored = inv.swap_locations(&id).unwrap();
    assert_eq!(restored.location, original.location);
    assert_eq!(restored.storage_location, original.storage_location);
}

#[test]
fn test_view_follows_subscription() {
    let inv = inventory();
    let sub = inv.subscribe().unwrap();
    let mut view = InventoryView::new();
    view.apply_snapshot(sub.recv().unwrap());

    inv.add_item(new_item("Aspirin", "sales", "red", "")).unwrap();
    inv.add_item(new_item("Ibuprofen", "preparation", "left", "la")).unwrap();
    view.apply_snapshot(sub.latest().unwrap());

    view.select_section("preparation");
    let names: Vec<_> = view.visible_items().map(|i| i.name.clone()).collect();
    assert_eq!(names, vec!["Ibuprofen"]);

    view.search("asp");
    assert_eq!(view.highlighted_location(), Some("sales"));
}

#[test]
fn test_memo_update_and_clear() {
    let inv = inventory();
    let id = inv.add_item(new_item("Aspirin", "sales", "", "")).unwrap();
    let item = inv.update_memo(&id, "유통기한 확인").unwrap();
    assert_eq!(item.memo.as_deref(), Some("유통기한 확인"));
    let item = inv.update_memo(&id, "  ").unwrap();
    assert!(item.memo.is_none());
}
