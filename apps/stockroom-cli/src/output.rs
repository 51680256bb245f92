//! Plain-text rendering of items and snapshots

use stockroom_core::{format_status_time, Item, LocationCatalog, StatusKind};

const MEMO_PREVIEW_CHARS: usize = 10;

/// One line per item: id, name, both locations, flags and memo preview.
pub fn item_line(catalog: &LocationCatalog, item: &Item) -> String {
    let mut line = format!(
        "{}  {}  [{}]",
        item.id,
        item.name,
        catalog.display_path(&item.location)
    );
    if !item.storage_location.is_empty() {
        line.push_str(&format!(
            "  storage [{}]",
            catalog.display_path(&item.storage_location.as_path())
        ));
    }
    for kind in StatusKind::ALL {
        if let Some(time) = item.status_time(kind).filter(|_| item.status(kind)) {
            line.push_str(&format!("  {}({})", kind.label(), format_status_time(&time)));
        }
    }
    if let Some(memo) = item.memo_preview(MEMO_PREVIEW_CHARS) {
        line.push_str(&format!("  memo: {}", memo));
    }
    line
}

pub fn print_items<'a>(catalog: &LocationCatalog, items: impl IntoIterator<Item = &'a Item>) {
    let mut count = 0;
    for item in items {
        println!("{}", item_line(catalog, item));
        count += 1;
    }
    println!("{} item(s)", count);
}
