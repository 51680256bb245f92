//! Per-view UI state: the latest snapshot plus filter and highlight.

use serde::{Deserialize, Serialize};

use crate::item::{Item, StatusKind};
use crate::store::Snapshot;

/// Which items the list shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    /// Items whose sales location has this id at any level.
    Section(String),
    /// Whitespace-separated terms, all of which must appear in the name.
    Search(String),
}

impl Filter {
    pub fn matches(&self, item: &Item) -> bool {
        match self {
            Filter::All => true,
            Filter::Section(section) => item.location.contains_id(section),
            Filter::Search(term) => matches_search(&item.name, term),
        }
    }
}

/// Case-insensitive match of every whitespace-separated term in `term`.
pub fn matches_search(name: &str, term: &str) -> bool {
    let name = name.to_lowercase();
    term.to_lowercase()
        .split_whitespace()
        .all(|t| name.contains(t))
}

#[derive(Debug, Clone, Default)]
pub struct InventoryView {
    snapshot: Snapshot,
    filter: Filter,
    visible: Vec<usize>,
    highlighted_location: Option<String>,
}

impl InventoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace local state with `snapshot`. Local edits are discarded.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshot = snapshot;
        self.refilter();
    }

    /// Optimistically show a local change until the next snapshot arrives.
    pub fn apply_local(&mut self, item: Item) {
        match self.snapshot.items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.snapshot.items.push(item),
        }
        self.refilter();
    }

    pub fn version(&self) -> u64 {
        self.snapshot.version
    }

    pub fn items(&self) -> &[Item] {
        &self.snapshot.items
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.refilter();
    }

    /// Show one section and drop any search highlight.
    pub fn select_section(&mut self, section: &str) {
        self.highlighted_location = None;
        self.set_filter(Filter::Section(section.to_string()));
    }

    /// Search by name and highlight the first hit's main location.
    pub fn search(&mut self, term: &str) {
        self.set_filter(Filter::Search(term.to_string()));
        let first = self
            .visible_items()
            .next()
            .map(|item| item.location.main.clone())
            .filter(|main| !main.is_empty());
        self.highlighted_location = first;
    }

    pub fn clear_filter(&mut self) {
        self.highlighted_location = None;
        self.set_filter(Filter::All);
    }

    pub fn highlighted_location(&self) -> Option<&str> {
        self.highlighted_location.as_deref()
    }

    pub fn visible_items(&self) -> impl Iterator<Item = &Item> {
        self.visible.iter().map(|&i| &self.snapshot.items[i])
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn low_stock_items(&self) -> Vec<&Item> {
        self.with_status(StatusKind::LowStock)
    }

    pub fn order_placed_items(&self) -> Vec<&Item> {
        self.with_status(StatusKind::OrderPlaced)
    }

    fn with_status(&self, kind: StatusKind) -> Vec<&Item> {
        self.snapshot
            .items
            .iter()
            .filter(|item| item.status(kind))
            .collect()
    }

    fn refilter(&mut self) {
        self.visible = self
            .snapshot
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filter.matches(item))
            .map(|(i, _)| i)
            .collect();
    }
}
