use std::fmt;

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::location::{ItemLocation, StorageLocation};

/// Store-assigned item identifier. Empty until the item is first written.
pub type ItemId = String;

/// The two operational status flags an item carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusKind {
    LowStock,
    OrderPlaced,
}

impl StatusKind {
    pub const ALL: [StatusKind; 2] = [StatusKind::LowStock, StatusKind::OrderPlaced];

    /// Label shown next to the checkbox.
    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::LowStock => "부족",
            StatusKind::OrderPlaced => "주문완료",
        }
    }

    /// Parse the wire name or a short alias.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "lowstock" | "low-stock" | "low_stock" | "low" => Some(StatusKind::LowStock),
            "orderplaced" | "order-placed" | "order_placed" | "ordered" => {
                Some(StatusKind::OrderPlaced)
            }
            _ => None,
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusKind::LowStock => write!(f, "lowStock"),
            StatusKind::OrderPlaced => write!(f, "orderPlaced"),
        }
    }
}

/// A tracked inventory item.
///
/// Invariant: `low_stock_time.is_some() == low_stock`, and likewise for
/// `order_placed_time`. Decoding is lenient so older documents load; call
/// [`Item::normalize_status`] to repair a document that breaks the invariant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: ItemId,
    pub name: String,
    #[serde(default)]
    pub location: ItemLocation,
    #[serde(default)]
    pub storage_location: StorageLocation,
    #[serde(default, deserialize_with = "null_as_false")]
    pub low_stock: bool,
    #[serde(default, deserialize_with = "null_as_false")]
    pub order_placed: bool,
    #[serde(default)]
    pub low_stock_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order_placed_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
}

/// Fields a user supplies when creating an item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub location: ItemLocation,
    #[serde(default)]
    pub storage_location: StorageLocation,
}

impl Item {
    /// A fresh item with both flags cleared and no id yet.
    pub fn from_new(new: NewItem) -> Self {
        Self {
            id: ItemId::new(),
            name: new.name,
            location: new.location,
            storage_location: new.storage_location,
            low_stock: false,
            order_placed: false,
            low_stock_time: None,
            order_placed_time: None,
            memo: None,
        }
    }

    pub fn status(&self, kind: StatusKind) -> bool {
        match kind {
            StatusKind::LowStock => self.low_stock,
            StatusKind::OrderPlaced => self.order_placed,
        }
    }

    pub fn status_time(&self, kind: StatusKind) -> Option<DateTime<Utc>> {
        match kind {
            StatusKind::LowStock => self.low_stock_time,
            StatusKind::OrderPlaced => self.order_placed_time,
        }
    }

    /// Set a flag and its paired timestamp together.
    ///
    /// A transition to `true` stamps `now`; setting an already-set flag keeps
    /// its original time. Clearing a flag clears its time.
    pub fn set_status(&mut self, kind: StatusKind, value: bool, now: DateTime<Utc>) {
        let (flag, time) = match kind {
            StatusKind::LowStock => (&mut self.low_stock, &mut self.low_stock_time),
            StatusKind::OrderPlaced => (&mut self.order_placed, &mut self.order_placed_time),
        };
        if value {
            if !*flag || time.is_none() {
                *time = Some(now);
            }
        } else {
            *time = None;
        }
        *flag = value;
    }

    /// Whether both flag/time pairs agree.
    pub fn status_consistent(&self) -> bool {
        self.low_stock == self.low_stock_time.is_some()
            && self.order_placed == self.order_placed_time.is_some()
    }

    /// Repair flag/time pairs that disagree. Returns true if anything changed.
    pub fn normalize_status(&mut self, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        for kind in StatusKind::ALL {
            let flag = self.status(kind);
            if flag != self.status_time(kind).is_some() {
                self.set_status(kind, flag, now);
                changed = true;
            }
        }
        changed
    }

    /// Exchange the sales and storage locations, level by level.
    ///
    /// The result is not checked against the catalog.
    pub fn swap_locations(&mut self) {
        let sales = std::mem::take(&mut self.location);
        let storage = std::mem::take(&mut self.storage_location);
        self.location = storage.into();
        self.storage_location = sales.into();
    }

    /// Set the memo; blank text removes it.
    pub fn set_memo(&mut self, memo: &str) {
        let memo = memo.trim();
        self.memo = if memo.is_empty() {
            None
        } else {
            Some(memo.to_string())
        };
    }

    /// First `max_chars` characters of the memo, with an ellipsis when cut.
    pub fn memo_preview(&self, max_chars: usize) -> Option<String> {
        let memo = self.memo.as_deref()?;
        if memo.chars().count() <= max_chars {
            return Some(memo.to_string());
        }
        let cut: String = memo.chars().take(max_chars).collect();
        Some(format!("{}...", cut))
    }
}

/// Format a status time as `YY-MM-DD HH:MM` in local time.
pub fn format_status_time(time: &DateTime<Utc>) -> String {
    time.with_timezone(&Local).format("%y-%m-%d %H:%M").to_string()
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
