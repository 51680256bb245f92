//! Location paths into the catalog.
//!
//! An item carries two paths of the same shape: where it is sold
//! ([`ItemLocation`]) and where it is stored ([`StorageLocation`]). Unset
//! levels are empty strings, matching the stored document layout.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// One of the three catalog levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationLevel {
    Main,
    Sub,
    Final,
}

impl LocationLevel {
    pub const ALL: [LocationLevel; 3] =
        [LocationLevel::Main, LocationLevel::Sub, LocationLevel::Final];

    /// Zero-based depth in the catalog.
    pub fn depth(&self) -> usize {
        match self {
            LocationLevel::Main => 0,
            LocationLevel::Sub => 1,
            LocationLevel::Final => 2,
        }
    }
}

impl fmt::Display for LocationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationLevel::Main => write!(f, "main"),
            LocationLevel::Sub => write!(f, "sub"),
            LocationLevel::Final => write!(f, "final"),
        }
    }
}

/// A main/sub/final path into the location catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocationPath {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub main: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub sub: String,
    #[serde(rename = "final", default, deserialize_with = "null_as_empty")]
    pub final_: String,
}

/// Where an item is sold.
pub type ItemLocation = LocationPath;

impl LocationPath {
    pub fn new(main: &str, sub: &str, final_: &str) -> Self {
        Self {
            main: main.to_string(),
            sub: sub.to_string(),
            final_: final_.to_string(),
        }
    }

    pub fn main_only(main: &str) -> Self {
        Self::new(main, "", "")
    }

    /// Build from up to three segments; missing segments stay empty.
    pub fn from_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let part = |i: usize| segments.get(i).map(|s| s.as_ref()).unwrap_or("");
        Self::new(part(0), part(1), part(2))
    }

    pub fn get(&self, level: LocationLevel) -> &str {
        match level {
            LocationLevel::Main => &self.main,
            LocationLevel::Sub => &self.sub,
            LocationLevel::Final => &self.final_,
        }
    }

    /// Set one level and clear every level below it.
    ///
    /// Picking a new main clears sub and final; picking a new sub clears final.
    pub fn select(&mut self, level: LocationLevel, value: &str) {
        match level {
            LocationLevel::Main => {
                self.main = value.to_string();
                self.sub.clear();
                self.final_.clear();
            }
            LocationLevel::Sub => {
                self.sub = value.to_string();
                self.final_.clear();
            }
            LocationLevel::Final => {
                self.final_ = value.to_string();
            }
        }
    }

    /// Non-empty levels, in order from main down.
    pub fn segments(&self) -> Vec<&str> {
        [self.main.as_str(), self.sub.as_str(), self.final_.as_str()]
            .into_iter()
            .take_while(|s| !s.is_empty())
            .collect()
    }

    pub fn depth(&self) -> usize {
        self.segments().len()
    }

    pub fn is_empty(&self) -> bool {
        self.main.is_empty() && self.sub.is_empty() && self.final_.is_empty()
    }

    /// Whether any level equals `id`, ignoring case.
    pub fn contains_id(&self, id: &str) -> bool {
        let id = id.to_lowercase();
        [&self.main, &self.sub, &self.final_]
            .iter()
            .any(|level| !level.is_empty() && level.to_lowercase() == id)
    }
}

impl fmt::Display for LocationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join(" "))
    }
}

/// Where an item is stored. Same shape as [`LocationPath`], different field names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageLocation {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub storage_main: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub storage_sub: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub storage_final: String,
}

impl StorageLocation {
    pub fn new(main: &str, sub: &str, final_: &str) -> Self {
        Self {
            storage_main: main.to_string(),
            storage_sub: sub.to_string(),
            storage_final: final_.to_string(),
        }
    }

    pub fn as_path(&self) -> LocationPath {
        LocationPath::from(self.clone())
    }

    pub fn is_empty(&self) -> bool {
        self.storage_main.is_empty() && self.storage_sub.is_empty() && self.storage_final.is_empty()
    }
}

impl From<LocationPath> for StorageLocation {
    fn from(path: LocationPath) -> Self {
        Self {
            storage_main: path.main,
            storage_sub: path.sub,
            storage_final: path.final_,
        }
    }
}

impl From<StorageLocation> for LocationPath {
    fn from(storage: StorageLocation) -> Self {
        Self {
            main: storage.storage_main,
            sub: storage.storage_sub,
            final_: storage.storage_final,
        }
    }
}

/// Stored documents may carry `null` for an unset level.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
