//! Static location catalog.
//!
//! A forest of at most three levels (main → sub → final). Node ids are unique
//! among siblings only, so id lookups walk the whole forest depth-first.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::location::{LocationLevel, LocationPath};

/// Maximum nesting depth of the catalog (main, sub, final).
pub const MAX_DEPTH: usize = 3;

/// One physical location and its optional children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationNode {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<LocationNode>,
}

impl LocationNode {
    /// A node without children.
    pub fn leaf(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            children: Vec::new(),
        }
    }

    /// A node with children.
    pub fn branch(id: &str, name: &str, children: Vec<LocationNode>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            children,
        }
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Direct child with the given id.
    pub fn child(&self, id: &str) -> Option<&LocationNode> {
        self.children.iter().find(|c| c.id == id)
    }
}

/// Errors building a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Location node at depth {depth} has an empty id")]
    EmptyId { depth: usize },

    #[error("Duplicate location id '{id}' among siblings under '{parent}'")]
    DuplicateSibling { parent: String, id: String },

    #[error("Location '{id}' exceeds the maximum depth of {MAX_DEPTH}")]
    TooDeep { id: String },

    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors validating a location path against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocationError {
    #[error("Main location is required")]
    MissingMain,

    #[error("Unknown {level} location '{id}'")]
    Unknown { level: LocationLevel, id: String },

    #[error("'{parent}' has no sub-locations, but {level} '{id}' was given")]
    NoChildren {
        parent: String,
        level: LocationLevel,
        id: String,
    },

    #[error("Final location '{final_id}' given without a sub location")]
    FinalWithoutSub { final_id: String },
}

/// The immutable location tree used for validation and pickers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationCatalog {
    roots: Vec<LocationNode>,
}

impl LocationCatalog {
    /// Build a catalog from root nodes, checking depth and sibling uniqueness.
    pub fn from_nodes(roots: Vec<LocationNode>) -> Result<Self, CatalogError> {
        check_level(&roots, "<root>", 1)?;
        Ok(Self { roots })
    }

    /// Parse a JSON array of location nodes.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let roots: Vec<LocationNode> = serde_json::from_str(json)?;
        Self::from_nodes(roots)
    }

    /// Load a catalog file (JSON array of nodes).
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize back to the JSON layout accepted by [`LocationCatalog::from_json`].
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.roots)
    }

    /// The default store layout: sales floor, storage yard, preparation room.
    pub fn builtin() -> Self {
        let finals = |ids: &[(&str, &str)]| -> Vec<LocationNode> {
            ids.iter().map(|(id, name)| LocationNode::leaf(id, name)).collect()
        };

        let sales = LocationNode::branch(
            "sales",
            "판매구역",
            vec![
                LocationNode::branch(
                    "red",
                    "Red-",
                    finals(&[
                        ("red-a", "red-a"),
                        ("red-b", "red-b"),
                        ("red-1", "1"),
                        ("red-2", "2"),
                        ("red-3", "3"),
                        ("red-4", "4"),
                        ("red-5", "5"),
                    ]),
                ),
                LocationNode::branch(
                    "blue",
                    "Blue-",
                    finals(&[
                        ("blue-a", "blue-a"),
                        ("blue-b", "blue-B"),
                        ("blue-1", "1"),
                        ("blue-2", "2"),
                    ]),
                ),
                LocationNode::leaf("green", "Green-"),
                LocationNode::branch(
                    "dp",
                    "DP",
                    finals(&[
                        ("dpa", "DPA"),
                        ("dpb", "DPB"),
                        ("dpc", "DPC"),
                        ("dpd", "DPD"),
                        ("dpe", "DPE"),
                        ("dpf", "DPF"),
                        ("dpg", "DPG"),
                    ]),
                ),
                LocationNode::branch(
                    "other",
                    "그외",
                    finals(&[
                        ("refrigerator", "냉장고"),
                        ("warm-storage", "온장고"),
                        ("rack", "랙"),
                        ("under-chair", "의자밑"),
                        ("band-stand", "밴드매대"),
                    ]),
                ),
            ],
        );

        let storage = LocationNode::branch(
            "storage",
            "집하장",
            finals(&[
                ("ss", "SS (저장소)"),
                ("sr", "SR (Right)"),
                ("sm", "SM (Middle)"),
                ("sl", "SL (Left)"),
                ("sd", "SD"),
            ]),
        );

        let preparation = LocationNode::branch(
            "preparation",
            "조제실",
            vec![
                LocationNode::branch(
                    "left",
                    "L",
                    finals(&[("la", "LA"), ("lb", "LB"), ("lc", "LC")]),
                ),
                LocationNode::branch("middle", "M", finals(&[("ma", "MA"), ("mb", "MB")])),
                LocationNode::branch(
                    "right",
                    "R",
                    finals(&[("ra", "RA"), ("rb", "RB"), ("rc", "RC")]),
                ),
                LocationNode::leaf("ins", "INS"),
                LocationNode::leaf("n-0-9", "N (0-9)"),
            ],
        );

        Self {
            roots: vec![sales, storage, preparation],
        }
    }

    pub fn roots(&self) -> &[LocationNode] {
        &self.roots
    }

    /// Walk the tree by id, one path segment per level.
    pub fn resolve(&self, path: &[&str]) -> Option<&LocationNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.roots.iter().find(|n| n.id == *first)?;
        for segment in rest {
            node = node.child(segment)?;
        }
        Some(node)
    }

    /// Depth-first, pre-order search by id across the whole forest.
    ///
    /// Returns the first match in sibling order when an id repeats under
    /// different parents.
    pub fn find(&self, id: &str) -> Option<&LocationNode> {
        let mut stack: Vec<&LocationNode> = self.roots.iter().rev().collect();
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// Children of the first node with this id, or an empty slice.
    pub fn children_of(&self, node_id: &str) -> &[LocationNode] {
        self.find(node_id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Picker options for the main level.
    pub fn main_options(&self) -> &[LocationNode] {
        &self.roots
    }

    /// Picker options for the sub level under `main`.
    pub fn sub_options(&self, main: &str) -> &[LocationNode] {
        self.resolve(&[main]).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Picker options for the final level under `main/sub`.
    pub fn final_options(&self, main: &str, sub: &str) -> &[LocationNode] {
        self.resolve(&[main, sub])
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Options for a given level of a partially filled path.
    pub fn options_for(&self, path: &LocationPath, level: LocationLevel) -> &[LocationNode] {
        match level {
            LocationLevel::Main => self.main_options(),
            LocationLevel::Sub => self.sub_options(&path.main),
            LocationLevel::Final => self.final_options(&path.main, &path.sub),
        }
    }

    /// Check a path against the tree: each set level must be a child of the
    /// level above, and deeper levels may only be set where children exist.
    pub fn validate(&self, path: &LocationPath) -> Result<(), LocationError> {
        if path.main.is_empty() {
            return Err(LocationError::MissingMain);
        }
        let main = self
            .resolve(&[&path.main])
            .ok_or_else(|| LocationError::Unknown {
                level: LocationLevel::Main,
                id: path.main.clone(),
            })?;

        if path.sub.is_empty() {
            if !path.final_.is_empty() {
                return Err(LocationError::FinalWithoutSub {
                    final_id: path.final_.clone(),
                });
            }
            return Ok(());
        }
        if !main.has_children() {
            return Err(LocationError::NoChildren {
                parent: main.id.clone(),
                level: LocationLevel::Sub,
                id: path.sub.clone(),
            });
        }
        let sub = main.child(&path.sub).ok_or_else(|| LocationError::Unknown {
            level: LocationLevel::Sub,
            id: path.sub.clone(),
        })?;

        if path.final_.is_empty() {
            return Ok(());
        }
        if !sub.has_children() {
            return Err(LocationError::NoChildren {
                parent: sub.id.clone(),
                level: LocationLevel::Final,
                id: path.final_.clone(),
            });
        }
        if sub.child(&path.final_).is_none() {
            return Err(LocationError::Unknown {
                level: LocationLevel::Final,
                id: path.final_.clone(),
            });
        }
        Ok(())
    }

    /// Human-readable label, e.g. `판매구역 > Red- > red-a`.
    ///
    /// Segments that do not resolve fall back to their raw id.
    pub fn display_path(&self, path: &LocationPath) -> String {
        let mut labels = Vec::new();
        let mut level = Some(self.roots.as_slice());
        for segment in path.segments() {
            // Once a segment fails to resolve, the rest are shown raw.
            let node = level.and_then(|nodes| nodes.iter().find(|n| n.id == segment));
            labels.push(node.map(|n| n.name.as_str()).unwrap_or(segment));
            level = node.map(|n| n.children.as_slice());
        }
        labels.join(" > ")
    }

    /// Format as a tree string for display.
    pub fn format_tree(&self) -> String {
        let mut output = String::new();
        for root in &self.roots {
            output.push_str(&format!("{} ({})\n", root.name, root.id));
            format_children(&root.children, "", &mut output);
        }
        output
    }
}

impl Default for LocationCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn check_level(nodes: &[LocationNode], parent: &str, depth: usize) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for node in nodes {
        if depth > MAX_DEPTH {
            return Err(CatalogError::TooDeep { id: node.id.clone() });
        }
        if node.id.trim().is_empty() {
            return Err(CatalogError::EmptyId { depth });
        }
        if !seen.insert(node.id.as_str()) {
            return Err(CatalogError::DuplicateSibling {
                parent: parent.to_string(),
                id: node.id.clone(),
            });
        }
        check_level(&node.children, &node.id, depth + 1)?;
    }
    Ok(())
}

fn format_children(children: &[LocationNode], prefix: &str, output: &mut String) {
    for (i, child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{}{}{} ({})\n", prefix, connector, child.name, child.id));
        let child_prefix = if is_last {
            format!("{}    ", prefix)
        } else {
            format!("{}│   ", prefix)
        };
        format_children(&child.children, &child_prefix, output);
    }
}
