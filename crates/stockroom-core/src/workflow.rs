//! Editing workflows: the location-change modal and the add-item form.
//!
//! State transitions of [`LocationEditor`]:
//! ```text
//! Closed → Editing → Saved     → Closed
//!                  ↘ Cancelled → Closed
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{LocationCatalog, LocationError};
use crate::item::{Item, ItemId, NewItem};
use crate::location::{LocationLevel, LocationPath, StorageLocation};

/// Which of an item's two paths a selection applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationTarget {
    Sales,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EditorState {
    Closed,
    Editing,
    Saved,
    Cancelled,
}

impl fmt::Display for EditorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditorState::Closed => write!(f, "CLOSED"),
            EditorState::Editing => write!(f, "EDITING"),
            EditorState::Saved => write!(f, "SAVED"),
            EditorState::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Editor is {actual}, expected {expected}")]
    InvalidState {
        expected: EditorState,
        actual: EditorState,
    },

    #[error("Invalid location: {0}")]
    Location(#[from] LocationError),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

/// The outcome of a saved location edit, ready to commit to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationChange {
    pub item_id: ItemId,
    pub location: LocationPath,
    pub storage_location: StorageLocation,
}

/// Apply a picker selection with catalog checking and cascading reset.
///
/// An empty value is the "nothing selected" placeholder and just clears.
fn select_in(
    catalog: &LocationCatalog,
    path: &mut LocationPath,
    level: LocationLevel,
    value: &str,
) -> Result<(), WorkflowError> {
    if !value.is_empty() && !catalog.options_for(path, level).iter().any(|n| n.id == value) {
        return Err(LocationError::Unknown {
            level,
            id: value.to_string(),
        }
        .into());
    }
    path.select(level, value);
    Ok(())
}

fn validate_pair(
    catalog: &LocationCatalog,
    sales: &LocationPath,
    storage: &LocationPath,
) -> Result<(), WorkflowError> {
    catalog.validate(sales)?;
    if !storage.is_empty() {
        catalog.validate(storage)?;
    }
    Ok(())
}

/// Modal state for changing an item's sales and storage locations.
#[derive(Debug, Clone)]
pub struct LocationEditor {
    catalog: Arc<LocationCatalog>,
    state: EditorState,
    item_id: Option<ItemId>,
    sales: LocationPath,
    storage: LocationPath,
}

impl LocationEditor {
    pub fn new(catalog: Arc<LocationCatalog>) -> Self {
        Self {
            catalog,
            state: EditorState::Closed,
            item_id: None,
            sales: LocationPath::default(),
            storage: LocationPath::default(),
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn item_id(&self) -> Option<&str> {
        self.item_id.as_deref()
    }

    pub fn draft(&self, target: LocationTarget) -> &LocationPath {
        match target {
            LocationTarget::Sales => &self.sales,
            LocationTarget::Storage => &self.storage,
        }
    }

    /// Picker options for one level of one draft.
    pub fn options(&self, target: LocationTarget, level: LocationLevel) -> Vec<(&str, &str)> {
        self.catalog
            .options_for(self.draft(target), level)
            .iter()
            .map(|n| (n.id.as_str(), n.name.as_str()))
            .collect()
    }

    /// Start editing `item`, seeding both drafts from its current paths.
    pub fn open(&mut self, item: &Item) -> Result<(), WorkflowError> {
        if self.state == EditorState::Editing {
            return Err(WorkflowError::InvalidState {
                expected: EditorState::Closed,
                actual: self.state,
            });
        }
        self.item_id = Some(item.id.clone());
        self.sales = item.location.clone();
        self.storage = item.storage_location.as_path();
        self.state = EditorState::Editing;
        Ok(())
    }

    pub fn select(
        &mut self,
        target: LocationTarget,
        level: LocationLevel,
        value: &str,
    ) -> Result<(), WorkflowError> {
        self.require(EditorState::Editing)?;
        let path = match target {
            LocationTarget::Sales => &mut self.sales,
            LocationTarget::Storage => &mut self.storage,
        };
        select_in(&self.catalog, path, level, value)
    }

    /// Validate the drafts and finish the edit.
    pub fn save(&mut self) -> Result<LocationChange, WorkflowError> {
        self.require(EditorState::Editing)?;
        validate_pair(&self.catalog, &self.sales, &self.storage)?;
        let item_id = self.item_id.clone().ok_or(WorkflowError::MissingField("item"))?;
        self.state = EditorState::Saved;
        Ok(LocationChange {
            item_id,
            location: self.sales.clone(),
            storage_location: self.storage.clone().into(),
        })
    }

    /// Return to editing after a save could not be committed.
    pub fn resume(&mut self) -> Result<(), WorkflowError> {
        self.require(EditorState::Saved)?;
        self.state = EditorState::Editing;
        Ok(())
    }

    /// Discard the drafts.
    pub fn cancel(&mut self) -> Result<(), WorkflowError> {
        self.require(EditorState::Editing)?;
        self.state = EditorState::Cancelled;
        Ok(())
    }

    /// Reset to `Closed` from any state.
    pub fn close(&mut self) {
        self.state = EditorState::Closed;
        self.item_id = None;
        self.sales = LocationPath::default();
        self.storage = LocationPath::default();
    }

    fn require(&self, expected: EditorState) -> Result<(), WorkflowError> {
        if self.state != expected {
            return Err(WorkflowError::InvalidState {
                expected,
                actual: self.state,
            });
        }
        Ok(())
    }
}

/// Form state for creating an item.
#[derive(Debug, Clone)]
pub struct AddItemForm {
    catalog: Arc<LocationCatalog>,
    name: String,
    sales: LocationPath,
    storage: LocationPath,
}

impl AddItemForm {
    pub fn new(catalog: Arc<LocationCatalog>) -> Self {
        Self {
            catalog,
            name: String::new(),
            sales: LocationPath::default(),
            storage: LocationPath::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn draft(&self, target: LocationTarget) -> &LocationPath {
        match target {
            LocationTarget::Sales => &self.sales,
            LocationTarget::Storage => &self.storage,
        }
    }

    pub fn select(
        &mut self,
        target: LocationTarget,
        level: LocationLevel,
        value: &str,
    ) -> Result<(), WorkflowError> {
        let path = match target {
            LocationTarget::Sales => &mut self.sales,
            LocationTarget::Storage => &mut self.storage,
        };
        select_in(&self.catalog, path, level, value)
    }

    /// Names of existing items containing the typed name, ignoring case.
    ///
    /// Nothing is suggested until more than one character is typed.
    pub fn similar_items<'a>(&self, existing: &'a [Item]) -> Vec<&'a str> {
        if self.name.chars().count() <= 1 {
            return Vec::new();
        }
        let needle = self.name.to_lowercase();
        existing
            .iter()
            .filter(|i| i.name.to_lowercase().contains(&needle))
            .map(|i| i.name.as_str())
            .collect()
    }

    /// Validate and build the item to create.
    pub fn submit(&self) -> Result<NewItem, WorkflowError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(WorkflowError::MissingField("name"));
        }
        if self.sales.main.is_empty() {
            return Err(WorkflowError::MissingField("location"));
        }
        validate_pair(&self.catalog, &self.sales, &self.storage)?;
        Ok(NewItem {
            name: name.to_string(),
            location: self.sales.clone(),
            storage_location: self.storage.clone().into(),
        })
    }

    pub fn reset(&mut self) {
        self.name.clear();
        self.sales = LocationPath::default();
        self.storage = LocationPath::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Arc<LocationCatalog> {
        Arc::new(LocationCatalog::builtin())
    }

    fn item() -> Item {
        let mut item = Item::from_new(NewItem {
            name: "Aspirin".into(),
            location: LocationPath::new("sales", "red", "red-a"),
            storage_location: StorageLocation::new("storage", "ss", ""),
        });
        item.id = "item-1".into();
        item
    }

    #[test]
    fn editor_starts_closed() {
        let editor = LocationEditor::new(catalog());
        assert_eq!(editor.state(), EditorState::Closed);
        assert!(editor.item_id().is_none());
    }

    #[test]
    fn open_seeds_drafts() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(editor.draft(LocationTarget::Sales).sub, "red");
        assert_eq!(editor.draft(LocationTarget::Storage).main, "storage");
    }

    #[test]
    fn selecting_main_resets_sub_and_final() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        editor
            .select(LocationTarget::Sales, LocationLevel::Main, "preparation")
            .unwrap();
        let draft = editor.draft(LocationTarget::Sales);
        assert_eq!(draft.sub, "");
        assert_eq!(draft.final_, "");
    }

    #[test]
    fn selecting_sub_resets_final() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        editor
            .select(LocationTarget::Sales, LocationLevel::Sub, "blue")
            .unwrap();
        assert_eq!(editor.draft(LocationTarget::Sales), &LocationPath::new("sales", "blue", ""));
    }

    #[test]
    fn select_rejects_values_outside_the_options() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        let err = editor
            .select(LocationTarget::Sales, LocationLevel::Sub, "ss")
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Location(LocationError::Unknown { .. })));
        assert_eq!(editor.draft(LocationTarget::Sales).sub, "red");
    }

    #[test]
    fn options_follow_the_draft() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        assert_eq!(editor.options(LocationTarget::Sales, LocationLevel::Final).len(), 7);
        editor
            .select(LocationTarget::Sales, LocationLevel::Sub, "green")
            .unwrap();
        assert!(editor.options(LocationTarget::Sales, LocationLevel::Final).is_empty());
    }

    #[test]
    fn save_produces_change_and_closes() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        editor
            .select(LocationTarget::Storage, LocationLevel::Sub, "sm")
            .unwrap();
        let change = editor.save().unwrap();
        assert_eq!(editor.state(), EditorState::Saved);
        assert_eq!(change.item_id, "item-1");
        assert_eq!(change.storage_location, StorageLocation::new("storage", "sm", ""));

        editor.close();
        assert_eq!(editor.state(), EditorState::Closed);
    }

    #[test]
    fn save_requires_main() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        editor
            .select(LocationTarget::Sales, LocationLevel::Main, "")
            .unwrap();
        assert_eq!(
            editor.save(),
            Err(WorkflowError::Location(LocationError::MissingMain))
        );
        assert_eq!(editor.state(), EditorState::Editing);
    }

    #[test]
    fn cancel_and_wrong_state_errors() {
        let mut editor = LocationEditor::new(catalog());
        assert!(matches!(
            editor.select(LocationTarget::Sales, LocationLevel::Main, "sales"),
            Err(WorkflowError::InvalidState { .. })
        ));
        editor.open(&item()).unwrap();
        assert!(editor.open(&item()).is_err());
        editor.cancel().unwrap();
        assert_eq!(editor.state(), EditorState::Cancelled);
        assert!(editor.save().is_err());
        assert!(editor.open(&item()).is_ok());
    }

    #[test]
    fn resume_after_failed_commit() {
        let mut editor = LocationEditor::new(catalog());
        editor.open(&item()).unwrap();
        editor.save().unwrap();
        editor.resume().unwrap();
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(editor.draft(LocationTarget::Sales).final_, "red-a");
    }

    #[test]
    fn form_requires_name_and_location() {
        let mut form = AddItemForm::new(catalog());
        assert_eq!(form.submit(), Err(WorkflowError::MissingField("name")));
        form.set_name("  Aspirin ");
        assert_eq!(form.submit(), Err(WorkflowError::MissingField("location")));
        form.select(LocationTarget::Sales, LocationLevel::Main, "sales")
            .unwrap();
        let new = form.submit().unwrap();
        assert_eq!(new.name, "Aspirin");
        assert_eq!(new.location, LocationPath::main_only("sales"));
        assert!(new.storage_location.is_empty());
    }

    #[test]
    fn form_suggests_similar_names() {
        let existing = vec![item(), {
            let mut other = item();
            other.name = "Tylenol".into();
            other
        }];
        let mut form = AddItemForm::new(catalog());
        form.set_name("a");
        assert!(form.similar_items(&existing).is_empty());
        form.set_name("SPI");
        assert_eq!(form.similar_items(&existing), vec!["Aspirin"]);
    }
}
