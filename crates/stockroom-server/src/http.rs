//! HTTP endpoint handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    DeleteOutcome, InventoryError, InventoryView, Item, ItemId, LocationNode, LocationPath,
    NewItem, StatusKind, StorageLocation, StoreError,
};

use crate::AppState;

pub type ApiError = (StatusCode, String);

/// Map an inventory failure to a status code and message.
pub fn api_error(err: InventoryError) -> ApiError {
    let status = match &err {
        InventoryError::Validation(_) | InventoryError::Location(_) => StatusCode::BAD_REQUEST,
        InventoryError::NotFound(_) | InventoryError::Store(StoreError::NotFound(_)) => {
            StatusCode::NOT_FOUND
        }
        InventoryError::Store(StoreError::Validation(_)) => StatusCode::BAD_REQUEST,
        InventoryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

/// Get the location tree
pub async fn list_locations(State(state): State<Arc<AppState>>) -> Json<Vec<LocationNode>> {
    Json(state.inventory.catalog().roots().to_vec())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    /// Location id at any level of the sales path
    pub section: Option<String>,
    /// Name search terms
    pub q: Option<String>,
    /// `lowStock` or `orderPlaced`
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemsResponse {
    pub version: u64,
    pub items: Vec<Item>,
    pub highlighted_location: Option<String>,
}

/// List items, optionally filtered by section, search or status
pub async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ItemsResponse>, ApiError> {
    let status = match query.status.as_deref() {
        Some(raw) => Some(StatusKind::parse(raw).ok_or_else(|| {
            (StatusCode::BAD_REQUEST, format!("Unknown status: {}", raw))
        })?),
        None => None,
    };

    let snapshot = state.inventory.snapshot().map_err(api_error)?;
    let mut view = InventoryView::new();
    view.apply_snapshot(snapshot);
    if let Some(term) = query.q.as_deref() {
        view.search(term);
    } else if let Some(section) = query.section.as_deref() {
        view.select_section(section);
    }

    let items = view
        .visible_items()
        .filter(|item| status.map_or(true, |kind| item.status(kind)))
        .cloned()
        .collect();

    Ok(Json(ItemsResponse {
        version: view.version(),
        items,
        highlighted_location: view.highlighted_location().map(str::to_string),
    }))
}

/// Get a specific item
pub async fn get_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    state.inventory.get(&id).map(Json).map_err(api_error)
}

/// Create an item
pub async fn add_item(
    State(state): State<Arc<AppState>>,
    Json(new): Json<NewItem>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let id = state.inventory.add_item(new).map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(serde_json::json!({ "id": id }))))
}

/// Create or replace many items in one batch
pub async fn update_items(
    State(state): State<Arc<AppState>>,
    Json(items): Json<Vec<Item>>,
) -> Result<Json<Vec<ItemId>>, ApiError> {
    state.inventory.update_items(items).map(Json).map_err(api_error)
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub kind: StatusKind,
    pub value: bool,
}

/// Set a status flag
pub async fn set_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Item>, ApiError> {
    state
        .inventory
        .set_status(&id, request.kind, request.value)
        .map(Json)
        .map_err(api_error)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationRequest {
    pub location: LocationPath,
    #[serde(default)]
    pub storage_location: StorageLocation,
}

/// Move an item
pub async fn change_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<Item>, ApiError> {
    state
        .inventory
        .change_location(&id, request.location, request.storage_location)
        .map(Json)
        .map_err(api_error)
}

#[derive(Debug, Deserialize)]
pub struct MemoRequest {
    #[serde(default)]
    pub memo: String,
}

/// Replace or clear the memo
pub async fn update_memo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<MemoRequest>,
) -> Result<Json<Item>, ApiError> {
    state
        .inventory
        .update_memo(&id, &request.memo)
        .map(Json)
        .map_err(api_error)
}

/// Exchange sales and storage locations
pub async fn swap_locations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Item>, ApiError> {
    state
        .inventory
        .swap_locations(&id)
        .map(Json)
        .map_err(api_error)
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

/// Delete an item; requires `?confirm=true`
pub async fn delete_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<StatusCode, ApiError> {
    let confirmed = query.confirm;
    match state
        .inventory
        .delete_with_confirmation(&id, &|_: &str| confirmed)
        .map_err(api_error)?
    {
        DeleteOutcome::Deleted => Ok(StatusCode::NO_CONTENT),
        DeleteOutcome::Cancelled => Err((
            StatusCode::PRECONDITION_FAILED,
            "Deletion requires confirm=true".to_string(),
        )),
    }
}

/// Get system status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let snapshot = state.inventory.snapshot().map_err(api_error)?;
    let count = |kind| snapshot.items.iter().filter(|i| i.status(kind)).count();

    Ok(Json(serde_json::json!({
        "version": snapshot.version,
        "items": {
            "total": snapshot.items.len(),
            "lowStock": count(StatusKind::LowStock),
            "orderPlaced": count(StatusKind::OrderPlaced)
        },
        "locations": state.inventory.catalog().main_options().len()
    })))
}
