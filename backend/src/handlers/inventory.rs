//! HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{CurrentUser, ManagerUser};
use crate::services::inventory::{
    BatchRow, BatchStatusReport, ExpirationReport, ExpiryFilter, InventoryService,
    MedicineOverview, ReceiveBatchInput, StockLevelFilter,
};
use crate::services::stock_alerts::velocity_window_start;
use crate::AppState;

/// Query parameters for the batch list
#[derive(Debug, Deserialize)]
pub struct BatchListQuery {
    #[serde(default)]
    pub status: StockLevelFilter,
    pub search: Option<String>,
}

/// List batches with stock level and expiry status
pub async fn list_batches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<BatchListQuery>,
) -> AppResult<Json<BatchStatusReport>> {
    let service = InventoryService::new(state.db);
    let report = service
        .list_batches(Utc::now().date_naive(), query.status, query.search.as_deref())
        .await?;
    Ok(Json(report))
}

/// Query parameters for the expiration monitor
#[derive(Debug, Deserialize)]
pub struct ExpirationQuery {
    #[serde(default)]
    pub filter: ExpiryFilter,
}

/// Batches ordered by expiry date
pub async fn expiration_monitor(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ExpirationQuery>,
) -> AppResult<Json<ExpirationReport>> {
    let service = InventoryService::new(state.db);
    let report = service
        .expiration_monitor(Utc::now().date_naive(), query.filter)
        .await?;
    Ok(Json(report))
}

/// Medicines with aggregate stock and condition
pub async fn list_medicines(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<Vec<MedicineOverview>>> {
    let service = InventoryService::new(state.db);
    let medicines = service
        .medicine_overview(velocity_window_start(Utc::now()))
        .await?;
    Ok(Json(medicines))
}

/// Get a batch by ID
pub async fn get_batch(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<BatchRow>> {
    let service = InventoryService::new(state.db);
    Ok(Json(service.get_batch(batch_id).await?))
}

/// Receive a new stock batch
pub async fn receive_batch(
    State(state): State<AppState>,
    manager: ManagerUser,
    Json(input): Json<ReceiveBatchInput>,
) -> AppResult<(StatusCode, Json<BatchRow>)> {
    let service = InventoryService::new(state.db);
    let batch = service.receive_batch(input).await?;
    tracing::debug!(received_by = %manager.0.user_id, batch_id = %batch.id, "Batch received");
    Ok((StatusCode::CREATED, Json(batch)))
}
