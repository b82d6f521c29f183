//! HTTP handlers for sales

use axum::{extract::State, http::StatusCode, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sales::{RecordSaleInput, SaleReceipt};
use crate::services::SalesService;
use crate::AppState;

/// Record a sale
pub async fn record_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RecordSaleInput>,
) -> AppResult<(StatusCode, Json<SaleReceipt>)> {
    let service = SalesService::new(state.db);
    let receipt = service.record_sale(current_user.0.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}
