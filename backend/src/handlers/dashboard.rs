//! Dashboard handler
//!
//! Opening the dashboard as a manager or admin runs one alert generation pass.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;
use shared::{analyze_stock, StockAnalysis, UserRole};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock_alerts::{velocity_window_start, GenerationReport};
use crate::services::{InventoryService, NotificationService, StockAlertService};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user_role: UserRole,
    pub is_manager_or_admin: bool,
    pub unread_notifications: i64,
    pub generated: GenerationReport,
    pub stock_analysis: StockAnalysis,
}

/// Dashboard overview
pub async fn get_dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<DashboardResponse>> {
    let now = Utc::now();
    let today = now.date_naive();
    let is_manager = user.is_manager_or_admin();

    let mut generated = GenerationReport::default();
    let mut unread_notifications = 0;

    let medicines = if is_manager {
        let alerts = StockAlertService::new(state.db.clone());
        let snapshot = alerts.load_snapshot(now, today).await?;
        match alerts.generate(&snapshot, today).await {
            Ok(report) => generated = report,
            Err(e) => tracing::warn!(error = %e, "Stock alert generation failed"),
        }
        unread_notifications = NotificationService::new(state.db.clone())
            .get_unread_count(user.user_id)
            .await?;
        snapshot.medicines
    } else {
        InventoryService::new(state.db)
            .medicine_stock(velocity_window_start(now))
            .await?
    };

    Ok(Json(DashboardResponse {
        user_role: user.role,
        is_manager_or_admin: is_manager,
        unread_notifications,
        generated,
        stock_analysis: analyze_stock(&medicines),
    }))
}
