//! HTTP handlers for notification endpoints
//!
//! Only managers and admins have notifications; staff get 403.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use shared::{PaginatedResponse, Pagination};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::ManagerUser;
use crate::services::notification::{Notification, NotificationService};
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct NotificationListResponse {
    #[serde(flatten)]
    pub page: PaginatedResponse<Notification>,
    pub unread_count: i64,
}

/// List the current user's notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    ManagerUser(user): ManagerUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<NotificationListResponse>> {
    let service = NotificationService::new(state.db);
    let pagination = Pagination::from_query(query.page, query.per_page);

    let page = service
        .list_notifications(user.user_id, query.unread_only.unwrap_or(false), &pagination)
        .await?;

    Ok(Json(NotificationListResponse {
        page: PaginatedResponse {
            data: page.notifications,
            pagination: pagination.meta(page.total.max(0) as u64),
        },
        unread_count: page.unread_count,
    }))
}

/// Unread count response
#[derive(Debug, Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// Get unread notification count
pub async fn get_unread_count(
    State(state): State<AppState>,
    ManagerUser(user): ManagerUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.db);
    let count = service.get_unread_count(user.user_id).await?;
    Ok(Json(UnreadCountResponse { count }))
}

/// Mark notification as read
pub async fn mark_as_read(
    State(state): State<AppState>,
    ManagerUser(user): ManagerUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    let service = NotificationService::new(state.db);
    let notification = service.mark_as_read(user.user_id, notification_id).await?;
    Ok(Json(notification))
}

/// Mark all read response
#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked_count: u64,
}

/// Mark all notifications as read
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    ManagerUser(user): ManagerUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let service = NotificationService::new(state.db);
    let marked_count = service.mark_all_as_read(user.user_id).await?;
    tracing::debug!(user_id = %user.user_id, marked_count, "Marked all notifications read");
    Ok(Json(MarkAllReadResponse { marked_count }))
}

/// Delete a notification
pub async fn delete_notification(
    State(state): State<AppState>,
    ManagerUser(user): ManagerUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = NotificationService::new(state.db);
    service
        .delete_notification(user.user_id, notification_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::NotificationType;

    #[test]
    fn test_list_response_keeps_flat_shape() {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            notification_type: NotificationType::OutOfStock,
            title: "Out of stock: Loperamide".to_string(),
            message: "No capsule left".to_string(),
            medicine_id: Some(Uuid::new_v4()),
            batch_id: None,
            is_read: false,
            created_at: Utc::now(),
        };
        let response = NotificationListResponse {
            page: PaginatedResponse {
                data: vec![notification],
                pagination: Pagination::default().meta(1),
            },
            unread_count: 1,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"][0]["notification_type"], "out_of_stock");
        assert_eq!(json["pagination"]["total_pages"], 1);
        assert_eq!(json["unread_count"], 1);
        assert!(json.get("page").is_none());
    }
}
