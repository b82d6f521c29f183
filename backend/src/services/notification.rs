//! Notification store
//!
//! Supports:
//! - Listing a user's notifications with unread counts
//! - Mark-read, mark-all-read and delete
//! - Dedup lookups and inserts for the stock alert generator

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    DedupKey, NewNotification, NotificationState, NotificationType, Pagination,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Notification service for reading and updating a user's notifications
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// Stored notification
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub medicine_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn state(&self) -> NotificationState {
        NotificationState::from_read_flag(self.is_read)
    }
}

/// One page of a user's notifications
#[derive(Debug, Clone, Serialize)]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: i64,
    pub unread_count: i64,
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// List notifications for a user, newest first
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        unread_only: bool,
        pagination: &Pagination,
    ) -> AppResult<NotificationPage> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, notification_type, title, message,
                   medicine_id, batch_id, is_read, created_at
            FROM notifications
            WHERE user_id = $1 AND ($2 = false OR is_read = false)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM notifications
            WHERE user_id = $1 AND ($2 = false OR is_read = false)
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.db)
        .await?;

        let unread_count = self.get_unread_count(user_id).await?;

        Ok(NotificationPage {
            notifications,
            total,
            unread_count,
        })
    }

    /// Get unread notification count
    pub async fn get_unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Get one of the user's notifications
    pub async fn get_notification(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, notification_type, title, message,
                   medicine_id, batch_id, is_read, created_at
            FROM notifications
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Notification".to_string()))
    }

    // ========================================================================
    // User actions
    // ========================================================================

    /// Mark notification as read
    pub async fn mark_as_read(
        &self,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> AppResult<Notification> {
        let mut notification = self.get_notification(user_id, notification_id).await?;
        // Deleted rows are gone, so a stored notification is either unread or read.
        if notification.state() == NotificationState::Read {
            return Ok(notification);
        }

        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE id = $1 AND user_id = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        // Deleted between the read and the update
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }

        notification.is_read = true;
        Ok(notification)
    }

    /// Mark all notifications as read, returning how many changed
    pub async fn mark_all_as_read(&self, user_id: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a notification
    pub async fn delete_notification(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Generator support
    // ========================================================================

    /// Dedup keys of every unread notification held by `user_ids`
    pub async fn unread_keys(&self, user_ids: &[Uuid]) -> AppResult<HashSet<DedupKey>> {
        let rows = sqlx::query_as::<_, (Uuid, NotificationType, Option<Uuid>, Option<Uuid>)>(
            r#"
            SELECT user_id, notification_type, medicine_id, batch_id
            FROM notifications
            WHERE is_read = false AND user_id = ANY($1)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, notification_type, medicine_id, batch_id)| DedupKey {
                user_id,
                notification_type,
                medicine_id,
                batch_id,
            })
            .collect())
    }

    /// Insert planned notifications in one transaction, returning how many were stored.
    ///
    /// Rows that collide with an unread notification for the same condition are
    /// skipped by the partial unique index.
    pub async fn insert_notifications(&self, planned: &[NewNotification]) -> AppResult<u64> {
        if planned.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;
        let mut inserted = 0;

        for notification in planned {
            let result = sqlx::query(
                r#"
                INSERT INTO notifications (
                    user_id, notification_type, title, message, medicine_id, batch_id
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(notification.user_id)
            .bind(notification.notification_type)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.medicine_id)
            .bind(notification.batch_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::debug!(
                    user_id = %notification.user_id,
                    notification_type = notification.notification_type.as_str(),
                    "Condition already has an unread notification"
                );
            }
            inserted += result.rows_affected();
        }

        tx.commit().await?;

        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seed_manager_and_medicine(pool: &PgPool) -> (Uuid, Uuid) {
        let (user_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (username, role) VALUES ('manager', 'manager') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        let (medicine_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO medicines (name, unit) VALUES ('Amoxicillin', 'capsule') RETURNING id",
        )
        .fetch_one(pool)
        .await
        .unwrap();
        (user_id, medicine_id)
    }

    fn low_stock(user_id: Uuid, medicine_id: Uuid) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: NotificationType::LowStock,
            title: "Low stock: Amoxicillin".to_string(),
            message: "Only 12 capsule left".to_string(),
            medicine_id: Some(medicine_id),
            batch_id: None,
        }
    }

    fn out_of_stock(user_id: Uuid, medicine_id: Uuid) -> NewNotification {
        NewNotification {
            notification_type: NotificationType::OutOfStock,
            title: "Out of stock: Amoxicillin".to_string(),
            ..low_stock(user_id, medicine_id)
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires database connection
    async fn test_duplicate_unread_condition_is_skipped(pool: PgPool) {
        let (user_id, medicine_id) = seed_manager_and_medicine(&pool).await;
        let service = NotificationService::new(pool);
        let planned = vec![low_stock(user_id, medicine_id)];

        assert_eq!(service.insert_notifications(&planned).await.unwrap(), 1);
        assert_eq!(service.insert_notifications(&planned).await.unwrap(), 0);
        assert_eq!(service.get_unread_count(user_id).await.unwrap(), 1);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires database connection
    async fn test_mark_all_read_counts_only_unread(pool: PgPool) {
        let (user_id, medicine_id) = seed_manager_and_medicine(&pool).await;
        let service = NotificationService::new(pool);
        let planned = vec![low_stock(user_id, medicine_id), out_of_stock(user_id, medicine_id)];
        assert_eq!(service.insert_notifications(&planned).await.unwrap(), 2);

        let page = service
            .list_notifications(user_id, true, &Pagination::default())
            .await
            .unwrap();
        let first = service
            .mark_as_read(user_id, page.notifications[0].id)
            .await
            .unwrap();
        assert!(first.is_read);
        let again = service.mark_as_read(user_id, first.id).await.unwrap();
        assert!(again.is_read);

        assert_eq!(service.mark_all_as_read(user_id).await.unwrap(), 1);
        assert_eq!(service.mark_all_as_read(user_id).await.unwrap(), 0);
        assert_eq!(service.get_unread_count(user_id).await.unwrap(), 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires database connection
    async fn test_reading_lets_condition_alert_again(pool: PgPool) {
        let (user_id, medicine_id) = seed_manager_and_medicine(&pool).await;
        let service = NotificationService::new(pool);
        let planned = vec![low_stock(user_id, medicine_id)];
        assert_eq!(service.insert_notifications(&planned).await.unwrap(), 1);

        service.mark_all_as_read(user_id).await.unwrap();
        assert!(service.unread_keys(&[user_id]).await.unwrap().is_empty());

        assert_eq!(service.insert_notifications(&planned).await.unwrap(), 1);
        let keys = service.unread_keys(&[user_id]).await.unwrap();
        assert!(keys.contains(&planned[0].dedup_key()));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore] // Requires database connection
    async fn test_other_users_notification_is_not_found(pool: PgPool) {
        let (user_id, medicine_id) = seed_manager_and_medicine(&pool).await;
        let service = NotificationService::new(pool);
        service
            .insert_notifications(&[low_stock(user_id, medicine_id)])
            .await
            .unwrap();
        let page = service
            .list_notifications(user_id, false, &Pagination::default())
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        let err = service
            .mark_as_read(stranger, page.notifications[0].id)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
