//! Stock alert generator
//!
//! Loads the current stock picture, plans notifications for every active
//! manager and admin, and stores the ones they do not already have unread.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use shared::{near_expiry_cutoff, plan_notifications, StockSnapshot, VELOCITY_WINDOW_DAYS};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::inventory::{live_batch_filter, InventoryService};
use crate::services::notification::NotificationService;

#[derive(Clone)]
pub struct StockAlertService {
    db: PgPool,
}

/// Outcome of one generation pass
#[derive(Debug, Clone, Default, Serialize)]
pub struct GenerationReport {
    pub recipients: usize,
    pub planned: usize,
    pub created: u64,
}

/// Start of the trailing sales window ending at `now`
pub fn velocity_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(VELOCITY_WINDOW_DAYS)
}

impl StockAlertService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Active managers and admins
    pub async fn recipients(&self) -> AppResult<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM users
            WHERE is_active = true AND role IN ('manager', 'admin')
            ORDER BY id
            "#,
        )
        .fetch_all(&self.db)
        .await?;

        Ok(ids)
    }

    /// Medicines with their trailing sales plus batches close enough to expiry to matter
    pub async fn load_snapshot(&self, now: DateTime<Utc>, today: NaiveDate) -> AppResult<StockSnapshot> {
        let inventory = InventoryService::new(self.db.clone());
        let medicines = inventory.medicine_stock(velocity_window_start(now)).await?;

        let batches = sqlx::query_as::<_, shared::BatchExpiry>(concat!(
            "SELECT b.id AS batch_id, b.medicine_id, m.name AS medicine_name, m.unit, ",
            "b.quantity, b.expiry_date ",
            "FROM stock_batches b JOIN medicines m ON m.id = b.medicine_id ",
            "WHERE ",
            live_batch_filter!(),
            " AND b.expiry_date IS NOT NULL AND b.expiry_date <= $1 ",
            "ORDER BY b.expiry_date, b.id",
        ))
        .bind(near_expiry_cutoff(today))
        .fetch_all(&self.db)
        .await?;

        Ok(StockSnapshot { medicines, batches })
    }

    /// Run one generation pass over an already loaded snapshot
    pub async fn generate(
        &self,
        snapshot: &StockSnapshot,
        today: NaiveDate,
    ) -> AppResult<GenerationReport> {
        let recipients = self.recipients().await?;
        if recipients.is_empty() {
            tracing::debug!("No managers or admins to notify");
            return Ok(GenerationReport::default());
        }

        let notifications = NotificationService::new(self.db.clone());
        let existing = notifications.unread_keys(&recipients).await?;

        let planned = plan_notifications(snapshot, &recipients, &existing, today);
        let created = notifications.insert_notifications(&planned).await?;

        tracing::info!(
            recipients = recipients.len(),
            medicines = snapshot.medicines.len(),
            batches = snapshot.batches.len(),
            planned = planned.len(),
            created,
            "Stock alert generation finished"
        );

        Ok(GenerationReport {
            recipients: recipients.len(),
            planned: planned.len(),
            created,
        })
    }
}
