//! Stock alert planning
//!
//! Turns a snapshot of medicines and batches into the notifications managers
//! should receive, skipping any condition a recipient already has an unread
//! notification for.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::health::{
    assess_stock, classify_batch_expiry, ExpiryStatus, LowStockReason, SalesVelocity,
    StockCondition,
};
use crate::models::{DedupKey, NewNotification, NotificationType};

/// Aggregate stock and trailing sales of one medicine
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MedicineStock {
    pub medicine_id: Uuid,
    pub name: String,
    pub unit: String,
    pub current_stock: i64,
    pub units_sold_30d: i64,
}

impl MedicineStock {
    pub fn velocity(&self) -> SalesVelocity {
        SalesVelocity::trailing(self.units_sold_30d)
    }

    pub fn condition(&self) -> StockCondition {
        assess_stock(self.current_stock, &self.velocity())
    }
}

/// A live batch considered for expiry alerts
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BatchExpiry {
    pub batch_id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub unit: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
}

/// Everything the planner looks at in one pass
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    pub medicines: Vec<MedicineStock>,
    pub batches: Vec<BatchExpiry>,
}

/// A condition worth notifying about, before it is addressed to anyone
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub medicine_id: Option<Uuid>,
    pub batch_id: Option<Uuid>,
}

impl Alert {
    fn addressed_to(&self, user_id: Uuid) -> NewNotification {
        NewNotification {
            user_id,
            notification_type: self.notification_type,
            title: self.title.clone(),
            message: self.message.clone(),
            medicine_id: self.medicine_id,
            batch_id: self.batch_id,
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

/// Alert for a batch that is near expiry, if it is
pub fn expiry_alert(batch: &BatchExpiry, today: NaiveDate) -> Option<Alert> {
    if batch.quantity <= 0 {
        return None;
    }
    let expiry = batch.expiry_date?;
    if classify_batch_expiry(Some(expiry), today) != Some(ExpiryStatus::NearExpiry) {
        return None;
    }

    let days_left = (expiry - today).num_days();
    Some(Alert {
        notification_type: NotificationType::Expiry,
        title: format!("Near Expiry Alert: {}", batch.medicine_name),
        message: format!(
            "Batch #{} of {} will expire in {} days (on {}). Current stock: {} {}",
            short_id(batch.batch_id),
            batch.medicine_name,
            days_left,
            expiry.format("%Y-%m-%d"),
            batch.quantity,
            batch.unit
        ),
        medicine_id: Some(batch.medicine_id),
        batch_id: Some(batch.batch_id),
    })
}

/// Alert for a medicine that is out of stock or running low
pub fn stock_alert(medicine: &MedicineStock) -> Option<Alert> {
    let name = &medicine.name;
    match medicine.condition() {
        StockCondition::Healthy => None,
        StockCondition::OutOfStock => Some(Alert {
            notification_type: NotificationType::OutOfStock,
            title: format!("Out of Stock: {}", name),
            message: format!(
                "{} is currently out of stock. Please reorder immediately.",
                name
            ),
            medicine_id: Some(medicine.medicine_id),
            batch_id: None,
        }),
        StockCondition::LowStock(reason) => {
            let message = match reason {
                LowStockReason::Velocity { days_of_stock, daily_rate } => format!(
                    "{} has only {:.1} days of stock remaining ({} {}). Average daily sales: {:.1}. Please reorder soon.",
                    name, days_of_stock, medicine.current_stock, medicine.unit, daily_rate
                ),
                LowStockReason::BelowMinimum => format!(
                    "{} is low in stock ({} {}). Please reorder soon.",
                    name, medicine.current_stock, medicine.unit
                ),
            };
            Some(Alert {
                notification_type: NotificationType::LowStock,
                title: format!("Low Stock Alert: {}", name),
                message,
                medicine_id: Some(medicine.medicine_id),
                batch_id: None,
            })
        }
    }
}

/// Every condition currently present in the snapshot, expiry first
pub fn detect_alerts(snapshot: &StockSnapshot, today: NaiveDate) -> Vec<Alert> {
    snapshot
        .batches
        .iter()
        .filter_map(|batch| expiry_alert(batch, today))
        .chain(snapshot.medicines.iter().filter_map(stock_alert))
        .collect()
}

/// Plan the notifications to insert for `recipients`.
///
/// `existing_unread` holds the dedup keys of unread notifications already
/// stored. A condition is planned at most once per recipient.
pub fn plan_notifications(
    snapshot: &StockSnapshot,
    recipients: &[Uuid],
    existing_unread: &HashSet<DedupKey>,
    today: NaiveDate,
) -> Vec<NewNotification> {
    let alerts = detect_alerts(snapshot, today);
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut planned = Vec::new();

    for alert in &alerts {
        for &user_id in recipients {
            let notification = alert.addressed_to(user_id);
            let key = notification.dedup_key();
            if existing_unread.contains(&key) || !seen.insert(key) {
                continue;
            }
            planned.push(notification);
        }
    }

    planned
}
