//! Inventory service for batch status, expiry monitoring and receiving stock

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    classify_batch_expiry, classify_stock_level, near_expiry_cutoff, round1, ExpiryStatus,
    Medicine, MedicineStock, StockCondition, StockLevel, UnitType,
};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Rows of `stock_batches b JOIN medicines m` that hold sellable stock.
///
/// Expands to a string literal so it can be spliced into queries with `concat!`.
macro_rules! live_batch_filter {
    () => {
        "b.is_deleted = false AND b.is_recalled = false AND m.is_deleted = false AND b.quantity > 0"
    };
}
pub(crate) use live_batch_filter;

/// Convert an entered quantity to pieces for `medicine`
pub fn entry_pieces(medicine: &Medicine, quantity: i64, unit: UnitType) -> AppResult<i64> {
    medicine
        .units()
        .to_pieces(quantity, unit)
        .ok_or_else(|| AppError::Validation {
            field: "quantity".to_string(),
            message: format!("{} {} of {} is too many pieces", quantity, unit, medicine.name),
        })
}

/// Inventory service for reading stock and receiving batches
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

/// Stock level filter for the batch list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockLevelFilter {
    #[default]
    All,
    Low,
    Medium,
    InStock,
}

impl StockLevelFilter {
    pub fn admits(&self, level: StockLevel) -> bool {
        match self {
            StockLevelFilter::All => true,
            StockLevelFilter::Low => level == StockLevel::Low,
            StockLevelFilter::Medium => level == StockLevel::Medium,
            StockLevelFilter::InStock => level == StockLevel::InStock,
        }
    }
}

/// Expiry filter for the expiration monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryFilter {
    #[default]
    All,
    Expired,
    ExpiringSoon,
}

impl ExpiryFilter {
    pub fn admits(&self, status: Option<ExpiryStatus>) -> bool {
        match self {
            ExpiryFilter::All => true,
            ExpiryFilter::Expired => status == Some(ExpiryStatus::Expired),
            ExpiryFilter::ExpiringSoon => status == Some(ExpiryStatus::NearExpiry),
        }
    }
}

/// Batch joined with its medicine
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct BatchRow {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub unit: String,
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub date_received: DateTime<Utc>,
    pub selling_price: Option<Decimal>,
}

/// Batch with its evaluated health
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatus {
    #[serde(flatten)]
    pub batch: BatchRow,
    pub stock_level: StockLevel,
    pub expiry_status: Option<ExpiryStatus>,
    pub value: Decimal,
}

impl BatchStatus {
    pub fn evaluate(batch: BatchRow, today: NaiveDate) -> Self {
        let value = Decimal::from(batch.quantity) * batch.selling_price.unwrap_or(Decimal::ZERO);
        Self {
            stock_level: classify_stock_level(batch.quantity),
            expiry_status: classify_batch_expiry(batch.expiry_date, today),
            value,
            batch,
        }
    }
}

/// Batch list with totals over every batch, not only the filtered ones
#[derive(Debug, Clone, Serialize)]
pub struct BatchStatusReport {
    pub batches: Vec<BatchStatus>,
    pub status_filter: StockLevelFilter,
    pub total_value: Decimal,
    pub total_pieces: i64,
    pub low_stock_count: usize,
    pub medium_stock_count: usize,
    pub in_stock_count: usize,
}

/// Expiration monitor view
#[derive(Debug, Clone, Serialize)]
pub struct ExpirationReport {
    pub batches: Vec<BatchStatus>,
    pub filter: ExpiryFilter,
    pub today: NaiveDate,
    pub near_expiry_cutoff: NaiveDate,
    pub expired_count: usize,
    pub expiring_soon_count: usize,
}

/// Medicine with its stock assessment
#[derive(Debug, Clone, Serialize)]
pub struct MedicineOverview {
    #[serde(flatten)]
    pub stock: MedicineStock,
    pub stock_level: StockLevel,
    pub condition: StockCondition,
    pub days_of_stock: Option<f64>,
}

impl From<MedicineStock> for MedicineOverview {
    fn from(stock: MedicineStock) -> Self {
        Self {
            stock_level: classify_stock_level(stock.current_stock),
            condition: stock.condition(),
            days_of_stock: stock.velocity().days_of_stock(stock.current_stock).map(round1),
            stock,
        }
    }
}

/// Input for receiving a batch
#[derive(Debug, Deserialize, Validate)]
pub struct ReceiveBatchInput {
    pub medicine_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000"))]
    pub quantity: i64,
    #[serde(default)]
    pub unit_type: UnitType,
    pub expiry_date: Option<NaiveDate>,
    #[validate(length(max = 255, message = "Location must be at most 255 characters"))]
    pub location: Option<String>,
}

/// Evaluate batches and tally totals
pub fn summarize_batches(
    rows: Vec<BatchRow>,
    today: NaiveDate,
    filter: StockLevelFilter,
) -> BatchStatusReport {
    let mut report = BatchStatusReport {
        batches: Vec::new(),
        status_filter: filter,
        total_value: Decimal::ZERO,
        total_pieces: 0,
        low_stock_count: 0,
        medium_stock_count: 0,
        in_stock_count: 0,
    };

    for row in rows {
        let status = BatchStatus::evaluate(row, today);
        report.total_value += status.value;
        report.total_pieces += status.batch.quantity;
        match status.stock_level {
            StockLevel::Low => report.low_stock_count += 1,
            StockLevel::Medium => report.medium_stock_count += 1,
            StockLevel::InStock => report.in_stock_count += 1,
        }
        if filter.admits(status.stock_level) {
            report.batches.push(status);
        }
    }

    report
}

/// Evaluate batches for the expiration monitor
pub fn build_expiration_report(
    rows: Vec<BatchRow>,
    today: NaiveDate,
    filter: ExpiryFilter,
) -> ExpirationReport {
    let evaluated: Vec<BatchStatus> = rows
        .into_iter()
        .map(|row| BatchStatus::evaluate(row, today))
        .collect();

    let count = |wanted: ExpiryStatus| {
        evaluated
            .iter()
            .filter(|b| b.expiry_status == Some(wanted))
            .count()
    };
    let expired_count = count(ExpiryStatus::Expired);
    let expiring_soon_count = count(ExpiryStatus::NearExpiry);

    ExpirationReport {
        batches: evaluated
            .into_iter()
            .filter(|b| filter.admits(b.expiry_status))
            .collect(),
        filter,
        today,
        near_expiry_cutoff: near_expiry_cutoff(today),
        expired_count,
        expiring_soon_count,
    }
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Aggregate live stock and sales since `since` for every medicine
    pub async fn medicine_stock(&self, since: DateTime<Utc>) -> AppResult<Vec<MedicineStock>> {
        let rows = sqlx::query_as::<_, MedicineStock>(
            r#"
            SELECT m.id AS medicine_id, m.name, m.unit,
                   COALESCE((
                       SELECT SUM(b.quantity) FROM stock_batches b
                       WHERE b.medicine_id = m.id
                         AND b.is_deleted = false
                         AND b.is_recalled = false
                   ), 0)::BIGINT AS current_stock,
                   COALESCE((
                       SELECT SUM(s.pieces_dispensed) FROM sale_records s
                       WHERE s.medicine_id = m.id AND s.sold_at >= $1
                   ), 0)::BIGINT AS units_sold_30d
            FROM medicines m
            WHERE m.is_deleted = false
            ORDER BY m.name, m.id
            "#,
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Medicines with stock level and condition
    pub async fn medicine_overview(&self, since: DateTime<Utc>) -> AppResult<Vec<MedicineOverview>> {
        let stock = self.medicine_stock(since).await?;
        Ok(stock.into_iter().map(MedicineOverview::from).collect())
    }

    /// Live batches holding stock, with optional medicine name search
    pub async fn list_batches(
        &self,
        today: NaiveDate,
        filter: StockLevelFilter,
        search: Option<&str>,
    ) -> AppResult<BatchStatusReport> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let rows = sqlx::query_as::<_, BatchRow>(concat!(
            "SELECT b.id, b.medicine_id, m.name AS medicine_name, m.unit, b.quantity, ",
            "b.expiry_date, b.location, b.date_received, m.selling_price ",
            "FROM stock_batches b JOIN medicines m ON m.id = b.medicine_id ",
            "WHERE ",
            live_batch_filter!(),
            " AND ($1::TEXT IS NULL OR m.name ILIKE $1) ",
            "ORDER BY m.name, b.date_received",
        ))
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(summarize_batches(rows, today, filter))
    }

    /// Live, non-recalled batches holding stock, soonest expiry first
    pub async fn expiration_monitor(
        &self,
        today: NaiveDate,
        filter: ExpiryFilter,
    ) -> AppResult<ExpirationReport> {
        let rows = sqlx::query_as::<_, BatchRow>(concat!(
            "SELECT b.id, b.medicine_id, m.name AS medicine_name, m.unit, b.quantity, ",
            "b.expiry_date, b.location, b.date_received, m.selling_price ",
            "FROM stock_batches b JOIN medicines m ON m.id = b.medicine_id ",
            "WHERE ",
            live_batch_filter!(),
            " ORDER BY b.expiry_date ASC NULLS LAST, b.id",
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(build_expiration_report(rows, today, filter))
    }

    /// Get a batch by ID
    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<BatchRow> {
        sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT b.id, b.medicine_id, m.name AS medicine_name, m.unit, b.quantity,
                   b.expiry_date, b.location, b.date_received, m.selling_price
            FROM stock_batches b
            JOIN medicines m ON m.id = b.medicine_id
            WHERE b.id = $1
            "#,
        )
        .bind(batch_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Stock batch".to_string()))
    }

    /// Receive a new batch, converting the entered unit to pieces
    pub async fn receive_batch(&self, input: ReceiveBatchInput) -> AppResult<BatchRow> {
        input.validate()?;

        let medicine = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT id, name, unit, units_per_pack, packs_per_box, selling_price, is_deleted
            FROM medicines
            WHERE id = $1 AND is_deleted = false
            "#,
        )
        .bind(input.medicine_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        let pieces = entry_pieces(&medicine, input.quantity, input.unit_type)?;

        let batch_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO stock_batches (medicine_id, quantity, expiry_date, location)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(input.medicine_id)
        .bind(pieces)
        .bind(input.expiry_date)
        .bind(&input.location)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(
            %batch_id,
            medicine_id = %input.medicine_id,
            pieces,
            unit = input.unit_type.as_str(),
            "Received stock batch"
        );

        self.get_batch(batch_id).await
    }
}
