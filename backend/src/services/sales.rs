//! Sales service for dispensing medicine out of stock batches

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{plan_fifo_draw, Medicine, SaleRecord, StockBatch, UnitType};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::inventory::entry_pieces;

#[derive(Clone)]
pub struct SalesService {
    db: PgPool,
}

/// Input for recording a sale
#[derive(Debug, Deserialize, Validate)]
pub struct RecordSaleInput {
    pub medicine_id: Uuid,
    #[validate(range(min = 1, max = 1_000_000, message = "Quantity must be between 1 and 1000000"))]
    pub quantity: i64,
    #[serde(default)]
    pub unit_type: UnitType,
}

/// Pieces taken from one batch
#[derive(Debug, Clone, Serialize)]
pub struct DispensedLine {
    pub sale_id: Uuid,
    pub batch_id: Uuid,
    pub pieces: i64,
    pub batch_remaining: i64,
}

/// Result of a recorded sale
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub medicine_id: Uuid,
    pub medicine_name: String,
    pub pieces_dispensed: i64,
    pub lines: Vec<DispensedLine>,
    pub sold_at: DateTime<Utc>,
}

impl SalesService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Dispense a medicine first-in-first-out across its live batches.
    ///
    /// Either the whole quantity is taken or nothing changes.
    pub async fn record_sale(&self, sold_by: Uuid, input: RecordSaleInput) -> AppResult<SaleReceipt> {
        input.validate()?;

        let mut tx = self.db.begin().await?;

        let medicine = sqlx::query_as::<_, Medicine>(
            r#"
            SELECT id, name, unit, units_per_pack, packs_per_box, selling_price, is_deleted
            FROM medicines
            WHERE id = $1 AND is_deleted = false
            FOR UPDATE
            "#,
        )
        .bind(input.medicine_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Medicine".to_string()))?;

        let pieces = entry_pieces(&medicine, input.quantity, input.unit_type)?;

        let batches = sqlx::query_as::<_, StockBatch>(
            r#"
            SELECT id, medicine_id, quantity, expiry_date, location, date_received,
                   is_deleted, is_recalled
            FROM stock_batches
            WHERE medicine_id = $1
              AND is_deleted = false
              AND is_recalled = false
              AND quantity > 0
            ORDER BY date_received, id
            FOR UPDATE
            "#,
        )
        .bind(input.medicine_id)
        .fetch_all(&mut *tx)
        .await?;

        let stock: Vec<(Uuid, i64)> = batches.iter().map(|b| (b.id, b.quantity)).collect();
        let available: i64 = stock.iter().map(|(_, qty)| qty).sum();
        let draws = plan_fifo_draw(&stock, pieces).ok_or_else(|| {
            AppError::InsufficientStock(format!(
                "{} has {} pieces available, {} requested",
                medicine.name, available, pieces
            ))
        })?;

        let sold_at = Utc::now();
        let mut lines = Vec::with_capacity(draws.len());

        for draw in draws {
            sqlx::query("UPDATE stock_batches SET quantity = $2 WHERE id = $1")
                .bind(draw.batch_id)
                .bind(draw.remaining)
                .execute(&mut *tx)
                .await?;

            let record = sqlx::query_as::<_, SaleRecord>(
                r#"
                INSERT INTO sale_records (medicine_id, batch_id, pieces_dispensed, sold_at, sold_by)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, medicine_id, batch_id, pieces_dispensed, sold_at, sold_by
                "#,
            )
            .bind(input.medicine_id)
            .bind(draw.batch_id)
            .bind(draw.pieces)
            .bind(sold_at)
            .bind(sold_by)
            .fetch_one(&mut *tx)
            .await?;

            lines.push(DispensedLine {
                sale_id: record.id,
                batch_id: record.batch_id,
                pieces: record.pieces_dispensed,
                batch_remaining: draw.remaining,
            });
        }

        tx.commit().await?;

        tracing::info!(
            medicine_id = %input.medicine_id,
            pieces,
            batches = lines.len(),
            "Recorded sale"
        );

        Ok(SaleReceipt {
            medicine_id: medicine.id,
            medicine_name: medicine.name,
            pieces_dispensed: pieces,
            lines,
            sold_at,
        })
    }
}
