//! Stock batch and sale models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A discrete lot of a medicine with its own expiry date and quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockBatch {
    pub id: Uuid,
    pub medicine_id: Uuid,
    /// Quantity in pieces, never negative
    pub quantity: i64,
    pub expiry_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub date_received: DateTime<Utc>,
    pub is_deleted: bool,
    pub is_recalled: bool,
}

/// A dispense of a medicine out of one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleRecord {
    pub id: Uuid,
    pub medicine_id: Uuid,
    pub batch_id: Uuid,
    pub pieces_dispensed: i64,
    pub sold_at: DateTime<Utc>,
    pub sold_by: Uuid,
}

/// How much to take from one batch when dispensing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchDraw {
    pub batch_id: Uuid,
    pub pieces: i64,
    pub remaining: i64,
}

/// Plan a first-in-first-out draw of `pieces` over batches already in
/// receiving order.
///
/// Returns `None` when `pieces` is not positive or the batches do not hold
/// enough stock, in which case nothing should be changed.
pub fn plan_fifo_draw(batches: &[(Uuid, i64)], pieces: i64) -> Option<Vec<BatchDraw>> {
    if pieces <= 0 {
        return None;
    }

    let mut needed = pieces;
    let mut draws = Vec::new();

    for &(batch_id, available) in batches {
        if needed <= 0 {
            break;
        }
        if available <= 0 {
            continue;
        }
        let taken = available.min(needed);
        needed -= taken;
        draws.push(BatchDraw {
            batch_id,
            pieces: taken,
            remaining: available - taken,
        });
    }

    if needed > 0 {
        None
    } else {
        Some(draws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fifo_spans_batches() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let draws = plan_fifo_draw(&[(a, 30), (b, 50)], 45).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!(draws[0], BatchDraw { batch_id: a, pieces: 30, remaining: 0 });
        assert_eq!(draws[1], BatchDraw { batch_id: b, pieces: 15, remaining: 35 });
    }

    #[test]
    fn test_fifo_skips_empty_batches() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let draws = plan_fifo_draw(&[(a, 0), (b, 10)], 4).unwrap();

        assert_eq!(draws, vec![BatchDraw { batch_id: b, pieces: 4, remaining: 6 }]);
    }

    #[test]
    fn test_fifo_insufficient_stock() {
        let a = Uuid::new_v4();
        assert!(plan_fifo_draw(&[(a, 10)], 11).is_none());
    }

    #[test]
    fn test_fifo_rejects_non_positive_request() {
        let a = Uuid::nil();
        assert!(plan_fifo_draw(&[(a, 10)], 0).is_none());
        assert!(plan_fifo_draw(&[(a, 10)], -616).is_none());
    }

    proptest! {
        #[test]
        fn prop_fifo_draw_never_exceeds_a_batch(
            qtys in prop::collection::vec(0i64..1000, 0..10),
            wanted in -100i64..5000,
        ) {
            let batches: Vec<(Uuid, i64)> = qtys.iter().map(|&q| (Uuid::new_v4(), q)).collect();
            if let Some(draws) = plan_fifo_draw(&batches, wanted) {
                prop_assert!(wanted > 0);
                for draw in &draws {
                    let available = batches.iter().find(|(id, _)| *id == draw.batch_id).map(|(_, q)| *q);
                    prop_assert_eq!(Some(draw.pieces + draw.remaining), available);
                }
            }
        }
    }
}
