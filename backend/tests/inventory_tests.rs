//! Inventory and dispensing tests
//!
//! Tests for unit conversion, first-in-first-out batch draws and the
//! dashboard stock analysis.

use proptest::prelude::*;
use shared::{analyze_stock, plan_fifo_draw, MedicineStock, UnitConfig, UnitType};
use uuid::Uuid;

fn medicine(name: &str, stock: i64, sold: i64) -> MedicineStock {
    MedicineStock {
        medicine_id: Uuid::new_v4(),
        name: name.to_string(),
        unit: "capsule".to_string(),
        current_stock: stock,
        units_sold_30d: sold,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_unit_conversion() {
        let units = UnitConfig::new(10, 12);
        assert_eq!(units.to_pieces(3, UnitType::Piece), Some(3));
        assert_eq!(units.to_pieces(3, UnitType::Pack), Some(30));
        assert_eq!(units.to_pieces(3, UnitType::Box), Some(360));
    }

    #[test]
    fn test_unset_factors_count_as_one() {
        let units = UnitConfig::new(0, -4);
        assert_eq!(units.to_pieces(7, UnitType::Box), Some(7));
    }

    #[test]
    fn test_fifo_draw_takes_oldest_first() {
        let oldest = Uuid::new_v4();
        let middle = Uuid::new_v4();
        let newest = Uuid::new_v4();
        let draws = plan_fifo_draw(&[(oldest, 5), (middle, 10), (newest, 50)], 12).unwrap();

        assert_eq!(draws.len(), 2);
        assert_eq!((draws[0].batch_id, draws[0].pieces, draws[0].remaining), (oldest, 5, 0));
        assert_eq!((draws[1].batch_id, draws[1].pieces, draws[1].remaining), (middle, 7, 3));
    }

    #[test]
    fn test_fifo_draw_fails_when_short() {
        assert!(plan_fifo_draw(&[(Uuid::new_v4(), 5), (Uuid::new_v4(), 4)], 10).is_none());
        assert!(plan_fifo_draw(&[], 1).is_none());
    }

    #[test]
    fn test_overflowing_box_count_is_rejected_before_drawing() {
        let units = UnitConfig::new(100, 10);
        let pieces = units.to_pieces(i64::MAX / 500, UnitType::Box);
        assert_eq!(pieces, None);

        // A wrapped negative count must never look like a completed draw.
        assert!(plan_fifo_draw(&[(Uuid::nil(), 10)], -616).is_none());
    }

    #[test]
    fn test_analysis_highlights_understock() {
        let analysis = analyze_stock(&[
            medicine("Amoxicillin", 40, 210),
            medicine("Metformin", 3000, 30),
        ]);
        assert_eq!(analysis.understock.len(), 1);
        assert_eq!(analysis.understock[0].name, "Amoxicillin");
        assert_eq!(analysis.overstock[0].name, "Metformin");
        assert_eq!(analysis.fast_selling[0].name, "Amoxicillin");
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn batches_strategy() -> impl Strategy<Value = Vec<(Uuid, i64)>> {
        prop::collection::vec(0i64..500, 0..8)
            .prop_map(|qtys| qtys.into_iter().map(|q| (Uuid::new_v4(), q)).collect())
    }

    proptest! {
        #[test]
        fn prop_fifo_draw_conserves_pieces(batches in batches_strategy(), wanted in 1i64..2000) {
            let available: i64 = batches.iter().map(|(_, q)| q).sum();
            match plan_fifo_draw(&batches, wanted) {
                Some(draws) => {
                    prop_assert!(available >= wanted);
                    prop_assert_eq!(draws.iter().map(|d| d.pieces).sum::<i64>(), wanted);
                    prop_assert!(draws.iter().all(|d| d.pieces > 0 && d.remaining >= 0));
                    // Every batch before the last one drawn is emptied.
                    for draw in &draws[..draws.len() - 1] {
                        prop_assert_eq!(draw.remaining, 0);
                    }
                }
                None => prop_assert!(available < wanted),
            }
        }

        #[test]
        fn prop_box_is_packs_of_pieces(per_pack in 1i32..50, per_box in 1i32..50, qty in 0i64..100) {
            let units = UnitConfig::new(per_pack, per_box);
            prop_assert_eq!(
                units.to_pieces(qty, UnitType::Box),
                units.to_pieces(qty * i64::from(per_box), UnitType::Pack)
            );
        }

        #[test]
        fn prop_analysis_lists_are_capped(stocks in prop::collection::vec((0i64..1000, 0i64..1000), 0..30)) {
            let medicines: Vec<MedicineStock> = stocks
                .into_iter()
                .map(|(stock, sold)| medicine("Generic", stock, sold))
                .collect();
            let analysis = analyze_stock(&medicines);
            prop_assert!(analysis.fast_selling.len() <= shared::ANALYSIS_LIMIT);
            prop_assert!(analysis.slow_selling.len() <= shared::ANALYSIS_LIMIT);
            prop_assert!(analysis.overstock.len() <= shared::ANALYSIS_LIMIT);
            prop_assert!(analysis.understock.len() <= shared::ANALYSIS_LIMIT);
        }
    }
}
