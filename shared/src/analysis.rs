//! Dashboard stock analysis over trailing 30-day sales

use std::cmp::Ordering;

use serde::Serialize;
use uuid::Uuid;

use crate::alerts::MedicineStock;
use crate::health::{round1, LOW_STOCK_DAYS, OVERSTOCK_DAYS};

/// Entries shown per list
pub const ANALYSIS_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnalysisEntry {
    pub medicine_id: Uuid,
    pub name: String,
    pub current_stock: i64,
    pub units_sold_30d: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_of_stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_sales: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct StockAnalysis {
    pub fast_selling: Vec<AnalysisEntry>,
    pub slow_selling: Vec<AnalysisEntry>,
    pub overstock: Vec<AnalysisEntry>,
    pub understock: Vec<AnalysisEntry>,
}

fn entry(medicine: &MedicineStock) -> AnalysisEntry {
    let velocity = medicine.velocity();
    AnalysisEntry {
        medicine_id: medicine.medicine_id,
        name: medicine.name.clone(),
        current_stock: medicine.current_stock,
        units_sold_30d: medicine.units_sold_30d,
        days_of_stock: velocity.days_of_stock(medicine.current_stock).map(round1),
        daily_sales: velocity.has_history().then(|| round1(velocity.daily_rate())),
    }
}

fn by_days(a: &AnalysisEntry, b: &AnalysisEntry) -> Ordering {
    a.days_of_stock
        .partial_cmp(&b.days_of_stock)
        .unwrap_or(Ordering::Equal)
}

pub fn analyze_stock(medicines: &[MedicineStock]) -> StockAnalysis {
    let mut fast_selling: Vec<AnalysisEntry> = medicines
        .iter()
        .filter(|m| m.units_sold_30d > 0)
        .map(entry)
        .collect();
    fast_selling.sort_by(|a, b| b.units_sold_30d.cmp(&a.units_sold_30d));
    fast_selling.truncate(ANALYSIS_LIMIT);

    let mut slow_selling: Vec<AnalysisEntry> = medicines
        .iter()
        .filter(|m| m.units_sold_30d == 0 && m.current_stock > 0)
        .map(entry)
        .collect();
    slow_selling.sort_by(|a, b| b.current_stock.cmp(&a.current_stock));
    slow_selling.truncate(ANALYSIS_LIMIT);

    let mut overstock: Vec<AnalysisEntry> = medicines
        .iter()
        .filter(|m| m.current_stock > 0)
        .filter(|m| {
            m.velocity()
                .days_of_stock(m.current_stock)
                .is_some_and(|days| days > OVERSTOCK_DAYS)
        })
        .map(entry)
        .collect();
    overstock.sort_by(|a, b| by_days(b, a));
    overstock.truncate(ANALYSIS_LIMIT);

    let mut understock: Vec<AnalysisEntry> = medicines
        .iter()
        .filter(|m| {
            m.velocity()
                .days_of_stock(m.current_stock.max(0))
                .is_some_and(|days| days < LOW_STOCK_DAYS)
        })
        .map(entry)
        .collect();
    understock.sort_by(by_days);
    understock.truncate(ANALYSIS_LIMIT);

    StockAnalysis {
        fast_selling,
        slow_selling,
        overstock,
        understock,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn medicine(name: &str, stock: i64, sold: i64) -> MedicineStock {
        MedicineStock {
            medicine_id: Uuid::new_v4(),
            name: name.to_string(),
            unit: "tablet".to_string(),
            current_stock: stock,
            units_sold_30d: sold,
        }
    }

    #[test]
    fn test_buckets() {
        let medicines = vec![
            medicine("Paracetamol", 40, 210),
            medicine("Ibuprofen", 5000, 30),
            medicine("Cetirizine", 300, 0),
            medicine("Omeprazole", 0, 0),
        ];
        let analysis = analyze_stock(&medicines);

        let names = |list: &[AnalysisEntry]| list.iter().map(|e| e.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&analysis.fast_selling), vec!["Paracetamol", "Ibuprofen"]);
        assert_eq!(names(&analysis.slow_selling), vec!["Cetirizine"]);
        assert_eq!(names(&analysis.overstock), vec!["Ibuprofen"]);
        assert_eq!(names(&analysis.understock), vec!["Paracetamol"]);

        assert_eq!(analysis.understock[0].days_of_stock, Some(5.7));
        assert_eq!(analysis.understock[0].daily_sales, Some(7.0));
        assert_eq!(analysis.overstock[0].days_of_stock, Some(5000.0));
    }

    #[test]
    fn test_lists_are_capped() {
        let medicines: Vec<_> = (0..8)
            .map(|i| medicine(&format!("M{}", i), 10, 100 + i))
            .collect();
        let analysis = analyze_stock(&medicines);

        assert_eq!(analysis.fast_selling.len(), ANALYSIS_LIMIT);
        assert_eq!(analysis.fast_selling[0].name, "M7");
        assert_eq!(analysis.understock.len(), ANALYSIS_LIMIT);
    }

    #[test]
    fn test_empty() {
        assert_eq!(analyze_stock(&[]), StockAnalysis::default());
    }
}
