//! Stock health evaluation
//!
//! Classifies batches by expiry date and medicines by stock quantity and
//! trailing sales velocity. All thresholds are fixed.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Batches expiring within this many days are near expiry
pub const NEAR_EXPIRY_DAYS: i64 = 180;

/// Trailing window used to estimate daily consumption
pub const VELOCITY_WINDOW_DAYS: i64 = 30;

/// Fewer days of stock than this, with sales history, is low stock
pub const LOW_STOCK_DAYS: f64 = 7.0;

/// Fewer pieces than this is low stock regardless of sales
pub const LOW_STOCK_PIECES: i64 = 20;

/// Stock level cutoffs in pieces
pub const LOW_LEVEL_PIECES: i64 = 50;
pub const MEDIUM_LEVEL_PIECES: i64 = 200;

/// Days of stock above which a medicine counts as overstocked
pub const OVERSTOCK_DAYS: f64 = 90.0;

/// Expiry bucket of a batch
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryStatus {
    Good,
    NearExpiry,
    Expired,
}

impl std::fmt::Display for ExpiryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpiryStatus::Good => write!(f, "Good"),
            ExpiryStatus::NearExpiry => write!(f, "Near Expiry"),
            ExpiryStatus::Expired => write!(f, "Expired"),
        }
    }
}

/// Last day still counted as near expiry
pub fn near_expiry_cutoff(today: NaiveDate) -> NaiveDate {
    today + Duration::days(NEAR_EXPIRY_DAYS)
}

/// Classify an expiry date relative to `today`
pub fn classify_expiry(expiry: NaiveDate, today: NaiveDate) -> ExpiryStatus {
    if expiry < today {
        ExpiryStatus::Expired
    } else if expiry <= near_expiry_cutoff(today) {
        ExpiryStatus::NearExpiry
    } else {
        ExpiryStatus::Good
    }
}

/// Batches without an expiry date are not evaluated
pub fn classify_batch_expiry(expiry: Option<NaiveDate>, today: NaiveDate) -> Option<ExpiryStatus> {
    expiry.map(|date| classify_expiry(date, today))
}

/// Quantity bucket of a batch or medicine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum StockLevel {
    Low,
    Medium,
    InStock,
}

impl StockLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::Low => "low",
            StockLevel::Medium => "medium",
            StockLevel::InStock => "in_stock",
        }
    }
}

pub fn classify_stock_level(pieces: i64) -> StockLevel {
    if pieces < LOW_LEVEL_PIECES {
        StockLevel::Low
    } else if pieces < MEDIUM_LEVEL_PIECES {
        StockLevel::Medium
    } else {
        StockLevel::InStock
    }
}

/// Trailing sales of one medicine
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SalesVelocity {
    pub units_sold: i64,
    pub window_days: i64,
}

impl SalesVelocity {
    pub fn trailing(units_sold: i64) -> Self {
        Self {
            units_sold: units_sold.max(0),
            window_days: VELOCITY_WINDOW_DAYS,
        }
    }

    pub fn has_history(&self) -> bool {
        self.units_sold > 0
    }

    /// Estimated pieces consumed per day
    pub fn daily_rate(&self) -> f64 {
        if self.window_days <= 0 {
            return 0.0;
        }
        self.units_sold as f64 / self.window_days as f64
    }

    /// `None` when there is no sales history to divide by
    pub fn days_of_stock(&self, current_stock: i64) -> Option<f64> {
        let rate = self.daily_rate();
        if rate > 0.0 {
            Some(current_stock as f64 / rate)
        } else {
            None
        }
    }
}

/// Why a medicine counts as low on stock
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum LowStockReason {
    /// Sales would exhaust stock within a week
    Velocity { days_of_stock: f64, daily_rate: f64 },
    /// Below the absolute piece minimum
    BelowMinimum,
}

/// Stock condition of a medicine
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StockCondition {
    OutOfStock,
    LowStock(LowStockReason),
    Healthy,
}

impl StockCondition {
    pub fn needs_reorder(&self) -> bool {
        !matches!(self, StockCondition::Healthy)
    }
}

/// Assess a medicine from its aggregate stock and trailing sales
pub fn assess_stock(current_stock: i64, velocity: &SalesVelocity) -> StockCondition {
    if current_stock <= 0 {
        return StockCondition::OutOfStock;
    }

    if let Some(days) = velocity.days_of_stock(current_stock) {
        if days < LOW_STOCK_DAYS {
            return StockCondition::LowStock(LowStockReason::Velocity {
                days_of_stock: days,
                daily_rate: velocity.daily_rate(),
            });
        }
    }

    if current_stock < LOW_STOCK_PIECES {
        StockCondition::LowStock(LowStockReason::BelowMinimum)
    } else {
        StockCondition::Healthy
    }
}

/// Round to one decimal place for display
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expiry_boundaries() {
        let today = date(2024, 1, 1);
        assert_eq!(classify_expiry(date(2023, 12, 31), today), ExpiryStatus::Expired);
        assert_eq!(classify_expiry(today, today), ExpiryStatus::NearExpiry);
        assert_eq!(
            classify_expiry(today + Duration::days(180), today),
            ExpiryStatus::NearExpiry
        );
        assert_eq!(
            classify_expiry(today + Duration::days(181), today),
            ExpiryStatus::Good
        );
    }

    #[test]
    fn test_missing_expiry_not_evaluated() {
        assert_eq!(classify_batch_expiry(None, date(2024, 1, 1)), None);
    }

    #[test]
    fn test_stock_levels() {
        assert_eq!(classify_stock_level(0), StockLevel::Low);
        assert_eq!(classify_stock_level(49), StockLevel::Low);
        assert_eq!(classify_stock_level(50), StockLevel::Medium);
        assert_eq!(classify_stock_level(199), StockLevel::Medium);
        assert_eq!(classify_stock_level(200), StockLevel::InStock);
    }

    #[test]
    fn test_velocity_rule() {
        let velocity = SalesVelocity::trailing(210);
        assert_eq!(velocity.daily_rate(), 7.0);

        match assess_stock(40, &velocity) {
            StockCondition::LowStock(LowStockReason::Velocity { days_of_stock, daily_rate }) => {
                assert!((days_of_stock - 40.0 / 7.0).abs() < 1e-9);
                assert_eq!(daily_rate, 7.0);
            }
            other => panic!("expected velocity low stock, got {:?}", other),
        }
    }

    #[test]
    fn test_absolute_rule_without_history() {
        let velocity = SalesVelocity::trailing(0);
        assert_eq!(velocity.days_of_stock(15), None);
        assert_eq!(
            assess_stock(15, &velocity),
            StockCondition::LowStock(LowStockReason::BelowMinimum)
        );
        assert_eq!(assess_stock(20, &velocity), StockCondition::Healthy);
    }

    #[test]
    fn test_out_of_stock_wins() {
        assert_eq!(
            assess_stock(0, &SalesVelocity::trailing(300)),
            StockCondition::OutOfStock
        );
        assert_eq!(
            assess_stock(0, &SalesVelocity::trailing(0)),
            StockCondition::OutOfStock
        );
    }

    #[test]
    fn test_round1() {
        assert_eq!(round1(5.714), 5.7);
        assert_eq!(round1(90.06), 90.1);
    }
}
