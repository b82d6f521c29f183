//! Medicine and unit configuration models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Largest quantity accepted in one sale or receipt, in any unit
pub const MAX_ENTRY_QUANTITY: i64 = 1_000_000;

/// A medicine kept in stock
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    /// Display label for the base unit (e.g. "tablet")
    pub unit: String,
    pub units_per_pack: i32,
    pub packs_per_box: i32,
    /// Price per piece
    pub selling_price: Option<Decimal>,
    pub is_deleted: bool,
}

impl Medicine {
    pub fn units(&self) -> UnitConfig {
        UnitConfig::new(self.units_per_pack, self.packs_per_box)
    }
}

/// Unit in which a quantity is entered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    #[default]
    Piece,
    Pack,
    Box,
}

impl UnitType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitType::Piece => "piece",
            UnitType::Pack => "pack",
            UnitType::Box => "box",
        }
    }
}

impl std::fmt::Display for UnitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Piece/pack/box conversion factors for a medicine
///
/// A missing or non-positive factor counts as 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitConfig {
    units_per_pack: i64,
    packs_per_box: i64,
}

impl UnitConfig {
    pub fn new(units_per_pack: i32, packs_per_box: i32) -> Self {
        Self {
            units_per_pack: i64::from(units_per_pack.max(1)),
            packs_per_box: i64::from(packs_per_box.max(1)),
        }
    }

    pub fn pieces_per_box(&self) -> i64 {
        self.units_per_pack * self.packs_per_box
    }

    /// Convert a quantity in `unit` to pieces, `None` on overflow
    pub fn to_pieces(&self, quantity: i64, unit: UnitType) -> Option<i64> {
        match unit {
            UnitType::Piece => Some(quantity),
            UnitType::Pack => quantity.checked_mul(self.units_per_pack),
            UnitType::Box => quantity.checked_mul(self.pieces_per_box()),
        }
    }
}

impl Default for UnitConfig {
    fn default() -> Self {
        Self::new(1, 1)
    }
}
