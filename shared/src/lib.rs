//! Shared types and stock health logic for the pharmacy inventory service
//!
//! This crate holds the domain models and every stock decision (expiry and
//! stock classification, sales velocity, alert planning). It performs no I/O.

pub mod alerts;
pub mod analysis;
pub mod health;
pub mod models;
pub mod types;

pub use alerts::*;
pub use analysis::*;
pub use health::*;
pub use models::*;
pub use types::*;
