//! HTTP request handlers

pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod notification;
pub mod sales;

pub use dashboard::*;
pub use health::*;
pub use inventory::*;
pub use notification::*;
pub use sales::*;
