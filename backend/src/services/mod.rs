//! Business logic services for the pharmacy inventory server

pub mod inventory;
pub mod notification;
pub mod sales;
pub mod stock_alerts;

pub use inventory::InventoryService;
pub use notification::NotificationService;
pub use sales::SalesService;
pub use stock_alerts::StockAlertService;
