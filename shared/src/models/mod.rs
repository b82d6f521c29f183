//! Domain models for the pharmacy inventory service

mod batch;
mod medicine;
mod notification;
mod user;

pub use batch::*;
pub use medicine::*;
pub use notification::*;
pub use user::*;
