//! Stock validation, reduction, and synchronization.

pub mod errors;
pub mod models;
mod repository;
pub mod service;

pub use errors::StockServiceError;
pub use service::*;
