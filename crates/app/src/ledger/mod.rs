//! Change ledger and cache invalidation log.

pub mod models;
pub mod service;

pub use models::*;
pub use service::ChangeLedger;
