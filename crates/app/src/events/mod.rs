//! Realtime broadcast events.

pub mod hub;
pub mod models;

pub use hub::EventHub;
pub use models::*;
