//! Shared application domain and persistence modules.

pub mod context;
pub mod database;
pub mod events;
pub mod ledger;
pub mod stock;

#[cfg(test)]
mod test;
