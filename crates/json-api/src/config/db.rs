//! Database Config

use clap::Args;

/// Settings for the shared product/stock database.
#[derive(Debug, Args)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection string for the stock database, shared with
    /// the storefront deployment
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,
}
