//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories for accounts, journal entries, student ledgers and periods
//! - Database migrations
//! - The audit outbox and the posted-lines trial balance

pub mod audit;
pub mod entities;
pub mod migration;
pub mod repositories;
pub mod trial_balance;

pub use audit::{AuditOutbox, TracingAuditSink};
pub use repositories::{
    AccountRepository, JournalRepository, LegacyPayment, ManualEntryInput, PeriodRepository,
    PostingOutcome, StudentLedgerRepository,
};
pub use trial_balance::PostedLinesTrialBalance;

use std::time::Duration;

use bursar_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection using the configured pool bounds.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    Database::connect(options).await
}
