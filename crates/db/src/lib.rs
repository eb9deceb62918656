//! Database layer with `SeaORM` entities and repositories.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repository abstractions executing the ledger operations transactionally
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{GroupRepository, RepoError, RepoResult, SplitRepository};

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use splitledger_shared::config::DatabaseConfig;
use splitledger_shared::error::{AppError, AppResult};

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Establishes a pooled connection from application configuration.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect_with(config: &DatabaseConfig) -> AppResult<DatabaseConnection> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);

    Database::connect(options)
        .await
        .map_err(|err| AppError::Database(err.to_string()))
}
