//! Database layer for volunteer-hub.

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DatabaseTransaction, TransactionTrait};
use std::time::Duration;
use tracing::log::LevelFilter;
use volunteer_common::{AppError, Config};

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Start a transaction.
pub async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction, AppError> {
    db.begin()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Commit a transaction.
pub async fn commit(txn: DatabaseTransaction) -> Result<(), AppError> {
    txn.commit()
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}
