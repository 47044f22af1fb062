//! Database migrations.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_account_tables;
mod m20250601_000002_create_event_tables;
mod m20250601_000003_create_moderation_tables;
mod m20250601_000004_create_certificate_table;
mod m20250601_000005_create_review_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_account_tables::Migration),
            Box::new(m20250601_000002_create_event_tables::Migration),
            Box::new(m20250601_000003_create_moderation_tables::Migration),
            Box::new(m20250601_000004_create_certificate_table::Migration),
            Box::new(m20250601_000005_create_review_table::Migration),
        ]
    }
}
