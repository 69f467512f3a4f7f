#![allow(dead_code)]

use std::sync::Arc;

use invoice_store::{
    config::AppConfig,
    db,
    repositories::{InvoiceRepository, ItemRepository},
    schema,
};
use sea_orm::DatabaseConnection;

/// Fresh in-memory database without any tables.
pub async fn empty_db(enforce_foreign_keys: bool) -> DatabaseConnection {
    let mut cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());
    cfg.enforce_foreign_keys = enforce_foreign_keys;

    db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to open in-memory database")
}

/// Fresh in-memory database with every migration applied and foreign keys enforced.
pub async fn migrated_db() -> Arc<DatabaseConnection> {
    let pool = empty_db(true).await;
    schema::migrate(&pool)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(pool)
}

pub struct TestStore {
    pub db: Arc<DatabaseConnection>,
    pub invoices: InvoiceRepository,
    pub items: ItemRepository,
}

impl TestStore {
    pub async fn new() -> Self {
        Self::from_db(migrated_db().await)
    }

    pub fn from_db(db: Arc<DatabaseConnection>) -> Self {
        Self {
            invoices: InvoiceRepository::new(db.clone()),
            items: ItemRepository::new(db.clone()),
            db,
        }
    }
}
