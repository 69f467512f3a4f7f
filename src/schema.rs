//! Schema lifecycle for the invoice store.
//!
//! Two paths exist on purpose: [`migrate`] only ever adds, and [`reset`]
//! drops everything and rebuilds it. `reset` cannot be called without a
//! [`ResetConfirmation`], which is only handed out on explicit consent.

use metrics::{counter, histogram};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement, TransactionTrait,
    Value,
};
use sea_orm_migration::prelude::{Alias, MigratorTrait, SchemaManager, Table};
use sea_orm_migration::MigrationStatus;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::migrator::Migrator;

pub const INVOICES_TABLE: &str = "invoices";
pub const ITEMS_TABLE: &str = "items";
const MIGRATIONS_TABLE: &str = "seaql_migrations";

/// Proof that an operator agreed to a destructive reset.
#[derive(Debug)]
pub struct ResetConfirmation {
    _private: (),
}

impl ResetConfirmation {
    /// Grants a confirmation only when `confirmed` is true.
    pub fn confirm(confirmed: bool) -> Result<Self, ServiceError> {
        if confirmed {
            Ok(Self { _private: () })
        } else {
            Err(ServiceError::ResetNotConfirmed)
        }
    }

    /// Grants a confirmation when the configuration carries a standing
    /// `allow_reset` permission.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, ServiceError> {
        Self::confirm(cfg.allow_reset)
    }

    /// An explicit `yes` wins; otherwise the configuration decides.
    pub fn resolve(yes: bool, cfg: &AppConfig) -> Result<Self, ServiceError> {
        if yes {
            Self::confirm(true)
        } else {
            Self::from_config(cfg)
        }
    }
}

/// Applies every pending migration and returns how many ran.
pub async fn migrate(db: &DatabaseConnection) -> Result<usize, ServiceError> {
    run_up(db, None).await
}

/// Applies at most `steps` pending migrations.
pub async fn migrate_to(db: &DatabaseConnection, steps: u32) -> Result<usize, ServiceError> {
    run_up(db, Some(steps)).await
}

async fn run_up(db: &DatabaseConnection, steps: Option<u32>) -> Result<usize, ServiceError> {
    info!("Running database migrations");
    let start = std::time::Instant::now();

    let pending_before = pending_count(db).await?;
    let result = Migrator::up(db, steps).await;

    let elapsed = start.elapsed();
    histogram!("invoice_store_db.migrate.duration", elapsed);

    if let Err(e) = result {
        error!("Database migrations failed after {:?}: {}", elapsed, e);
        counter!("invoice_store_db.migrate.failures", 1);
        return Err(ServiceError::MigrationError(e.to_string()));
    }

    let applied = pending_before - pending_count(db).await?;
    info!(
        applied,
        "Database migrations completed successfully in {:?}", elapsed
    );
    Ok(applied)
}

async fn pending_count(db: &DatabaseConnection) -> Result<usize, ServiceError> {
    Migrator::get_pending_migrations(db)
        .await
        .map(|pending| pending.len())
        .map_err(|e| ServiceError::MigrationError(e.to_string()))
}

/// Drops both tables and the migration ledger, then rebuilds the schema.
///
/// Every invoice and item is lost. The drops and the rebuild share one
/// transaction, so a failed rebuild leaves the previous schema and data.
pub async fn reset(
    db: &DatabaseConnection,
    _confirmation: ResetConfirmation,
) -> Result<(), ServiceError> {
    warn!("Resetting invoice schema; all invoices and items will be dropped");
    counter!("invoice_store_db.schema.reset", 1);

    let txn = db.begin().await?;
    let manager = SchemaManager::new(&txn);
    // Child first so no foreign key ever points at a missing parent table.
    for table in [ITEMS_TABLE, INVOICES_TABLE, MIGRATIONS_TABLE] {
        manager
            .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
            .await
            .map_err(|e| ServiceError::MigrationError(e.to_string()))?;
        info!(table, "Dropped table");
    }

    if let Err(e) = Migrator::up(&txn, None).await {
        error!("Schema rebuild failed, rolling back reset: {}", e);
        counter!("invoice_store_db.schema.reset_failures", 1);
        txn.rollback().await?;
        return Err(ServiceError::MigrationError(e.to_string()));
    }

    txn.commit().await?;
    info!("Invoice schema reset complete");
    Ok(())
}

/// Applied/pending state of one migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationState {
    pub name: String,
    pub applied: bool,
}

pub async fn status(db: &DatabaseConnection) -> Result<Vec<MigrationState>, ServiceError> {
    let migrations = Migrator::get_migration_with_status(db)
        .await
        .map_err(|e| ServiceError::MigrationError(e.to_string()))?;

    Ok(migrations
        .iter()
        .map(|m| MigrationState {
            name: m.name().to_string(),
            applied: matches!(m.status(), MigrationStatus::Applied),
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ColumnShape {
    pub name: String,
    pub column_type: String,
    pub not_null: i32,
    pub pk: i32,
}

impl ColumnShape {
    pub fn is_nullable(&self) -> bool {
        self.not_null == 0 && self.pk == 0
    }

    pub fn is_primary_key(&self) -> bool {
        self.pk != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct IndexShape {
    pub name: String,
    pub is_unique: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ForeignKeyShape {
    pub target_table: String,
    pub from_column: String,
    pub to_column: String,
    pub on_delete: String,
}

/// Physical layout of one table as the engine reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableShape {
    pub name: String,
    pub columns: Vec<ColumnShape>,
    pub indexes: Vec<IndexShape>,
    pub foreign_keys: Vec<ForeignKeyShape>,
}

impl TableShape {
    pub fn exists(&self) -> bool {
        !self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnShape> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_unique_index(&self, name: &str) -> bool {
        self.indexes
            .iter()
            .any(|idx| idx.name == name && idx.is_unique != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    pub invoices: TableShape,
    pub items: TableShape,
}

/// Describes the `invoices` and `items` tables. Only SQLite is supported.
pub async fn inspect(db: &DatabaseConnection) -> Result<SchemaSnapshot, ServiceError> {
    if db.get_database_backend() != DbBackend::Sqlite {
        return Err(ServiceError::ValidationError(
            "schema inspection is only available for SQLite".into(),
        ));
    }

    Ok(SchemaSnapshot {
        invoices: table_shape(db, INVOICES_TABLE).await?,
        items: table_shape(db, ITEMS_TABLE).await?,
    })
}

async fn table_shape(db: &DatabaseConnection, table: &str) -> Result<TableShape, ServiceError> {
    let columns = ColumnShape::find_by_statement(pragma_statement(
        r#"SELECT name, type AS column_type, "notnull" AS not_null, pk
           FROM pragma_table_info(?) ORDER BY cid"#,
        table,
    ))
    .all(db)
    .await?;

    // Implicit autoindexes are skipped; they aren't part of the declared schema.
    let indexes = IndexShape::find_by_statement(pragma_statement(
        r#"SELECT name, "unique" AS is_unique
           FROM pragma_index_list(?)
           WHERE name NOT LIKE 'sqlite_autoindex_%'
           ORDER BY name"#,
        table,
    ))
    .all(db)
    .await?;

    let foreign_keys = ForeignKeyShape::find_by_statement(pragma_statement(
        r#"SELECT "table" AS target_table, "from" AS from_column, "to" AS to_column, on_delete
           FROM pragma_foreign_key_list(?) ORDER BY id, seq"#,
        table,
    ))
    .all(db)
    .await?;

    Ok(TableShape {
        name: table.to_string(),
        columns,
        indexes,
        foreign_keys,
    })
}

fn pragma_statement(sql: &str, table: &str) -> Statement {
    Statement::from_sql_and_values(DbBackend::Sqlite, sql, [Value::from(table)])
}
