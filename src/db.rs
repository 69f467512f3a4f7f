use crate::config::AppConfig;
use crate::errors::ServiceError;
use metrics::{counter, gauge, histogram};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement,
};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
    /// Whether SQLite sessions check foreign keys
    pub enforce_foreign_keys: bool,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 8,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
            enforce_foreign_keys: true,
        }
    }
}

/// Lifetime given to the connection backing an in-memory database; the
/// database disappears when that connection is recycled.
const MEMORY_CONNECTION_LIFETIME: Duration = Duration::from_secs(60 * 60 * 24 * 365);

impl DbConfig {
    /// An in-memory database lives as long as its connection, so the whole
    /// pool has to share exactly one.
    fn pins_single_connection(&self) -> bool {
        is_in_memory(&self.url)
    }
}

fn is_in_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Establishes a connection pool to the database
///
/// # Errors
/// Returns a `ServiceError` if the connection cannot be established
pub async fn establish_connection(database_url: &str) -> Result<DbPool, ServiceError> {
    let config = DbConfig {
        url: database_url.to_string(),
        ..Default::default()
    };

    establish_connection_with_config(&config).await
}

/// Establishes a connection pool to the database with custom configuration
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let pinned = config.pins_single_connection();
    let (max_connections, min_connections) = if pinned {
        (1, 1)
    } else {
        (config.max_connections, config.min_connections)
    };

    // The pragma is per-session: every connection the pool opens, including
    // replacements for recycled ones, gets the policy at connect time.
    let enforce = config.enforce_foreign_keys;
    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(max_connections)
        .min_connections(min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .map_sqlx_sqlite_opts(move |opts| opts.foreign_keys(enforce))
        .sqlx_logging(false);

    if pinned {
        opt.idle_timeout(MEMORY_CONNECTION_LIFETIME)
            .max_lifetime(MEMORY_CONNECTION_LIFETIME);
    }

    gauge!("invoice_store_db.max_connections", max_connections as f64);

    info!(
        "Connecting to database with max_connections={}",
        max_connections
    );

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!("Database connection establishment failed: {}", e);
        ServiceError::DatabaseError(e)
    })?;

    apply_foreign_key_policy(&db_pool, config.enforce_foreign_keys).await?;

    info!("Database connection pool established successfully");

    Ok(db_pool)
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
            enforce_foreign_keys: cfg.enforce_foreign_keys,
        }
    }
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Turns SQLite foreign key checking on or off for the session.
///
/// Only the connection that runs the pragma is affected; pools keep the
/// policy they were built with for new connections. Other backends always enforce declared foreign keys; the call is a
/// no-op for them.
pub async fn apply_foreign_key_policy(pool: &DbPool, enforce: bool) -> Result<(), ServiceError> {
    if pool.get_database_backend() != DbBackend::Sqlite {
        return Ok(());
    }

    let pragma = if enforce {
        "PRAGMA foreign_keys = ON"
    } else {
        warn!("Foreign key enforcement disabled; items may reference missing invoices");
        "PRAGMA foreign_keys = OFF"
    };
    pool.execute_unprepared(pragma).await?;
    debug!(enforce, "Applied foreign key policy");
    Ok(())
}

/// Reports whether the session currently enforces foreign keys.
pub async fn foreign_keys_enabled(pool: &DbPool) -> Result<bool, ServiceError> {
    if pool.get_database_backend() != DbBackend::Sqlite {
        return Ok(true);
    }

    let row = pool
        .query_one(Statement::from_string(
            DbBackend::Sqlite,
            "PRAGMA foreign_keys".to_string(),
        ))
        .await?
        .ok_or_else(|| ServiceError::NotFound("PRAGMA foreign_keys returned no row".into()))?;
    let flag: i32 = row.try_get("", "foreign_keys")?;
    Ok(flag != 0)
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    debug!("Checking database connection");
    let start = std::time::Instant::now();

    let result = pool.ping().await.map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            histogram!("invoice_store_db.connection_latency", elapsed);
        }
        Err(e) => {
            error!(
                "Database connection check failed after {:?}: {}",
                elapsed, e
            );
            counter!("invoice_store_db.connection_failures", 1);
        }
    }

    result
}

/// Closes the database connection pool
pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");

    pool.close().await.map_err(ServiceError::DatabaseError)
}
