use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError, ValidationErrors};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_DATABASE_URL: &str = "sqlite://invoices.db?mode=rwc";
const DEFAULT_SEED_STATUS: &str = "DRAFT";
const CONFIG_DIR: &str = "config";

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    #[validate(length(min = 1))]
    pub database_url: String,

    /// Application environment
    #[validate(length(min = 1))]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    #[validate(range(min = 1))]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// DB idle timeout (seconds)
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,

    /// DB acquire timeout (seconds)
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    /// Turn on SQLite foreign key enforcement for every session
    #[serde(default = "default_true_bool")]
    pub enforce_foreign_keys: bool,

    /// Allow the destructive reset without a per-invocation confirmation
    #[serde(default)]
    pub allow_reset: bool,

    /// Accepted invoice statuses; empty accepts any text
    #[serde(default)]
    #[validate(custom = "validate_allowed_statuses")]
    pub allowed_statuses: Vec<String>,

    /// Status given to seeded demo invoices
    #[serde(default = "default_seed_status")]
    #[validate(length(min = 1))]
    pub seed_status: String,
}

impl AppConfig {
    pub fn new(database_url: String, environment: String) -> Self {
        Self {
            database_url,
            environment,
            log_level: default_log_level(),
            log_json: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            enforce_foreign_keys: true,
            allow_reset: false,
            allowed_statuses: Vec::new(),
            seed_status: default_seed_status(),
        }
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Checks that can't be expressed as field validators
    pub fn validate_additional_constraints(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.db_min_connections > self.db_max_connections {
            let mut err = ValidationError::new("db_min_connections");
            err.message = Some("db_min_connections cannot exceed db_max_connections".into());
            errors.add("db_min_connections", err);
        }

        // A standing reset permission in production would let any invocation wipe data.
        if self.is_production() && self.allow_reset {
            let mut err = ValidationError::new("allow_reset");
            err.message = Some("allow_reset must not be enabled in production".into());
            errors.add("allow_reset", err);
        }

        if !self.allowed_statuses.is_empty()
            && !self
                .allowed_statuses
                .iter()
                .any(|status| status.eq_ignore_ascii_case(&self.seed_status))
        {
            let mut err = ValidationError::new("seed_status");
            err.message = Some("seed_status must be one of allowed_statuses".into());
            errors.add("seed_status", err);
        }

        if errors.errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

/// Default value functions
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_seed_status() -> String {
    DEFAULT_SEED_STATUS.to_string()
}

fn default_db_max_connections() -> u32 {
    8
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_idle_timeout_secs() -> u64 {
    600
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}
fn default_true_bool() -> bool {
    true
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

fn validate_allowed_statuses(statuses: &Vec<String>) -> Result<(), ValidationError> {
    if statuses.iter().any(|s| s.trim().is_empty()) {
        let mut err = ValidationError::new("allowed_statuses");
        err.message = Some("allowed_statuses cannot contain blank entries".into());
        return Err(err);
    }
    Ok(())
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("invoice_store={},migration={},sea_orm_migration=info", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    // Support both RUN_ENV and APP_ENV for selecting config profile
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    load_config_from(Path::new(CONFIG_DIR), &run_env)
}

/// Same as [`load_config`] with an explicit config directory and profile.
pub fn load_config_from(config_dir: &Path, run_env: &str) -> Result<AppConfig, AppConfigError> {
    info!("Loading configuration for environment: {}", run_env);

    if !config_dir.exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            config_dir.display()
        );
    }

    let config = Config::builder()
        .set_default("database_url", DEFAULT_DATABASE_URL)?
        .set_default("environment", run_env)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .add_source(File::from(config_dir.join("default")).required(false))
        .add_source(File::from(config_dir.join(run_env)).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_statuses"),
        )
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    app_config.validate_additional_constraints().map_err(|e| {
        error!("Configuration constraint validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(format!("{name}.toml")), content).unwrap();
    }

    #[test]
    fn defaults_apply_without_config_files() {
        let dir = TempDir::new().unwrap();
        let cfg = load_config_from(dir.path(), "test").unwrap();

        assert_eq!(cfg.environment, "test");
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.enforce_foreign_keys);
        assert!(!cfg.allow_reset);
        assert!(cfg.allowed_statuses.is_empty());
        assert_eq!(cfg.seed_status, "DRAFT");
    }

    #[test]
    fn profile_file_overrides_default_file() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "default",
            r#"
            database_url = "sqlite://default.db?mode=rwc"
            allowed_statuses = ["DRAFT", "SUBMITTED"]
            "#,
        );
        write_config(
            &dir,
            "staging",
            r#"
            database_url = "sqlite://staging.db?mode=rwc"
            log_level = "debug"
            "#,
        );

        let cfg = load_config_from(dir.path(), "staging").unwrap();
        assert_eq!(cfg.database_url, "sqlite://staging.db?mode=rwc");
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.allowed_statuses, vec!["DRAFT", "SUBMITTED"]);
    }

    #[test]
    fn invalid_log_level_is_rejected() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "default", r#"log_level = "loud""#);

        let result = load_config_from(dir.path(), "test");
        match result {
            Err(AppConfigError::Validation(errors)) => {
                assert!(errors.field_errors().contains_key("log_level"));
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn production_refuses_standing_reset_permission() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "production".into());
        assert!(cfg.validate_additional_constraints().is_ok());

        cfg.allow_reset = true;
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn pool_bounds_must_be_ordered() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.db_min_connections = 10;
        cfg.db_max_connections = 2;
        assert!(cfg.validate_additional_constraints().is_err());
    }

    #[test]
    fn seed_status_must_be_allowed() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.allowed_statuses = vec!["PENDING".into()];
        assert!(cfg.validate_additional_constraints().is_err());

        cfg.seed_status = "pending".into();
        assert!(cfg.validate_additional_constraints().is_ok());

        cfg.allowed_statuses.clear();
        cfg.seed_status = "anything".into();
        assert!(cfg.validate_additional_constraints().is_ok());
    }

    #[test]
    fn blank_status_entries_are_rejected() {
        let mut cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        cfg.allowed_statuses = vec!["DRAFT".into(), " ".into()];
        assert!(cfg.validate().is_err());
    }
}
