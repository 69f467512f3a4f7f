use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::ServiceError;

pub mod invoice_repository;
pub mod item_repository;

pub use invoice_repository::{InvoiceRepository, NewInvoice};
pub use item_repository::{ItemRepository, NewItem};

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Which invoice statuses the store accepts.
///
/// Storage permits any text; narrowing it is a deployment decision made
/// through `allowed_statuses`. An empty list accepts everything.
#[derive(Debug, Clone, Default)]
pub struct StatusPolicy {
    allowed: Vec<String>,
}

impl StatusPolicy {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn only<I, S>(statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: statuses.into_iter().map(Into::into).collect(),
        }
    }

    /// Matching ignores ASCII case.
    pub fn check(&self, status: &str) -> Result<(), ServiceError> {
        if self.allowed.is_empty()
            || self
                .allowed
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(status))
        {
            Ok(())
        } else {
            Err(ServiceError::ValidationError(format!(
                "status '{}' is not one of: {}",
                status,
                self.allowed.join(", ")
            )))
        }
    }
}

impl From<&AppConfig> for StatusPolicy {
    fn from(cfg: &AppConfig) -> Self {
        Self::only(cfg.allowed_statuses.iter().cloned())
    }
}
