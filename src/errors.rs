use sea_orm::{DbErr, SqlErr};

use crate::config::AppConfigError;

const NOT_NULL_MARKER: &str = "NOT NULL constraint failed: ";
const FOREIGN_KEY_MARKER: &str = "FOREIGN KEY constraint failed";
const UNIQUE_MARKER: &str = "UNIQUE constraint failed";
const FOREIGN_KEY_MISMATCH_MARKER: &str = "foreign key mismatch";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(DbErr),

    /// A required column was absent from an insert or update.
    #[error("Not null violation: {0}")]
    NotNullViolation(String),

    /// An item referenced an invoice that does not exist, or an invoice
    /// still owning items was removed.
    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    /// The engine could not check a foreign key because the referenced
    /// column carries no uniqueness constraint.
    #[error("Foreign key mismatch: {0}")]
    ForeignKeyMismatch(String),

    #[error("Unique violation: {0}")]
    UniqueViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Reset refused: destructive reset requires explicit confirmation")]
    ResetNotConfirmed,

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<DbErr> for ServiceError {
    fn from(err: DbErr) -> Self {
        ServiceError::from_db(err)
    }
}

impl From<AppConfigError> for ServiceError {
    fn from(err: AppConfigError) -> Self {
        ServiceError::ConfigError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Sorts a raw database error into the constraint category it belongs to.
    ///
    /// sea-orm's `SqlErr` covers unique and foreign-key violations portably;
    /// not-null violations and foreign key mismatches are only reported
    /// through the engine message.
    pub fn from_db(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                return ServiceError::UniqueViolation(detail)
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                return ServiceError::ReferentialIntegrity(detail)
            }
            _ => {}
        }

        let message = err.to_string();
        if let Some(column) = not_null_column(&message) {
            return ServiceError::NotNullViolation(column);
        }
        if message.to_ascii_lowercase().contains(FOREIGN_KEY_MISMATCH_MARKER) {
            return ServiceError::ForeignKeyMismatch(message);
        }
        if message.contains(FOREIGN_KEY_MARKER) {
            return ServiceError::ReferentialIntegrity(message);
        }
        if message.contains(UNIQUE_MARKER) {
            return ServiceError::UniqueViolation(message);
        }

        ServiceError::DatabaseError(err)
    }

    /// True for errors raised by a storage constraint rather than by the
    /// connection or the caller.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(
            self,
            Self::NotNullViolation(_)
                | Self::ReferentialIntegrity(_)
                | Self::ForeignKeyMismatch(_)
                | Self::UniqueViolation(_)
        )
    }
}

/// Extracts the offending `table.column` from a not-null failure.
fn not_null_column(message: &str) -> Option<String> {
    if let Some(idx) = message.find(NOT_NULL_MARKER) {
        let rest = &message[idx + NOT_NULL_MARKER.len()..];
        let column = rest
            .split(|c: char| c.is_whitespace() || c == ')' || c == '"')
            .next()
            .unwrap_or_default();
        return Some(column.to_string());
    }

    // Postgres: null value in column "status" of relation "invoices" violates not-null constraint
    if message.contains("violates not-null constraint") {
        let column = message
            .split("column \"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .unwrap_or_default();
        return Some(column.to_string());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn sqlite_not_null_message_names_the_column() {
        let err = ServiceError::from_db(DbErr::Custom(
            "error returned from database: (code: 1299) NOT NULL constraint failed: invoices.status"
                .into(),
        ));
        assert_matches!(err, ServiceError::NotNullViolation(column) if column == "invoices.status");
    }

    #[test]
    fn postgres_not_null_message_names_the_column() {
        let err = ServiceError::from_db(DbErr::Custom(
            "null value in column \"invoice_id\" of relation \"items\" violates not-null constraint"
                .into(),
        ));
        assert_matches!(err, ServiceError::NotNullViolation(column) if column == "invoice_id");
    }

    #[test]
    fn foreign_key_mismatch_is_distinct_from_integrity_failure() {
        let mismatch = ServiceError::from_db(DbErr::Custom(
            "foreign key mismatch - \"items\" referencing \"invoices\"".into(),
        ));
        assert_matches!(mismatch, ServiceError::ForeignKeyMismatch(_));

        let failed = ServiceError::from_db(DbErr::Custom("FOREIGN KEY constraint failed".into()));
        assert_matches!(failed, ServiceError::ReferentialIntegrity(_));
    }

    #[test]
    fn unique_message_falls_back_to_unique_violation() {
        let err = ServiceError::from_db(DbErr::Custom(
            "UNIQUE constraint failed: invoices.invoice_id".into(),
        ));
        assert_matches!(err, ServiceError::UniqueViolation(_));
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn unrelated_errors_stay_database_errors() {
        let err = ServiceError::from_db(DbErr::RecordNotFound("invoice".into()));
        assert_matches!(err, ServiceError::DatabaseError(_));
        assert!(!err.is_constraint_violation());
    }
}
