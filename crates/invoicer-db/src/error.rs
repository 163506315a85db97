//! # Database Error Types
//!
//! Error types for database operations and for the document lifecycle.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Adds context and categorization                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError ← What a repository operation reports                      │
//! │       │      (ValidationFailure from invoicer-core joins here)         │
//! │       ▼                                                                 │
//! │  ApiError (api.rs) ← Serialized for the HTTP collaborator              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use invoicer_core::{DocumentKind, ValidationFailure};
use thiserror::Error;

/// Database operation errors.
///
/// These errors wrap sqlx errors and provide additional context
/// for debugging and user feedback.
#[derive(Debug, Error)]
pub enum DbError {
    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Two concurrent creates with the same document number
    /// - Any UNIQUE index violation
    #[error("Duplicate value for {constraint}")]
    UniqueViolation { constraint: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value could not be mapped back to a domain type.
    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a CorruptRow error.
    pub fn corrupt(table: &'static str, reason: impl Into<String>) -> Self {
        DbError::CorruptRow {
            table,
            reason: reason.into(),
        }
    }

    /// True for a UNIQUE violation on a tenant's client emails.
    pub fn is_duplicate_client_email(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { constraint }
                if constraint.contains("clients.email")
        )
    }

    /// True for a UNIQUE violation on the document number index.
    pub fn is_duplicate_document_number(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { constraint }
                if constraint.contains("documents.number")
        )
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::ColumnDecode   → DbError::CorruptRow
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite error messages for constraints:
                // UNIQUE constraint: "UNIQUE constraint failed: <table>.<column>, ..."
                // FK constraint: "FOREIGN KEY constraint failed"
                if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        constraint: columns.to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::ColumnDecode { index, source } => {
                DbError::corrupt("unknown", format!("column {index}: {source}"))
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Store Error
// =============================================================================

/// What a repository operation reports to its caller.
///
/// Everything except `Storage` is a client error and is never retried.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request broke a ledger, field or transition rule.
    #[error(transparent)]
    ValidationFailed(#[from] ValidationFailure),

    /// A document with this number already exists for the tenant and kind.
    #[error("a {kind} numbered {number} already exists")]
    DuplicateDocumentNumber { kind: DocumentKind, number: String },

    /// Another client of the tenant already uses this email.
    #[error("a client with email {email} already exists")]
    DuplicateClientEmail { email: String },

    /// Absent, or owned by another tenant.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Deleting would orphan records that reference this one.
    #[error("{entity} {id} is still referenced by {dependents}")]
    DependencyConflict {
        entity: &'static str,
        id: String,
        dependents: String,
    },

    /// The storage engine failed.
    #[error(transparent)]
    Storage(#[from] DbError),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn dependency(
        entity: &'static str,
        id: impl Into<String>,
        dependents: impl Into<String>,
    ) -> Self {
        StoreError::DependencyConflict {
            entity,
            id: id.into(),
            dependents: dependents.into(),
        }
    }

    /// Machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::ValidationFailed(_) => "VALIDATION_FAILED",
            StoreError::DuplicateDocumentNumber { .. } => "DUPLICATE_DOCUMENT_NUMBER",
            StoreError::DuplicateClientEmail { .. } => "DUPLICATE_CLIENT_EMAIL",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::DependencyConflict { .. } => "DEPENDENCY_CONFLICT",
            StoreError::Storage(_) => "STORAGE_FAILURE",
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Storage(err.into())
    }
}

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_number_detection() {
        let err = DbError::UniqueViolation {
            constraint: "documents.tenant_id, documents.kind, documents.number".to_string(),
        };
        assert!(err.is_duplicate_document_number());

        let other = DbError::UniqueViolation {
            constraint: "taxes.tenant_id, taxes.name".to_string(),
        };
        assert!(!other.is_duplicate_document_number());
        assert!(!other.is_duplicate_client_email());

        let email = DbError::UniqueViolation {
            constraint: "clients.tenant_id, clients.email".to_string(),
        };
        assert!(email.is_duplicate_client_email());
        assert!(!email.is_duplicate_document_number());
    }

    #[test]
    fn test_store_error_messages() {
        let err = StoreError::DuplicateDocumentNumber {
            kind: DocumentKind::PurchaseInvoice,
            number: "PI-7".to_string(),
        };
        assert_eq!(err.to_string(), "a purchase invoice numbered PI-7 already exists");
        assert_eq!(err.kind(), "DUPLICATE_DOCUMENT_NUMBER");

        let err = StoreError::dependency("tax", "t1", "2 products");
        assert_eq!(err.to_string(), "tax t1 is still referenced by 2 products");
    }
}
