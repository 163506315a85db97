//! # API Error Type
//!
//! The error body an HTTP layer sends back when a repository call fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Invoicer                               │
//! │                                                                         │
//! │  Handler                          invoicer-db                           │
//! │  ───────                          ───────────                           │
//! │                                                                         │
//! │  POST /invoices                                                         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  db.documents().create(..) ──► StoreError                               │
//! │                                    │                                    │
//! │                                    ▼                                    │
//! │                          ApiError::from(err)                            │
//! │                                    │                                    │
//! │         ◄──── status() + JSON ─────┘                                    │
//! │                                                                         │
//! │  { "code": "VALIDATION_FAILED",                                         │
//! │    "message": "validation failed: ...",                                 │
//! │    "reasons": ["the provided total (19.00) does not match ..."] }       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Storage failures are logged here and surfaced with a generic message so
//! SQL details never reach a client.

use serde::Serialize;

use crate::error::{DbError, StoreError};

/// Error body for a failed request.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "invoice not found: 6f1c...",
///   "reasons": ["invoice not found: 6f1c..."]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// One entry per broken rule; a single entry for non-validation errors
    pub reasons: Vec<String>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Ledger, field or transition rule broken (400)
    ValidationFailed,

    /// Resource not found (404)
    NotFound,

    /// Document number taken (409)
    DuplicateDocumentNumber,

    /// Client email taken (409)
    DuplicateClientEmail,

    /// Delete blocked by dependents (403)
    DependencyConflict,

    /// Database operation failed (500)
    StorageFailure,
}

impl ErrorCode {
    /// HTTP status code for this error.
    pub const fn status(&self) -> u16 {
        match self {
            ErrorCode::ValidationFailed => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::DuplicateDocumentNumber => 409,
            ErrorCode::DuplicateClientEmail => 409,
            ErrorCode::DependencyConflict => 403,
            ErrorCode::StorageFailure => 500,
        }
    }
}

impl ApiError {
    /// Creates an error with a single reason equal to the message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        ApiError {
            code,
            reasons: vec![message.clone()],
            message,
        }
    }

    /// HTTP status code for this error.
    pub fn status(&self) -> u16 {
        self.code.status()
    }

    fn storage(err: &DbError) -> Self {
        let message = match err {
            DbError::ConnectionFailed(_) | DbError::PoolExhausted => "Database unavailable",
            DbError::MigrationFailed(_) => "Database migration failed",
            _ => "Database operation failed",
        };
        tracing::error!(error = %err, "Storage failure");
        ApiError::new(ErrorCode::StorageFailure, message)
    }
}

/// Converts repository errors to API errors.
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::ValidationFailed(failure) => ApiError {
                code: ErrorCode::ValidationFailed,
                message: failure.to_string(),
                reasons: failure.reasons(),
            },
            StoreError::DuplicateDocumentNumber { .. } => {
                ApiError::new(ErrorCode::DuplicateDocumentNumber, err.to_string())
            }
            StoreError::DuplicateClientEmail { .. } => {
                ApiError::new(ErrorCode::DuplicateClientEmail, err.to_string())
            }
            StoreError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            StoreError::DependencyConflict { .. } => {
                ApiError::new(ErrorCode::DependencyConflict, err.to_string())
            }
            StoreError::Storage(db) => ApiError::storage(db),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use invoicer_core::error::{LedgerError, TotalsField, ValidationError};
    use invoicer_core::{DocumentKind, Money, ValidationFailure};

    #[test]
    fn test_validation_failure_lists_every_reason() {
        let failure = ValidationFailure::new(vec![
            LedgerError::TotalsMismatch {
                field: TotalsField::Total,
                expected: Money::from_cents(2000),
                provided: Money::from_cents(1900),
            }
            .into(),
            ValidationError::Required { field: "number".to_string() }.into(),
        ]);

        let api = ApiError::from(StoreError::from(failure));
        assert_eq!(api.code, ErrorCode::ValidationFailed);
        assert_eq!(api.status(), 400);
        assert_eq!(api.reasons.len(), 2);
        assert!(api.reasons[0].contains("20.00"));
        assert_eq!(api.reasons[1], "number is required");
    }

    #[test]
    fn test_status_mapping() {
        let dup = ApiError::from(StoreError::DuplicateDocumentNumber {
            kind: DocumentKind::Invoice,
            number: "INV-1".to_string(),
        });
        assert_eq!(dup.status(), 409);

        let missing = ApiError::from(StoreError::not_found("quote", "q1"));
        assert_eq!(missing.status(), 404);
        assert_eq!(missing.message, "quote not found: q1");

        let blocked = ApiError::from(StoreError::dependency("product", "p1", "3 line items"));
        assert_eq!(blocked.status(), 403);

        let email = ApiError::from(StoreError::DuplicateClientEmail {
            email: "asha@example.com".to_string(),
        });
        assert_eq!(email.code, ErrorCode::DuplicateClientEmail);
        assert_eq!(email.status(), 409);
    }

    #[test]
    fn test_storage_errors_are_generic() {
        let api = ApiError::from(StoreError::Storage(DbError::QueryFailed(
            "no such table: documents".to_string(),
        )));
        assert_eq!(api.code, ErrorCode::StorageFailure);
        assert_eq!(api.status(), 500);
        assert_eq!(api.message, "Database operation failed");
    }

    #[test]
    fn test_serialized_shape() {
        let api = ApiError::new(ErrorCode::NotFound, "tax not found: t1");
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["reasons"][0], "tax not found: t1");
    }
}
