//! # Error Types
//!
//! Domain-specific error types for invoicer-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  invoicer-core errors (this file)                                      │
//! │  ├── ArithmeticError   - Major/minor unit conversion, overflow         │
//! │  ├── LedgerError       - Line item / totals / tax reconciliation       │
//! │  ├── ValidationError   - Field-level input problems                    │
//! │  ├── TransitionError   - Illegal status changes, re-conversion         │
//! │  └── ValidationFailure - Every violation found in one request          │
//! │                                                                         │
//! │  invoicer-db errors (separate crate)                                   │
//! │  ├── DbError           - Database operation failures                   │
//! │  └── StoreError        - What a lifecycle operation reports            │
//! │                                                                         │
//! │  Flow: Violation → ValidationFailure → StoreError → ApiError           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors is transient. They describe client input that
//! failed a rule and are never retried.

use std::fmt;

use thiserror::Error;

use crate::money::Money;
use crate::types::DocumentKind;

// =============================================================================
// Arithmetic Error
// =============================================================================

/// Failure converting or combining monetary values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ArithmeticError {
    /// NaN or infinity where a money amount was expected.
    #[error("amount {value} is not a finite number")]
    NotFinite { value: f64 },

    /// The amount does not land on a whole cent (e.g. `12.345`) or carries
    /// float noise from a client-side computation (e.g. `19.999999999999996`).
    #[error("amount {value} is not a whole number of cents")]
    SubCentPrecision { value: f64 },

    /// The amount cannot be represented exactly as an integer count of cents.
    #[error("amount {value} is outside the representable range")]
    OutOfRange { value: f64 },

    /// An integer sum or product of cents overflowed.
    #[error("overflow while computing {operation}")]
    Overflow { operation: &'static str },
}

// =============================================================================
// Ledger Error
// =============================================================================

/// The document aggregate that disagreed with its line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TotalsField {
    SubTotal,
    TotalTax,
    Total,
}

impl TotalsField {
    /// Wire name of the field.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TotalsField::SubTotal => "subTotal",
            TotalsField::TotalTax => "totalTax",
            TotalsField::Total => "total",
        }
    }
}

impl fmt::Display for TotalsField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component of the GST breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaxComponent {
    /// `cgst + sgst` compared against `gst`.
    CgstPlusSgst,
    /// `igst` compared against `gst`.
    Igst,
}

impl fmt::Display for TaxComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxComponent::CgstPlusSgst => f.write_str("cgst + sgst"),
            TaxComponent::Igst => f.write_str("igst"),
        }
    }
}

/// Reconciliation failures raised by the money ledger.
///
/// Amounts are reported in minor units, exactly as compared.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LedgerError {
    /// `total_price != price * quantity` for one line.
    #[error(
        "totalPrice for product {product_name} does not match price x quantity: expected {expected}, provided {provided}"
    )]
    LineItemMismatch {
        product_name: String,
        expected: Money,
        provided: Money,
    },

    /// A document aggregate does not match the sum over its line items.
    #[error("the provided {field} ({provided}) does not match the calculated {field} ({expected})")]
    TotalsMismatch {
        field: TotalsField,
        expected: Money,
        provided: Money,
    },

    /// GST components disagree with the headline rate (basis points).
    #[error("{component} ({provided} bps) does not match gst ({expected} bps)")]
    TaxBreakdownMismatch {
        component: TaxComponent,
        expected: u32,
        provided: u32,
    },

    /// A named amount could not be converted or combined.
    #[error("{field}: {source}")]
    InvalidAmount {
        field: String,
        #[source]
        source: ArithmeticError,
    },

    /// Arithmetic failed while reconciling totals.
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),
}

impl LedgerError {
    /// Attaches a field path to an arithmetic failure.
    pub fn amount(field: impl Into<String>, source: ArithmeticError) -> Self {
        LedgerError::InvalidAmount {
            field: field.into(),
            source,
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field-level input validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// The field does not exist on this kind of document.
    #[error("{field} does not apply to a {kind}")]
    NotApplicable { field: String, kind: DocumentKind },
}

// =============================================================================
// Transition Error
// =============================================================================

/// Illegal moves through a document's status machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The status belongs to another kind of document.
    #[error("status {status} is not valid for a {kind}")]
    StatusKindMismatch { kind: DocumentKind, status: String },

    /// The move is not an edge of the state machine.
    #[error("a {kind} cannot move from {from} to {to}")]
    InvalidTransition {
        kind: DocumentKind,
        from: String,
        to: String,
    },

    /// CONVERTED_TO_INVOICE is only reachable through conversion.
    #[error("CONVERTED_TO_INVOICE can only be reached by converting the quote")]
    ConversionOnly,

    /// The quote already produced an invoice.
    #[error("quote {quote_id} has already been converted to an invoice")]
    AlreadyConverted { quote_id: String },

    /// The quote is in a status that cannot be converted.
    #[error("quote {quote_id} is {status} and cannot be converted to an invoice")]
    NotConvertible { quote_id: String, status: String },

    /// The document's status moved after the update was planned.
    #[error("status changed from {expected} to {found} while the update was in progress")]
    StatusChanged { expected: String, found: String },
}

// =============================================================================
// Aggregated Failure
// =============================================================================

/// One reason a write was rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error(transparent)]
    Field(#[from] ValidationError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl From<ArithmeticError> for Violation {
    fn from(err: ArithmeticError) -> Self {
        Violation::Ledger(LedgerError::Arithmetic(err))
    }
}

/// Every violation found while checking one request.
///
/// Never empty when returned as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationFailure {
    violations: Vec<Violation>,
}

impl ValidationFailure {
    /// Wraps a non-empty list of violations.
    pub fn new(violations: Vec<Violation>) -> Self {
        ValidationFailure { violations }
    }

    /// Returns `Ok(())` when nothing was collected.
    pub fn check(violations: Vec<Violation>) -> Result<(), ValidationFailure> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure::new(violations))
        }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Human-readable reason per violation, in detection order.
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    /// First ledger error, if any. Handy in tests and logs.
    pub fn first_ledger_error(&self) -> Option<&LedgerError> {
        self.violations.iter().find_map(|v| match v {
            Violation::Ledger(e) => Some(e),
            _ => None,
        })
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation failed: {}", self.reasons().join("; "))
    }
}

impl std::error::Error for ValidationFailure {}

impl From<Violation> for ValidationFailure {
    fn from(violation: Violation) -> Self {
        ValidationFailure::new(vec![violation])
    }
}

impl From<ValidationError> for ValidationFailure {
    fn from(err: ValidationError) -> Self {
        Violation::from(err).into()
    }
}

impl From<LedgerError> for ValidationFailure {
    fn from(err: LedgerError) -> Self {
        Violation::from(err).into()
    }
}

impl From<TransitionError> for ValidationFailure {
    fn from(err: TransitionError) -> Self {
        Violation::from(err).into()
    }
}

impl From<ArithmeticError> for ValidationFailure {
    fn from(err: ArithmeticError) -> Self {
        Violation::from(err).into()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_mismatch_message() {
        let err = LedgerError::TotalsMismatch {
            field: TotalsField::Total,
            expected: Money::from_cents(2000),
            provided: Money::from_cents(1900),
        };
        assert_eq!(
            err.to_string(),
            "the provided total (19.00) does not match the calculated total (20.00)"
        );
    }

    #[test]
    fn test_line_item_message_names_product() {
        let err = LedgerError::LineItemMismatch {
            product_name: "Widget".to_string(),
            expected: Money::from_cents(2000),
            provided: Money::from_cents(1999),
        };
        assert!(err.to_string().contains("Widget"));
    }

    #[test]
    fn test_failure_collects_reasons() {
        let failure = ValidationFailure::new(vec![
            ValidationError::Required {
                field: "number".to_string(),
            }
            .into(),
            TransitionError::ConversionOnly.into(),
        ]);
        assert_eq!(failure.reasons().len(), 2);
        assert_eq!(failure.reasons()[0], "number is required");
        assert!(failure.to_string().starts_with("validation failed: "));
    }

    #[test]
    fn test_check_empty_is_ok() {
        assert!(ValidationFailure::check(Vec::new()).is_ok());
    }

    #[test]
    fn test_arithmetic_converts_to_failure() {
        let failure: ValidationFailure = ArithmeticError::Overflow {
            operation: "subTotal",
        }
        .into();
        assert!(matches!(
            failure.first_ledger_error(),
            Some(LedgerError::Arithmetic(_))
        ));
    }
}
