//! # invoicer-core: Pure Business Logic for Invoicer
//!
//! This crate is the **heart** of Invoicer. It contains the money ledger and
//! the document lifecycle rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            HTTP / auth / exports (collaborators)                │   │
//! │  │    resolve tenant ──► parse JSON ──► call repository            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ wire DTOs (major units)               │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ invoicer-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   money   │  │  ledger   │  │ lifecycle │  │   wire    │  │   │
//! │  │   │   Money   │  │  totals   │  │  status   │  │ requests  │  │   │
//! │  │   │  ×100/÷100│  │  tax split│  │  planning │  │  views    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  invoicer-db (Database Layer)                   │   │
//! │  │        SQLite, migrations, transactional repositories          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type and major/minor unit conversion
//! - [`types`] - Kinds, statuses, tax rates, taxes and products
//! - [`document`] - Documents, line items, patches, listing types
//! - [`ledger`] - Line item and document totals reconciliation
//! - [`lifecycle`] - Status machines and pre-transaction planning
//! - [`validation`] - Field-level rules
//! - [`wire`] - JSON requests and views
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) past the wire
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use invoicer_core::ledger::{validate_document_totals, SuppliedTotals};
//! use invoicer_core::money::{to_minor_units, Money};
//!
//! // Convert once at the boundary
//! let total = to_minor_units(20.00).unwrap();
//! assert_eq!(total, Money::from_cents(2000));
//!
//! // An empty document must total zero
//! let supplied = SuppliedTotals { total: Some(total), ..Default::default() };
//! assert!(validate_document_totals(&supplied, &[]).is_err());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod document;
pub mod error;
pub mod ledger;
pub mod lifecycle;
pub mod money;
pub mod types;
pub mod validation;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use invoicer_core::Money` instead of
// `use invoicer_core::money::Money`

pub use document::*;
pub use error::{
    ArithmeticError, LedgerError, TransitionError, ValidationError, ValidationFailure, Violation,
};
pub use money::{to_major_units, to_minor_units, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minor units per major unit. Single currency, two decimals.
pub const MINOR_UNITS_PER_MAJOR: i64 = 100;

/// Maximum length of a document number.
pub const MAX_NUMBER_LEN: usize = 50;

/// Maximum length of names (products, taxes, sellers, references).
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of notes and addresses.
pub const MAX_NOTES_LEN: usize = 2000;

/// Maximum line items on one document.
pub const MAX_LINE_ITEMS: usize = 500;

/// Page size when a listing does not ask for one.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Largest page a listing may ask for.
pub const MAX_PAGE_LIMIT: u32 = 100;
