//! # invoicer-db: Database Layer for Invoicer
//!
//! This crate stores invoices, quotes, purchase invoices, clients, taxes and
//! products in SQLite with sqlx, and runs the document lifecycle transactionally.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Invoicer Data Flow                               │
//! │                                                                         │
//! │  HTTP handler (tenant resolved, JSON parsed via invoicer-core::wire)   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   invoicer-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ (document.rs) │    │  (embedded)  │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ SqlitePool    │    │ DocumentRepo  │    │ 001_init.sql │  │   │
//! │  │   │ DbConfig      │◄───│ TaxRepo       │    │              │  │   │
//! │  │   │ from_env()    │    │ ProductRepo   │    │              │  │   │
//! │  │   │               │    │ ClientRepo    │    │              │  │   │
//! │  │   │               │    │ AddressRepo   │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   StoreError ──► api::ApiError { code, message, reasons }      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and repository error types
//! - [`api`] - Error body and HTTP status mapping
//! - [`repository`] - Repository implementations (document, tax, product, client, address)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use invoicer_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::from_env()?).await?;
//!
//! let created = db.documents().create(tenant_id, new_invoice).await?;
//! let page = db.documents().list(tenant_id, DocumentKind::Invoice, &filter).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod api;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use api::{ApiError, ErrorCode};
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{ConfigError, Database, DbConfig};

// Repository re-exports for convenience
pub use repository::address::AddressRepository;
pub use repository::client::ClientRepository;
pub use repository::document::DocumentRepository;
pub use repository::product::ProductRepository;
pub use repository::tax::TaxRepository;
