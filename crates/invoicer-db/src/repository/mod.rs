//! # Repository Module
//!
//! Database repository implementations for Invoicer.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Handler (tenant already resolved)                                     │
//! │       │                                                                 │
//! │       │  db.documents().create(tenant_id, new)                         │
//! │       ▼                                                                 │
//! │  DocumentRepository                                                    │
//! │  ├── plan with invoicer-core (pure, no I/O)                            │
//! │  ├── begin transaction                                                 │
//! │  ├── header + line items, every statement tenant-filtered              │
//! │  └── commit (dropped transaction = rollback)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows are read through `#[derive(FromRow)]` structs and converted into
//! `invoicer-core` types; a stored value that no longer parses surfaces as
//! [`DbError::CorruptRow`](crate::error::DbError::CorruptRow).
//!
//! ## Available Repositories
//!
//! - [`DocumentRepository`](document::DocumentRepository) - Invoices, quotes, purchase invoices
//! - [`TaxRepository`](tax::TaxRepository) - Tax records
//! - [`ProductRepository`](product::ProductRepository) - Product catalog
//! - [`ClientRepository`](client::ClientRepository) - Clients documents are billed to
//! - [`AddressRepository`](address::AddressRepository) - Client shipping addresses

pub mod address;
pub mod client;
pub mod document;
pub mod product;
pub mod tax;

use invoicer_core::TaxRate;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new record id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Reads a basis-point column.
pub(crate) fn rate_from_column(table: &'static str, bps: i64) -> DbResult<TaxRate> {
    u32::try_from(bps)
        .map(TaxRate::from_bps)
        .map_err(|_| DbError::corrupt(table, format!("tax rate {bps} out of range")))
}

pub(crate) fn opt_rate_from_column(table: &'static str, bps: Option<i64>) -> DbResult<Option<TaxRate>> {
    bps.map(|b| rate_from_column(table, b)).transpose()
}

pub(crate) fn rate_to_column(rate: Option<TaxRate>) -> Option<i64> {
    rate.map(|r| i64::from(r.bps()))
}

/// Tables whose rows carry a `tenant_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Owned {
    Tax,
    Product,
    Client,
    Address,
}

impl Owned {
    fn sql(&self) -> &'static str {
        match self {
            Owned::Tax => "SELECT COUNT(*) FROM taxes WHERE id = ?1 AND tenant_id = ?2",
            Owned::Product => "SELECT COUNT(*) FROM products WHERE id = ?1 AND tenant_id = ?2",
            Owned::Client => "SELECT COUNT(*) FROM clients WHERE id = ?1 AND tenant_id = ?2",
            Owned::Address => "SELECT COUNT(*) FROM addresses WHERE id = ?1 AND tenant_id = ?2",
        }
    }

    pub(crate) fn entity(&self) -> &'static str {
        match self {
            Owned::Tax => "tax",
            Owned::Product => "product",
            Owned::Client => "client",
            Owned::Address => "address",
        }
    }
}

/// Whether `id` exists in `table` for this tenant.
pub(crate) async fn is_owned(
    conn: &mut SqliteConnection,
    table: Owned,
    tenant_id: &str,
    id: &str,
) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar(table.sql())
        .bind(id)
        .bind(tenant_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

/// "2 products and 1 line item", skipping zero counts. `None` when nothing
/// depends on the record.
pub(crate) fn describe_dependents(counts: &[(i64, &str, &str)]) -> Option<String> {
    let parts: Vec<String> = counts
        .iter()
        .filter(|(n, _, _)| *n > 0)
        .map(|(n, one, many)| format!("{n} {}", if *n == 1 { one } else { many }))
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" and "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_dependents() {
        assert_eq!(describe_dependents(&[(0, "product", "products")]), None);
        assert_eq!(
            describe_dependents(&[(2, "product", "products"), (1, "line item", "line items")]),
            Some("2 products and 1 line item".to_string())
        );
        assert_eq!(
            describe_dependents(&[(0, "product", "products"), (3, "line item", "line items")]),
            Some("3 line items".to_string())
        );
    }

    #[test]
    fn test_rate_columns() {
        assert_eq!(rate_from_column("taxes", 1800).unwrap(), TaxRate::from_bps(1800));
        assert!(rate_from_column("taxes", -1).is_err());
        assert_eq!(rate_to_column(Some(TaxRate::from_bps(900))), Some(900));
        assert_eq!(opt_rate_from_column("taxes", None).unwrap(), None);
    }
}
