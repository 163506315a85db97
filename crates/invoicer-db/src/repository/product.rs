//! # Product Repository
//!
//! Database operations for a tenant's product catalog.
//!
//! ## Key Operations
//! - Create with an optional tax reference (must belong to the same tenant)
//! - Lookup and name search
//! - Delete, blocked while line items still reference the product

use chrono::{DateTime, Utc};
use invoicer_core::validation::{product_violations, validate_search_query};
use invoicer_core::{Money, NewProduct, Product, ValidationFailure};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::repository::{describe_dependents, is_owned, new_id, Owned};

const PRODUCT_COLUMNS: &str =
    "id, tenant_id, name, description, hsn_code, price_cents, tax_id, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    tenant_id: String,
    name: String,
    description: Option<String>,
    hsn_code: Option<String>,
    price_cents: i64,
    tax_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            description: row.description,
            hsn_code: row.hsn_code,
            price: Money::from_cents(row.price_cents),
            tax_id: row.tax_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// // Search products by name
/// let results = repo.list(tenant, Some("consult")).await?;
///
/// // Get by ID
/// let product = repo.get(tenant, "uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(StoreError::ValidationFailed)` - Missing name, negative price
    /// * `Err(StoreError::NotFound)` - `tax_id` is not one of the tenant's taxes
    pub async fn create(&self, tenant_id: &str, new: NewProduct) -> StoreResult<Product> {
        debug!(tenant_id = %tenant_id, name = %new.name, "Inserting product");

        ValidationFailure::check(product_violations(&new))?;

        let mut tx = self.pool.begin().await?;

        if let Some(tax_id) = &new.tax_id {
            if !is_owned(&mut tx, Owned::Tax, tenant_id, tax_id).await? {
                return Err(StoreError::not_found(Owned::Tax.entity(), tax_id.as_str()));
            }
        }

        let now = Utc::now();
        let product = Product {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            hsn_code: new.hsn_code,
            price: new.price,
            tax_id: new.tax_id,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, name, description, hsn_code,
                price_cents, tax_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.hsn_code)
        .bind(product.price.cents())
        .bind(&product.tax_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    pub async fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND tenant_id = ?2");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Product::from)
            .ok_or_else(|| StoreError::not_found("product", id))
    }

    /// Lists the tenant's products by name, optionally filtered by a
    /// case-insensitive substring of the name.
    pub async fn list(&self, tenant_id: &str, search: Option<&str>) -> StoreResult<Vec<Product>> {
        let search = match search {
            Some(q) => validate_search_query(q).map_err(ValidationFailure::from)?,
            None => String::new(),
        };

        debug!(tenant_id = %tenant_id, search = %search, "Listing products");

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE tenant_id = ?1 AND (?2 = '' OR name LIKE '%' || ?2 || '%') \
             ORDER BY name, id"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(&search)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed products");
        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Counts the tenant's products.
    pub async fn count(&self, tenant_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::DependencyConflict)` - Line items still reference it
    pub async fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<()> {
        debug!(tenant_id = %tenant_id, product_id = %id, "Deleting product");

        let mut tx = self.pool.begin().await?;

        if !is_owned(&mut tx, Owned::Product, tenant_id, id).await? {
            return Err(StoreError::not_found("product", id));
        }

        let line_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM line_items WHERE product_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(dependents) = describe_dependents(&[(line_items, "line item", "line items")]) {
            warn!(product_id = %id, dependents = %dependents, "Product delete blocked");
            return Err(StoreError::dependency("product", id, dependents));
        }

        sqlx::query("DELETE FROM products WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(product_id = %id, "Product deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
