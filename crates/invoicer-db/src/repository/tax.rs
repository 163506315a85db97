//! # Tax Repository
//!
//! Tax records a tenant attaches to products and line items.
//!
//! ## GST Breakdown
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gst 18%  ──►  intra-state: cgst 9% + sgst 9%   (must add up to gst)   │
//! │           └─►  inter-state: igst 18%            (must equal gst)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The breakdown is checked on create and on the merged record of every
//! update. A tax referenced by a product or a line item cannot be deleted.

use chrono::{DateTime, Utc};
use invoicer_core::validation::tax_violations;
use invoicer_core::{NewTax, Tax, TaxBreakdown, TaxPatch, ValidationFailure};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, StoreError, StoreResult};
use crate::repository::{describe_dependents, new_id, opt_rate_from_column, rate_from_column, rate_to_column};

const TABLE: &str = "taxes";

const TAX_COLUMNS: &str = "id, tenant_id, name, hsn_sac_code, description, \
     gst_bps, cgst_bps, sgst_bps, igst_bps, created_at, updated_at";

#[derive(Debug, FromRow)]
struct TaxRow {
    id: String,
    tenant_id: String,
    name: String,
    hsn_sac_code: Option<String>,
    description: Option<String>,
    gst_bps: i64,
    cgst_bps: Option<i64>,
    sgst_bps: Option<i64>,
    igst_bps: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaxRow> for Tax {
    type Error = DbError;

    fn try_from(row: TaxRow) -> Result<Self, Self::Error> {
        Ok(Tax {
            gst: rate_from_column(TABLE, row.gst_bps)?,
            cgst: opt_rate_from_column(TABLE, row.cgst_bps)?,
            sgst: opt_rate_from_column(TABLE, row.sgst_bps)?,
            igst: opt_rate_from_column(TABLE, row.igst_bps)?,
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            hsn_sac_code: row.hsn_sac_code,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn check_record(tax: &Tax) -> Result<(), ValidationFailure> {
    ValidationFailure::check(tax_violations(
        &tax.name,
        tax.hsn_sac_code.as_deref(),
        tax.description.as_deref(),
        &tax.breakdown(),
    ))
}

/// Repository for tax records.
///
/// ## Usage
/// ```rust,ignore
/// let gst18 = db.taxes().create(tenant, new_tax).await?;
/// let all = db.taxes().list(tenant).await?;
/// ```
#[derive(Debug, Clone)]
pub struct TaxRepository {
    pool: SqlitePool,
}

impl TaxRepository {
    /// Creates a new TaxRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TaxRepository { pool }
    }

    /// Creates a tax record.
    ///
    /// ## Returns
    /// * `Err(StoreError::ValidationFailed)` - Missing name, rate out of
    ///   range, or a breakdown that does not add up
    pub async fn create(&self, tenant_id: &str, new: NewTax) -> StoreResult<Tax> {
        debug!(tenant_id = %tenant_id, name = %new.name, "Creating tax");

        let rates = TaxBreakdown {
            gst: Some(new.gst),
            cgst: new.cgst,
            sgst: new.sgst,
            igst: new.igst,
        };
        ValidationFailure::check(tax_violations(
            &new.name,
            new.hsn_sac_code.as_deref(),
            new.description.as_deref(),
            &rates,
        ))?;

        let now = Utc::now();
        let tax = Tax {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            name: new.name.trim().to_string(),
            hsn_sac_code: new.hsn_sac_code,
            description: new.description,
            gst: new.gst,
            cgst: new.cgst,
            sgst: new.sgst,
            igst: new.igst,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO taxes (
                id, tenant_id, name, hsn_sac_code, description,
                gst_bps, cgst_bps, sgst_bps, igst_bps, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&tax.id)
        .bind(&tax.tenant_id)
        .bind(&tax.name)
        .bind(&tax.hsn_sac_code)
        .bind(&tax.description)
        .bind(i64::from(tax.gst.bps()))
        .bind(rate_to_column(tax.cgst))
        .bind(rate_to_column(tax.sgst))
        .bind(rate_to_column(tax.igst))
        .bind(tax.created_at)
        .bind(tax.updated_at)
        .execute(&self.pool)
        .await?;

        info!(tax_id = %tax.id, "Tax created");
        Ok(tax)
    }

    /// Gets a tax by id.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    pub async fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Tax> {
        let sql = format!("SELECT {TAX_COLUMNS} FROM taxes WHERE id = ?1 AND tenant_id = ?2");
        let row: Option<TaxRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Tax::try_from(row)?),
            None => Err(StoreError::not_found("tax", id)),
        }
    }

    /// Lists the tenant's taxes by name.
    pub async fn list(&self, tenant_id: &str) -> StoreResult<Vec<Tax>> {
        let sql = format!("SELECT {TAX_COLUMNS} FROM taxes WHERE tenant_id = ?1 ORDER BY name, id");
        let rows: Vec<TaxRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Listed taxes");
        rows.into_iter()
            .map(|row| Tax::try_from(row).map_err(StoreError::from))
            .collect()
    }

    /// Applies a partial update.
    ///
    /// Fields the patch omits keep their stored values; nullable fields sent
    /// as null are cleared. The merged record is validated as a whole.
    pub async fn update(&self, tenant_id: &str, id: &str, patch: TaxPatch) -> StoreResult<Tax> {
        debug!(tenant_id = %tenant_id, tax_id = %id, "Updating tax");

        let existing = self.get(tenant_id, id).await?;
        let mut merged = patch.apply(&existing);
        merged.name = merged.name.trim().to_string();
        check_record(&merged)?;
        merged.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE taxes SET
                name = ?3,
                hsn_sac_code = ?4,
                description = ?5,
                gst_bps = ?6,
                cgst_bps = ?7,
                sgst_bps = ?8,
                igst_bps = ?9,
                updated_at = ?10
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&merged.name)
        .bind(&merged.hsn_sac_code)
        .bind(&merged.description)
        .bind(i64::from(merged.gst.bps()))
        .bind(rate_to_column(merged.cgst))
        .bind(rate_to_column(merged.sgst))
        .bind(rate_to_column(merged.igst))
        .bind(merged.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("tax", id));
        }

        Ok(merged)
    }

    /// Deletes a tax record.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::DependencyConflict)` - Products or line items use it
    pub async fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<()> {
        debug!(tenant_id = %tenant_id, tax_id = %id, "Deleting tax");

        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM taxes WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(StoreError::not_found("tax", id));
        }

        let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tax_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        let line_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM line_items WHERE tax_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(dependents) = describe_dependents(&[
            (products, "product", "products"),
            (line_items, "line item", "line items"),
        ]) {
            warn!(tax_id = %id, dependents = %dependents, "Tax delete blocked");
            return Err(StoreError::dependency("tax", id, dependents));
        }

        sqlx::query("DELETE FROM taxes WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(tax_id = %id, "Tax deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use invoicer_core::{Money, NewProduct, TaxRate};

    const TENANT: &str = "tenant-a";

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn gst18() -> NewTax {
        NewTax {
            name: "GST 18%".to_string(),
            hsn_sac_code: Some("9983".to_string()),
            description: None,
            gst: TaxRate::from_bps(1800),
            cgst: Some(TaxRate::from_bps(900)),
            sgst: Some(TaxRate::from_bps(900)),
            igst: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let created = db.taxes().create(TENANT, gst18()).await.unwrap();

        let fetched = db.taxes().get(TENANT, &created.id).await.unwrap();
        assert_eq!(fetched.name, "GST 18%");
        assert_eq!(fetched.gst, TaxRate::from_bps(1800));
        assert_eq!(fetched.cgst, Some(TaxRate::from_bps(900)));
        assert_eq!(fetched.igst, None);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_breakdown() {
        let db = test_db().await;
        let new = NewTax {
            sgst: Some(TaxRate::from_bps(800)),
            ..gst18()
        };

        let err = db.taxes().create(TENANT, new).await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));
        assert!(db.taxes().list(TENANT).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_see_tax() {
        let db = test_db().await;
        let created = db.taxes().create(TENANT, gst18()).await.unwrap();

        let err = db.taxes().get("tenant-b", &created.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "tax", .. }));
        assert!(db.taxes().list("tenant-b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_explicit_presence() {
        let db = test_db().await;
        let created = db.taxes().create(TENANT, gst18()).await.unwrap();

        // Switch to inter-state: clear the split, set igst
        let patch = TaxPatch {
            cgst: Some(None),
            sgst: Some(None),
            igst: Some(Some(TaxRate::from_bps(1800))),
            hsn_sac_code: Some(None),
            ..Default::default()
        };
        let updated = db.taxes().update(TENANT, &created.id, patch).await.unwrap();
        assert_eq!(updated.cgst, None);
        assert_eq!(updated.igst, Some(TaxRate::from_bps(1800)));
        assert_eq!(updated.hsn_sac_code, None);
        assert_eq!(updated.name, "GST 18%");

        let stored = db.taxes().get(TENANT, &created.id).await.unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_update_checks_merged_breakdown() {
        let db = test_db().await;
        let created = db.taxes().create(TENANT, gst18()).await.unwrap();

        // gst changes but the stored split no longer adds up
        let patch = TaxPatch {
            gst: Some(TaxRate::from_bps(1200)),
            ..Default::default()
        };
        let err = db.taxes().update(TENANT, &created.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(_)));

        let stored = db.taxes().get(TENANT, &created.id).await.unwrap();
        assert_eq!(stored.gst, TaxRate::from_bps(1800));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_product() {
        let db = test_db().await;
        let tax = db.taxes().create(TENANT, gst18()).await.unwrap();
        db.products()
            .create(
                TENANT,
                NewProduct {
                    name: "Consulting".to_string(),
                    description: None,
                    hsn_code: None,
                    price: Money::from_cents(10_000),
                    tax_id: Some(tax.id.clone()),
                },
            )
            .await
            .unwrap();

        let err = db.taxes().delete(TENANT, &tax.id).await.unwrap_err();
        match err {
            StoreError::DependencyConflict { dependents, .. } => assert_eq!(dependents, "1 product"),
            other => panic!("expected dependency conflict, got {other:?}"),
        }
        assert!(db.taxes().get(TENANT, &tax.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let tax = db.taxes().create(TENANT, gst18()).await.unwrap();

        let err = db.taxes().delete("tenant-b", &tax.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        db.taxes().delete(TENANT, &tax.id).await.unwrap();
        assert!(db.taxes().get(TENANT, &tax.id).await.is_err());
    }
}
