//! # Client Repository
//!
//! Clients are the parties invoices and quotes are billed to. A client owns
//! its addresses: they are created with it (or later through
//! [`AddressRepository`](super::address::AddressRepository)) and removed
//! with it.
//!
//! Emails are stored trimmed and lowercased; the UNIQUE index on
//! `(tenant_id, email)` rejects a second client with the same address.
//! A client that documents are billed or shipped to cannot be deleted.

use chrono::{DateTime, Utc};
use invoicer_core::validation::{client_violations, new_client_violations, validate_search_query};
use invoicer_core::{Client, ClientPatch, ClientSummary, NewClient, ValidationFailure};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, StoreError, StoreResult};
use crate::repository::address::insert_address;
use crate::repository::{describe_dependents, is_owned, new_id, Owned};

const CLIENT_COLUMNS: &str = "id, tenant_id, first_name, last_name, email, phone_no, pan_no, \
     company_name, gstin, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ClientRow {
    id: String,
    tenant_id: String,
    first_name: String,
    last_name: String,
    email: String,
    phone_no: String,
    pan_no: Option<String>,
    company_name: Option<String>,
    gstin: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            tenant_id: row.tenant_id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone_no: row.phone_no,
            pan_no: row.pan_no,
            company_name: row.company_name,
            gstin: row.gstin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ClientSummaryRow {
    #[sqlx(flatten)]
    client: ClientRow,
    invoices: i64,
    quotes: i64,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// PAN and GSTIN are printed in upper case.
fn normalize_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_uppercase())
}

fn email_conflict(email: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |err| {
        let err = DbError::from(err);
        if err.is_duplicate_client_email() {
            warn!(email = %email, "Client email taken");
            StoreError::DuplicateClientEmail {
                email: email.to_string(),
            }
        } else {
            StoreError::Storage(err)
        }
    }
}

/// Repository for clients.
///
/// ## Usage
/// ```rust,ignore
/// let client = db.clients().create(tenant, new_client).await?;
/// let addresses = db.addresses().list_for_client(tenant, &client.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Creates a client and the addresses sent with it, in one transaction.
    ///
    /// ## Returns
    /// * `Err(StoreError::ValidationFailed)` - A client or address field is invalid
    /// * `Err(StoreError::DuplicateClientEmail)` - Another client of the tenant uses the email
    pub async fn create(&self, tenant_id: &str, mut new: NewClient) -> StoreResult<Client> {
        new.email = normalize_email(&new.email);
        new.pan_no = normalize_code(new.pan_no);
        new.gstin = normalize_code(new.gstin);

        debug!(tenant_id = %tenant_id, email = %new.email, "Creating client");

        ValidationFailure::check(new_client_violations(&new))?;

        let now = Utc::now();
        let client = Client {
            id: new_id(),
            tenant_id: tenant_id.to_string(),
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            email: new.email,
            phone_no: new.phone_no.trim().to_string(),
            pan_no: new.pan_no,
            company_name: new.company_name,
            gstin: new.gstin,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, tenant_id, first_name, last_name, email, phone_no,
                pan_no, company_name, gstin, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&client.id)
        .bind(&client.tenant_id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.email)
        .bind(&client.phone_no)
        .bind(&client.pan_no)
        .bind(&client.company_name)
        .bind(&client.gstin)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(email_conflict(&client.email))?;

        let address_count = new.addresses.len();
        for data in new.addresses {
            insert_address(&mut tx, tenant_id, &client.id, data).await?;
        }

        tx.commit().await?;

        info!(client_id = %client.id, addresses = address_count, "Client created");
        Ok(client)
    }

    /// Gets a client by id.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    pub async fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Client> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = ?1 AND tenant_id = ?2");
        let row: Option<ClientRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Client::from)
            .ok_or_else(|| StoreError::not_found("client", id))
    }

    /// Lists the tenant's clients by name with their invoice and quote
    /// counts, optionally filtered by a case-insensitive substring of the
    /// name, email or company.
    pub async fn list(&self, tenant_id: &str, search: Option<&str>) -> StoreResult<Vec<ClientSummary>> {
        let search = match search {
            Some(q) => validate_search_query(q).map_err(ValidationFailure::from)?,
            None => String::new(),
        };

        debug!(tenant_id = %tenant_id, search = %search, "Listing clients");

        let rows: Vec<ClientSummaryRow> = sqlx::query_as(
            r#"
            SELECT
                c.id, c.tenant_id, c.first_name, c.last_name, c.email, c.phone_no,
                c.pan_no, c.company_name, c.gstin, c.created_at, c.updated_at,
                (SELECT COUNT(*) FROM documents d
                  WHERE d.client_id = c.id AND d.kind = 'INVOICE') AS invoices,
                (SELECT COUNT(*) FROM documents d
                  WHERE d.client_id = c.id AND d.kind = 'QUOTE') AS quotes
            FROM clients c
            WHERE c.tenant_id = ?1
              AND (?2 = ''
                   OR c.first_name || ' ' || c.last_name LIKE '%' || ?2 || '%'
                   OR c.email LIKE '%' || ?2 || '%'
                   OR COALESCE(c.company_name, '') LIKE '%' || ?2 || '%')
            ORDER BY c.first_name, c.last_name, c.id
            "#,
        )
        .bind(tenant_id)
        .bind(&search)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Listed clients");
        Ok(rows
            .into_iter()
            .map(|row| ClientSummary {
                client: Client::from(row.client),
                invoices: row.invoices,
                quotes: row.quotes,
            })
            .collect())
    }

    /// Counts the tenant's clients.
    pub async fn count(&self, tenant_id: &str) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients WHERE tenant_id = ?1")
            .bind(tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Applies a partial update. The merged record is validated as a whole.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::ValidationFailed)` - The merged record is invalid
    /// * `Err(StoreError::DuplicateClientEmail)` - The new email is taken
    pub async fn update(&self, tenant_id: &str, id: &str, patch: ClientPatch) -> StoreResult<Client> {
        debug!(tenant_id = %tenant_id, client_id = %id, "Updating client");

        let existing = self.get(tenant_id, id).await?;
        let mut merged = patch.apply(&existing);
        merged.first_name = merged.first_name.trim().to_string();
        merged.last_name = merged.last_name.trim().to_string();
        merged.email = normalize_email(&merged.email);
        merged.phone_no = merged.phone_no.trim().to_string();
        merged.pan_no = normalize_code(merged.pan_no);
        merged.gstin = normalize_code(merged.gstin);
        ValidationFailure::check(client_violations(&merged))?;
        merged.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                first_name = ?3,
                last_name = ?4,
                email = ?5,
                phone_no = ?6,
                pan_no = ?7,
                company_name = ?8,
                gstin = ?9,
                updated_at = ?10
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&merged.first_name)
        .bind(&merged.last_name)
        .bind(&merged.email)
        .bind(&merged.phone_no)
        .bind(&merged.pan_no)
        .bind(&merged.company_name)
        .bind(&merged.gstin)
        .bind(merged.updated_at)
        .execute(&self.pool)
        .await
        .map_err(email_conflict(&merged.email))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("client", id));
        }

        Ok(merged)
    }

    /// Deletes a client and its addresses.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::DependencyConflict)` - Documents are billed or shipped to it
    pub async fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<()> {
        debug!(tenant_id = %tenant_id, client_id = %id, "Deleting client");

        let mut tx = self.pool.begin().await?;

        if !is_owned(&mut tx, Owned::Client, tenant_id, id).await? {
            return Err(StoreError::not_found("client", id));
        }

        let (invoices, quotes): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COALESCE(SUM(kind = 'INVOICE'), 0),
                COALESCE(SUM(kind = 'QUOTE'), 0)
            FROM documents
            WHERE client_id = ?1
               OR shipping_address_id IN (SELECT id FROM addresses WHERE client_id = ?1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(dependents) = describe_dependents(&[
            (invoices, "invoice", "invoices"),
            (quotes, "quote", "quotes"),
        ]) {
            warn!(client_id = %id, dependents = %dependents, "Client delete blocked");
            return Err(StoreError::dependency("client", id, dependents));
        }

        sqlx::query("DELETE FROM clients WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(client_id = %id, "Client deleted");
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
    use chrono::NaiveDate;
    use invoicer_core::{AddressData, DocumentKind, LineItemData, Money, NewDocument, TaxBreakdown};

    const TENANT: &str = "tenant-a";

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn asha() -> NewClient {
        NewClient {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: " Asha@Example.com ".to_string(),
            phone_no: "9876543210".to_string(),
            pan_no: Some("abcde1234f".to_string()),
            company_name: Some("Rao Traders".to_string()),
            gstin: None,
            addresses: vec![AddressData {
                street: "12 MG Road".to_string(),
                city: "Pune".to_string(),
                state: "Maharashtra".to_string(),
                country: "India".to_string(),
                post_code: "411001".to_string(),
            }],
        }
    }

    /// One 10.00 line with no tax.
    fn quote_for(client_id: &str, address_id: &str) -> NewDocument {
        NewDocument {
            kind: DocumentKind::Quote,
            number: "Q-1".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 30),
            status: None,
            sub_total: Money::from_cents(1000),
            discount: Money::zero(),
            total_tax: Money::zero(),
            total: Money::from_cents(1000),
            notes: None,
            tax: TaxBreakdown::default(),
            client_id: Some(client_id.to_string()),
            shipping_address_id: Some(address_id.to_string()),
            seller_name: None,
            seller_address: None,
            items: vec![LineItemData {
                product_name: "Consulting".to_string(),
                product_description: None,
                hsn_code: None,
                price: Money::from_cents(1000),
                quantity: 1,
                total_price: Money::from_cents(1000),
                taxable_amount: Money::zero(),
                product_id: None,
                tax_id: None,
            }],
        }
    }

    #[tokio::test]
    async fn test_create_normalizes_and_adds_addresses() {
        let db = test_db().await;
        let client = db.clients().create(TENANT, asha()).await.unwrap();

        assert_eq!(client.email, "asha@example.com");
        assert_eq!(client.pan_no.as_deref(), Some("ABCDE1234F"));

        let fetched = db.clients().get(TENANT, &client.id).await.unwrap();
        assert_eq!(fetched, client);

        let addresses = db.addresses().list_for_client(TENANT, &client.id).await.unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].data.city, "Pune");
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_fields() {
        let db = test_db().await;
        let new = NewClient {
            email: "not-an-email".to_string(),
            phone_no: "12345".to_string(),
            ..asha()
        };

        let err = db.clients().create(TENANT, new).await.unwrap_err();
        match err {
            StoreError::ValidationFailed(failure) => assert_eq!(failure.violations().len(), 2),
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert_eq!(db.clients().count(TENANT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_per_tenant() {
        let db = test_db().await;
        db.clients().create(TENANT, asha()).await.unwrap();

        let err = db.clients().create(TENANT, asha()).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateClientEmail { .. }));

        // Same email under another tenant is fine
        db.clients().create("tenant-b", asha()).await.unwrap();
        assert_eq!(db.clients().count(TENANT).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_clears_and_checks_email() {
        let db = test_db().await;
        let client = db.clients().create(TENANT, asha()).await.unwrap();
        let other = db
            .clients()
            .create(
                TENANT,
                NewClient {
                    first_name: "Vikram".to_string(),
                    email: "vikram@example.com".to_string(),
                    addresses: Vec::new(),
                    ..asha()
                },
            )
            .await
            .unwrap();

        let patch = ClientPatch {
            company_name: Some(None),
            phone_no: Some("9123456780".to_string()),
            ..Default::default()
        };
        let updated = db.clients().update(TENANT, &client.id, patch).await.unwrap();
        assert_eq!(updated.company_name, None);
        assert_eq!(updated.phone_no, "9123456780");
        assert_eq!(db.clients().get(TENANT, &client.id).await.unwrap(), updated);

        let patch = ClientPatch {
            email: Some("ASHA@example.com".to_string()),
            ..Default::default()
        };
        let err = db.clients().update(TENANT, &other.id, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateClientEmail { .. }));
    }

    #[tokio::test]
    async fn test_list_with_counts_and_search() {
        let db = test_db().await;
        let client = db.clients().create(TENANT, asha()).await.unwrap();
        let address = db.addresses().list_for_client(TENANT, &client.id).await.unwrap().remove(0);
        db.documents()
            .create(TENANT, quote_for(&client.id, &address.id))
            .await
            .unwrap();

        let listed = db.clients().list(TENANT, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].quotes, 1);
        assert_eq!(listed[0].invoices, 0);

        assert_eq!(db.clients().list(TENANT, Some("traders")).await.unwrap().len(), 1);
        assert!(db.clients().list(TENANT, Some("nobody")).await.unwrap().is_empty());
        assert!(db.clients().list("tenant-b", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_blocked_by_documents() {
        let db = test_db().await;
        let client = db.clients().create(TENANT, asha()).await.unwrap();
        let address = db.addresses().list_for_client(TENANT, &client.id).await.unwrap().remove(0);
        db.documents()
            .create(TENANT, quote_for(&client.id, &address.id))
            .await
            .unwrap();

        let err = db.clients().delete(TENANT, &client.id).await.unwrap_err();
        match err {
            StoreError::DependencyConflict { dependents, .. } => assert_eq!(dependents, "1 quote"),
            other => panic!("expected dependency conflict, got {other:?}"),
        }

        let err = db.addresses().delete(TENANT, &address.id).await.unwrap_err();
        assert!(matches!(err, StoreError::DependencyConflict { .. }));
        assert!(db.clients().get(TENANT, &client.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_removes_addresses() {
        let db = test_db().await;
        let client = db.clients().create(TENANT, asha()).await.unwrap();
        let address = db.addresses().list_for_client(TENANT, &client.id).await.unwrap().remove(0);

        let err = db.clients().delete("tenant-b", &client.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "client", .. }));

        db.clients().delete(TENANT, &client.id).await.unwrap();
        assert!(db.clients().get(TENANT, &client.id).await.is_err());
        assert!(db.addresses().get(TENANT, &address.id).await.is_err());
    }
}
