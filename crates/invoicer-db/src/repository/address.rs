//! # Address Repository
//!
//! Shipping addresses. Every address belongs to one client of the same
//! tenant and is removed with it; a document that ships to an address
//! keeps it from being deleted.

use chrono::{DateTime, Utc};
use invoicer_core::validation::address_violations;
use invoicer_core::{Address, AddressData, AddressPatch, NewAddress, ValidationFailure};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::repository::{describe_dependents, is_owned, new_id, Owned};

const ADDRESS_COLUMNS: &str = "id, tenant_id, client_id, street, city, state, country, \
     post_code, created_at, updated_at";

#[derive(Debug, FromRow)]
struct AddressRow {
    id: String,
    tenant_id: String,
    client_id: String,
    street: String,
    city: String,
    state: String,
    country: String,
    post_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Address {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            data: AddressData {
                street: row.street,
                city: row.city,
                state: row.state,
                country: row.country,
                post_code: row.post_code,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn trimmed(data: AddressData) -> AddressData {
    AddressData {
        street: data.street.trim().to_string(),
        city: data.city.trim().to_string(),
        state: data.state.trim().to_string(),
        country: data.country.trim().to_string(),
        post_code: data.post_code.trim().to_string(),
    }
}

/// Inserts an address for a client the caller has already checked.
pub(crate) async fn insert_address(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    client_id: &str,
    data: AddressData,
) -> StoreResult<Address> {
    let now = Utc::now();
    let address = Address {
        id: new_id(),
        tenant_id: tenant_id.to_string(),
        client_id: client_id.to_string(),
        data: trimmed(data),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO addresses (
            id, tenant_id, client_id, street, city, state, country, post_code,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&address.id)
    .bind(&address.tenant_id)
    .bind(&address.client_id)
    .bind(&address.data.street)
    .bind(&address.data.city)
    .bind(&address.data.state)
    .bind(&address.data.country)
    .bind(&address.data.post_code)
    .bind(address.created_at)
    .bind(address.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(address)
}

/// Repository for client addresses.
#[derive(Debug, Clone)]
pub struct AddressRepository {
    pool: SqlitePool,
}

impl AddressRepository {
    /// Creates a new AddressRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AddressRepository { pool }
    }

    /// Adds an address to an existing client.
    ///
    /// ## Returns
    /// * `Err(StoreError::ValidationFailed)` - A postal field is missing
    /// * `Err(StoreError::NotFound)` - The client is absent or owned by another tenant
    pub async fn create(&self, tenant_id: &str, new: NewAddress) -> StoreResult<Address> {
        debug!(tenant_id = %tenant_id, client_id = %new.client_id, "Creating address");

        ValidationFailure::check(address_violations("", &new.data))?;

        let mut tx = self.pool.begin().await?;

        if !is_owned(&mut tx, Owned::Client, tenant_id, &new.client_id).await? {
            return Err(StoreError::not_found("client", new.client_id));
        }

        let address = insert_address(&mut tx, tenant_id, &new.client_id, new.data).await?;
        tx.commit().await?;

        info!(address_id = %address.id, client_id = %address.client_id, "Address created");
        Ok(address)
    }

    /// Gets an address by id.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    pub async fn get(&self, tenant_id: &str, id: &str) -> StoreResult<Address> {
        let sql = format!("SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ?1 AND tenant_id = ?2");
        let row: Option<AddressRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Address::from)
            .ok_or_else(|| StoreError::not_found("address", id))
    }

    /// Lists a client's addresses, oldest first.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - The client is absent or owned by another tenant
    pub async fn list_for_client(&self, tenant_id: &str, client_id: &str) -> StoreResult<Vec<Address>> {
        let mut conn = self.pool.acquire().await?;
        if !is_owned(&mut conn, Owned::Client, tenant_id, client_id).await? {
            return Err(StoreError::not_found("client", client_id));
        }

        let sql = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses \
             WHERE tenant_id = ?1 AND client_id = ?2 ORDER BY created_at, id"
        );
        let rows: Vec<AddressRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(client_id)
            .fetch_all(&mut *conn)
            .await?;

        debug!(client_id = %client_id, count = rows.len(), "Listed addresses");
        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Applies a partial update. The address stays with its client.
    pub async fn update(&self, tenant_id: &str, id: &str, patch: AddressPatch) -> StoreResult<Address> {
        debug!(tenant_id = %tenant_id, address_id = %id, "Updating address");

        let existing = self.get(tenant_id, id).await?;
        let data = patch.apply(&existing.data);
        ValidationFailure::check(address_violations("", &data))?;

        let updated = Address {
            data: trimmed(data),
            updated_at: Utc::now(),
            ..existing
        };

        let result = sqlx::query(
            r#"
            UPDATE addresses SET
                street = ?3,
                city = ?4,
                state = ?5,
                country = ?6,
                post_code = ?7,
                updated_at = ?8
            WHERE id = ?1 AND tenant_id = ?2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&updated.data.street)
        .bind(&updated.data.city)
        .bind(&updated.data.state)
        .bind(&updated.data.country)
        .bind(&updated.data.post_code)
        .bind(updated.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("address", id));
        }

        Ok(updated)
    }

    /// Deletes an address.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::DependencyConflict)` - Documents still ship to it
    pub async fn delete(&self, tenant_id: &str, id: &str) -> StoreResult<()> {
        debug!(tenant_id = %tenant_id, address_id = %id, "Deleting address");

        let mut tx = self.pool.begin().await?;

        if !is_owned(&mut tx, Owned::Address, tenant_id, id).await? {
            return Err(StoreError::not_found("address", id));
        }

        let documents: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE shipping_address_id = ?1")
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(dependents) = describe_dependents(&[(documents, "document", "documents")]) {
            warn!(address_id = %id, dependents = %dependents, "Address delete blocked");
            return Err(StoreError::dependency("address", id, dependents));
        }

        sqlx::query("DELETE FROM addresses WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(address_id = %id, "Address deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
