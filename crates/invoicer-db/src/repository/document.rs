//! # Document Repository
//!
//! Invoices, quotes and purchase invoices: one table, one `kind` column,
//! one set of operations parameterised by [`DocumentKind`].
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    create / update / convert                            │
//! │                                                                         │
//! │  invoicer-core lifecycle::plan_*  ── ValidationFailed? ──► return       │
//! │       │  (ledger, fields, transitions; no I/O)                          │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │   ├── number free for (tenant, kind)?  ── no ──► DuplicateDocumentNumber│
//! │   ├── product / tax refs owned?        ── no ──► NotFound               │
//! │   ├── client / address owned?          ── no ──► NotFound               │
//! │   ├── INSERT / UPDATE header                                            │
//! │   ├── DELETE + INSERT line items                                        │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any `?` before COMMIT drops the transaction, which rolls it back.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The UNIQUE index on `(tenant_id, kind, number)` is the authoritative
//! duplicate guard; the lookup inside the transaction only produces the
//! friendlier error first.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use invoicer_core::lifecycle::{plan_conversion, plan_create, plan_update, UpdatePlan};
use invoicer_core::validation::validate_search_query;
use invoicer_core::{
    DashboardSummary, Document, DocumentFilter, DocumentKind, DocumentPatch, DocumentStatus,
    DocumentSummary, DocumentWithItems, LineItem, LineItemData, Money, NewDocument, Page,
    QuoteStatus, TaxBreakdown, TransitionError, ValidationFailure,
};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, StoreError, StoreResult};
use crate::repository::{is_owned, new_id, opt_rate_from_column, rate_to_column, Owned};

const DOCUMENTS: &str = "documents";
const LINE_ITEMS: &str = "line_items";

const DOCUMENT_COLUMNS: &str = "id, tenant_id, kind, number, issue_date, due_date, status, \
     sub_total_cents, discount_cents, total_tax_cents, total_cents, notes, \
     gst_bps, cgst_bps, sgst_bps, igst_bps, client_id, shipping_address_id, \
     seller_name, seller_address, source_quote_id, created_at, updated_at";

const ITEM_COLUMNS: &str = "id, document_id, position, product_name, product_description, \
     hsn_code, price_cents, quantity, total_price_cents, taxable_cents, product_id, tax_id";

// =============================================================================
// Rows
// =============================================================================

#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    tenant_id: String,
    kind: String,
    number: String,
    issue_date: NaiveDate,
    due_date: Option<NaiveDate>,
    status: Option<String>,
    sub_total_cents: i64,
    discount_cents: i64,
    total_tax_cents: i64,
    total_cents: i64,
    notes: Option<String>,
    gst_bps: Option<i64>,
    cgst_bps: Option<i64>,
    sgst_bps: Option<i64>,
    igst_bps: Option<i64>,
    client_id: Option<String>,
    shipping_address_id: Option<String>,
    seller_name: Option<String>,
    seller_address: Option<String>,
    source_quote_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DbError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let kind: DocumentKind = row
            .kind
            .parse()
            .map_err(|e: String| DbError::corrupt(DOCUMENTS, e))?;
        let status = row
            .status
            .as_deref()
            .map(|s| DocumentStatus::parse(kind, s))
            .transpose()
            .map_err(|e| DbError::corrupt(DOCUMENTS, e.to_string()))?;

        Ok(Document {
            id: row.id,
            tenant_id: row.tenant_id,
            kind,
            number: row.number,
            issue_date: row.issue_date,
            due_date: row.due_date,
            status,
            sub_total: Money::from_cents(row.sub_total_cents),
            discount: Money::from_cents(row.discount_cents),
            total_tax: Money::from_cents(row.total_tax_cents),
            total: Money::from_cents(row.total_cents),
            notes: row.notes,
            tax: TaxBreakdown {
                gst: opt_rate_from_column(DOCUMENTS, row.gst_bps)?,
                cgst: opt_rate_from_column(DOCUMENTS, row.cgst_bps)?,
                sgst: opt_rate_from_column(DOCUMENTS, row.sgst_bps)?,
                igst: opt_rate_from_column(DOCUMENTS, row.igst_bps)?,
            },
            client_id: row.client_id,
            shipping_address_id: row.shipping_address_id,
            seller_name: row.seller_name,
            seller_address: row.seller_address,
            source_quote_id: row.source_quote_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    document: DocumentRow,
    item_count: i64,
}

#[derive(Debug, FromRow)]
struct LineItemRow {
    id: String,
    document_id: String,
    position: i64,
    product_name: String,
    product_description: Option<String>,
    hsn_code: Option<String>,
    price_cents: i64,
    quantity: i64,
    total_price_cents: i64,
    taxable_cents: i64,
    product_id: Option<String>,
    tax_id: Option<String>,
}

impl TryFrom<LineItemRow> for LineItem {
    type Error = DbError;

    fn try_from(row: LineItemRow) -> Result<Self, Self::Error> {
        let quantity = u32::try_from(row.quantity)
            .map_err(|_| DbError::corrupt(LINE_ITEMS, format!("quantity {} out of range", row.quantity)))?;

        Ok(LineItem {
            id: row.id,
            document_id: row.document_id,
            position: row.position,
            data: LineItemData {
                product_name: row.product_name,
                product_description: row.product_description,
                hsn_code: row.hsn_code,
                price: Money::from_cents(row.price_cents),
                quantity,
                total_price: Money::from_cents(row.total_price_cents),
                taxable_amount: Money::from_cents(row.taxable_cents),
                product_id: row.product_id,
                tax_id: row.tax_id,
            },
        })
    }
}

#[derive(Debug, FromRow)]
struct DashboardRow {
    invoices: i64,
    quotes: i64,
    purchase_invoices: i64,
    clients: i64,
    products: i64,
    revenue_cents: i64,
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Maps a header write failure, turning the number index violation into
/// `DuplicateDocumentNumber`.
fn number_conflict(kind: DocumentKind, number: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |err| {
        let err = DbError::from(err);
        if err.is_duplicate_document_number() {
            StoreError::DuplicateDocumentNumber {
                kind,
                number: number.to_string(),
            }
        } else {
            StoreError::Storage(err)
        }
    }
}

async fn ensure_number_free(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    kind: DocumentKind,
    number: &str,
    except_id: Option<&str>,
) -> StoreResult<()> {
    let taken: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM documents WHERE tenant_id = ?1 AND kind = ?2 AND number = ?3 AND id != ?4",
    )
    .bind(tenant_id)
    .bind(kind.as_str())
    .bind(number)
    .bind(except_id.unwrap_or(""))
    .fetch_one(&mut *conn)
    .await?;

    if taken > 0 {
        warn!(tenant_id = %tenant_id, kind = %kind, number = %number, "Document number taken");
        return Err(StoreError::DuplicateDocumentNumber {
            kind,
            number: number.to_string(),
        });
    }
    Ok(())
}

/// Every product and tax an item points at must belong to the tenant.
async fn ensure_references(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    items: &[LineItemData],
) -> StoreResult<()> {
    let mut checked = BTreeSet::new();

    for item in items {
        for (table, id) in [(Owned::Product, &item.product_id), (Owned::Tax, &item.tax_id)] {
            let Some(id) = id else { continue };
            if !checked.insert((table.entity(), id.as_str())) {
                continue;
            }
            if !is_owned(&mut *conn, table, tenant_id, id).await? {
                warn!(tenant_id = %tenant_id, entity = table.entity(), id = %id, "Unknown line item reference");
                return Err(StoreError::not_found(table.entity(), id.as_str()));
            }
        }
    }
    Ok(())
}

/// The client must belong to the tenant and the shipping address to that
/// client.
async fn ensure_parties(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    client_id: Option<&str>,
    shipping_address_id: Option<&str>,
) -> StoreResult<()> {
    if let Some(client_id) = client_id {
        if !is_owned(&mut *conn, Owned::Client, tenant_id, client_id).await? {
            warn!(tenant_id = %tenant_id, client_id = %client_id, "Unknown client");
            return Err(StoreError::not_found("client", client_id));
        }
    }

    if let Some(address_id) = shipping_address_id {
        let owner: Option<String> =
            sqlx::query_scalar("SELECT client_id FROM addresses WHERE id = ?1 AND tenant_id = ?2")
                .bind(address_id)
                .bind(tenant_id)
                .fetch_optional(&mut *conn)
                .await?;

        let belongs = match (owner.as_deref(), client_id) {
            (Some(owner), Some(client_id)) => owner == client_id,
            (Some(_), None) => true,
            (None, _) => false,
        };
        if !belongs {
            warn!(tenant_id = %tenant_id, address_id = %address_id, "Unknown shipping address");
            return Err(StoreError::not_found("address", address_id));
        }
    }
    Ok(())
}

async fn insert_items(
    conn: &mut SqliteConnection,
    document_id: &str,
    items: &[LineItemData],
) -> StoreResult<Vec<LineItem>> {
    let mut stored = Vec::with_capacity(items.len());

    for (position, data) in items.iter().enumerate() {
        let item = LineItem {
            id: new_id(),
            document_id: document_id.to_string(),
            position: position as i64,
            data: data.clone(),
        };

        sqlx::query(
            r#"
            INSERT INTO line_items (
                id, document_id, position, product_name, product_description, hsn_code,
                price_cents, quantity, total_price_cents, taxable_cents, product_id, tax_id
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&item.id)
        .bind(&item.document_id)
        .bind(item.position)
        .bind(&item.data.product_name)
        .bind(&item.data.product_description)
        .bind(&item.data.hsn_code)
        .bind(item.data.price.cents())
        .bind(i64::from(item.data.quantity))
        .bind(item.data.total_price.cents())
        .bind(item.data.taxable_amount.cents())
        .bind(&item.data.product_id)
        .bind(&item.data.tax_id)
        .execute(&mut *conn)
        .await?;

        stored.push(item);
    }

    Ok(stored)
}

/// Writes a header and its items. Callers have already validated `new`.
async fn insert_document(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    new: &NewDocument,
    status: Option<DocumentStatus>,
    source_quote_id: Option<&str>,
) -> StoreResult<DocumentWithItems> {
    let now = Utc::now();
    let document = Document {
        id: new_id(),
        tenant_id: tenant_id.to_string(),
        kind: new.kind,
        number: new.number.trim().to_string(),
        issue_date: new.issue_date,
        due_date: new.due_date,
        status,
        sub_total: new.sub_total,
        discount: new.discount,
        total_tax: new.total_tax,
        total: new.total,
        notes: new.notes.clone(),
        tax: new.tax,
        client_id: new.client_id.clone(),
        shipping_address_id: new.shipping_address_id.clone(),
        seller_name: new.seller_name.clone(),
        seller_address: new.seller_address.clone(),
        source_quote_id: source_quote_id.map(str::to_string),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO documents (
            id, tenant_id, kind, number, issue_date, due_date, status,
            sub_total_cents, discount_cents, total_tax_cents, total_cents, notes,
            gst_bps, cgst_bps, sgst_bps, igst_bps,
            client_id, shipping_address_id, seller_name, seller_address,
            source_quote_id, created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7,
            ?8, ?9, ?10, ?11, ?12,
            ?13, ?14, ?15, ?16,
            ?17, ?18, ?19, ?20,
            ?21, ?22, ?23
        )
        "#,
    )
    .bind(&document.id)
    .bind(&document.tenant_id)
    .bind(document.kind.as_str())
    .bind(&document.number)
    .bind(document.issue_date)
    .bind(document.due_date)
    .bind(document.status.map(|s| s.as_str()))
    .bind(document.sub_total.cents())
    .bind(document.discount.cents())
    .bind(document.total_tax.cents())
    .bind(document.total.cents())
    .bind(&document.notes)
    .bind(rate_to_column(document.tax.gst))
    .bind(rate_to_column(document.tax.cgst))
    .bind(rate_to_column(document.tax.sgst))
    .bind(rate_to_column(document.tax.igst))
    .bind(&document.client_id)
    .bind(&document.shipping_address_id)
    .bind(&document.seller_name)
    .bind(&document.seller_address)
    .bind(&document.source_quote_id)
    .bind(document.created_at)
    .bind(document.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(number_conflict(document.kind, &document.number))?;

    let items = insert_items(&mut *conn, &document.id, &new.items).await?;

    Ok(DocumentWithItems { document, items })
}

/// `%query%` with LIKE wildcards in the query taken literally.
fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn filtered<'a>(
    select: &str,
    tenant_id: &str,
    kind: DocumentKind,
    filter: &DocumentFilter,
    search: Option<&str>,
) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new(select);

    qb.push(" WHERE tenant_id = ").push_bind(tenant_id.to_string());
    qb.push(" AND kind = ").push_bind(kind.as_str());

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(client_id) = &filter.client_id {
        qb.push(" AND client_id = ").push_bind(client_id.clone());
    }
    if let Some(from) = filter.issued_from {
        qb.push(" AND issue_date >= ").push_bind(from);
    }
    if let Some(to) = filter.issued_to {
        qb.push(" AND issue_date <= ").push_bind(to);
    }
    if let Some(from) = filter.due_from {
        qb.push(" AND due_date >= ").push_bind(from);
    }
    if let Some(to) = filter.due_to {
        qb.push(" AND due_date <= ").push_bind(to);
    }
    if let Some(query) = search.filter(|q| !q.is_empty()) {
        let pattern = like_pattern(query);
        qb.push(" AND (number LIKE ")
            .push_bind(pattern.clone())
            .push(" ESCAPE '\\' OR seller_name LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\')");
    }

    qb
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for billing documents.
///
/// Every method takes the resolved tenant first; a document owned by
/// another tenant is indistinguishable from a missing one.
///
/// ## Usage
/// ```rust,ignore
/// let docs = db.documents();
///
/// let quote = docs.create(tenant, new_quote).await?;
/// let invoice = docs.convert_quote_to_invoice(tenant, &quote.document.id).await?;
/// let page = docs.list(tenant, DocumentKind::Invoice, &DocumentFilter::default()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Creates a document with its line items.
    ///
    /// ## Returns
    /// * `Err(StoreError::ValidationFailed)` - Any ledger, field or status rule broken
    /// * `Err(StoreError::DuplicateDocumentNumber)` - Number taken for this tenant and kind
    /// * `Err(StoreError::NotFound)` - An item references a foreign product or tax,
    ///   or the client or shipping address is not the tenant's
    pub async fn create(&self, tenant_id: &str, new: NewDocument) -> StoreResult<DocumentWithItems> {
        debug!(
            tenant_id = %tenant_id,
            kind = %new.kind,
            number = %new.number,
            items = new.items.len(),
            "Creating document"
        );

        let status = plan_create(&new).inspect_err(|failure| {
            warn!(kind = %new.kind, reasons = ?failure.reasons(), "Document rejected");
        })?;

        let mut tx = self.pool.begin().await?;

        ensure_number_free(&mut tx, tenant_id, new.kind, new.number.trim(), None).await?;
        ensure_references(&mut tx, tenant_id, &new.items).await?;
        ensure_parties(
            &mut tx,
            tenant_id,
            new.client_id.as_deref(),
            new.shipping_address_id.as_deref(),
        )
        .await?;
        let created = insert_document(&mut tx, tenant_id, &new, status, None).await?;

        tx.commit()
            .await
            .map_err(number_conflict(new.kind, &created.document.number))?;

        info!(
            document_id = %created.document.id,
            kind = %created.document.kind,
            number = %created.document.number,
            "Document created"
        );
        Ok(created)
    }

    /// Applies a partial update.
    ///
    /// Fields the patch omits keep their stored values. When the patch
    /// carries items, they replace the stored set entirely.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::ValidationFailed)` - Merged document breaks a rule,
    ///   or the status move is not allowed
    /// * `Err(StoreError::DuplicateDocumentNumber)` - Renumbered onto a taken number
    /// * `Err(StoreError::NotFound)` - The new shipping address is not the client's
    pub async fn update(
        &self,
        tenant_id: &str,
        kind: DocumentKind,
        id: &str,
        patch: DocumentPatch,
    ) -> StoreResult<DocumentWithItems> {
        debug!(tenant_id = %tenant_id, kind = %kind, document_id = %id, "Updating document");

        let existing = self.get(tenant_id, kind, id).await?;
        let stored_items = self.items(&existing).await?;

        let plan = plan_update(&existing, &stored_items, &patch).inspect_err(|failure| {
            warn!(document_id = %id, reasons = ?failure.reasons(), "Update rejected");
        })?;

        self.commit_update(tenant_id, &existing, plan, stored_items).await
    }

    /// Writes a planned update. The header is only rewritten while its
    /// status is still the one the plan was made from; a conversion that
    /// committed in between turns into `StatusChanged`.
    async fn commit_update(
        &self,
        tenant_id: &str,
        existing: &Document,
        plan: UpdatePlan,
        stored_items: Vec<LineItem>,
    ) -> StoreResult<DocumentWithItems> {
        let kind = existing.kind;
        let id = existing.id.as_str();

        let mut document = plan.document;
        document.number = document.number.trim().to_string();
        document.updated_at = Utc::now();

        let mut tx = self.pool.begin().await?;

        if plan.renumbered {
            ensure_number_free(&mut tx, tenant_id, kind, &document.number, Some(id)).await?;
        }
        if let Some(items) = &plan.items {
            ensure_references(&mut tx, tenant_id, items).await?;
        }
        if document.shipping_address_id != existing.shipping_address_id {
            ensure_parties(
                &mut tx,
                tenant_id,
                document.client_id.as_deref(),
                document.shipping_address_id.as_deref(),
            )
            .await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE documents SET
                number = ?4,
                issue_date = ?5,
                due_date = ?6,
                status = ?7,
                sub_total_cents = ?8,
                discount_cents = ?9,
                total_tax_cents = ?10,
                total_cents = ?11,
                notes = ?12,
                gst_bps = ?13,
                cgst_bps = ?14,
                sgst_bps = ?15,
                igst_bps = ?16,
                shipping_address_id = ?17,
                seller_name = ?18,
                seller_address = ?19,
                updated_at = ?20
            WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3 AND status IS ?21
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(kind.as_str())
        .bind(&document.number)
        .bind(document.issue_date)
        .bind(document.due_date)
        .bind(document.status.map(|s| s.as_str()))
        .bind(document.sub_total.cents())
        .bind(document.discount.cents())
        .bind(document.total_tax.cents())
        .bind(document.total.cents())
        .bind(&document.notes)
        .bind(rate_to_column(document.tax.gst))
        .bind(rate_to_column(document.tax.cgst))
        .bind(rate_to_column(document.tax.sgst))
        .bind(rate_to_column(document.tax.igst))
        .bind(&document.shipping_address_id)
        .bind(&document.seller_name)
        .bind(&document.seller_address)
        .bind(document.updated_at)
        .bind(existing.status.map(|s| s.as_str()))
        .execute(&mut *tx)
        .await
        .map_err(number_conflict(kind, &document.number))?;

        if result.rows_affected() == 0 {
            let current: Option<Option<String>> = sqlx::query_scalar(
                "SELECT status FROM documents WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3",
            )
            .bind(id)
            .bind(tenant_id)
            .bind(kind.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            let Some(found) = current else {
                return Err(StoreError::not_found(kind.label(), id));
            };
            let changed = TransitionError::StatusChanged {
                expected: existing.status.map_or("NONE", |s| s.as_str()).to_string(),
                found: found.unwrap_or_else(|| "NONE".to_string()),
            };
            warn!(document_id = %id, reason = %changed, "Update lost a status race");
            return Err(ValidationFailure::new(vec![changed.into()]).into());
        }

        let items = match &plan.items {
            Some(items) => {
                sqlx::query("DELETE FROM line_items WHERE document_id = ?1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                insert_items(&mut tx, id, items).await?
            }
            None => stored_items,
        };

        tx.commit()
            .await
            .map_err(number_conflict(kind, &document.number))?;

        info!(document_id = %id, kind = %kind, "Document updated");
        Ok(DocumentWithItems { document, items })
    }

    /// Deletes a document and its line items.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent or owned by another tenant
    /// * `Err(StoreError::DependencyConflict)` - A quote that produced an invoice
    pub async fn delete(&self, tenant_id: &str, kind: DocumentKind, id: &str) -> StoreResult<()> {
        debug!(tenant_id = %tenant_id, kind = %kind, document_id = %id, "Deleting document");

        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(kind.as_str())
        .fetch_one(&mut *tx)
        .await?;
        if exists == 0 {
            return Err(StoreError::not_found(kind.label(), id));
        }

        let invoices: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE source_quote_id = ?1 AND tenant_id = ?2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_one(&mut *tx)
        .await?;
        if invoices > 0 {
            warn!(document_id = %id, "Delete blocked by converted invoice");
            let dependents = if invoices == 1 {
                "1 invoice".to_string()
            } else {
                format!("{invoices} invoices")
            };
            return Err(StoreError::dependency(kind.label(), id, dependents));
        }

        sqlx::query("DELETE FROM line_items WHERE document_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM documents WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3")
            .bind(id)
            .bind(tenant_id)
            .bind(kind.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(document_id = %id, kind = %kind, "Document deleted");
        Ok(())
    }

    /// Converts a DRAFT or ACCEPTED quote into a PENDING invoice.
    ///
    /// Money fields and line items are copied verbatim and the invoice keeps
    /// the quote's number. The quote ends `CONVERTED_TO_INVOICE`.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - No such quote for this tenant
    /// * `Err(StoreError::ValidationFailed)` - Already converted, or declined
    /// * `Err(StoreError::DuplicateDocumentNumber)` - An invoice already has the number
    pub async fn convert_quote_to_invoice(&self, tenant_id: &str, quote_id: &str) -> StoreResult<DocumentWithItems> {
        debug!(tenant_id = %tenant_id, quote_id = %quote_id, "Converting quote");

        let quote = self.get(tenant_id, DocumentKind::Quote, quote_id).await?;
        let items = self.items(&quote).await?;

        let plan = plan_conversion(&quote, &items)
            .inspect_err(|e| warn!(quote_id = %quote_id, error = %e, "Conversion rejected"))
            .map_err(ValidationFailure::from)?;

        let mut tx = self.pool.begin().await?;

        // Guarded so two concurrent conversions cannot both succeed
        let marked = sqlx::query(
            r#"
            UPDATE documents SET status = ?4, updated_at = ?5
            WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3 AND status IN ('DRAFT', 'ACCEPTED')
            "#,
        )
        .bind(quote_id)
        .bind(tenant_id)
        .bind(DocumentKind::Quote.as_str())
        .bind(QuoteStatus::ConvertedToInvoice.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if marked.rows_affected() == 0 {
            let current: Option<Option<String>> = sqlx::query_scalar(
                "SELECT status FROM documents WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3",
            )
            .bind(quote_id)
            .bind(tenant_id)
            .bind(DocumentKind::Quote.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            let err = match current {
                None => return Err(StoreError::not_found(DocumentKind::Quote.label(), quote_id)),
                Some(Some(status)) if status == QuoteStatus::ConvertedToInvoice.as_str() => {
                    TransitionError::AlreadyConverted {
                        quote_id: quote_id.to_string(),
                    }
                }
                Some(status) => TransitionError::NotConvertible {
                    quote_id: quote_id.to_string(),
                    status: status.unwrap_or_else(|| "NONE".to_string()),
                },
            };
            warn!(quote_id = %quote_id, error = %err, "Conversion lost a race");
            return Err(ValidationFailure::from(err).into());
        }

        let invoice = &plan.invoice;
        ensure_number_free(&mut tx, tenant_id, invoice.kind, &invoice.number, None).await?;
        let created = insert_document(
            &mut tx,
            tenant_id,
            invoice,
            invoice.status,
            Some(plan.source_quote_id.as_str()),
        )
        .await?;

        tx.commit()
            .await
            .map_err(number_conflict(invoice.kind, &invoice.number))?;

        info!(
            quote_id = %quote_id,
            invoice_id = %created.document.id,
            number = %created.document.number,
            "Quote converted to invoice"
        );
        Ok(created)
    }

    /// Gets a document header.
    ///
    /// ## Returns
    /// * `Err(StoreError::NotFound)` - Absent, of another kind, or owned by another tenant
    pub async fn get(&self, tenant_id: &str, kind: DocumentKind, id: &str) -> StoreResult<Document> {
        let sql = format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?1 AND tenant_id = ?2 AND kind = ?3"
        );
        let row: Option<DocumentRow> = sqlx::query_as(&sql)
            .bind(id)
            .bind(tenant_id)
            .bind(kind.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Document::try_from(row)?),
            None => Err(StoreError::not_found(kind.label(), id)),
        }
    }

    /// Gets a document with its line items in position order.
    pub async fn get_with_items(&self, tenant_id: &str, kind: DocumentKind, id: &str) -> StoreResult<DocumentWithItems> {
        let document = self.get(tenant_id, kind, id).await?;
        let items = self.items(&document).await?;
        Ok(DocumentWithItems { document, items })
    }

    /// Line items of an already loaded document, in position order.
    pub async fn items(&self, document: &Document) -> StoreResult<Vec<LineItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM line_items WHERE document_id = ?1 ORDER BY position");
        let rows: Vec<LineItemRow> = sqlx::query_as(&sql)
            .bind(&document.id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| LineItem::try_from(row).map_err(StoreError::from))
            .collect()
    }

    /// Lists documents of one kind, newest issue date first.
    ///
    /// ## Returns
    /// * `Err(StoreError::ValidationFailed)` - Search too long, or a status
    ///   filter of another kind
    pub async fn list(
        &self,
        tenant_id: &str,
        kind: DocumentKind,
        filter: &DocumentFilter,
    ) -> StoreResult<Page<DocumentSummary>> {
        let search = filter
            .search
            .as_deref()
            .map(validate_search_query)
            .transpose()
            .map_err(ValidationFailure::from)?;

        if let Some(status) = filter.status {
            if status.kind() != kind {
                let err = TransitionError::StatusKindMismatch {
                    kind,
                    status: status.as_str().to_string(),
                };
                return Err(ValidationFailure::from(err).into());
            }
        }

        let (page, limit) = (filter.page(), filter.limit());
        debug!(tenant_id = %tenant_id, kind = %kind, page, limit, "Listing documents");

        let mut count = filtered("SELECT COUNT(*) FROM documents", tenant_id, kind, filter, search.as_deref());
        let total_entries: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let select = format!(
            "SELECT {DOCUMENT_COLUMNS}, \
             (SELECT COUNT(*) FROM line_items li WHERE li.document_id = documents.id) AS item_count \
             FROM documents"
        );
        let mut query = filtered(&select, tenant_id, kind, filter, search.as_deref());
        query
            .push(" ORDER BY issue_date DESC, created_at DESC, id LIMIT ")
            .push_bind(i64::from(limit))
            .push(" OFFSET ")
            .push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));

        let rows: Vec<SummaryRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let items = rows
            .into_iter()
            .map(|row| {
                Ok(DocumentSummary {
                    document: Document::try_from(row.document)?,
                    item_count: row.item_count,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        debug!(count = items.len(), total_entries, "Listed documents");
        Ok(Page::new(items, page, limit, total_entries))
    }

    /// Document counts per kind, client and product counts and invoice revenue.
    pub async fn dashboard(&self, tenant_id: &str) -> StoreResult<DashboardSummary> {
        let row: DashboardRow = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM documents WHERE tenant_id = ?1 AND kind = 'INVOICE') AS invoices,
                (SELECT COUNT(*) FROM documents WHERE tenant_id = ?1 AND kind = 'QUOTE') AS quotes,
                (SELECT COUNT(*) FROM documents WHERE tenant_id = ?1 AND kind = 'PURCHASE_INVOICE') AS purchase_invoices,
                (SELECT COUNT(*) FROM clients WHERE tenant_id = ?1) AS clients,
                (SELECT COUNT(*) FROM products WHERE tenant_id = ?1) AS products,
                (SELECT COALESCE(SUM(total_cents), 0) FROM documents WHERE tenant_id = ?1 AND kind = 'INVOICE') AS revenue_cents
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardSummary {
            invoices: row.invoices,
            quotes: row.quotes,
            purchase_invoices: row.purchase_invoices,
            clients: row.clients,
            products: row.products,
            revenue: Money::from_cents(row.revenue_cents),
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
