//! # Documents and Line Items
//!
//! Invoices, quotes and purchase invoices share one shape, tagged by
//! [`DocumentKind`]. Fields that only make sense for some kinds are optional
//! and checked by [`crate::lifecycle`].
//!
//! ```text
//! ┌──────────────────────────────┐        ┌──────────────────────────────┐
//! │ Document                     │ 1    * │ LineItem                     │
//! │ ──────────────────────────── │───────►│ ──────────────────────────── │
//! │ kind, number, status         │        │ position                     │
//! │ sub_total, total_tax         │        │ price x quantity             │
//! │ discount, total   (cents)    │        │ total_price, taxable_amount  │
//! │ source_quote_id (invoices)   │        │ product_id?, tax_id?         │
//! └──────────────────────────────┘        └──────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{DocumentKind, DocumentStatus, TaxBreakdown, TaxRate};
use crate::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};

// =============================================================================
// Line Items
// =============================================================================

/// The priced content of one line, as supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemData {
    pub product_name: String,
    pub product_description: Option<String>,
    /// HSN classification code.
    pub hsn_code: Option<String>,
    /// Unit price.
    pub price: Money,
    pub quantity: u32,
    /// Must equal `price * quantity`.
    pub total_price: Money,
    /// Portion of `total_price` attributable to tax.
    pub taxable_amount: Money,
    pub product_id: Option<String>,
    pub tax_id: Option<String>,
}

/// A stored line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    pub id: String,
    pub document_id: String,
    /// Zero-based order within the document.
    pub position: i64,
    #[serde(flatten)]
    pub data: LineItemData,
}

// =============================================================================
// Document
// =============================================================================

/// A stored billing document header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub tenant_id: String,
    pub kind: DocumentKind,
    /// User-assigned number, unique per tenant and kind.
    pub number: String,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    /// Invoices and quotes only.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    /// `None` for purchase invoices.
    pub status: Option<DocumentStatus>,
    pub sub_total: Money,
    pub discount: Money,
    pub total_tax: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub tax: TaxBreakdown,
    pub client_id: Option<String>,
    pub shipping_address_id: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<String>,
    /// Set on invoices produced by quote conversion.
    pub source_quote_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A document together with its ordered line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentWithItems {
    #[serde(flatten)]
    pub document: Document,
    pub items: Vec<LineItem>,
}

/// A document to be created. All three aggregates are mandatory here.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub kind: DocumentKind,
    pub number: String,
    pub issue_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// `None` takes the kind's initial status.
    pub status: Option<DocumentStatus>,
    pub sub_total: Money,
    pub discount: Money,
    pub total_tax: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub tax: TaxBreakdown,
    pub client_id: Option<String>,
    pub shipping_address_id: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<String>,
    pub items: Vec<LineItemData>,
}

/// A partial update.
///
/// `None` means the client did not send the field. For nullable fields the
/// inner `Option` separates "set to null" from "set to a value". A present
/// `Some(Money::zero())` or `Some(String::new())` is a real value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub number: Option<String>,
    pub issue_date: Option<NaiveDate>,
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<DocumentStatus>,
    pub sub_total: Option<Money>,
    pub discount: Option<Money>,
    pub total_tax: Option<Money>,
    pub total: Option<Money>,
    pub notes: Option<Option<String>>,
    pub gst: Option<Option<TaxRate>>,
    pub cgst: Option<Option<TaxRate>>,
    pub sgst: Option<Option<TaxRate>>,
    pub igst: Option<Option<TaxRate>>,
    pub shipping_address_id: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<Option<String>>,
    /// Replaces the whole item set when present.
    pub items: Option<Vec<LineItemData>>,
}

impl DocumentPatch {
    /// True when any of the three reconciled aggregates was sent.
    pub fn touches_aggregates(&self) -> bool {
        self.sub_total.is_some() || self.total_tax.is_some() || self.total.is_some()
    }

    /// Merges the header fields over a stored document. Items are not
    /// touched; `updated_at` is left for the store to stamp.
    pub fn apply(&self, document: &Document) -> Document {
        let mut merged = document.clone();
        if let Some(number) = &self.number {
            merged.number = number.clone();
        }
        if let Some(issue_date) = self.issue_date {
            merged.issue_date = issue_date;
        }
        if let Some(due_date) = self.due_date {
            merged.due_date = due_date;
        }
        if let Some(status) = self.status {
            merged.status = Some(status);
        }
        if let Some(sub_total) = self.sub_total {
            merged.sub_total = sub_total;
        }
        if let Some(discount) = self.discount {
            merged.discount = discount;
        }
        if let Some(total_tax) = self.total_tax {
            merged.total_tax = total_tax;
        }
        if let Some(total) = self.total {
            merged.total = total;
        }
        if let Some(notes) = &self.notes {
            merged.notes = notes.clone();
        }
        if let Some(gst) = self.gst {
            merged.tax.gst = gst;
        }
        if let Some(cgst) = self.cgst {
            merged.tax.cgst = cgst;
        }
        if let Some(sgst) = self.sgst {
            merged.tax.sgst = sgst;
        }
        if let Some(igst) = self.igst {
            merged.tax.igst = igst;
        }
        if let Some(address) = &self.shipping_address_id {
            merged.shipping_address_id = Some(address.clone());
        }
        if let Some(seller) = &self.seller_name {
            merged.seller_name = Some(seller.clone());
        }
        if let Some(address) = &self.seller_address {
            merged.seller_address = address.clone();
        }
        merged
    }
}

// =============================================================================
// Listing
// =============================================================================

/// One row of a document listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    #[serde(flatten)]
    pub document: Document,
    pub item_count: i64,
}

/// Filters for listing documents of one kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub client_id: Option<String>,
    /// Matched against number and seller name.
    pub search: Option<String>,
    pub issued_from: Option<NaiveDate>,
    pub issued_to: Option<NaiveDate>,
    pub due_from: Option<NaiveDate>,
    pub due_to: Option<NaiveDate>,
    /// 1-based; `None` means the first page.
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl DocumentFilter {
    /// Effective page, clamped to at least 1.
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Effective page size, clamped to `1..=MAX_PAGE_LIMIT`.
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.limit())
    }
}

/// A page of results with the counts a client needs for pagination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub limit: u32,
    pub total_entries: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, limit: u32, total_entries: i64) -> Self {
        let limit_i = i64::from(limit.max(1));
        Page {
            items,
            page,
            limit,
            total_entries,
            total_pages: (total_entries + limit_i - 1) / limit_i,
        }
    }

    /// Converts every item, keeping the counts.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            limit: self.limit,
            total_entries: self.total_entries,
            total_pages: self.total_pages,
        }
    }
}

/// Tenant-wide counts and revenue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub invoices: i64,
    pub quotes: i64,
    pub purchase_invoices: i64,
    pub clients: i64,
    pub products: i64,
    /// Sum of invoice totals.
    pub revenue: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InvoiceStatus;

    fn stored() -> Document {
        let now = Utc::now();
        Document {
            id: "d1".into(),
            tenant_id: "tenant".into(),
            kind: DocumentKind::Invoice,
            number: "INV-1".into(),
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 30),
            status: Some(DocumentStatus::Invoice(InvoiceStatus::Pending)),
            sub_total: Money::from_cents(1800),
            discount: Money::from_cents(100),
            total_tax: Money::from_cents(200),
            total: Money::from_cents(1900),
            notes: Some("thanks".into()),
            tax: TaxBreakdown::default(),
            client_id: Some("c1".into()),
            shipping_address_id: Some("a1".into()),
            seller_name: None,
            seller_address: None,
            source_quote_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_patch_zero_and_empty_are_values() {
        let patch = DocumentPatch {
            discount: Some(Money::zero()),
            notes: Some(Some(String::new())),
            ..Default::default()
        };
        let merged = patch.apply(&stored());
        assert_eq!(merged.discount, Money::zero());
        assert_eq!(merged.notes.as_deref(), Some(""));
        assert_eq!(merged.total, Money::from_cents(1900));
    }

    #[test]
    fn test_patch_null_clears() {
        let patch = DocumentPatch {
            notes: Some(None),
            due_date: Some(None),
            ..Default::default()
        };
        let merged = patch.apply(&stored());
        assert_eq!(merged.notes, None);
        assert_eq!(merged.due_date, None);
    }

    #[test]
    fn test_empty_patch_is_identity() {
        let doc = stored();
        assert_eq!(DocumentPatch::default().apply(&doc), doc);
        assert!(!DocumentPatch::default().touches_aggregates());
    }

    #[test]
    fn test_filter_clamps_paging() {
        let filter = DocumentFilter {
            page: Some(0),
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.page(), 1);
        assert_eq!(filter.limit(), MAX_PAGE_LIMIT);
        assert_eq!(filter.offset(), 0);

        let filter = DocumentFilter {
            page: Some(3),
            limit: Some(20),
            ..Default::default()
        };
        assert_eq!(filter.offset(), 40);
    }

    #[test]
    fn test_page_counts() {
        let page: Page<i32> = Page::new(vec![1, 2], 1, 20, 41);
        assert_eq!(page.total_pages, 3);
        let empty: Page<i32> = Page::new(Vec::new(), 1, 20, 0);
        assert_eq!(empty.total_pages, 0);
    }
}
