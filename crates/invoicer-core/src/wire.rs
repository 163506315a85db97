//! # Wire Format
//!
//! JSON request and response shapes. Amounts cross this boundary in major
//! units (`12.50`) and tax rates in percent (`18`); everything past it is
//! cents and basis points.
//!
//! ```text
//! ┌───────────────────┐  into_new_document()  ┌───────────────────┐
//! │ CreateDocument-   │ ────────────────────► │ NewDocument       │
//! │ Request (f64)     │   to_minor_units()    │ (Money / TaxRate) │
//! └───────────────────┘                       └───────────────────┘
//! ┌───────────────────┐       From<&..>       ┌───────────────────┐
//! │ DocumentView (f64)│ ◄──────────────────── │ DocumentWithItems │
//! └───────────────────┘   to_major_units()    └───────────────────┘
//! ```
//!
//! Conversion failures are collected per field (`items[1].price`) so one
//! response lists every problem.
//!
//! Field names accept the per-kind spellings older clients send
//! (`invoiceNumber`, `quoteDate`, `invoiceItems`, ...).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::document::{
    DashboardSummary, DocumentPatch, DocumentSummary, DocumentWithItems, LineItem, LineItemData,
    NewDocument,
};
use crate::error::{LedgerError, ValidationFailure, Violation};
use crate::money::{to_major_units, to_minor_units, Money};
use crate::types::{
    Address, AddressData, AddressPatch, Client, ClientPatch, ClientSummary, DocumentKind,
    DocumentStatus, NewAddress, NewClient, NewProduct, NewTax, Product, Tax, TaxBreakdown,
    TaxPatch, TaxRate,
};
use crate::validation::validate_quantity;

// =============================================================================
// Helpers
// =============================================================================

/// Deserializes a nullable field so that "absent" and "null" differ.
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent → `None`, `null` → `Some(None)`, value → `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Collects conversion failures while building a domain value.
#[derive(Default)]
struct Collector {
    violations: Vec<Violation>,
}

impl Collector {
    fn money(&mut self, field: &str, major: f64) -> Money {
        to_minor_units(major).unwrap_or_else(|e| {
            self.violations.push(LedgerError::amount(field, e).into());
            Money::zero()
        })
    }

    fn rate(&mut self, field: &str, pct: f64) -> TaxRate {
        TaxRate::from_percentage(pct).unwrap_or_else(|e| {
            self.violations.push(LedgerError::amount(field, e).into());
            TaxRate::zero()
        })
    }

    fn opt_rate(&mut self, field: &str, pct: Option<f64>) -> Option<TaxRate> {
        pct.map(|p| self.rate(field, p))
    }

    fn nullable_rate(&mut self, field: &str, pct: Option<Option<f64>>) -> Option<Option<TaxRate>> {
        pct.map(|p| self.opt_rate(field, p))
    }

    fn status(&mut self, kind: DocumentKind, status: &str) -> Option<DocumentStatus> {
        match DocumentStatus::parse(kind, status) {
            Ok(s) => Some(s),
            Err(e) => {
                self.violations.push(e.into());
                None
            }
        }
    }

    fn items(&mut self, items: Vec<LineItemInput>) -> Vec<LineItemData> {
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| item.convert(i, self))
            .collect()
    }

    fn finish<T>(self, value: T) -> Result<T, ValidationFailure> {
        ValidationFailure::check(self.violations)?;
        Ok(value)
    }
}

fn percent(rate: Option<TaxRate>) -> Option<f64> {
    rate.map(|r| r.percentage())
}

/// Optional form fields arrive as `""` when left empty.
fn blank_to_none(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Line Items
// =============================================================================

/// One line as sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub hsn_code: Option<String>,
    pub price: f64,
    /// Defaults to 1.
    #[serde(default)]
    pub quantity: Option<f64>,
    pub total_price: f64,
    pub taxable_amount: f64,
    #[serde(default)]
    pub product_id: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl LineItemInput {
    fn convert(self, index: usize, c: &mut Collector) -> LineItemData {
        let path = |field: &str| format!("items[{index}].{field}");

        let quantity = match validate_quantity(&path("quantity"), self.quantity.unwrap_or(1.0)) {
            Ok(q) => q,
            Err(e) => {
                c.violations.push(e.into());
                0
            }
        };

        LineItemData {
            price: c.money(&path("price"), self.price),
            total_price: c.money(&path("totalPrice"), self.total_price),
            taxable_amount: c.money(&path("taxableAmount"), self.taxable_amount),
            quantity,
            product_name: self.product_name,
            product_description: self.product_description,
            hsn_code: self.hsn_code,
            product_id: self.product_id,
            tax_id: self.tax_id,
        }
    }
}

// =============================================================================
// Document Requests
// =============================================================================

/// Body of a create request for any document kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateDocumentRequest {
    #[serde(alias = "invoiceNumber", alias = "quoteNumber")]
    pub number: String,
    #[serde(alias = "invoiceDate", alias = "quoteDate")]
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[serde(default, alias = "invoiceDueDate", alias = "quoteDueDate")]
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: Option<String>,
    pub sub_total: f64,
    #[serde(default)]
    pub discount: Option<f64>,
    pub total_tax: f64,
    pub total: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub gst: Option<f64>,
    #[serde(default)]
    pub cgst: Option<f64>,
    #[serde(default)]
    pub sgst: Option<f64>,
    #[serde(default)]
    pub igst: Option<f64>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub shipping_address_id: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default)]
    pub seller_address: Option<String>,
    #[serde(default, alias = "invoiceItems", alias = "quoteItems")]
    pub items: Vec<LineItemInput>,
}

impl CreateDocumentRequest {
    /// Converts to cents and basis points, collecting every failure.
    pub fn into_new_document(self, kind: DocumentKind) -> Result<NewDocument, ValidationFailure> {
        let mut c = Collector::default();

        let status = self.status.as_deref().and_then(|s| c.status(kind, s));
        let tax = TaxBreakdown {
            gst: c.opt_rate("gst", self.gst),
            cgst: c.opt_rate("cgst", self.cgst),
            sgst: c.opt_rate("sgst", self.sgst),
            igst: c.opt_rate("igst", self.igst),
        };

        let new = NewDocument {
            kind,
            number: self.number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            status,
            sub_total: c.money("subTotal", self.sub_total),
            discount: c.money("discount", self.discount.unwrap_or(0.0)),
            total_tax: c.money("totalTax", self.total_tax),
            total: c.money("total", self.total),
            notes: self.notes,
            tax,
            client_id: self.client_id,
            shipping_address_id: self.shipping_address_id,
            seller_name: self.seller_name,
            seller_address: self.seller_address,
            items: c.items(self.items),
        };

        c.finish(new)
    }
}

/// Body of a partial update. Absent fields are left alone; `null` clears
/// nullable fields.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDocumentRequest {
    #[serde(default, alias = "invoiceNumber", alias = "quoteNumber")]
    pub number: Option<String>,
    #[serde(default, alias = "invoiceDate", alias = "quoteDate")]
    pub issue_date: Option<NaiveDate>,
    #[serde(
        default,
        alias = "invoiceDueDate",
        alias = "quoteDueDate",
        deserialize_with = "double_option"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub sub_total: Option<f64>,
    #[serde(default)]
    pub discount: Option<f64>,
    #[serde(default)]
    pub total_tax: Option<f64>,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub gst: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub cgst: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sgst: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub igst: Option<Option<f64>>,
    #[serde(default)]
    pub shipping_address_id: Option<String>,
    #[serde(default)]
    pub seller_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub seller_address: Option<Option<String>>,
    #[serde(default, alias = "invoiceItems", alias = "quoteItems")]
    pub items: Option<Vec<LineItemInput>>,
}

impl UpdateDocumentRequest {
    /// Converts the fields that were sent, collecting every failure.
    pub fn into_patch(self, kind: DocumentKind) -> Result<DocumentPatch, ValidationFailure> {
        let mut c = Collector::default();

        let status = self.status.as_deref().and_then(|s| c.status(kind, s));

        let patch = DocumentPatch {
            number: self.number,
            issue_date: self.issue_date,
            due_date: self.due_date,
            status,
            sub_total: self.sub_total.map(|v| c.money("subTotal", v)),
            discount: self.discount.map(|v| c.money("discount", v)),
            total_tax: self.total_tax.map(|v| c.money("totalTax", v)),
            total: self.total.map(|v| c.money("total", v)),
            notes: self.notes,
            gst: c.nullable_rate("gst", self.gst),
            cgst: c.nullable_rate("cgst", self.cgst),
            sgst: c.nullable_rate("sgst", self.sgst),
            igst: c.nullable_rate("igst", self.igst),
            shipping_address_id: self.shipping_address_id,
            seller_name: self.seller_name,
            seller_address: self.seller_address,
            items: self.items.map(|items| c.items(items)),
        };

        c.finish(patch)
    }
}

// =============================================================================
// Tax and Product Requests
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaxRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub hsn_sac_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub gst: f64,
    #[serde(default)]
    pub cgst: Option<f64>,
    #[serde(default)]
    pub sgst: Option<f64>,
    #[serde(default)]
    pub igst: Option<f64>,
}

impl CreateTaxRequest {
    pub fn into_new_tax(self) -> Result<NewTax, ValidationFailure> {
        let mut c = Collector::default();
        let tax = NewTax {
            gst: c.rate("gst", self.gst),
            cgst: c.opt_rate("cgst", self.cgst),
            sgst: c.opt_rate("sgst", self.sgst),
            igst: c.opt_rate("igst", self.igst),
            name: self.name,
            hsn_sac_code: self.hsn_sac_code,
            description: self.description,
        };
        c.finish(tax)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaxRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub hsn_sac_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub gst: Option<f64>,
    #[serde(default, deserialize_with = "double_option")]
    pub cgst: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sgst: Option<Option<f64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub igst: Option<Option<f64>>,
}

impl UpdateTaxRequest {
    pub fn into_patch(self) -> Result<TaxPatch, ValidationFailure> {
        let mut c = Collector::default();
        let patch = TaxPatch {
            gst: self.gst.map(|p| c.rate("gst", p)),
            cgst: c.nullable_rate("cgst", self.cgst),
            sgst: c.nullable_rate("sgst", self.sgst),
            igst: c.nullable_rate("igst", self.igst),
            name: self.name,
            hsn_sac_code: self.hsn_sac_code,
            description: self.description,
        };
        c.finish(patch)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[serde(default, alias = "name")]
    pub product_name: String,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub hsn_code: Option<String>,
    pub price: f64,
    #[serde(default)]
    pub tax_id: Option<String>,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> Result<NewProduct, ValidationFailure> {
        let mut c = Collector::default();
        let product = NewProduct {
            price: c.money("price", self.price),
            name: self.product_name,
            description: self.product_description,
            hsn_code: self.hsn_code,
            tax_id: self.tax_id,
        };
        c.finish(product)
    }
}

// =============================================================================
// Clients & Addresses
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub post_code: String,
}

impl From<AddressInput> for AddressData {
    fn from(input: AddressInput) -> Self {
        AddressData {
            street: input.street,
            city: input.city,
            state: input.state,
            country: input.country,
            post_code: input.post_code,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_no: String,
    #[serde(default)]
    pub pan_no: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub client_gstin_number: Option<String>,
    #[serde(default)]
    pub addresses: Vec<AddressInput>,
}

impl CreateClientRequest {
    /// Text fields need no unit conversion; rules are checked by the store.
    pub fn into_new_client(self) -> NewClient {
        NewClient {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_no: self.phone_no,
            pan_no: blank_to_none(self.pan_no),
            company_name: blank_to_none(self.company_name),
            gstin: blank_to_none(self.client_gstin_number),
            addresses: self.addresses.into_iter().map(AddressData::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_no: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub pan_no: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub company_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub client_gstin_number: Option<Option<String>>,
}

impl UpdateClientRequest {
    pub fn into_patch(self) -> ClientPatch {
        ClientPatch {
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone_no: self.phone_no,
            pan_no: self.pan_no.map(blank_to_none),
            company_name: self.company_name.map(blank_to_none),
            gstin: self.client_gstin_number.map(blank_to_none),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateAddressRequest {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub post_code: String,
}

impl CreateAddressRequest {
    pub fn into_new_address(self) -> NewAddress {
        NewAddress {
            client_id: self.client_id,
            data: AddressData {
                street: self.street,
                city: self.city,
                state: self.state,
                country: self.country,
                post_code: self.post_code,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAddressRequest {
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub post_code: Option<String>,
}

impl UpdateAddressRequest {
    pub fn into_patch(self) -> AddressPatch {
        AddressPatch {
            street: self.street,
            city: self.city,
            state: self.state,
            country: self.country,
            post_code: self.post_code,
        }
    }
}

// =============================================================================
// Views
// =============================================================================

/// A line item in major units.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItemView {
    pub id: String,
    pub position: i64,
    pub product_name: String,
    pub product_description: Option<String>,
    pub hsn_code: Option<String>,
    pub price: f64,
    pub quantity: u32,
    pub total_price: f64,
    pub taxable_amount: f64,
    pub product_id: Option<String>,
    pub tax_id: Option<String>,
}

impl From<&LineItem> for LineItemView {
    fn from(item: &LineItem) -> Self {
        let data = &item.data;
        LineItemView {
            id: item.id.clone(),
            position: item.position,
            product_name: data.product_name.clone(),
            product_description: data.product_description.clone(),
            hsn_code: data.hsn_code.clone(),
            price: to_major_units(data.price),
            quantity: data.quantity,
            total_price: to_major_units(data.total_price),
            taxable_amount: to_major_units(data.taxable_amount),
            product_id: data.product_id.clone(),
            tax_id: data.tax_id.clone(),
        }
    }
}

/// A document with its items in major units, as returned by reads and
/// consumed by spreadsheet exports.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentView {
    pub id: String,
    pub kind: DocumentKind,
    pub number: String,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub sub_total: f64,
    pub discount: f64,
    pub total_tax: f64,
    pub total: f64,
    pub notes: Option<String>,
    pub gst: Option<f64>,
    pub cgst: Option<f64>,
    pub sgst: Option<f64>,
    pub igst: Option<f64>,
    pub client_id: Option<String>,
    pub shipping_address_id: Option<String>,
    pub seller_name: Option<String>,
    pub seller_address: Option<String>,
    pub source_quote_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub items: Vec<LineItemView>,
}

impl From<&DocumentWithItems> for DocumentView {
    fn from(full: &DocumentWithItems) -> Self {
        let doc = &full.document;
        DocumentView {
            id: doc.id.clone(),
            kind: doc.kind,
            number: doc.number.clone(),
            issue_date: doc.issue_date,
            due_date: doc.due_date,
            status: doc.status.map(|s| s.as_str().to_string()),
            sub_total: to_major_units(doc.sub_total),
            discount: to_major_units(doc.discount),
            total_tax: to_major_units(doc.total_tax),
            total: to_major_units(doc.total),
            notes: doc.notes.clone(),
            gst: percent(doc.tax.gst),
            cgst: percent(doc.tax.cgst),
            sgst: percent(doc.tax.sgst),
            igst: percent(doc.tax.igst),
            client_id: doc.client_id.clone(),
            shipping_address_id: doc.shipping_address_id.clone(),
            seller_name: doc.seller_name.clone(),
            seller_address: doc.seller_address.clone(),
            source_quote_id: doc.source_quote_id.clone(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            items: full.items.iter().map(LineItemView::from).collect(),
        }
    }
}

/// One listing row in major units.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummaryView {
    pub id: String,
    pub kind: DocumentKind,
    pub number: String,
    #[ts(as = "String")]
    pub issue_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub total: f64,
    pub client_id: Option<String>,
    pub seller_name: Option<String>,
    pub item_count: i64,
}

impl From<&DocumentSummary> for DocumentSummaryView {
    fn from(summary: &DocumentSummary) -> Self {
        let doc = &summary.document;
        DocumentSummaryView {
            id: doc.id.clone(),
            kind: doc.kind,
            number: doc.number.clone(),
            issue_date: doc.issue_date,
            due_date: doc.due_date,
            status: doc.status.map(|s| s.as_str().to_string()),
            total: to_major_units(doc.total),
            client_id: doc.client_id.clone(),
            seller_name: doc.seller_name.clone(),
            item_count: summary.item_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub invoices: i64,
    pub quotes: i64,
    pub purchase_invoices: i64,
    pub clients: i64,
    pub products: i64,
    pub revenue: f64,
}

impl From<&DashboardSummary> for DashboardView {
    fn from(summary: &DashboardSummary) -> Self {
        DashboardView {
            invoices: summary.invoices,
            quotes: summary.quotes,
            purchase_invoices: summary.purchase_invoices,
            clients: summary.clients,
            products: summary.products,
            revenue: to_major_units(summary.revenue),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxView {
    pub id: String,
    pub name: String,
    pub hsn_sac_code: Option<String>,
    pub description: Option<String>,
    pub gst: f64,
    pub cgst: Option<f64>,
    pub sgst: Option<f64>,
    pub igst: Option<f64>,
}

impl From<&Tax> for TaxView {
    fn from(tax: &Tax) -> Self {
        TaxView {
            id: tax.id.clone(),
            name: tax.name.clone(),
            hsn_sac_code: tax.hsn_sac_code.clone(),
            description: tax.description.clone(),
            gst: tax.gst.percentage(),
            cgst: percent(tax.cgst),
            sgst: percent(tax.sgst),
            igst: percent(tax.igst),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub product_name: String,
    pub product_description: Option<String>,
    pub hsn_code: Option<String>,
    pub price: f64,
    pub tax_id: Option<String>,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        ProductView {
            id: product.id.clone(),
            product_name: product.name.clone(),
            product_description: product.description.clone(),
            hsn_code: product.hsn_code.clone(),
            price: to_major_units(product.price),
            tax_id: product.tax_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: String,
    pub pan_no: Option<String>,
    pub company_name: Option<String>,
    pub client_gstin_number: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Client> for ClientView {
    fn from(client: &Client) -> Self {
        ClientView {
            id: client.id.clone(),
            first_name: client.first_name.clone(),
            last_name: client.last_name.clone(),
            email: client.email.clone(),
            phone_no: client.phone_no.clone(),
            pan_no: client.pan_no.clone(),
            company_name: client.company_name.clone(),
            client_gstin_number: client.gstin.clone(),
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

/// One client listing row with its document counts.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ClientSummaryView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone_no: String,
    pub company_name: Option<String>,
    pub invoices: i64,
    pub quotes: i64,
}

impl From<&ClientSummary> for ClientSummaryView {
    fn from(summary: &ClientSummary) -> Self {
        let client = &summary.client;
        ClientSummaryView {
            id: client.id.clone(),
            name: client.display_name(),
            email: client.email.clone(),
            phone_no: client.phone_no.clone(),
            company_name: client.company_name.clone(),
            invoices: summary.invoices,
            quotes: summary.quotes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddressView {
    pub id: String,
    pub client_id: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub post_code: String,
    /// Short form for address pickers.
    pub label: String,
}

impl From<&Address> for AddressView {
    fn from(address: &Address) -> Self {
        AddressView {
            id: address.id.clone(),
            client_id: address.client_id.clone(),
            street: address.data.street.clone(),
            city: address.data.city.clone(),
            state: address.data.state.clone(),
            country: address.data.country.clone(),
            post_code: address.data.post_code.clone(),
            label: address.short_label(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArithmeticError;
    use crate::types::InvoiceStatus;
    use serde_json::json;

    fn invoice_json() -> serde_json::Value {
        json!({
            "invoiceNumber": "INV-001",
            "invoiceDate": "2024-04-01",
            "invoiceDueDate": "2024-04-30",
            "status": "PENDING",
            "subTotal": 18.0,
            "totalTax": 2.0,
            "total": 20.0,
            "gst": 18,
            "cgst": 9,
            "sgst": 9,
            "clientId": "client-1",
            "shippingAddressId": "address-1",
            "invoiceItems": [
                { "productName": "Widget", "price": 10.0, "quantity": 2,
                  "totalPrice": 20.0, "taxableAmount": 2.0 }
            ]
        })
    }

    #[test]
    fn test_create_request_converts_to_cents() {
        let req: CreateDocumentRequest = serde_json::from_value(invoice_json()).unwrap();
        let new = req.into_new_document(DocumentKind::Invoice).unwrap();
        assert_eq!(new.number, "INV-001");
        assert_eq!(new.total, Money::from_cents(2000));
        assert_eq!(new.discount, Money::zero());
        assert_eq!(new.status, Some(DocumentStatus::Invoice(InvoiceStatus::Pending)));
        assert_eq!(new.tax.gst, Some(TaxRate::from_bps(1800)));
        assert_eq!(new.items[0].price, Money::from_cents(1000));
        assert_eq!(new.items[0].quantity, 2);
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        let item: LineItemInput = serde_json::from_value(json!({
            "productName": "Pen", "price": 0.29, "totalPrice": 0.29, "taxableAmount": 0
        }))
        .unwrap();
        let mut c = Collector::default();
        let data = item.convert(0, &mut c);
        assert!(c.violations.is_empty());
        assert_eq!(data.quantity, 1);
        assert_eq!(data.price, Money::from_cents(29));
    }

    #[test]
    fn test_create_request_collects_every_conversion_failure() {
        let mut body = invoice_json();
        body["total"] = json!(20.001);
        body["status"] = json!("DRAFT");
        body["invoiceItems"][0]["quantity"] = json!(1.5);
        let req: CreateDocumentRequest = serde_json::from_value(body).unwrap();
        let failure = req.into_new_document(DocumentKind::Invoice).unwrap_err();

        assert_eq!(failure.violations().len(), 3);
        assert!(failure.violations().iter().any(|v| matches!(
            v,
            Violation::Ledger(LedgerError::InvalidAmount {
                field,
                source: ArithmeticError::SubCentPrecision { .. },
            }) if field == "total"
        )));
        assert!(failure
            .reasons()
            .iter()
            .any(|r| r.starts_with("items[0].quantity")));
    }

    #[test]
    fn test_update_request_absent_null_and_zero() {
        let req: UpdateDocumentRequest = serde_json::from_value(json!({
            "discount": 0,
            "notes": null,
            "quoteNumber": ""
        }))
        .unwrap();
        let patch = req.into_patch(DocumentKind::Quote).unwrap();
        assert_eq!(patch.discount, Some(Money::zero()));
        assert_eq!(patch.notes, Some(None));
        assert_eq!(patch.number.as_deref(), Some(""));
        assert_eq!(patch.total, None);
        assert_eq!(patch.gst, None);
        assert_eq!(patch.items, None);
    }

    #[test]
    fn test_update_tax_request_clears_component() {
        let req: UpdateTaxRequest = serde_json::from_value(json!({ "igst": null, "gst": 12 })).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.igst, Some(None));
        assert_eq!(patch.gst, Some(TaxRate::from_bps(1200)));
        assert_eq!(patch.cgst, None);
    }

    #[test]
    fn test_document_view_uses_major_units() {
        let req: CreateDocumentRequest = serde_json::from_value(invoice_json()).unwrap();
        let new = req.into_new_document(DocumentKind::Invoice).unwrap();
        let now = Utc::now();
        let full = DocumentWithItems {
            document: crate::document::Document {
                id: "d1".into(),
                tenant_id: "t1".into(),
                kind: new.kind,
                number: new.number.clone(),
                issue_date: new.issue_date,
                due_date: new.due_date,
                status: new.status,
                sub_total: new.sub_total,
                discount: new.discount,
                total_tax: new.total_tax,
                total: new.total,
                notes: None,
                tax: new.tax,
                client_id: new.client_id.clone(),
                shipping_address_id: new.shipping_address_id.clone(),
                seller_name: None,
                seller_address: None,
                source_quote_id: None,
                created_at: now,
                updated_at: now,
            },
            items: vec![LineItem {
                id: "i1".into(),
                document_id: "d1".into(),
                position: 0,
                data: new.items[0].clone(),
            }],
        };

        let view = DocumentView::from(&full);
        assert_eq!(view.total, 20.0);
        assert_eq!(view.gst, Some(18.0));
        assert_eq!(view.status.as_deref(), Some("PENDING"));
        assert_eq!(view.items[0].total_price, 20.0);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["subTotal"], json!(18.0));
        assert_eq!(json["kind"], json!("INVOICE"));
    }

    #[test]
    fn test_client_request_blank_optionals() {
        let req: CreateClientRequest = serde_json::from_value(json!({
            "firstName": "Asha",
            "lastName": "Rao",
            "email": "asha@example.com",
            "phoneNo": "9876543210",
            "panNo": "",
            "clientGstinNumber": "27ABCDE1234F1Z5",
            "addresses": [
                { "street": "12 MG Road", "city": "Pune", "state": "MH",
                  "country": "India", "postCode": "411001" }
            ]
        }))
        .unwrap();
        let new = req.into_new_client();
        assert_eq!(new.pan_no, None);
        assert_eq!(new.gstin.as_deref(), Some("27ABCDE1234F1Z5"));
        assert_eq!(new.addresses[0].post_code, "411001");

        let patch: UpdateClientRequest =
            serde_json::from_value(json!({ "companyName": null, "phoneNo": "9123456780" })).unwrap();
        let patch = patch.into_patch();
        assert_eq!(patch.company_name, Some(None));
        assert_eq!(patch.phone_no.as_deref(), Some("9123456780"));
        assert_eq!(patch.pan_no, None);
    }
}
