//! # Domain Types
//!
//! Core domain types used throughout Invoicer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DocumentKind   │   │ DocumentStatus  │   │   TaxBreakdown  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Invoice        │   │  Invoice(..)    │   │  gst   (bps)    │       │
//! │  │  Quote          │   │  Quote(..)      │   │  cgst  (bps)    │       │
//! │  │  PurchaseInvoice│   │  (none for PI)  │   │  sgst / igst    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │      Tax        │   │    Product      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  bps (u32)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  1800 = 18%     │   │  name, rates    │   │  price (Money)  │       │
//! │  └─────────────────┘   └─────────────────┘   │  tax_id (opt)   │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Documents and line items live in [`crate::document`].

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{ArithmeticError, TransitionError};
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1800 bps = 18% GST, split as 900 CGST + 900 SGST
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage as sent on the wire (`18`, `2.5`).
    ///
    /// Same exactness rule as money: the percentage must land on a whole
    /// basis point. Negative rates are out of range.
    pub fn from_percentage(pct: f64) -> Result<Self, ArithmeticError> {
        if !pct.is_finite() {
            return Err(ArithmeticError::NotFinite { value: pct });
        }
        let bps = (pct * 100.0).round();
        if bps < 0.0 || bps > u32::MAX as f64 {
            return Err(ArithmeticError::OutOfRange { value: pct });
        }
        if bps / 100.0 != pct {
            return Err(ArithmeticError::SubCentPrecision { value: pct });
        }
        Ok(TaxRate(bps as u32))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

/// Aggregate GST breakdown carried by documents and tax records.
///
/// Every component is optional; the cross-field rules live in
/// [`crate::ledger::validate_tax_breakdown`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxBreakdown {
    pub gst: Option<TaxRate>,
    pub cgst: Option<TaxRate>,
    pub sgst: Option<TaxRate>,
    pub igst: Option<TaxRate>,
}

// =============================================================================
// Document Kind
// =============================================================================

/// The three structurally parallel billing documents.
///
/// One tagged type parameterises validation and persistence; the storage
/// layer keeps all three in one table keyed by this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentKind {
    Invoice,
    Quote,
    PurchaseInvoice,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [
        DocumentKind::Invoice,
        DocumentKind::Quote,
        DocumentKind::PurchaseInvoice,
    ];

    /// Storage / wire name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "INVOICE",
            DocumentKind::Quote => "QUOTE",
            DocumentKind::PurchaseInvoice => "PURCHASE_INVOICE",
        }
    }

    /// Human-readable name used in messages.
    pub const fn label(&self) -> &'static str {
        match self {
            DocumentKind::Invoice => "invoice",
            DocumentKind::Quote => "quote",
            DocumentKind::PurchaseInvoice => "purchase invoice",
        }
    }

    /// Whether the kind has a status machine.
    pub const fn has_status(&self) -> bool {
        !matches!(self, DocumentKind::PurchaseInvoice)
    }

    /// Invoices and quotes are addressed to a client with a due date.
    pub const fn has_client(&self) -> bool {
        !matches!(self, DocumentKind::PurchaseInvoice)
    }

    /// Purchase invoices record the seller instead of a client.
    pub const fn has_seller(&self) -> bool {
        matches!(self, DocumentKind::PurchaseInvoice)
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVOICE" => Ok(DocumentKind::Invoice),
            "QUOTE" => Ok(DocumentKind::Quote),
            "PURCHASE_INVOICE" => Ok(DocumentKind::PurchaseInvoice),
            other => Err(format!("unknown document kind: {other}")),
        }
    }
}

// =============================================================================
// Document Status
// =============================================================================

/// Invoice payment status.
///
/// ```text
/// PENDING ──► PARTIALLY_PAID ──► PAID
///    └──────────────────────────►┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    PartiallyPaid,
    /// Terminal.
    Paid,
}

impl InvoiceStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::PartiallyPaid => "PARTIALLY_PAID",
            InvoiceStatus::Paid => "PAID",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(InvoiceStatus::Pending),
            "PARTIALLY_PAID" => Some(InvoiceStatus::PartiallyPaid),
            "PAID" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }
}

impl Default for InvoiceStatus {
    fn default() -> Self {
        InvoiceStatus::Pending
    }
}

/// Quote status.
///
/// ```text
/// DRAFT ──► ACCEPTED ──► DECLINED
///   │          │
///   │          └──► CONVERTED_TO_INVOICE   (conversion only)
///   ├──► DECLINED
///   └──► CONVERTED_TO_INVOICE              (conversion only)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuoteStatus {
    Draft,
    Accepted,
    /// Terminal.
    Declined,
    /// Terminal. Only reachable through conversion.
    ConvertedToInvoice,
}

impl QuoteStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::Draft => "DRAFT",
            QuoteStatus::Accepted => "ACCEPTED",
            QuoteStatus::Declined => "DECLINED",
            QuoteStatus::ConvertedToInvoice => "CONVERTED_TO_INVOICE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(QuoteStatus::Draft),
            "ACCEPTED" => Some(QuoteStatus::Accepted),
            "DECLINED" => Some(QuoteStatus::Declined),
            "CONVERTED_TO_INVOICE" => Some(QuoteStatus::ConvertedToInvoice),
            _ => None,
        }
    }

    /// Statuses a quote may be converted from.
    pub const fn is_convertible(&self) -> bool {
        matches!(self, QuoteStatus::Draft | QuoteStatus::Accepted)
    }
}

impl Default for QuoteStatus {
    fn default() -> Self {
        QuoteStatus::Draft
    }
}

/// Status of a document whose kind has a status machine.
///
/// Serializes as the bare status string; the two vocabularies are disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(untagged)]
pub enum DocumentStatus {
    Invoice(InvoiceStatus),
    Quote(QuoteStatus),
}

impl DocumentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Invoice(s) => s.as_str(),
            DocumentStatus::Quote(s) => s.as_str(),
        }
    }

    /// The kind this status belongs to.
    pub const fn kind(&self) -> DocumentKind {
        match self {
            DocumentStatus::Invoice(_) => DocumentKind::Invoice,
            DocumentStatus::Quote(_) => DocumentKind::Quote,
        }
    }

    /// Parses a status string in the vocabulary of `kind`.
    pub fn parse(kind: DocumentKind, s: &str) -> Result<Self, TransitionError> {
        let parsed = match kind {
            DocumentKind::Invoice => InvoiceStatus::parse(s).map(DocumentStatus::Invoice),
            DocumentKind::Quote => QuoteStatus::parse(s).map(DocumentStatus::Quote),
            DocumentKind::PurchaseInvoice => None,
        };
        parsed.ok_or_else(|| TransitionError::StatusKindMismatch {
            kind,
            status: s.to_string(),
        })
    }

    /// Initial status for a freshly created document of `kind`.
    pub const fn initial(kind: DocumentKind) -> Option<Self> {
        match kind {
            DocumentKind::Invoice => Some(DocumentStatus::Invoice(InvoiceStatus::Pending)),
            DocumentKind::Quote => Some(DocumentStatus::Quote(QuoteStatus::Draft)),
            DocumentKind::PurchaseInvoice => None,
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Tax
// =============================================================================

/// A tenant's tax record, referenced by products and line items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tax {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    /// HSN/SAC classification code.
    pub hsn_sac_code: Option<String>,
    pub description: Option<String>,
    /// GST is always present on a tax record.
    pub gst: TaxRate,
    pub cgst: Option<TaxRate>,
    pub sgst: Option<TaxRate>,
    pub igst: Option<TaxRate>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Tax {
    pub fn breakdown(&self) -> TaxBreakdown {
        TaxBreakdown {
            gst: Some(self.gst),
            cgst: self.cgst,
            sgst: self.sgst,
            igst: self.igst,
        }
    }
}

/// Fields for a new tax record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTax {
    pub name: String,
    pub hsn_sac_code: Option<String>,
    pub description: Option<String>,
    pub gst: TaxRate,
    pub cgst: Option<TaxRate>,
    pub sgst: Option<TaxRate>,
    pub igst: Option<TaxRate>,
}

/// Partial update of a tax record. `None` means "not sent"; the inner
/// `Option` of nullable fields distinguishes "clear" from "set".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaxPatch {
    pub name: Option<String>,
    pub hsn_sac_code: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub gst: Option<TaxRate>,
    pub cgst: Option<Option<TaxRate>>,
    pub sgst: Option<Option<TaxRate>>,
    pub igst: Option<Option<TaxRate>>,
}

impl TaxPatch {
    /// Applies the patch over a stored record.
    pub fn apply(&self, tax: &Tax) -> Tax {
        let mut merged = tax.clone();
        if let Some(name) = &self.name {
            merged.name = name.clone();
        }
        if let Some(code) = &self.hsn_sac_code {
            merged.hsn_sac_code = code.clone();
        }
        if let Some(description) = &self.description {
            merged.description = description.clone();
        }
        if let Some(gst) = self.gst {
            merged.gst = gst;
        }
        if let Some(cgst) = self.cgst {
            merged.cgst = cgst;
        }
        if let Some(sgst) = self.sgst {
            merged.sgst = sgst;
        }
        if let Some(igst) = self.igst {
            merged.igst = igst;
        }
        merged
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product in a tenant's catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    pub hsn_code: Option<String>,
    /// Unit price in cents.
    pub price: Money,
    pub tax_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new product.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub hsn_code: Option<String>,
    pub price: Money,
    pub tax_id: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// A customer documents are billed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub tenant_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique per tenant.
    pub email: String,
    pub phone_no: String,
    /// Indian PAN, 10 characters.
    pub pan_no: Option<String>,
    pub company_name: Option<String>,
    /// GSTIN, 15 characters.
    pub gstin: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Client {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Fields for a new client, with the addresses created alongside it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_no: String,
    pub pan_no: Option<String>,
    pub company_name: Option<String>,
    pub gstin: Option<String>,
    pub addresses: Vec<AddressData>,
}

/// Partial update of a client. Same presence rules as [`TaxPatch`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone_no: Option<String>,
    pub pan_no: Option<Option<String>>,
    pub company_name: Option<Option<String>>,
    pub gstin: Option<Option<String>>,
}

impl ClientPatch {
    pub fn apply(&self, client: &Client) -> Client {
        let mut merged = client.clone();
        if let Some(first_name) = &self.first_name {
            merged.first_name = first_name.clone();
        }
        if let Some(last_name) = &self.last_name {
            merged.last_name = last_name.clone();
        }
        if let Some(email) = &self.email {
            merged.email = email.clone();
        }
        if let Some(phone_no) = &self.phone_no {
            merged.phone_no = phone_no.clone();
        }
        if let Some(pan_no) = &self.pan_no {
            merged.pan_no = pan_no.clone();
        }
        if let Some(company_name) = &self.company_name {
            merged.company_name = company_name.clone();
        }
        if let Some(gstin) = &self.gstin {
            merged.gstin = gstin.clone();
        }
        merged
    }
}

/// A client with the number of invoices and quotes billed to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSummary {
    pub client: Client,
    pub invoices: i64,
    pub quotes: i64,
}

// =============================================================================
// Address
// =============================================================================

/// The postal fields of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddressData {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub post_code: String,
}

/// Fields for an address added to an existing client.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAddress {
    pub client_id: String,
    pub data: AddressData,
}

/// A shipping address belonging to one client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub tenant_id: String,
    pub client_id: String,
    pub data: AddressData,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Address {
    /// First street line, city and post code, as shown in pickers.
    pub fn short_label(&self) -> String {
        let street = self.data.street.split(',').next().unwrap_or_default().trim();
        format!("{}, {}, {}", street, self.data.city, self.data.post_code)
    }
}

/// Partial update of an address. Every field is required on the record,
/// so there is no "clear".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressPatch {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub post_code: Option<String>,
}

impl AddressPatch {
    pub fn apply(&self, data: &AddressData) -> AddressData {
        let pick = |patched: &Option<String>, stored: &String| patched.clone().unwrap_or_else(|| stored.clone());
        AddressData {
            street: pick(&self.street, &data.street),
            city: pick(&self.city, &data.city),
            state: pick(&self.state, &data.state),
            country: pick(&self.country, &data.country),
            post_code: pick(&self.post_code, &data.post_code),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_rate_from_bps() {
        let rate = TaxRate::from_bps(1800);
        assert_eq!(rate.bps(), 1800);
        assert!((rate.percentage() - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_tax_rate_from_percentage() {
        assert_eq!(TaxRate::from_percentage(18.0).unwrap().bps(), 1800);
        assert_eq!(TaxRate::from_percentage(2.5).unwrap().bps(), 250);
        assert_eq!(TaxRate::from_percentage(0.29).unwrap().bps(), 29);
        assert!(TaxRate::from_percentage(8.255).is_err());
        assert!(TaxRate::from_percentage(-1.0).is_err());
        assert!(TaxRate::from_percentage(f64::NAN).is_err());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(DocumentKind::PurchaseInvoice.as_str(), "PURCHASE_INVOICE");
        assert_eq!(DocumentKind::PurchaseInvoice.to_string(), "purchase invoice");
        assert_eq!("QUOTE".parse::<DocumentKind>().unwrap(), DocumentKind::Quote);
        assert!("RECEIPT".parse::<DocumentKind>().is_err());
        assert!(!DocumentKind::PurchaseInvoice.has_status());
    }

    #[test]
    fn test_status_parse_respects_kind() {
        assert_eq!(
            DocumentStatus::parse(DocumentKind::Invoice, "PARTIALLY_PAID").unwrap(),
            DocumentStatus::Invoice(InvoiceStatus::PartiallyPaid)
        );
        assert!(matches!(
            DocumentStatus::parse(DocumentKind::Invoice, "DRAFT"),
            Err(TransitionError::StatusKindMismatch { .. })
        ));
        assert!(DocumentStatus::parse(DocumentKind::PurchaseInvoice, "PENDING").is_err());
    }

    #[test]
    fn test_status_serializes_as_bare_string() {
        let status = DocumentStatus::Quote(QuoteStatus::ConvertedToInvoice);
        assert_eq!(
            serde_json::to_string(&status).unwrap(),
            "\"CONVERTED_TO_INVOICE\""
        );
        let back: DocumentStatus = serde_json::from_str("\"PAID\"").unwrap();
        assert_eq!(back, DocumentStatus::Invoice(InvoiceStatus::Paid));
    }

    #[test]
    fn test_initial_status() {
        assert_eq!(
            DocumentStatus::initial(DocumentKind::Quote),
            Some(DocumentStatus::Quote(QuoteStatus::Draft))
        );
        assert_eq!(DocumentStatus::initial(DocumentKind::PurchaseInvoice), None);
    }

    #[test]
    fn test_tax_patch_distinguishes_clear_from_absent() {
        let now = Utc::now();
        let tax = Tax {
            id: "t1".into(),
            tenant_id: "tenant".into(),
            name: "GST 18".into(),
            hsn_sac_code: Some("9983".into()),
            description: None,
            gst: TaxRate::from_bps(1800),
            cgst: Some(TaxRate::from_bps(900)),
            sgst: Some(TaxRate::from_bps(900)),
            igst: None,
            created_at: now,
            updated_at: now,
        };
        let patch = TaxPatch {
            hsn_sac_code: Some(None),
            ..Default::default()
        };
        let merged = patch.apply(&tax);
        assert_eq!(merged.hsn_sac_code, None);
        assert_eq!(merged.cgst, Some(TaxRate::from_bps(900)));
    }

    fn client() -> Client {
        let now = Utc::now();
        Client {
            id: "c1".to_string(),
            tenant_id: "t1".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: "asha@example.com".to_string(),
            phone_no: "9876543210".to_string(),
            pan_no: Some("ABCDE1234F".to_string()),
            company_name: None,
            gstin: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_client_patch_presence() {
        let patch = ClientPatch {
            last_name: Some("Iyer".to_string()),
            pan_no: Some(None),
            company_name: Some(Some("Rao & Co".to_string())),
            ..Default::default()
        };
        let merged = patch.apply(&client());
        assert_eq!(merged.display_name(), "Asha Iyer");
        assert_eq!(merged.pan_no, None);
        assert_eq!(merged.company_name.as_deref(), Some("Rao & Co"));
        assert_eq!(merged.email, "asha@example.com");
    }

    #[test]
    fn test_address_patch_and_label() {
        let now = Utc::now();
        let address = Address {
            id: "a1".to_string(),
            tenant_id: "t1".to_string(),
            client_id: "c1".to_string(),
            data: AddressData {
                street: "12 MG Road, Floor 3".to_string(),
                city: "Pune".to_string(),
                state: "MH".to_string(),
                country: "India".to_string(),
                post_code: "411001".to_string(),
            },
            created_at: now,
            updated_at: now,
        };
        assert_eq!(address.short_label(), "12 MG Road, Pune, 411001");

        let patch = AddressPatch {
            city: Some("Mumbai".to_string()),
            ..Default::default()
        };
        let data = patch.apply(&address.data);
        assert_eq!(data.city, "Mumbai");
        assert_eq!(data.street, address.data.street);
    }
}
