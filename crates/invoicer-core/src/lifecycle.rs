//! # Document Lifecycle Rules
//!
//! The pure half of the document lifecycle: status machines and the checks
//! that must pass before any storage transaction opens. The storage half
//! lives in `invoicer-db`'s document repository.
//!
//! ## State Machines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Invoice:   PENDING ──► PARTIALLY_PAID ──► PAID (terminal)              │
//! │                └────────────────────────►┘                              │
//! │                                                                         │
//! │  Quote:     DRAFT ──► ACCEPTED ──► DECLINED (terminal)                  │
//! │               └──────────────────►┘                                     │
//! │             DRAFT | ACCEPTED ══convert══► CONVERTED_TO_INVOICE          │
//! │                                            (terminal)                   │
//! │                                                                         │
//! │  Purchase invoice: no status                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Planning Functions
//! - [`plan_create`]: full validation of a new document, resolves its status
//! - [`plan_update`]: merges a patch, validates what it touched
//! - [`plan_conversion`]: builds the invoice a quote converts into
//!
//! Each planner collects every violation it finds before failing.

use chrono::NaiveDate;

use crate::document::{Document, DocumentPatch, LineItem, LineItemData, NewDocument};
use crate::error::{TransitionError, ValidationError, ValidationFailure, Violation};
use crate::ledger::{ledger_violations, SuppliedTotals};
use crate::types::{DocumentKind, DocumentStatus, InvoiceStatus, QuoteStatus, TaxBreakdown};
use crate::validation::{
    validate_document_number, validate_item_count, validate_non_negative, validate_notes,
    validate_optional_text, validate_product_name, validate_required_text, validate_tax_rate,
    validate_uuid,
};
use crate::{MAX_NAME_LEN, MAX_NOTES_LEN};

// =============================================================================
// Transitions
// =============================================================================

/// Checks a requested status change.
///
/// Re-stating the current status is a no-op. `CONVERTED_TO_INVOICE` is
/// never a legal target here; only [`plan_conversion`] reaches it.
pub fn check_transition(
    kind: DocumentKind,
    from: DocumentStatus,
    to: DocumentStatus,
) -> Result<(), TransitionError> {
    if to.kind() != kind {
        return Err(TransitionError::StatusKindMismatch {
            kind,
            status: to.as_str().to_string(),
        });
    }
    if from == to {
        return Ok(());
    }

    let allowed = match (from, to) {
        (_, DocumentStatus::Quote(QuoteStatus::ConvertedToInvoice)) => {
            return Err(TransitionError::ConversionOnly)
        }
        (DocumentStatus::Invoice(from), DocumentStatus::Invoice(to)) => matches!(
            (from, to),
            (InvoiceStatus::Pending, InvoiceStatus::PartiallyPaid)
                | (InvoiceStatus::Pending, InvoiceStatus::Paid)
                | (InvoiceStatus::PartiallyPaid, InvoiceStatus::Paid)
        ),
        (DocumentStatus::Quote(from), DocumentStatus::Quote(to)) => matches!(
            (from, to),
            (QuoteStatus::Draft, QuoteStatus::Accepted)
                | (QuoteStatus::Draft, QuoteStatus::Declined)
                | (QuoteStatus::Accepted, QuoteStatus::Declined)
        ),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(TransitionError::InvalidTransition {
            kind,
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Checks that `quote` may be converted into an invoice.
pub fn check_convertible(quote: &Document) -> Result<(), TransitionError> {
    match quote.status {
        Some(DocumentStatus::Quote(status)) if status.is_convertible() => Ok(()),
        Some(DocumentStatus::Quote(QuoteStatus::ConvertedToInvoice)) => {
            Err(TransitionError::AlreadyConverted {
                quote_id: quote.id.clone(),
            })
        }
        other => Err(TransitionError::NotConvertible {
            quote_id: quote.id.clone(),
            status: other.map_or("NONE", |s| s.as_str()).to_string(),
        }),
    }
}

// =============================================================================
// Header Rules
// =============================================================================

/// The header fields the kind-specific rules look at.
struct Header<'a> {
    kind: DocumentKind,
    number: &'a str,
    due_date: Option<NaiveDate>,
    status: Option<DocumentStatus>,
    client_id: Option<&'a str>,
    shipping_address_id: Option<&'a str>,
    seller_name: Option<&'a str>,
    seller_address: Option<&'a str>,
    notes: Option<&'a str>,
    tax: &'a TaxBreakdown,
}

impl<'a> From<&'a NewDocument> for Header<'a> {
    fn from(doc: &'a NewDocument) -> Self {
        Header {
            kind: doc.kind,
            number: &doc.number,
            due_date: doc.due_date,
            status: doc.status,
            client_id: doc.client_id.as_deref(),
            shipping_address_id: doc.shipping_address_id.as_deref(),
            seller_name: doc.seller_name.as_deref(),
            seller_address: doc.seller_address.as_deref(),
            notes: doc.notes.as_deref(),
            tax: &doc.tax,
        }
    }
}

impl<'a> From<&'a Document> for Header<'a> {
    fn from(doc: &'a Document) -> Self {
        Header {
            kind: doc.kind,
            number: &doc.number,
            due_date: doc.due_date,
            status: doc.status,
            client_id: doc.client_id.as_deref(),
            shipping_address_id: doc.shipping_address_id.as_deref(),
            seller_name: doc.seller_name.as_deref(),
            seller_address: doc.seller_address.as_deref(),
            notes: doc.notes.as_deref(),
            tax: &doc.tax,
        }
    }
}

fn not_applicable(field: &str, kind: DocumentKind) -> Violation {
    ValidationError::NotApplicable {
        field: field.to_string(),
        kind,
    }
    .into()
}

fn required(field: &str) -> Violation {
    ValidationError::Required {
        field: field.to_string(),
    }
    .into()
}

fn header_violations(header: &Header<'_>) -> Vec<Violation> {
    let mut violations = Vec::new();
    let kind = header.kind;

    if let Err(e) = validate_document_number(header.number) {
        violations.push(e.into());
    }
    if let Err(e) = validate_notes(header.notes) {
        violations.push(e.into());
    }

    if kind.has_client() {
        match header.client_id {
            Some(id) => {
                if let Err(e) = validate_required_text("clientId", id, MAX_NAME_LEN) {
                    violations.push(e.into());
                }
            }
            None => violations.push(required("clientId")),
        }
        match header.shipping_address_id {
            Some(id) => {
                if let Err(e) = validate_required_text("shippingAddressId", id, MAX_NAME_LEN) {
                    violations.push(e.into());
                }
            }
            None => violations.push(required("shippingAddressId")),
        }
        if header.due_date.is_none() {
            violations.push(required("dueDate"));
        }
    } else {
        if header.client_id.is_some() {
            violations.push(not_applicable("clientId", kind));
        }
        if header.shipping_address_id.is_some() {
            violations.push(not_applicable("shippingAddressId", kind));
        }
        if header.due_date.is_some() {
            violations.push(not_applicable("dueDate", kind));
        }
    }

    if kind.has_seller() {
        match header.seller_name {
            Some(name) => {
                if let Err(e) = validate_required_text("sellerName", name, MAX_NAME_LEN) {
                    violations.push(e.into());
                }
            }
            None => violations.push(required("sellerName")),
        }
        if let Err(e) = validate_optional_text("sellerAddress", header.seller_address, MAX_NOTES_LEN) {
            violations.push(e.into());
        }
    } else {
        if header.seller_name.is_some() {
            violations.push(not_applicable("sellerName", kind));
        }
        if header.seller_address.is_some() {
            violations.push(not_applicable("sellerAddress", kind));
        }
    }

    match header.status {
        Some(status) if status.kind() != kind => {
            violations.push(
                TransitionError::StatusKindMismatch {
                    kind,
                    status: status.as_str().to_string(),
                }
                .into(),
            );
        }
        None if kind.has_status() => violations.push(required("status")),
        _ => {}
    }

    let rates = [
        ("gst", header.tax.gst),
        ("cgst", header.tax.cgst),
        ("sgst", header.tax.sgst),
        ("igst", header.tax.igst),
    ];
    for (field, rate) in rates {
        if let Some(rate) = rate {
            if let Err(e) = validate_tax_rate(field, rate) {
                violations.push(e.into());
            }
        }
    }

    violations
}

/// Field rules for a set of line items, with `items[i].field` paths.
fn item_violations(items: &[LineItemData]) -> Vec<Violation> {
    let mut violations = Vec::new();

    if let Err(e) = validate_item_count(items.len()) {
        violations.push(e.into());
    }

    for (i, item) in items.iter().enumerate() {
        let path = |field: &str| format!("items[{i}].{field}");

        if let Err(e) = validate_product_name(&path("productName"), &item.product_name) {
            violations.push(e.into());
        }
        let amounts = [
            ("price", item.price),
            ("totalPrice", item.total_price),
            ("taxableAmount", item.taxable_amount),
        ];
        for (field, amount) in amounts {
            if let Err(e) = validate_non_negative(&path(field), amount) {
                violations.push(e.into());
            }
        }
        if let Some(id) = &item.product_id {
            if let Err(e) = validate_uuid(&path("productId"), id) {
                violations.push(e.into());
            }
        }
        if let Some(id) = &item.tax_id {
            if let Err(e) = validate_uuid(&path("taxId"), id) {
                violations.push(e.into());
            }
        }
    }

    violations
}

// =============================================================================
// Create
// =============================================================================

/// Validates a new document and resolves the status it is stored with.
///
/// All three aggregates are reconciled against the items. A missing status
/// takes the kind's initial one; `CONVERTED_TO_INVOICE` cannot be requested.
pub fn plan_create(new: &NewDocument) -> Result<Option<DocumentStatus>, ValidationFailure> {
    let status = match new.status {
        None => DocumentStatus::initial(new.kind),
        requested => requested,
    };

    let header = Header {
        status,
        ..Header::from(new)
    };
    let mut violations = header_violations(&header);

    if status == Some(DocumentStatus::Quote(QuoteStatus::ConvertedToInvoice)) {
        violations.push(TransitionError::ConversionOnly.into());
    }

    violations.extend(item_violations(&new.items));

    let supplied = SuppliedTotals::complete(new.sub_total, new.total_tax, new.total, new.discount);
    violations.extend(ledger_violations(&new.items, Some(&supplied), &new.tax));

    ValidationFailure::check(violations)?;
    Ok(status)
}

// =============================================================================
// Update
// =============================================================================

/// What an update will write.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    /// The stored header with the patch merged in.
    pub document: Document,
    /// Replacement item set, when the patch carried one.
    pub items: Option<Vec<LineItemData>>,
    /// Whether the number changed and needs a uniqueness check.
    pub renumbered: bool,
}

/// Merges `patch` over `existing` and validates the result.
///
/// Aggregates the patch carries are reconciled against the new item set, or
/// against `stored_items` when only aggregates were sent. Aggregates the
/// patch omits keep their stored values and are not compared.
pub fn plan_update(
    existing: &Document,
    stored_items: &[LineItem],
    patch: &DocumentPatch,
) -> Result<UpdatePlan, ValidationFailure> {
    let merged = patch.apply(existing);
    let mut violations = header_violations(&Header::from(&merged));

    if let (Some(from), Some(to)) = (existing.status, patch.status) {
        if let Err(e) = check_transition(existing.kind, from, to) {
            violations.push(e.into());
        }
    }

    if let Some(items) = &patch.items {
        violations.extend(item_violations(items));
    }

    let supplied = SuppliedTotals {
        sub_total: patch.sub_total,
        total_tax: patch.total_tax,
        total: patch.total,
        discount: merged.discount,
    };
    let reconcile = patch.items.is_some() || patch.touches_aggregates();

    match &patch.items {
        Some(items) => {
            violations.extend(ledger_violations(items, Some(&supplied), &merged.tax));
        }
        None => {
            let stored: Vec<LineItemData> = stored_items.iter().map(|i| i.data.clone()).collect();
            let supplied = reconcile.then_some(&supplied);
            violations.extend(ledger_violations(&stored, supplied, &merged.tax));
        }
    }

    ValidationFailure::check(violations)?;

    Ok(UpdatePlan {
        renumbered: merged.number != existing.number,
        document: merged,
        items: patch.items.clone(),
    })
}

// =============================================================================
// Conversion
// =============================================================================

/// The invoice a quote converts into.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionPlan {
    pub invoice: NewDocument,
    pub source_quote_id: String,
}

/// Builds the invoice for converting `quote`.
///
/// Money fields and every line item are copied verbatim; the quote was
/// valid when stored, so nothing is re-derived. Fails when the quote was
/// already converted or was declined.
pub fn plan_conversion(quote: &Document, items: &[LineItem]) -> Result<ConversionPlan, TransitionError> {
    check_convertible(quote)?;

    let invoice = NewDocument {
        kind: DocumentKind::Invoice,
        number: quote.number.clone(),
        issue_date: quote.issue_date,
        due_date: quote.due_date,
        status: DocumentStatus::initial(DocumentKind::Invoice),
        sub_total: quote.sub_total,
        discount: quote.discount,
        total_tax: quote.total_tax,
        total: quote.total,
        notes: quote.notes.clone(),
        tax: quote.tax,
        client_id: quote.client_id.clone(),
        shipping_address_id: quote.shipping_address_id.clone(),
        seller_name: None,
        seller_address: None,
        items: items.iter().map(|i| i.data.clone()).collect(),
    };

    Ok(ConversionPlan {
        invoice,
        source_quote_id: quote.id.clone(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LedgerError, TotalsField};
    use crate::money::Money;
    use chrono::Utc;

    fn line(price: i64, quantity: u32, total: i64, taxable: i64) -> LineItemData {
        LineItemData {
            product_name: "Widget".to_string(),
            product_description: None,
            hsn_code: None,
            price: Money::from_cents(price),
            quantity,
            total_price: Money::from_cents(total),
            taxable_amount: Money::from_cents(taxable),
            product_id: None,
            tax_id: None,
        }
    }

    fn new_invoice(total: i64) -> NewDocument {
        NewDocument {
            kind: DocumentKind::Invoice,
            number: "INV-1".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2024, 4, 30),
            status: None,
            sub_total: Money::from_cents(1800),
            discount: Money::zero(),
            total_tax: Money::from_cents(200),
            total: Money::from_cents(total),
            notes: None,
            tax: TaxBreakdown::default(),
            client_id: Some("client-1".to_string()),
            shipping_address_id: Some("address-1".to_string()),
            seller_name: None,
            seller_address: None,
            items: vec![line(1000, 2, 2000, 200)],
        }
    }

    fn stored(new: &NewDocument, status: Option<DocumentStatus>) -> (Document, Vec<LineItem>) {
        let now = Utc::now();
        let doc = Document {
            id: "doc-1".to_string(),
            tenant_id: "tenant-1".to_string(),
            kind: new.kind,
            number: new.number.clone(),
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
            source_quote_id: None,
            created_at: now,
            updated_at: now,
        };
        let items = new
            .items
            .iter()
            .enumerate()
            .map(|(i, data)| LineItem {
                id: format!("item-{i}"),
                document_id: doc.id.clone(),
                position: i as i64,
                data: data.clone(),
            })
            .collect();
        (doc, items)
    }

    #[test]
    fn test_invoice_transitions() {
        let inv = |s| DocumentStatus::Invoice(s);
        let kind = DocumentKind::Invoice;
        assert!(check_transition(kind, inv(InvoiceStatus::Pending), inv(InvoiceStatus::PartiallyPaid)).is_ok());
        assert!(check_transition(kind, inv(InvoiceStatus::Pending), inv(InvoiceStatus::Paid)).is_ok());
        assert!(check_transition(kind, inv(InvoiceStatus::PartiallyPaid), inv(InvoiceStatus::Paid)).is_ok());
        assert!(check_transition(kind, inv(InvoiceStatus::Paid), inv(InvoiceStatus::Paid)).is_ok());
        assert!(matches!(
            check_transition(kind, inv(InvoiceStatus::Paid), inv(InvoiceStatus::Pending)),
            Err(TransitionError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_quote_transitions() {
        let q = |s| DocumentStatus::Quote(s);
        let kind = DocumentKind::Quote;
        assert!(check_transition(kind, q(QuoteStatus::Draft), q(QuoteStatus::Accepted)).is_ok());
        assert!(check_transition(kind, q(QuoteStatus::Accepted), q(QuoteStatus::Declined)).is_ok());
        assert!(check_transition(kind, q(QuoteStatus::Declined), q(QuoteStatus::Accepted)).is_err());
        assert_eq!(
            check_transition(kind, q(QuoteStatus::Accepted), q(QuoteStatus::ConvertedToInvoice)),
            Err(TransitionError::ConversionOnly)
        );
        assert!(matches!(
            check_transition(kind, q(QuoteStatus::Draft), DocumentStatus::Invoice(InvoiceStatus::Paid)),
            Err(TransitionError::StatusKindMismatch { .. })
        ));
    }

    #[test]
    fn test_create_balanced_invoice() {
        let status = plan_create(&new_invoice(2000)).unwrap();
        assert_eq!(status, Some(DocumentStatus::Invoice(InvoiceStatus::Pending)));
    }

    #[test]
    fn test_create_rejects_total_off_by_one_unit() {
        let failure = plan_create(&new_invoice(1900)).unwrap_err();
        assert_eq!(
            failure.first_ledger_error(),
            Some(&LedgerError::TotalsMismatch {
                field: TotalsField::Total,
                expected: Money::from_cents(2000),
                provided: Money::from_cents(1900),
            })
        );
    }

    #[test]
    fn test_create_rejects_converted_status() {
        let mut quote = new_invoice(2000);
        quote.kind = DocumentKind::Quote;
        quote.status = Some(DocumentStatus::Quote(QuoteStatus::ConvertedToInvoice));
        let failure = plan_create(&quote).unwrap_err();
        assert!(failure
            .violations()
            .contains(&Violation::Transition(TransitionError::ConversionOnly)));
    }

    #[test]
    fn test_create_collects_kind_specific_fields() {
        let mut purchase = new_invoice(2000);
        purchase.kind = DocumentKind::PurchaseInvoice;
        // client, shipping address and due date do not apply; seller is missing
        let failure = plan_create(&purchase).unwrap_err();
        assert_eq!(failure.violations().len(), 4);

        purchase.client_id = None;
        purchase.shipping_address_id = None;
        purchase.due_date = None;
        purchase.seller_name = Some("Acme Supplies".to_string());
        assert_eq!(plan_create(&purchase).unwrap(), None);
    }

    #[test]
    fn test_create_reports_item_paths() {
        let mut new = new_invoice(2000);
        new.items[0].product_name = String::new();
        let failure = plan_create(&new).unwrap_err();
        assert_eq!(failure.reasons(), vec!["items[0].productName is required"]);
    }

    #[test]
    fn test_update_aggregates_against_stored_items() {
        let (doc, items) = stored(&new_invoice(2000), DocumentStatus::initial(DocumentKind::Invoice));
        let patch = DocumentPatch {
            total: Some(Money::from_cents(1999)),
            ..Default::default()
        };
        let failure = plan_update(&doc, &items, &patch).unwrap_err();
        assert!(matches!(
            failure.first_ledger_error(),
            Some(LedgerError::TotalsMismatch { field: TotalsField::Total, .. })
        ));
    }

    #[test]
    fn test_update_items_with_partial_aggregates() {
        let (doc, items) = stored(&new_invoice(2000), DocumentStatus::initial(DocumentKind::Invoice));
        let patch = DocumentPatch {
            total_tax: Some(Money::from_cents(400)),
            items: Some(vec![line(1000, 4, 4000, 400)]),
            ..Default::default()
        };
        let plan = plan_update(&doc, &items, &patch).unwrap();
        assert_eq!(plan.items.as_ref().map(Vec::len), Some(1));
        assert_eq!(plan.document.total_tax, Money::from_cents(400));
        // omitted aggregates keep their stored values
        assert_eq!(plan.document.total, Money::from_cents(2000));
        assert!(!plan.renumbered);
    }

    #[test]
    fn test_update_zero_discount_is_applied() {
        let mut new = new_invoice(1900);
        new.discount = Money::from_cents(100);
        let (doc, items) = stored(&new, DocumentStatus::initial(DocumentKind::Invoice));
        let patch = DocumentPatch {
            discount: Some(Money::zero()),
            total: Some(Money::from_cents(2000)),
            ..Default::default()
        };
        let plan = plan_update(&doc, &items, &patch).unwrap();
        assert_eq!(plan.document.discount, Money::zero());
    }

    #[test]
    fn test_update_rejects_illegal_transition() {
        let (doc, items) = stored(
            &new_invoice(2000),
            Some(DocumentStatus::Invoice(InvoiceStatus::Paid)),
        );
        let patch = DocumentPatch {
            status: Some(DocumentStatus::Invoice(InvoiceStatus::Pending)),
            ..Default::default()
        };
        assert!(plan_update(&doc, &items, &patch).is_err());
    }

    #[test]
    fn test_update_detects_renumbering() {
        let (doc, items) = stored(&new_invoice(2000), DocumentStatus::initial(DocumentKind::Invoice));
        let patch = DocumentPatch {
            number: Some("INV-2".to_string()),
            ..Default::default()
        };
        assert!(plan_update(&doc, &items, &patch).unwrap().renumbered);
    }

    #[test]
    fn test_conversion_copies_verbatim() {
        let mut new = new_invoice(1900);
        new.kind = DocumentKind::Quote;
        new.discount = Money::from_cents(100);
        let (quote, items) = stored(&new, Some(DocumentStatus::Quote(QuoteStatus::Accepted)));

        let plan = plan_conversion(&quote, &items).unwrap();
        assert_eq!(plan.source_quote_id, "doc-1");
        assert_eq!(plan.invoice.kind, DocumentKind::Invoice);
        assert_eq!(plan.invoice.number, quote.number);
        assert_eq!(plan.invoice.status, Some(DocumentStatus::Invoice(InvoiceStatus::Pending)));
        assert_eq!(plan.invoice.sub_total, quote.sub_total);
        assert_eq!(plan.invoice.total_tax, quote.total_tax);
        assert_eq!(plan.invoice.discount, quote.discount);
        assert_eq!(plan.invoice.total, quote.total);
        assert_eq!(plan.invoice.items, vec![items[0].data.clone()]);
    }

    #[test]
    fn test_conversion_guards() {
        let mut new = new_invoice(2000);
        new.kind = DocumentKind::Quote;

        let (converted, items) = stored(&new, Some(DocumentStatus::Quote(QuoteStatus::ConvertedToInvoice)));
        assert_eq!(
            plan_conversion(&converted, &items).unwrap_err(),
            TransitionError::AlreadyConverted {
                quote_id: "doc-1".to_string()
            }
        );

        let (declined, items) = stored(&new, Some(DocumentStatus::Quote(QuoteStatus::Declined)));
        assert!(matches!(
            plan_conversion(&declined, &items),
            Err(TransitionError::NotConvertible { .. })
        ));
    }

    #[test]
    fn test_revalidating_stored_document_passes() {
        let (doc, items) = stored(&new_invoice(2000), DocumentStatus::initial(DocumentKind::Invoice));
        let patch = DocumentPatch {
            sub_total: Some(doc.sub_total),
            total_tax: Some(doc.total_tax),
            total: Some(doc.total),
            items: Some(items.iter().map(|i| i.data.clone()).collect()),
            ..Default::default()
        };
        assert!(plan_update(&doc, &items, &patch).is_ok());
    }
}
