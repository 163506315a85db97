//! # Money Ledger
//!
//! Reconciliation rules tying a document's aggregates to its line items.
//!
//! ## Invariants
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Per line:      total_price == price * quantity                         │
//! │                                                                         │
//! │  Per document:  sub_total   == Σ (total_price - taxable_amount)         │
//! │                 total_tax   == Σ taxable_amount                         │
//! │                 total       == sub_total + total_tax - discount         │
//! │                                                                         │
//! │  Tax breakdown: cgst + sgst == gst   (when all three are present)       │
//! │                 igst        == gst   (when both are present)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every comparison is strict equality on integer cents. An off-by-one-cent
//! client computation is rejected, never corrected.

use crate::document::LineItemData;
use crate::error::{ArithmeticError, LedgerError, TaxComponent, TotalsField, Violation};
use crate::money::Money;
use crate::types::TaxBreakdown;

/// Result type for ledger checks.
pub type LedgerResult<T> = Result<T, LedgerError>;

// =============================================================================
// Line Items
// =============================================================================

/// Checks `total_price == price * quantity` for one line.
///
/// ```rust
/// use invoicer_core::document::LineItemData;
/// use invoicer_core::ledger::validate_line_item;
/// use invoicer_core::money::Money;
///
/// let item = LineItemData {
///     product_name: "Widget".into(),
///     product_description: None,
///     hsn_code: None,
///     price: Money::from_cents(1000),
///     quantity: 2,
///     total_price: Money::from_cents(2000),
///     taxable_amount: Money::from_cents(200),
///     product_id: None,
///     tax_id: None,
/// };
/// assert!(validate_line_item(&item).is_ok());
/// ```
pub fn validate_line_item(item: &LineItemData) -> LedgerResult<()> {
    let expected = item.price.multiply_quantity(item.quantity)?;
    if expected != item.total_price {
        return Err(LedgerError::LineItemMismatch {
            product_name: item.product_name.clone(),
            expected,
            provided: item.total_price,
        });
    }
    Ok(())
}

// =============================================================================
// Document Totals
// =============================================================================

/// Aggregates recomputed from line items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemTotals {
    pub sub_total: Money,
    pub total_tax: Money,
}

impl ItemTotals {
    /// `sub_total + total_tax - discount`.
    pub fn total(&self, discount: Money) -> Result<Money, ArithmeticError> {
        self.sub_total
            .checked_add(self.total_tax, "total")?
            .checked_sub(discount, "total")
    }
}

/// Sums the line items with overflow checks.
pub fn compute_totals(items: &[LineItemData]) -> Result<ItemTotals, ArithmeticError> {
    let mut sub_total = Money::zero();
    let mut total_tax = Money::zero();
    for item in items {
        let net = item.total_price.checked_sub(item.taxable_amount, "subTotal")?;
        sub_total = sub_total.checked_add(net, "subTotal")?;
        total_tax = total_tax.checked_add(item.taxable_amount, "totalTax")?;
    }
    Ok(ItemTotals {
        sub_total,
        total_tax,
    })
}

/// The aggregates a request carried.
///
/// `None` means the caller did not send the field, so it is not compared.
/// Discount always has a value: the request's, the stored one, or zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuppliedTotals {
    pub sub_total: Option<Money>,
    pub total_tax: Option<Money>,
    pub total: Option<Money>,
    pub discount: Money,
}

impl SuppliedTotals {
    /// All three aggregates present, as on create.
    pub fn complete(sub_total: Money, total_tax: Money, total: Money, discount: Money) -> Self {
        SuppliedTotals {
            sub_total: Some(sub_total),
            total_tax: Some(total_tax),
            total: Some(total),
            discount,
        }
    }
}

/// Every totals mismatch, in `subTotal`, `totalTax`, `total` order.
pub fn totals_mismatches(supplied: &SuppliedTotals, items: &[LineItemData]) -> Vec<LedgerError> {
    let computed = match compute_totals(items) {
        Ok(computed) => computed,
        Err(e) => return vec![e.into()],
    };

    let mut errors = Vec::new();
    push_mismatch(&mut errors, TotalsField::SubTotal, supplied.sub_total, computed.sub_total);
    push_mismatch(&mut errors, TotalsField::TotalTax, supplied.total_tax, computed.total_tax);

    if supplied.total.is_some() {
        match computed.total(supplied.discount) {
            Ok(expected) => push_mismatch(&mut errors, TotalsField::Total, supplied.total, expected),
            Err(e) => errors.push(e.into()),
        }
    }

    errors
}

fn push_mismatch(
    errors: &mut Vec<LedgerError>,
    field: TotalsField,
    provided: Option<Money>,
    expected: Money,
) {
    if let Some(provided) = provided {
        if provided != expected {
            errors.push(LedgerError::TotalsMismatch {
                field,
                expected,
                provided,
            });
        }
    }
}

/// Recomputes the aggregates from `items` and compares the supplied ones.
///
/// Reports the first disagreement.
///
/// ```rust
/// use invoicer_core::error::{LedgerError, TotalsField};
/// use invoicer_core::ledger::{validate_document_totals, SuppliedTotals};
/// use invoicer_core::money::Money;
///
/// let supplied = SuppliedTotals {
///     total: Some(Money::from_cents(1900)),
///     ..Default::default()
/// };
/// // No items: everything sums to zero
/// let err = validate_document_totals(&supplied, &[]).unwrap_err();
/// assert!(matches!(err, LedgerError::TotalsMismatch { field: TotalsField::Total, .. }));
/// ```
pub fn validate_document_totals(supplied: &SuppliedTotals, items: &[LineItemData]) -> LedgerResult<()> {
    match totals_mismatches(supplied, items).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// =============================================================================
// Tax Breakdown
// =============================================================================

/// Every breakdown inconsistency in `rates`.
pub fn tax_breakdown_mismatches(rates: &TaxBreakdown) -> Vec<LedgerError> {
    let mut errors = Vec::new();

    if let (Some(gst), Some(cgst), Some(sgst)) = (rates.gst, rates.cgst, rates.sgst) {
        let split = cgst.bps().saturating_add(sgst.bps());
        if split != gst.bps() {
            errors.push(LedgerError::TaxBreakdownMismatch {
                component: TaxComponent::CgstPlusSgst,
                expected: gst.bps(),
                provided: split,
            });
        }
    }

    if let (Some(gst), Some(igst)) = (rates.gst, rates.igst) {
        if igst != gst {
            errors.push(LedgerError::TaxBreakdownMismatch {
                component: TaxComponent::Igst,
                expected: gst.bps(),
                provided: igst.bps(),
            });
        }
    }

    errors
}

/// Checks the GST breakdown, reporting the first inconsistency.
pub fn validate_tax_breakdown(rates: &TaxBreakdown) -> LedgerResult<()> {
    match tax_breakdown_mismatches(rates).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

// =============================================================================
// Whole Document
// =============================================================================

/// Runs every ledger rule and collects all violations.
///
/// `supplied` is `None` when the request carried neither aggregates nor
/// items, in which case totals are not reconciled.
pub fn ledger_violations(
    items: &[LineItemData],
    supplied: Option<&SuppliedTotals>,
    rates: &TaxBreakdown,
) -> Vec<Violation> {
    let mut violations: Vec<Violation> = items
        .iter()
        .filter_map(|item| validate_line_item(item).err())
        .map(Violation::from)
        .collect();

    if let Some(supplied) = supplied {
        violations.extend(totals_mismatches(supplied, items).into_iter().map(Violation::from));
    }

    violations.extend(tax_breakdown_mismatches(rates).into_iter().map(Violation::from));
    violations
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TaxRate;
    use proptest::prelude::*;

    fn item(price: i64, quantity: u32, total_price: i64, taxable: i64) -> LineItemData {
        LineItemData {
            product_name: "Widget".to_string(),
            product_description: None,
            hsn_code: None,
            price: Money::from_cents(price),
            quantity,
            total_price: Money::from_cents(total_price),
            taxable_amount: Money::from_cents(taxable),
            product_id: None,
            tax_id: None,
        }
    }

    #[test]
    fn test_line_item_ok() {
        assert!(validate_line_item(&item(1000, 2, 2000, 200)).is_ok());
        assert!(validate_line_item(&item(1000, 0, 0, 0)).is_ok());
    }

    #[test]
    fn test_line_item_mismatch() {
        let err = validate_line_item(&item(1000, 2, 1999, 200)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::LineItemMismatch {
                product_name: "Widget".to_string(),
                expected: Money::from_cents(2000),
                provided: Money::from_cents(1999),
            }
        );
    }

    #[test]
    fn test_line_item_overflow_is_arithmetic() {
        let err = validate_line_item(&item(i64::MAX, 2, 0, 0)).unwrap_err();
        assert!(matches!(err, LedgerError::Arithmetic(ArithmeticError::Overflow { .. })));
    }

    #[test]
    fn test_document_totals_balanced() {
        let items = vec![item(1000, 2, 2000, 200)];
        let supplied = SuppliedTotals::complete(
            Money::from_cents(1800),
            Money::from_cents(200),
            Money::from_cents(2000),
            Money::zero(),
        );
        assert!(validate_document_totals(&supplied, &items).is_ok());
    }

    #[test]
    fn test_document_total_off_by_one_unit() {
        let items = vec![item(1000, 2, 2000, 200)];
        let supplied = SuppliedTotals::complete(
            Money::from_cents(1800),
            Money::from_cents(200),
            Money::from_cents(1900),
            Money::zero(),
        );
        assert_eq!(
            validate_document_totals(&supplied, &items).unwrap_err(),
            LedgerError::TotalsMismatch {
                field: TotalsField::Total,
                expected: Money::from_cents(2000),
                provided: Money::from_cents(1900),
            }
        );
    }

    #[test]
    fn test_discount_reduces_total() {
        let items = vec![item(1000, 2, 2000, 200), item(550, 1, 550, 50)];
        let supplied = SuppliedTotals::complete(
            Money::from_cents(2300),
            Money::from_cents(250),
            Money::from_cents(2450),
            Money::from_cents(100),
        );
        assert!(validate_document_totals(&supplied, &items).is_ok());
    }

    #[test]
    fn test_only_supplied_fields_compared() {
        let items = vec![item(1000, 2, 2000, 200)];
        let supplied = SuppliedTotals {
            total_tax: Some(Money::from_cents(200)),
            ..Default::default()
        };
        assert!(validate_document_totals(&supplied, &items).is_ok());
    }

    #[test]
    fn test_mismatches_reported_in_field_order() {
        let items = vec![item(1000, 2, 2000, 200)];
        let supplied = SuppliedTotals::complete(
            Money::from_cents(1),
            Money::from_cents(2),
            Money::from_cents(3),
            Money::zero(),
        );
        let fields: Vec<TotalsField> = totals_mismatches(&supplied, &items)
            .into_iter()
            .filter_map(|e| match e {
                LedgerError::TotalsMismatch { field, .. } => Some(field),
                _ => None,
            })
            .collect();
        assert_eq!(
            fields,
            vec![TotalsField::SubTotal, TotalsField::TotalTax, TotalsField::Total]
        );
    }

    #[test]
    fn test_tax_breakdown() {
        let ok = TaxBreakdown {
            gst: Some(TaxRate::from_bps(1800)),
            cgst: Some(TaxRate::from_bps(900)),
            sgst: Some(TaxRate::from_bps(900)),
            igst: Some(TaxRate::from_bps(1800)),
        };
        assert!(validate_tax_breakdown(&ok).is_ok());

        let partial = TaxBreakdown {
            gst: Some(TaxRate::from_bps(1800)),
            cgst: Some(TaxRate::from_bps(500)),
            ..Default::default()
        };
        assert!(validate_tax_breakdown(&partial).is_ok());

        let bad = TaxBreakdown {
            cgst: Some(TaxRate::from_bps(900)),
            sgst: Some(TaxRate::from_bps(800)),
            ..ok
        };
        assert!(matches!(
            validate_tax_breakdown(&bad),
            Err(LedgerError::TaxBreakdownMismatch {
                component: TaxComponent::CgstPlusSgst,
                expected: 1800,
                provided: 1700,
            })
        ));
    }

    #[test]
    fn test_ledger_violations_collects_everything() {
        let items = vec![item(1000, 2, 1999, 200), item(100, 1, 101, 0)];
        let supplied = SuppliedTotals::complete(
            Money::zero(),
            Money::zero(),
            Money::zero(),
            Money::zero(),
        );
        let rates = TaxBreakdown {
            gst: Some(TaxRate::from_bps(1800)),
            igst: Some(TaxRate::from_bps(1200)),
            ..Default::default()
        };
        // two lines, three totals, one tax component
        assert_eq!(ledger_violations(&items, Some(&supplied), &rates).len(), 6);
        assert_eq!(ledger_violations(&items, None, &TaxBreakdown::default()).len(), 2);
    }

    fn arb_item() -> impl Strategy<Value = LineItemData> {
        (0i64..1_000_000, 0u32..1_000, 0i64..100).prop_map(|(price, qty, tax_pct)| {
            let total = price * i64::from(qty);
            item(price, qty, total, total * tax_pct / 100)
        })
    }

    proptest! {
        /// Totals computed from valid items always reconcile.
        #[test]
        fn prop_computed_totals_reconcile(
            items in prop::collection::vec(arb_item(), 0..20),
            discount in 0i64..10_000,
        ) {
            let computed = compute_totals(&items).unwrap();
            let discount = Money::from_cents(discount);
            let supplied = SuppliedTotals::complete(
                computed.sub_total,
                computed.total_tax,
                computed.total(discount).unwrap(),
                discount,
            );
            prop_assert!(ledger_violations(&items, Some(&supplied), &TaxBreakdown::default()).is_empty());
        }

        /// A line is rejected exactly when its total is not price x quantity.
        #[test]
        fn prop_line_item_rejects_iff_mismatch(
            price in 0i64..1_000_000,
            qty in 0u32..1_000,
            total in 0i64..1_000_000_000,
        ) {
            let line = item(price, qty, total, 0);
            prop_assert_eq!(validate_line_item(&line).is_ok(), total == price * i64::from(qty));
        }
    }
}
