//! # Validation Module
//!
//! Field-level input validation for Invoicer.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Wire conversion (crate::wire)                                │
//! │  ├── Major → minor units, percent → basis points                       │
//! │  └── Quantities must be whole numbers                                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Business rules                                               │
//! │  ├── THIS MODULE: required fields, lengths, ranges                     │
//! │  ├── crate::ledger: totals reconciliation                              │
//! │  └── crate::lifecycle: status transitions                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (tenant_id, kind, number)                                  │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use invoicer_core::validation::{validate_document_number, validate_search_query};
//!
//! assert!(validate_document_number("INV-2024-001").is_ok());
//! assert!(validate_document_number("  ").is_err());
//! assert_eq!(validate_search_query("  acme ").unwrap(), "acme");
//! ```

use crate::error::{ValidationError, Violation};
use crate::ledger::tax_breakdown_mismatches;
use crate::money::Money;
use crate::types::{AddressData, Client, NewClient, NewProduct, TaxBreakdown, TaxRate};
use crate::{MAX_LINE_ITEMS, MAX_NAME_LEN, MAX_NOTES_LEN, MAX_NUMBER_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a non-empty string of bounded length.
pub fn validate_required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional string of bounded length. Empty is allowed.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

/// Validates a document number.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
pub fn validate_document_number(number: &str) -> ValidationResult<()> {
    validate_required_text("number", number, MAX_NUMBER_LEN)
}

/// Validates a product or line-item name.
///
/// ```rust
/// use invoicer_core::validation::validate_product_name;
///
/// assert!(validate_product_name("productName", "Consulting (hourly)").is_ok());
/// assert!(validate_product_name("productName", "").is_err());
/// ```
pub fn validate_product_name(field: &str, name: &str) -> ValidationResult<()> {
    validate_required_text(field, name, MAX_NAME_LEN)
}

/// Validates free-text notes.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    validate_optional_text("notes", notes, MAX_NOTES_LEN)
}

/// Validates a search query.
///
/// ## Rules
/// - Can be empty (no filtering)
/// - Maximum 100 characters
///
/// ## Returns
/// The trimmed query string.
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > 100 {
        return Err(ValidationError::TooLong {
            field: "search".to_string(),
            max: 100,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity sent as a JSON number.
///
/// ## Rules
/// - Must be a whole number
/// - Must be between 0 and `u32::MAX`
pub fn validate_quantity(field: &str, qty: f64) -> ValidationResult<u32> {
    if !qty.is_finite() || qty.fract() != 0.0 {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must be a whole number".to_string(),
        });
    }

    if qty < 0.0 || qty > f64::from(u32::MAX) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::from(u32::MAX),
        });
    }

    Ok(qty as u32)
}

/// Validates that an amount is not negative.
///
/// Prices, line totals and taxable amounts are never negative; only
/// discounts act as signed adjustments.
///
/// ```rust
/// use invoicer_core::money::Money;
/// use invoicer_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("price", Money::from_cents(0)).is_ok());
/// assert!(validate_non_negative("price", Money::from_cents(-100)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_tax_rate(field: &str, rate: TaxRate) -> ValidationResult<()> {
    if rate.bps() > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the number of line items on one document.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count > MAX_LINE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 0,
            max: MAX_LINE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
///
/// ```rust
/// use invoicer_core::validation::validate_uuid;
///
/// assert!(validate_uuid("productId", "550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("productId", "not-a-uuid").is_err());
/// ```
pub fn validate_uuid(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Contact Validators
// =============================================================================

/// Validates an email address.
///
/// ## Rules
/// - Exactly one `@` with a non-empty name before it
/// - A domain of at least two non-empty labels (`example.com`)
/// - No whitespace
pub fn validate_email(field: &str, email: &str) -> ValidationResult<()> {
    validate_required_text(field, email, MAX_NAME_LEN)?;

    let invalid = |reason: &str| ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: reason.to_string(),
    };

    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return Err(invalid("must not contain spaces"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid("missing @"));
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid("expected a name, one @ and a domain"));
    }
    if domain.split('.').count() < 2 || domain.split('.').any(str::is_empty) {
        return Err(invalid("domain must look like example.com"));
    }
    Ok(())
}

/// Exactly `len` characters, each accepted by `allowed`.
fn validate_code(
    field: &str,
    value: &str,
    len: usize,
    allowed: fn(&char) -> bool,
    what: &str,
) -> ValidationResult<()> {
    let value = value.trim();
    if value.chars().count() != len || !value.chars().all(|c| allowed(&c)) {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("must be {len} {what}"),
        });
    }
    Ok(())
}

/// A 10-digit phone number.
pub fn validate_phone_number(field: &str, phone: &str) -> ValidationResult<()> {
    validate_code(field, phone, 10, char::is_ascii_digit, "digits")
}

/// A 10-character PAN.
pub fn validate_pan(field: &str, pan: &str) -> ValidationResult<()> {
    validate_code(field, pan, 10, char::is_ascii_alphanumeric, "letters or digits")
}

/// A 15-character GSTIN.
pub fn validate_gstin(field: &str, gstin: &str) -> ValidationResult<()> {
    validate_code(field, gstin, 15, char::is_ascii_alphanumeric, "letters or digits")
}

// =============================================================================
// Record Validators
// =============================================================================

fn collect(violations: &mut Vec<Violation>, result: ValidationResult<()>) {
    if let Err(e) = result {
        violations.push(e.into());
    }
}

/// Every rule a tax record breaks: name, text lengths, rate ranges and the
/// GST breakdown. Used on create and on the merged record of an update.
pub fn tax_violations(
    name: &str,
    hsn_sac_code: Option<&str>,
    description: Option<&str>,
    rates: &TaxBreakdown,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    collect(&mut violations, validate_required_text("name", name, MAX_NAME_LEN));
    collect(&mut violations, validate_optional_text("hsnSacCode", hsn_sac_code, MAX_NAME_LEN));
    collect(&mut violations, validate_optional_text("description", description, MAX_NOTES_LEN));

    let named = [("gst", rates.gst), ("cgst", rates.cgst), ("sgst", rates.sgst), ("igst", rates.igst)];
    for (field, rate) in named {
        if let Some(rate) = rate {
            collect(&mut violations, validate_tax_rate(field, rate));
        }
    }

    violations.extend(tax_breakdown_mismatches(rates).into_iter().map(Violation::from));
    violations
}

/// Every rule a new product breaks. The tax reference is only checked for
/// shape here; ownership is a storage concern.
pub fn product_violations(product: &NewProduct) -> Vec<Violation> {
    let mut violations = Vec::new();
    collect(&mut violations, validate_product_name("productName", &product.name));
    collect(
        &mut violations,
        validate_optional_text("productDescription", product.description.as_deref(), MAX_NOTES_LEN),
    );
    collect(&mut violations, validate_optional_text("hsnCode", product.hsn_code.as_deref(), MAX_NAME_LEN));
    collect(&mut violations, validate_non_negative("price", product.price));
    if let Some(tax_id) = &product.tax_id {
        collect(&mut violations, validate_uuid("taxId", tax_id));
    }
    violations
}

fn client_field_violations(
    first_name: &str,
    last_name: &str,
    email: &str,
    phone_no: &str,
    pan_no: Option<&str>,
    company_name: Option<&str>,
    gstin: Option<&str>,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    collect(&mut violations, validate_required_text("firstName", first_name, MAX_NAME_LEN));
    collect(&mut violations, validate_required_text("lastName", last_name, MAX_NAME_LEN));
    collect(&mut violations, validate_email("email", email));
    collect(&mut violations, validate_phone_number("phoneNo", phone_no));
    if let Some(pan) = pan_no {
        collect(&mut violations, validate_pan("panNo", pan));
    }
    collect(&mut violations, validate_optional_text("companyName", company_name, MAX_NAME_LEN));
    if let Some(gstin) = gstin {
        collect(&mut violations, validate_gstin("clientGstinNumber", gstin));
    }
    violations
}

/// Every rule a new client or one of its addresses breaks.
pub fn new_client_violations(client: &NewClient) -> Vec<Violation> {
    let mut violations = client_field_violations(
        &client.first_name,
        &client.last_name,
        &client.email,
        &client.phone_no,
        client.pan_no.as_deref(),
        client.company_name.as_deref(),
        client.gstin.as_deref(),
    );
    for (i, address) in client.addresses.iter().enumerate() {
        violations.extend(address_violations(&format!("addresses[{i}]"), address));
    }
    violations
}

/// Every rule a stored client breaks, checked on the merged record of an
/// update.
pub fn client_violations(client: &Client) -> Vec<Violation> {
    client_field_violations(
        &client.first_name,
        &client.last_name,
        &client.email,
        &client.phone_no,
        client.pan_no.as_deref(),
        client.company_name.as_deref(),
        client.gstin.as_deref(),
    )
}

/// Every required postal field that is missing. `prefix` qualifies field
/// names for nested addresses (`addresses[1].city`).
pub fn address_violations(prefix: &str, address: &AddressData) -> Vec<Violation> {
    let name = |field: &str| {
        if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        }
    };

    let mut violations = Vec::new();
    collect(&mut violations, validate_required_text(&name("street"), &address.street, MAX_NOTES_LEN));
    collect(&mut violations, validate_required_text(&name("city"), &address.city, MAX_NAME_LEN));
    collect(&mut violations, validate_required_text(&name("state"), &address.state, MAX_NAME_LEN));
    collect(&mut violations, validate_required_text(&name("country"), &address.country, MAX_NAME_LEN));
    collect(&mut violations, validate_required_text(&name("postCode"), &address.post_code, MAX_NAME_LEN));
    violations
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tax_violations_collects_everything() {
        let rates = TaxBreakdown {
            gst: Some(TaxRate::from_bps(1800)),
            cgst: Some(TaxRate::from_bps(900)),
            sgst: Some(TaxRate::from_bps(800)),
            igst: None,
        };
        let violations = tax_violations("", None, None, &rates);
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].to_string(), "name is required");

        let valid = TaxBreakdown {
            sgst: Some(TaxRate::from_bps(900)),
            ..rates
        };
        assert!(tax_violations("GST 18%", Some("9983"), None, &valid).is_empty());
    }

    #[test]
    fn test_tax_violations_rate_range() {
        let rates = TaxBreakdown {
            gst: Some(TaxRate::from_bps(12_000)),
            ..Default::default()
        };
        assert_eq!(tax_violations("Luxury", None, None, &rates).len(), 1);
    }

    #[test]
    fn test_product_violations() {
        let product = NewProduct {
            name: "Widget".to_string(),
            description: None,
            hsn_code: None,
            price: Money::from_cents(-1),
            tax_id: Some("nope".to_string()),
        };
        assert_eq!(product_violations(&product).len(), 2);

        let fixed = NewProduct {
            price: Money::from_cents(1250),
            tax_id: None,
            ..product
        };
        assert!(product_violations(&fixed).is_empty());
    }

    #[test]
    fn test_validate_document_number() {
        assert!(validate_document_number("INV-001").is_ok());
        assert!(validate_document_number("").is_err());
        assert!(validate_document_number("   ").is_err());
        assert!(validate_document_number(&"9".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("productName", "Widget").is_ok());
        assert_eq!(
            validate_product_name("items[2].productName", "").unwrap_err(),
            ValidationError::Required {
                field: "items[2].productName".to_string()
            }
        );
        assert!(validate_product_name("productName", &"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_notes() {
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some("")).is_ok());
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LEN + 1))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert_eq!(validate_quantity("quantity", 0.0).unwrap(), 0);
        assert_eq!(validate_quantity("quantity", 12.0).unwrap(), 12);
        assert!(validate_quantity("quantity", 1.5).is_err());
        assert!(validate_quantity("quantity", -1.0).is_err());
        assert!(validate_quantity("quantity", f64::NAN).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative("price", Money::from_cents(1099)).is_ok());
        assert!(validate_non_negative("price", Money::from_cents(-1)).is_err());
    }

    #[test]
    fn test_validate_tax_rate() {
        assert!(validate_tax_rate("gst", TaxRate::from_bps(0)).is_ok());
        assert!(validate_tax_rate("gst", TaxRate::from_bps(2800)).is_ok());
        assert!(validate_tax_rate("gst", TaxRate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "").is_err());
        assert!(validate_uuid("id", "123").is_err());
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(0).is_ok());
        assert!(validate_item_count(MAX_LINE_ITEMS).is_ok());
        assert!(validate_item_count(MAX_LINE_ITEMS + 1).is_err());
    }

    fn address() -> AddressData {
        AddressData {
            street: "12 MG Road".to_string(),
            city: "Pune".to_string(),
            state: "MH".to_string(),
            country: "India".to_string(),
            post_code: "411001".to_string(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("email", "asha@example.com").is_ok());
        assert!(validate_email("email", " asha@mail.example.in ").is_ok());
        assert!(validate_email("email", "").is_err());
        assert!(validate_email("email", "asha.example.com").is_err());
        assert!(validate_email("email", "@example.com").is_err());
        assert!(validate_email("email", "asha@example").is_err());
        assert!(validate_email("email", "asha@@example.com").is_err());
        assert!(validate_email("email", "asha rao@example.com").is_err());
    }

    #[test]
    fn test_contact_codes() {
        assert!(validate_phone_number("phoneNo", "9876543210").is_ok());
        assert!(validate_phone_number("phoneNo", "98765").is_err());
        assert!(validate_phone_number("phoneNo", "98765432ab").is_err());
        assert!(validate_pan("panNo", "ABCDE1234F").is_ok());
        assert!(validate_pan("panNo", "ABCDE1234").is_err());
        assert!(validate_gstin("clientGstinNumber", "27ABCDE1234F1Z5").is_ok());
        assert!(validate_gstin("clientGstinNumber", "27ABCDE1234F1Z").is_err());
    }

    #[test]
    fn test_new_client_violations() {
        let client = NewClient {
            first_name: "Asha".to_string(),
            last_name: String::new(),
            email: "asha@example.com".to_string(),
            phone_no: "12345".to_string(),
            pan_no: None,
            company_name: None,
            gstin: None,
            addresses: vec![address(), AddressData { city: String::new(), ..address() }],
        };
        let reasons: Vec<String> = new_client_violations(&client).iter().map(|v| v.to_string()).collect();
        assert_eq!(reasons.len(), 3);
        assert_eq!(reasons[0], "lastName is required");
        assert!(reasons[1].starts_with("phoneNo"));
        assert_eq!(reasons[2], "addresses[1].city is required");
    }

    #[test]
    fn test_address_violations() {
        assert!(address_violations("", &address()).is_empty());
        let blank = AddressData {
            post_code: "  ".to_string(),
            ..address()
        };
        assert_eq!(address_violations("", &blank)[0].to_string(), "postCode is required");
    }
}
