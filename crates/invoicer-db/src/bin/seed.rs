//! # Seed Data Generator
//!
//! Populates a tenant with demo data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default tenant into ./invoicer_dev.db
//! cargo run -p invoicer-db --bin seed
//!
//! # Specify database path and tenant
//! cargo run -p invoicer-db --bin seed -- --db ./data/invoicer.db --tenant acme
//! ```
//!
//! Without `--db`, the `INVOICER_DB_*` environment variables are honoured.
//!
//! ## Generated Data
//! - Two taxes: GST 18% (CGST 9% + SGST 9%) and IGST 5%
//! - Two products, one per tax
//! - A client with one shipping address
//! - A quote for both products, accepted and then converted to an invoice
//!
//! Requests go through the same JSON DTOs an HTTP handler would use, so
//! amounts below are in major units.

use invoicer_core::wire::{
    CreateClientRequest, CreateDocumentRequest, CreateProductRequest, CreateTaxRequest,
    DashboardView, DocumentView, UpdateDocumentRequest,
};
use invoicer_core::DocumentKind;
use invoicer_db::pool::ENV_DB_PATH;
use invoicer_db::{Database, DbConfig};
use serde_json::json;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_DB_PATH: &str = "./invoicer_dev.db";
const DEFAULT_TENANT: &str = "demo-tenant";

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,invoicer=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path: Option<String> = None;
    let mut tenant = String::from(DEFAULT_TENANT);

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--tenant" | "-t" => {
                if i + 1 < args.len() {
                    tenant = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Invoicer Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>      Database file path (default: {DEFAULT_DB_PATH})");
                println!("  -t, --tenant <ID>    Tenant to seed (default: {DEFAULT_TENANT})");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    init_tracing();

    let config = match db_path {
        Some(path) => DbConfig::new(path),
        None if env::var_os(ENV_DB_PATH).is_some() => DbConfig::from_env()?,
        None => DbConfig::new(DEFAULT_DB_PATH),
    };

    println!("🌱 Invoicer Seed Data Generator");
    println!("===============================");
    println!("Database: {}", config.database_path.display());
    println!("Tenant:   {}", tenant);
    println!();

    let db = Database::new(config).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.documents().dashboard(&tenant).await?;
    if existing.invoices + existing.quotes + existing.purchase_invoices > 0 {
        println!("⚠ Tenant already has documents");
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file or pick another --tenant to regenerate.");
        return Ok(());
    }

    // Taxes
    let gst18: CreateTaxRequest = serde_json::from_value(json!({
        "name": "GST 18%",
        "hsnSacCode": "998314",
        "gst": 18, "cgst": 9, "sgst": 9
    }))?;
    let gst18 = db.taxes().create(&tenant, gst18.into_new_tax()?).await?;

    let igst5: CreateTaxRequest = serde_json::from_value(json!({
        "name": "IGST 5%",
        "gst": 5, "igst": 5
    }))?;
    let igst5 = db.taxes().create(&tenant, igst5.into_new_tax()?).await?;
    println!("✓ Created 2 taxes");

    // Products
    let consulting: CreateProductRequest = serde_json::from_value(json!({
        "productName": "Consulting hour",
        "hsnCode": "998314",
        "price": 1500.00,
        "taxId": gst18.id
    }))?;
    let consulting = db.products().create(&tenant, consulting.into_new_product()?).await?;

    let stand: CreateProductRequest = serde_json::from_value(json!({
        "productName": "Laptop stand",
        "productDescription": "Aluminium, adjustable",
        "hsnCode": "8473",
        "price": 45.50,
        "taxId": igst5.id
    }))?;
    let stand = db.products().create(&tenant, stand.into_new_product()?).await?;
    println!("✓ Created 2 products");

    // Client
    let client: CreateClientRequest = serde_json::from_value(json!({
        "firstName": "Asha",
        "lastName": "Rao",
        "email": "asha.rao@example.com",
        "phoneNo": "9876543210",
        "companyName": "Rao Traders",
        "clientGstinNumber": "27ABCDE1234F1Z5",
        "addresses": [
            {
                "street": "12 MG Road, Camp",
                "city": "Pune",
                "state": "Maharashtra",
                "country": "India",
                "postCode": "411001"
            }
        ]
    }))?;
    let client = db.clients().create(&tenant, client.into_new_client()).await?;
    let address = db
        .addresses()
        .list_for_client(&tenant, &client.id)
        .await?
        .into_iter()
        .next()
        .ok_or("client was created without its address")?;
    println!("✓ Created client {}", client.display_name());

    // Quote: tax is included in each line's total
    //   6000.00 incl. 915.25 tax  +  91.00 incl. 4.33 tax
    let quote: CreateDocumentRequest = serde_json::from_value(json!({
        "quoteNumber": "Q-0001",
        "quoteDate": "2024-04-01",
        "quoteDueDate": "2024-04-30",
        "clientId": client.id,
        "shippingAddressId": address.id,
        "subTotal": 5171.42,
        "totalTax": 919.58,
        "total": 6091.00,
        "gst": 18, "cgst": 9, "sgst": 9,
        "quoteItems": [
            {
                "productName": consulting.name,
                "hsnCode": consulting.hsn_code,
                "price": 1500.00,
                "quantity": 4,
                "totalPrice": 6000.00,
                "taxableAmount": 915.25,
                "productId": consulting.id,
                "taxId": gst18.id
            },
            {
                "productName": stand.name,
                "productDescription": stand.description,
                "hsnCode": stand.hsn_code,
                "price": 45.50,
                "quantity": 2,
                "totalPrice": 91.00,
                "taxableAmount": 4.33,
                "productId": stand.id,
                "taxId": igst5.id
            }
        ]
    }))?;
    let quote = db
        .documents()
        .create(&tenant, quote.into_new_document(DocumentKind::Quote)?)
        .await?;
    println!("✓ Created quote {}", quote.document.number);

    let accept: UpdateDocumentRequest = serde_json::from_value(json!({ "status": "ACCEPTED" }))?;
    db.documents()
        .update(
            &tenant,
            DocumentKind::Quote,
            &quote.document.id,
            accept.into_patch(DocumentKind::Quote)?,
        )
        .await?;
    println!("✓ Accepted quote {}", quote.document.number);

    let invoice = db
        .documents()
        .convert_quote_to_invoice(&tenant, &quote.document.id)
        .await?;
    info!(invoice_id = %invoice.document.id, "Seed invoice created");
    println!("✓ Converted to invoice {}", invoice.document.number);

    println!();
    println!("Invoice:");
    println!("{}", serde_json::to_string_pretty(&DocumentView::from(&invoice))?);

    let dashboard = db.documents().dashboard(&tenant).await?;
    println!();
    println!("Dashboard:");
    println!("{}", serde_json::to_string_pretty(&DashboardView::from(&dashboard))?);

    println!();
    println!("✓ Seed complete!");

    db.close().await;
    Ok(())
}
