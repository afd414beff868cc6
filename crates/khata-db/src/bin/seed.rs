//! # Seed Data Generator
//!
//! Populates the database with realistic shop data for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default dev database
//! cargo run -p khata-db --bin seed
//!
//! # Specify database path
//! cargo run -p khata-db --bin seed -- --db ./data/khata.db
//! ```
//!
//! ## Generated Data
//! - Dealers (Pakistani cloth brands) with bills and part-payments
//! - Stock items attached to those bills
//! - Customers with cash and credit sales
//! - An admin account (admin@shop.pk / changeme123) and a sales-floor
//!   account with a limited permission set

use std::env;

use khata_db::repository::dealer::NewStockItem;
use khata_db::repository::sale::{NewSale, NewSaleLine};
use khata_db::{Database, DbConfig};
use khata_core::{Money, PaymentMethod, Permission, SaleType};

/// Dealer name, bill number, and the goods the opening bill brought in:
/// (brand, description, quantity, cost rupees).
const DEALERS: &[(&str, &str, &[(&str, &str, i64, i64)])] = &[
    (
        "Sana Safinaz",
        "BN-501",
        &[
            ("Sana Safinaz", "Luxury Lawn Suit", 20, 5000),
            ("Sana Safinaz", "Embroidered Unstitched", 10, 5000),
        ],
    ),
    (
        "Khaadi",
        "BN-502",
        &[
            ("Khaadi", "Lawn 3pc", 50, 2000),
            ("Khaadi", "Kurta Fabric", 40, 1200),
        ],
    ),
    (
        "Sapphire",
        "BN-503",
        &[("Sapphire", "Silk Dupatta", 30, 1000)],
    ),
    ("Gul Ahmed", "BN-504", &[("Gul Ahmed", "Chunri Lawn", 25, 1800)]),
];

/// Customer name and contact for sample sales.
const CUSTOMERS: &[(&str, &str)] = &[
    ("Ali Khan", "0300-1234567"),
    ("Zainab Bibi", "0321-7654321"),
    ("Usman Tariq", ""),
];

const PRINCIPALS: &[&str] = &["Faisal Rehman", "Hafiz Abdul Rasheed"];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./khata_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Dukaan Khata Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./khata_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("🌱 Dukaan Khata Seed Data Generator");
    println!("===================================");
    println!("Database: {}", db_path);
    println!();

    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.dealers().list().await?;
    if !existing.is_empty() {
        println!("⚠ Database already has {} dealers", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding dealers and bills...");

    let mut first_stock_item_ids: Vec<String> = Vec::new();

    for (index, (name, bill_number, goods)) in DEALERS.iter().enumerate() {
        let dealer = db.dealers().create(name, "").await?;

        let items: Vec<NewStockItem> = goods
            .iter()
            .map(|(brand, description, quantity, cost)| NewStockItem {
                brand: brand.to_string(),
                description: description.to_string(),
                quantity: *quantity,
                cost_per_unit: Money::from_rupees(*cost),
            })
            .collect();
        let total: Money = items
            .iter()
            .map(|i| i.cost_per_unit.multiply_quantity(i.quantity))
            .sum();

        let bill = db
            .dealers()
            .add_bill(&dealer.id, bill_number, "2024-05-01".parse()?, total, items)
            .await?;

        // Pay roughly two thirds of each bill down, alternating payers.
        let instalment = Money::from_paisa(total.paisa() / 3);
        db.dealers()
            .add_payment(
                &bill.id,
                instalment,
                "2024-05-10".parse()?,
                PRINCIPALS[index % PRINCIPALS.len()],
            )
            .await?;
        db.dealers()
            .add_payment(
                &bill.id,
                instalment,
                "2024-05-25".parse()?,
                PRINCIPALS[(index + 1) % PRINCIPALS.len()],
            )
            .await?;

        first_stock_item_ids.push(bill.items[0].id.clone());
        println!("  • {} ({} items, {} owed)", name, bill.items.len(), bill.outstanding());
    }

    println!();
    println!("Seeding customers and sales...");

    for (index, (name, contact)) in CUSTOMERS.iter().enumerate() {
        let stock_item_id = first_stock_item_ids[index % first_stock_item_ids.len()].clone();
        let sale_price = Money::from_rupees(3000 + 1500 * index as i64);
        let quantity = 1 + index as i64;
        let total = sale_price.multiply_quantity(quantity);

        // Alternate fully-paid cash sales and part-paid credit sales.
        let (sale_type, amount_paid) = if index % 2 == 0 {
            (SaleType::Cash, total)
        } else {
            (SaleType::Credit, Money::from_paisa(total.paisa() / 2))
        };

        let sale = db
            .sales()
            .record(NewSale {
                customer_name: name.to_string(),
                customer_contact: if contact.is_empty() {
                    None
                } else {
                    Some(contact.to_string())
                },
                date: "2024-06-05".parse()?,
                sale_type,
                lines: vec![NewSaleLine {
                    stock_item_id,
                    quantity,
                    sale_price,
                }],
                amount_paid,
                payment_method: PaymentMethod::Cash,
                paid_to: PRINCIPALS[index % PRINCIPALS.len()].to_string(),
            })
            .await?;

        println!("  • {} ({}, balance {})", name, sale.bill_no, sale.balance());
    }

    println!();
    println!("Seeding staff accounts...");

    db.users()
        .create("Admin", "admin@shop.pk", "changeme123", vec![Permission::Admin])
        .await?;
    db.users()
        .create(
            "Sales Floor",
            "sales@shop.pk",
            "changeme123",
            vec![Permission::Customers, Permission::Inventory],
        )
        .await?;
    println!("  • admin@shop.pk / changeme123 (admin)");
    println!("  • sales@shop.pk / changeme123 (customers, inventory)");

    let summary = db.dashboard_summary("2024-06-15".parse()?).await?;

    println!();
    println!("Done.");
    println!("  Outstanding debt:  {}", summary.total_outstanding_debt);
    println!("  Inventory value:   {}", summary.total_inventory_value);
    println!("  This month sales:  {}", summary.monthly_sales.current_month);
    println!("  Total profit:      {}", summary.total_profit);

    Ok(())
}
