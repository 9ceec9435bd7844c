//! # Seed Data Generator
//!
//! Populates a database with a demo outlet, catalog and customer.
//!
//! ## Usage
//! ```bash
//! # Seed ./tally.db
//! cargo run -p tally-db --bin seed
//!
//! # Specify database path
//! cargo run -p tally-db --bin seed -- --db ./data/tally.db
//! ```
//!
//! ## Generated Data
//! - One active outlet with 15% GST
//! - Products across categories, each with a subcategory and opening stock
//! - One walk-in customer

use std::env;

use tally_core::Money;
use tally_db::{Database, DbConfig, NewCustomer, NewOutlet, NewProduct};

/// `(category, subcategory, name, price_cents, stock)`
const PRODUCTS: &[(&str, &str, &str, i64, i64)] = &[
    ("Coffee", "Beans", "House Blend 1kg", 3200, 40),
    ("Coffee", "Beans", "Single Origin Ethiopia 250g", 1850, 25),
    ("Coffee", "Beans", "Decaf 500g", 2100, 12),
    ("Coffee", "Equipment", "Pour Over Kit", 6900, 6),
    ("Coffee", "Equipment", "Burr Grinder", 18900, 3),
    ("Tea", "Loose Leaf", "Earl Grey 100g", 1200, 30),
    ("Tea", "Loose Leaf", "Sencha 100g", 1450, 18),
    ("Tea", "Accessories", "Glass Teapot", 4500, 5),
    ("Bakery", "Pastries", "Croissant", 550, 24),
    ("Bakery", "Pastries", "Pain au Chocolat", 600, 20),
    ("Bakery", "Bread", "Sourdough Loaf", 950, 10),
    ("Dairy", "Milk", "Oat Milk 1L", 450, 36),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./tally.db");

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
                println!("Tally POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./tally.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Tally POS Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.session().await?.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    // Everything goes in together or not at all
    let mut uow = db.begin().await?;

    let outlet = uow
        .outlets()
        .insert(&NewOutlet {
            name: "Main Street".to_string(),
            currency: "NZD".to_string(),
            tax_rate_bps: 1500,
            is_active: true,
        })
        .await?;
    println!("✓ Outlet '{}' ({}% GST)", outlet.name, outlet.tax_rate().percentage());

    for (category, subcategory, name, price_cents, stock) in PRODUCTS {
        let product = uow
            .products()
            .insert(&NewProduct {
                name: name.to_string(),
                price: Money::from_cents(*price_cents),
                stock: *stock,
                category: Some(category.to_string()),
                subcategory: Some(subcategory.to_string()),
            })
            .await?;
        println!("  #{:<3} {:<30} {:>9}  stock {}", product.id, product.name, product.price().to_string(), product.stock);
    }

    uow.customers()
        .upsert_by_email(&NewCustomer {
            name: "Walk-in Customer".to_string(),
            email: "walk-in@tally.local".to_string(),
            phone: None,
            address: None,
            is_business: false,
        })
        .await?;

    uow.commit().await?;

    println!();
    println!("✓ Seeded {} products", PRODUCTS.len());
    println!("✓ Seed complete!");

    Ok(())
}
