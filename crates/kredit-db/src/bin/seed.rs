//! # Seed Data Generator
//!
//! Populates a database with demo customers for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default demo customers
//! cargo run -p kredit-db --bin seed
//!
//! # Specify database path
//! cargo run -p kredit-db --bin seed -- --db ./data/kredit.db
//! ```
//!
//! Customers start with a zero outstanding balance; balances only move
//! through committed checkouts.

use std::env;

use kredit_core::Customer;
use kredit_db::{Database, DbConfig};

/// Demo customers: (name, credit limit in minor units).
const CUSTOMERS: &[(&str, i64)] = &[
    ("Amina Traders", 500_000),
    ("Baraka Wholesale", 2_500_000),
    ("Chanda General Store", 150_000),
    ("Duka la Mama Zawadi", 80_000),
    ("Eastside Hardware", 1_200_000),
    ("Faraja Pharmacy", 300_000),
    ("Gikomba Textiles", 750_000),
    ("Hekima School Canteen", 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./kredit_dev.db");

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
                println!("Kredit POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./kredit_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Kredit POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.customers().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} customers", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating customers...");

    let mut created = 0;
    for (name, limit) in CUSTOMERS {
        let customer = Customer::new(*name, *limit);
        if let Err(e) = db.customers().insert(&customer).await {
            eprintln!("Failed to insert {}: {}", name, e);
            continue;
        }
        println!("  {:<24} limit {:>12}  id {}", name, kredit_core::Money::from_cents(*limit), customer.id);
        created += 1;
    }

    println!();
    println!("✓ Created {} customers", created);
    println!("✓ Seed complete!");

    Ok(())
}
