//! # Seed Data Generator
//!
//! Populates the database with a demo bike catalog for development.
//!
//! ## Usage
//! ```bash
//! # Seed the default database
//! cargo run -p velorent-db --bin seed
//!
//! # Specify database path
//! cargo run -p velorent-db --bin seed -- --db ./data/velorent.db
//! ```
//!
//! ## Generated Catalog
//! - Rentable bikes (city, mountain, road, e-bike, cargo, kids) with the
//!   full four-tier price grid and small spare quantities
//! - Non-rentable accessories (helmet, lock, lights, child seat, pannier)
//!   priced for attachment as rental extras
//! - One draft rental contract on the first bike

use chrono::{Duration, Utc};
use std::env;
use uuid::Uuid;
use velorent_core::{CatalogItem, PricingGranularity, RentalContract, RentalState};
use velorent_db::{Database, DbConfig};

/// Rentable bikes: (reference, name, hourly, daily, weekly, monthly, sale, qty)
/// Prices are in cents.
const BIKES: &[(&str, &str, i64, i64, i64, i64, i64, i64)] = &[
    ("BIKE-CITY-01", "City Bike", 300, 1500, 7000, 20000, 45000, 3),
    ("BIKE-CITY-02", "City Bike Step-Through", 300, 1500, 7000, 20000, 45000, 2),
    ("BIKE-MTB-01", "Mountain Bike", 500, 2500, 12000, 35000, 90000, 2),
    ("BIKE-ROAD-01", "Road Bike", 600, 3000, 14000, 40000, 120000, 1),
    ("BIKE-EBIKE-01", "Electric City Bike", 800, 4000, 18000, 50000, 180000, 2),
    ("BIKE-CARGO-01", "Cargo Bike", 700, 3500, 16000, 45000, 150000, 1),
    ("BIKE-KIDS-01", "Kids Bike 20\"", 200, 1000, 4500, 12000, 25000, 2),
    ("BIKE-TANDEM-01", "Tandem Bike", 900, 4500, 20000, 55000, 110000, 1),
];

/// Accessories: (reference, name, sale price in cents)
/// Not rentable on their own - they attach to contracts as extras.
const ACCESSORIES: &[(&str, &str, i64)] = &[
    ("ACC-HELMET-01", "Helmet", 500),
    ("ACC-LOCK-01", "Heavy-Duty Lock", 300),
    ("ACC-LIGHTS-01", "Light Set", 250),
    ("ACC-SEAT-01", "Child Seat", 800),
    ("ACC-PANNIER-01", "Pannier Bag", 400),
    ("ACC-PUMP-01", "Mini Pump", 150),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./velorent_dev.db");

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
                println!("VeloRent Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./velorent_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 VeloRent Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    // Connect to database
    let config = DbConfig::new(&db_path);
    let db = Database::new(config).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    // Check existing catalog
    let existing = db.catalog().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} catalog items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Seeding catalog...");

    let now = Utc::now();
    let mut inserted = 0;

    for &(reference, name, hourly, daily, weekly, monthly, sale, qty) in BIKES {
        let item = CatalogItem {
            id: Uuid::new_v4().to_string(),
            reference: reference.to_string(),
            name: name.to_string(),
            rentable: true,
            hourly_price_cents: hourly,
            daily_price_cents: daily,
            weekly_price_cents: weekly,
            monthly_price_cents: monthly,
            sale_price_cents: sale,
            available_quantity: qty,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.catalog().insert(&item).await {
            eprintln!("Failed to insert {}: {}", reference, e);
            continue;
        }
        inserted += 1;
    }

    for &(reference, name, sale) in ACCESSORIES {
        let item = CatalogItem {
            id: Uuid::new_v4().to_string(),
            reference: reference.to_string(),
            name: name.to_string(),
            rentable: false,
            hourly_price_cents: 0,
            daily_price_cents: 0,
            weekly_price_cents: 0,
            monthly_price_cents: 0,
            sale_price_cents: sale,
            available_quantity: 0,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = db.catalog().insert(&item).await {
            eprintln!("Failed to insert {}: {}", reference, e);
            continue;
        }
        inserted += 1;
    }

    println!("✓ Inserted {} catalog items", inserted);

    let rentable = db.catalog().list_rentable().await?;
    println!("  Rentable bikes: {}", rentable.len());

    // One draft contract so a fresh database has a rental to poke at.
    if let Some(bike) = rentable.first() {
        let reference = db.rentals().next_reference().await?;
        let start = now + Duration::hours(1);
        let contract = RentalContract {
            id: Uuid::new_v4().to_string(),
            reference: reference.clone(),
            customer_id: "CUST-DEMO-01".to_string(),
            item_id: bike.id.clone(),
            start_time: start,
            end_time: start + Duration::days(2),
            actual_return_time: None,
            granularity: PricingGranularity::Daily,
            quantity: 2,
            unit_price_cents: bike.daily_price_cents,
            deposit_cents: 5000,
            manual_extra_cents: 0,
            late_charge_cents: 0,
            state: RentalState::Draft,
            deposit_returned: false,
            invoice_id: None,
            notes: Some("Demo booking".to_string()),
            condition_on_pickup: None,
            condition_on_return: None,
            created_at: now,
            updated_at: now,
        };
        db.rentals().insert(&contract).await?;
        println!("✓ Created demo draft rental {} for {}", reference, bike.name);
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
