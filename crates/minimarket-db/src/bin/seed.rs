//! # Seed Data Generator
//!
//! Fills a development database with a demo catalog and an admin account.
//!
//! ## Usage
//! ```bash
//! # Default database, every demo product
//! cargo run -p minimarket-db --bin seed
//!
//! # Fewer products, custom path
//! cargo run -p minimarket-db --bin seed -- --count 20 --db ./data/minimarket.db
//! ```
//!
//! The admin signs in as `admin@minimarket.local` with the password given
//! by `--password` (default `changeme123`).

use std::env;

use minimarket_core::Role;
use minimarket_db::{Database, DbConfig, NewProduct, NewProfile};

/// Demo shelves: category and (name, base price in cents).
const CATALOG: &[(&str, &[(&str, i64)])] = &[
    (
        "Beverages",
        &[
            ("Mineral Water 1.5L", 120),
            ("Cola 500ml", 180),
            ("Orange Juice 1L", 350),
            ("Instant Coffee 200g", 690),
            ("Black Tea 50 bags", 420),
        ],
    ),
    (
        "Dairy",
        &[
            ("Whole Milk 1L", 210),
            ("Plain Yogurt 500g", 260),
            ("Cheddar 250g", 540),
            ("Butter 250g", 480),
            ("Eggs (12)", 390),
        ],
    ),
    (
        "Bakery",
        &[
            ("White Bread", 250),
            ("Wholemeal Bread", 290),
            ("Croissant", 110),
            ("Dinner Rolls (6)", 230),
        ],
    ),
    (
        "Pantry",
        &[
            ("Long Grain Rice 2kg", 640),
            ("Spaghetti 500g", 160),
            ("Chopped Tomatoes 400g", 95),
            ("Sunflower Oil 1L", 430),
            ("Sugar 1kg", 180),
            ("Salt 500g", 70),
        ],
    ),
    (
        "Household",
        &[
            ("Dish Soap 500ml", 240),
            ("Laundry Powder 1kg", 560),
            ("Toilet Paper (4)", 330),
            ("Matches (10)", 60),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = usize::MAX;
    let mut db_path = String::from("./minimarket_dev.db");
    let mut password = String::from("changeme123");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(usize::MAX);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--password" | "-p" => {
                if i + 1 < args.len() {
                    password = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Mini Market Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>        Number of products to create (default: all)");
                println!("  -d, --db <PATH>        Database file path (default: ./minimarket_dev.db)");
                println!("  -p, --password <PW>    Admin password (default: changeme123)");
                println!("  -h, --help             Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Mini Market Seed Data Generator");
    println!("==================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating products...");

    let mut generated = 0;
    'shelves: for (category_idx, (category, items)) in CATALOG.iter().enumerate() {
        for (item_idx, (name, price_cents)) in items.iter().enumerate() {
            if generated >= count {
                break 'shelves;
            }

            let input = demo_product(category, name, *price_cents, category_idx * 100 + item_idx);
            if let Err(e) = db.products().insert(&input).await {
                eprintln!("Failed to insert {}: {}", input.name, e);
                continue;
            }

            generated += 1;
        }
    }

    println!("✓ Created {} products", generated);

    if db.profiles().count().await? == 0 {
        let admin = db
            .profiles()
            .create(&NewProfile {
                full_name: "Store Admin".to_string(),
                email: "admin@minimarket.local".to_string(),
                password,
                role: Role::Admin,
            })
            .await?;
        println!("✓ Created admin profile {} ({})", admin.email, admin.id);
    }

    let low = db.products().low_stock(5).await?;
    println!("  Low stock at seed time: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Stock cycles through 0..=40 so a few shelves start empty or low.
fn demo_product(category: &str, name: &str, price_cents: i64, seed: usize) -> NewProduct {
    NewProduct {
        name: name.to_string(),
        // In-store code, not a real EAN.
        barcode: Some(format!("200{:010}", seed)),
        category: Some(category.to_string()),
        price_cents,
        stock: ((seed * 7) % 41) as i64,
    }
}
