//! # Seed Data Generator
//!
//! Populates a development database with a realistic catalog.
//!
//! ## Usage
//! ```bash
//! # 600 general products + 500 chocolates (default)
//! cargo run -p smartdesk-db --bin seed
//!
//! # Custom amounts
//! cargo run -p smartdesk-db --bin seed -- --count 2000 --chocolates 100
//!
//! # Specify database path
//! cargo run -p smartdesk-db --bin seed -- --db ./data/smartdesk.db
//! ```
//!
//! ## Generated Products
//! - General items spread round-robin over the GST categories, sku
//!   `SKU10000` upward, price 30.00 - 2000.00, stock 0 - 200
//! - A chocolate range `CHC0001..`, `ChocolateVar N` priced N rupees,
//!   stock 10 - 300
//!
//! Values are derived from the item index, so reruns produce the same catalog.

use std::env;

use smartdesk_core::tax::GST_CATEGORY_RATES;
use smartdesk_core::{Money, NewProduct, Product};
use smartdesk_db::{Database, DbConfig};

const ADJECTIVES: &[&str] = &[
    "Fresh", "Premium", "Organic", "Pure", "Classic", "Deluxe", "New", "Tasty", "Crunchy",
    "Smooth",
];

const WORDS: &[&str] = &[
    "Milk", "Paneer", "White Bread", "Chocolate Cake", "Orange Juice", "Potato Chips",
    "Frozen Peas", "Basmati Rice", "Mustard Oil", "Shampoo", "Dishwash Liquid", "A4 Paper",
    "Baby Diapers", "Dog Food", "USB Cable", "Blender", "Cushion Cover", "Gardening Soil",
    "Car Wax", "Vitamin C", "Yoga Mat", "Door Sensor", "LED Bulb",
];

const UNITS: &[&str] = &["piece", "kg", "litre", "gram"];

const GRAM_VARIANTS: &[u32] = &[50, 100, 200, 500];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 600;
    let mut chocolates: usize = 500;
    let mut db_path = String::from("./smartdesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if let Some(value) = args.get(i + 1) {
                    count = value.parse().unwrap_or(count);
                    i += 1;
                }
            }
            "--chocolates" => {
                if let Some(value) = args.get(i + 1) {
                    chocolates = value.parse().unwrap_or(chocolates);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if let Some(value) = args.get(i + 1) {
                    db_path = value.clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("SmartDesk POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>       General products to generate (default: 600)");
                println!("      --chocolates <N>  Chocolate range size (default: 500)");
                println!("  -d, --db <PATH>       Database file path (default: ./smartdesk_dev.db)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 SmartDesk POS Seed Data Generator");
    println!("====================================");
    println!("Database:   {}", db_path);
    println!("Products:   {}", count);
    println!("Chocolates: {}", chocolates);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database, migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    let start = std::time::Instant::now();
    let mut generated = 0;

    let categories: Vec<(usize, &str)> = GST_CATEGORY_RATES
        .iter()
        .enumerate()
        .filter(|(_, (name, _))| *name != "Chocolate")
        .map(|(idx, (name, _))| (idx, *name))
        .collect();

    for n in 0..count {
        let (category_idx, category) = categories[n % categories.len()];
        let product = general_product(n, category, category_idx)?;
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }
        generated += 1;
        if generated % 200 == 0 {
            println!("  Generated {} products...", generated);
        }
    }

    let chocolate_idx = GST_CATEGORY_RATES
        .iter()
        .position(|(name, _)| *name == "Chocolate")
        .unwrap_or(GST_CATEGORY_RATES.len() - 1);
    for n in 1..=chocolates {
        let product = chocolate(n, chocolate_idx)?;
        if let Err(e) = db.products().insert(&product).await {
            eprintln!("Failed to insert {}: {}", product.sku, e);
            continue;
        }
        generated += 1;
    }

    println!();
    println!("✓ Generated {} products in {:?}", generated, start.elapsed());
    println!("  Low stock (<= 5): {}", db.products().low_stock_count(5).await?);

    db.close().await;
    Ok(())
}

/// HSN code per category: `1001` for the first category, and so on.
fn hsn_for(category_idx: usize) -> String {
    format!("{:04}", 1000 + category_idx + 1)
}

fn general_product(n: usize, category: &str, category_idx: usize) -> Result<Product, Box<dyn std::error::Error>> {
    let adjective = ADJECTIVES[(n * 7) % ADJECTIVES.len()];
    let word = WORDS[(n * 13 + category_idx) % WORDS.len()];
    let unit = UNITS[(n * 3) % UNITS.len()];

    let mut name = format!("{adjective} {word}");
    if unit == "gram" {
        name = format!("{name} {}g", GRAM_VARIANTS[n % GRAM_VARIANTS.len()]);
    }

    // 30.00 - 2000.00
    let price_cents = 3_000 + ((n as i64 * 7_919) % 197_001);

    Ok(Product::create(NewProduct {
        sku: format!("SKU{}", 10_000 + n),
        name,
        category: category.to_string(),
        hsn: hsn_for(category_idx),
        unit: unit.to_string(),
        price: Money::from_cents(price_cents),
        quantity_on_hand: ((n * 37) % 201) as i64,
    })?)
}

fn chocolate(n: usize, category_idx: usize) -> Result<Product, Box<dyn std::error::Error>> {
    let unit = if n % 7 == 0 { "gram" } else { "piece" };
    let mut name = format!("ChocolateVar {n}");
    if unit == "gram" {
        name = format!("{name} {}g", GRAM_VARIANTS[n % GRAM_VARIANTS.len()]);
    }

    Ok(Product::create(NewProduct {
        sku: format!("CHC{n:04}"),
        name,
        category: "Chocolate".to_string(),
        hsn: hsn_for(category_idx),
        unit: unit.to_string(),
        price: Money::from_cents(n as i64 * 100),
        quantity_on_hand: 10 + ((n * 53) % 291) as i64,
    })?)
}
