//! # Seed Data Generator
//!
//! Populates a database with a demo shop: catalog products plus a spread of
//! single-item and multi-item sales, so the `duka report` output has
//! something to show.
//!
//! ## Usage
//! ```bash
//! # 40 sales for the default owner
//! cargo run -p duka-db --bin seed
//!
//! # Custom amount, owner and file
//! cargo run -p duka-db --bin seed -- --count 200 --owner shop-2 --db ./data/duka.db
//! ```
//!
//! ## Generated Data
//! - Products across a few shop categories, some below their restock level
//! - Every third sale is a multi-item sale with 16% tax
//! - Every fifth multi-item sale carries a 10% discount
//! - Payment methods rotate through the common ones

use std::env;

use duka_core::{
    CustomerInfo, Discount, Money, MultiItemSaleDraft, NewProduct, PaymentMethod, Percent, Product,
    Quantity, SaleItem, SaleType, SingleSaleDraft,
};
use duka_db::{Database, DbConfig};

/// `(category, name, cost, price, stock, min_stock)`
const PRODUCTS: &[(&str, &str, i64, i64, i64, i64)] = &[
    ("Groceries", "Sugar 1kg", 120, 150, 40, 10),
    ("Groceries", "Maize Flour 2kg", 160, 200, 25, 10),
    ("Groceries", "Rice 1kg", 140, 180, 8, 10),
    ("Groceries", "Cooking Oil 1L", 280, 340, 12, 5),
    ("Dairy", "Milk 500ml", 45, 60, 30, 12),
    ("Dairy", "Yoghurt 250ml", 55, 75, 4, 6),
    ("Bakery", "Bread 400g", 50, 65, 20, 8),
    ("Household", "Bar Soap", 90, 120, 15, 5),
    ("Household", "Matchbox", 3, 5, 100, 20),
    ("Beverages", "Soda 500ml", 45, 70, 48, 12),
];

const PAYMENT_METHODS: &[PaymentMethod] = &[
    PaymentMethod::Cash,
    PaymentMethod::Mpesa,
    PaymentMethod::Cash,
    PaymentMethod::Card,
    PaymentMethod::Mpesa,
    PaymentMethod::Credit,
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 40;
    let mut db_path = String::from("./duka_dev.db");
    let mut owner_id = String::from("demo-shop");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(40);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--owner" | "-o" => {
                if i + 1 < args.len() {
                    owner_id = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Duka Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>      Number of sales to generate (default: 40)");
                println!("  -d, --db <PATH>      Database file path (default: ./duka_dev.db)");
                println!("  -o, --owner <ID>     Owner to seed (default: demo-shop)");
                println!("  -h, --help           Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Duka Seed Data Generator");
    println!("===========================");
    println!("Database: {}", db_path);
    println!("Owner:    {}", owner_id);
    println!("Sales:    {}", count);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count(&owner_id).await?;
    if existing > 0 {
        println!("⚠ Owner already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file or pick another --owner to regenerate.");
        return Ok(());
    }

    println!();
    println!("Creating products...");

    let mut products = Vec::with_capacity(PRODUCTS.len());
    for (idx, &(category, name, cost, price, stock, min_stock)) in PRODUCTS.iter().enumerate() {
        let product = new_product(idx, category, name, cost, price, stock, min_stock);
        match db.products().create_product(&owner_id, product).await {
            Ok(product) => products.push(product),
            Err(e) => eprintln!("Failed to insert {}: {}", name, e),
        }
    }
    println!("✓ Created {} products", products.len());

    if products.is_empty() {
        return Ok(());
    }

    println!();
    println!("Recording sales...");

    let start = std::time::Instant::now();
    let mut singles = 0;
    let mut multis = 0;

    for seed in 0..count {
        let payment_method = PAYMENT_METHODS[seed % PAYMENT_METHODS.len()];

        let result = if seed % 3 == 2 {
            let draft = multi_item_draft(&products, seed, payment_method);
            db.multi_item_sales()
                .create_multi_item_sale(&owner_id, draft)
                .await
                .map(|_| multis += 1)
        } else {
            let draft = single_draft(&products[seed % products.len()], seed, payment_method);
            db.sales()
                .create_sale(&owner_id, draft)
                .await
                .map(|_| singles += 1)
        };

        if let Err(e) = result {
            eprintln!("Failed to record sale {}: {}", seed, e);
        }
    }

    let elapsed = start.elapsed();
    println!();
    println!(
        "✓ Recorded {} single and {} multi-item sales in {:?}",
        singles, multis, elapsed
    );

    let records = db.sale_records(&owner_id, 5).await?;
    println!();
    println!("Latest sales:");
    for record in &records {
        println!("  {}  {}", record.display_name(), record.total_amount());
    }

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

fn new_product(
    seed: usize,
    category: &str,
    name: &str,
    cost: i64,
    price: i64,
    stock: i64,
    min_stock: i64,
) -> NewProduct {
    let code: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(3)
        .collect::<String>()
        .to_uppercase();

    NewProduct {
        name: name.to_string(),
        sku: Some(format!("{}-{:03}", code, seed)),
        category: category.to_string(),
        description: None,
        cost_price: Money::from(cost),
        selling_price: Money::from(price),
        quantity: stock,
        min_stock_level: min_stock,
        unit_of_measure: "pcs".to_string(),
        supplier: None,
        location: None,
        // EAN-13 shaped, checksum not valid
        barcode: Some(format!("616{:010}", seed)),
        batch_number: None,
        tags: None,
        is_perishable: category == "Dairy" || category == "Bakery",
        expiry_date: None,
    }
}

fn item_for(product: &Product, quantity: i64) -> SaleItem {
    SaleItem::new(
        Some(product.id.clone()),
        product.name.clone(),
        SaleType::Product,
        Quantity::from(quantity),
        product.selling_price,
        product.cost_price,
    )
}

fn single_draft(product: &Product, seed: usize, payment_method: PaymentMethod) -> SingleSaleDraft {
    SingleSaleDraft {
        product_id: Some(product.id.clone()),
        product_name: product.name.clone(),
        sale_type: SaleType::Product,
        quantity: Quantity::from((seed % 4 + 1) as i64),
        unit_price: product.selling_price,
        cost_price: product.cost_price,
        payment_method,
        customer: CustomerInfo::default(),
        notes: None,
    }
}

fn multi_item_draft(
    products: &[Product],
    seed: usize,
    payment_method: PaymentMethod,
) -> MultiItemSaleDraft {
    let lines = seed % 3 + 2;
    let items = (0..lines)
        .map(|n| item_for(&products[(seed + n * 3) % products.len()], (n % 2 + 1) as i64))
        .collect();

    let discount = (seed % 5 == 0).then(|| Discount::Percentage(Percent::from(10)));

    MultiItemSaleDraft {
        items,
        tax_rate: Some(Percent::from(16)),
        discount,
        payment_method,
        customer: CustomerInfo {
            name: Some(format!("Customer {}", seed % 7 + 1)),
            phone: None,
            email: None,
        },
        notes: None,
    }
}
