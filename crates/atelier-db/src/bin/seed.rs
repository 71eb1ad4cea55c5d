//! # Import and Demo Data
//!
//! Loads a JSON export into the record store, or writes a small demo
//! catalog for development.
//!
//! ## Usage
//! ```bash
//! # Import an export: either an array, or { "collection": [ ... ], ... }
//! cargo run -p atelier-db --bin atelier-seed -- --file db.json
//!
//! # Demo catalog: components, a simple product, a composite set, sales
//! cargo run -p atelier-db --bin atelier-seed -- --demo
//!
//! # Specify database path
//! cargo run -p atelier-db --bin atelier-seed -- --db ./data/atelier.db --demo
//! ```
//!
//! ## Import Format
//! ```text
//! [ {...}, {...} ]                      → collection "default"
//! { "productos": [..], "ventas": [..] } → "products", "sales"
//! ```
//! Documents are upserted in batches of 200, one transaction per batch.

use std::env;

use atelier_core::adjustments::ensure_default_adjustments;
use atelier_core::fabric::FabricEdit;
use atelier_core::materials::MaterialEdit;
use atelier_core::sales::NewSale;
use atelier_core::Product;
use atelier_db::{resolve_collection, Database, DbConfig, WriteOp};
use chrono::Local;
use rust_decimal::Decimal;
use serde_json::{json, Value};

/// Documents per transaction.
const BATCH_SIZE: usize = 200;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./atelier_dev.db");
    let mut file: Option<String> = None;
    let mut demo = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--file" | "-f" => {
                if i + 1 < args.len() {
                    file = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--demo" => demo = true,
            "--help" | "-h" => {
                println!("Atelier Ledger Import Tool");
                println!();
                println!("Usage: atelier-seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -f, --file <PATH>  JSON export to import");
                println!("      --demo         Write a small demo catalog");
                println!("  -d, --db <PATH>    Database file path (default: ./atelier_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {other}"),
        }
        i += 1;
    }

    if file.is_none() && !demo {
        eprintln!("Nothing to do: pass --file <PATH> or --demo (see --help)");
        return Ok(());
    }

    println!("Atelier Ledger Import Tool");
    println!("==========================");
    println!("Database: {db_path}");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    if let Some(path) = file {
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        let rows = export_rows(raw)?;
        println!("Prepared {} documents from {path}", rows.len());

        let start = std::time::Instant::now();
        let mut written = 0;
        for batch in rows.chunks(BATCH_SIZE) {
            db.records().apply(batch.to_vec()).await?;
            println!("  Upsert: {} -> {}", written, written + batch.len());
            written += batch.len();
        }
        println!("✓ Imported {written} documents in {:?}", start.elapsed());
    }

    if demo {
        write_demo(&db).await?;
    }

    println!("✓ Done");
    Ok(())
}

/// Flattens an export into upserts.
fn export_rows(raw: Value) -> Result<Vec<WriteOp>, String> {
    match raw {
        Value::Array(documents) => Ok(documents
            .into_iter()
            .map(|document| WriteOp::put("default", document))
            .collect()),
        Value::Object(collections) => Ok(collections
            .into_iter()
            .filter_map(|(collection, documents)| match documents {
                Value::Array(documents) => Some((collection, documents)),
                _ => None,
            })
            .flat_map(|(collection, documents)| {
                let collection = resolve_collection(&collection).to_string();
                documents
                    .into_iter()
                    .map(move |document| WriteOp::put(&collection, document))
            })
            .collect()),
        _ => Err("unrecognized export: expected an array or { collection: [...] }".to_string()),
    }
}

async fn write_demo(db: &Database) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("Writing demo catalog...");

    let components = [
        json!({ "id": "lona", "name": "Lona impermeable", "category": "telas", "price": 9000,
                "link": "https://www.casanacho.com.ar/lona-impermeable" }),
        json!({ "id": "forreria", "name": "Forrería", "category": "telas", "price": 4500 }),
        json!({ "id": "cierre", "name": "Cierre 20cm", "category": "mercería", "price": 1200, "unitDivisor": 10 }),
        json!({ "id": "hebilla", "name": "Hebilla plástica", "category": "herrajes", "price": 350 }),
        json!({ "id": "confeccion-bolso", "name": "Confección bolso", "category": "Mano de obra", "price": 6000 }),
        json!({ "id": "hilo", "name": "Hilo poliéster", "price": 800 }),
    ];
    for component in components {
        db.records().put("components", component).await?;
    }

    let bolso = json!({
        "id": "bolso-matero", "name": "Bolso matero", "type": "simple", "category": "Bolsos",
        "available": 5,
        "componentes": {
            "telas": [
                { "componentId": "lona", "anchoTelaCm": 150, "anchoCm": 60, "largoCm": 80, "porcentajeDesperdicio": 10 },
                { "componentId": "forreria", "anchoTelaCm": 150, "anchoCm": 60, "largoCm": 80, "porcentajeDesperdicio": 5 }
            ],
            "otros": [
                { "componentId": "cierre", "unidades": 1 },
                { "componentId": "hebilla", "unidades": 2 },
                { "componentId": "confeccion-bolso", "unidades": 1 }
            ]
        }
    });
    let cartuchera = json!({
        "id": "cartuchera", "name": "Cartuchera", "type": "simple", "category": "Accesorios",
        "available": 10, "price": 2500, "costoConfeccion": 1500
    });
    let set = json!({
        "id": "set-viaje", "name": "Set de viaje", "type": "composite",
        "compositeItems": [{ "productId": "bolso-matero" }, { "productId": "cartuchera" }]
    });

    // Priced through the calculators so derived fields are filled in.
    let component_index = db.components().index().await?;
    for document in [bolso, cartuchera, set] {
        let mut product = Product::from_document(document)?;
        if let Some(componentes) = product.componentes_mut() {
            for row in &mut componentes.telas {
                let component_id = row.component_id.clone();
                row.apply(FabricEdit::Component(component_id), &component_index);
            }
            for row in &mut componentes.otros {
                let component_id = row.component_id.clone();
                row.apply(MaterialEdit::Component(component_id), &component_index);
            }
        }
        ensure_default_adjustments(&mut product);
        let saved = db.products().save(product).await?;
        println!("  ✓ {} ({})", saved.name, saved.product_type().as_str());
    }

    let today = Local::now().date_naive();
    let sales = [
        NewSale {
            product_id: "bolso-matero".into(),
            quantity: Decimal::ONE,
            customer_name: Some("lucía".into()),
            ..NewSale::default()
        },
        NewSale {
            product_id: "cartuchera".into(),
            quantity: Decimal::from(2),
            payment_method: Some("Transferencia".into()),
            payment_received: Some(Decimal::from(3000)),
            ..NewSale::default()
        },
    ];
    for input in sales {
        let sale = db.sales().create(input, today).await?;
        println!("  ✓ sale {} total {}", sale.id, sale.total);
    }

    Ok(())
}
