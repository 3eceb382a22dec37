//! # Seed Data Generator
//!
//! Populates a database with the demo outlets and menu.
//!
//! ## Usage
//! ```bash
//! cargo run -p dapur-db --bin seed
//!
//! # Specify database path
//! cargo run -p dapur-db --bin seed -- --db ./data/dapur.db
//! ```

use std::env;

use dapur_db::seed::{ids, seed_demo_data};
use dapur_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./dapur_dev.db");

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
                println!("Dapur POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./dapur_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Dapur POS Seed Data Generator");
    println!("=============================");
    println!("Database: {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    seed_demo_data(db.pool()).await?;

    let catalog = db.catalog();
    for outlet_id in [ids::OUTLET_KWR, ids::OUTLET_SMG, ids::OUTLET_POP] {
        if let Some(outlet) = catalog.outlet(outlet_id).await? {
            println!(
                "  {:<12} {:<18} prefix={:<4} tax={}bps",
                outlet.id,
                outlet.name,
                outlet.order_prefix.as_deref().unwrap_or("-"),
                outlet.tax_rate.bps()
            );
        }
    }

    let menu = catalog
        .resolve(&[ids::NASI_GORENG, ids::ES_TEH, ids::NASI_BOX, ids::KOPI_TUBRUK])
        .await?;
    println!("  {} menu products", menu.len());

    db.close().await;
    println!("✓ Seed complete!");
    Ok(())
}
