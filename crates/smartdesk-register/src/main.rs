//! # SmartDesk POS Register
//!
//! Headless start-up: opens the configured database, loads the ledger, prints
//! today's summary and the low-stock list, then shuts down cleanly. A shell
//! embeds the library instead of running this binary.
//!
//! ```bash
//! SMARTDESK_DB_PATH=./smartdesk_dev.db cargo run -p smartdesk-register
//! ```

use smartdesk_register::commands::{catalog, report};
use smartdesk_register::{init_tracing, ConfigState, Register};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("Starting SmartDesk POS register");

    let config = ConfigState::from_env();
    let register = Register::open(config).await?;

    let summary = report::sales_summary(&register, report::ReportPeriod::Daily).await?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    for product in catalog::low_stock(&register) {
        println!("LOW  {:<12} {:>5}  {}", product.sku, product.quantity_on_hand, product.name);
    }

    register.shutdown().await?;
    Ok(())
}
