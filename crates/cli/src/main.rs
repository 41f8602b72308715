use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;

use stockroom_cli::{Cli, run};
use stockroom_infra::{FileStore, InventorySnapshots};
use stockroom_inventory::StockLedger;

fn main() -> Result<()> {
    let cli = Cli::parse();
    stockroom_observability::init_with(cli.log_format());
    let config = cli.ledger_config();

    let store = FileStore::open(&cli.data_dir)
        .with_context(|| format!("opening data directory {}", cli.data_dir.display()))?;
    let snapshots = InventorySnapshots::new(store);

    let ledger = StockLedger::in_memory(config);
    let loaded = snapshots.hydrate(&ledger).context("loading inventory snapshot")?;
    tracing::info!(items = loaded, underflow = %config.underflow, "ledger ready");

    let output = run(cli.command, &ledger, &snapshots, cli.actor, Utc::now())?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
