//! `stockroom`: command-line shell around the stock ledger.
//!
//! Each invocation loads the inventory snapshot from the data directory, runs
//! one ledger operation, writes the snapshot back if anything changed and
//! prints the result as JSON.

use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};

use stockroom_core::{ItemId, UserId};
use stockroom_events::EventBus;
use stockroom_infra::{InventorySnapshots, KeyValueStore};
use stockroom_inventory::{
    ItemDetails, LedgerConfig, LedgerEnvelope, MovementType, NewItem, NewMovement, StockLedger,
    UnderflowPolicy,
};
use stockroom_observability::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "stockroom", about = "Inventory stock ledger for a garment workshop")]
pub struct Cli {
    /// Directory holding the inventory snapshot.
    #[arg(long, env = "STOCKROOM_DATA_DIR", default_value = "./stockroom-data")]
    pub data_dir: PathBuf,

    /// User id recorded as the author of new items and movements.
    #[arg(long, env = "STOCKROOM_ACTOR")]
    pub actor: Option<UserId>,

    /// Overdraw handling: floor (record, clamp at zero) or reject.
    /// Overrides `STOCKROOM_UNDERFLOW_POLICY`.
    #[arg(long)]
    pub underflow: Option<UnderflowPolicy>,

    /// Log output: json, pretty or compact. Overrides `STOCKROOM_LOG_FORMAT`.
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Ledger settings from the environment, with `--underflow` on top.
    pub fn ledger_config(&self) -> LedgerConfig {
        self.ledger_config_over(LedgerConfig::from_env())
    }

    fn ledger_config_over(&self, mut config: LedgerConfig) -> LedgerConfig {
        if let Some(underflow) = self.underflow {
            config.underflow = underflow;
        }
        config
    }

    /// `--log-format`, else `STOCKROOM_LOG_FORMAT`, else JSON.
    pub fn log_format(&self) -> LogFormat {
        self.log_format.unwrap_or_else(LogFormat::from_env)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a new item.
    Register(RegisterArgs),
    /// Record a stock movement.
    Move(MoveArgs),
    /// Mark an item discontinued (or clear the mark with --off).
    Discontinue {
        item: ItemId,
        #[arg(long)]
        off: bool,
    },
    /// Edit an item's details and thresholds (stock is not editable).
    Edit {
        item: ItemId,
        #[command(flatten)]
        details: DetailsArgs,
    },
    /// Show one item.
    Show { item: ItemId },
    /// List every item.
    List,
    /// Items at or below their minimum, lowest first.
    LowStock,
    /// One item's movements, oldest first.
    History { item: ItemId },
    /// Movements across all items, newest first.
    Feed {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Totals and status counts.
    Summary,
}

impl Command {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::Register(_) | Command::Move(_) | Command::Discontinue { .. } | Command::Edit { .. }
        )
    }
}

#[derive(Args, Debug, Clone)]
pub struct DetailsArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub unit: String,
    #[arg(long)]
    pub location: String,
    #[arg(long)]
    pub min: i64,
    #[arg(long)]
    pub max: i64,
    /// Cost per unit in the smallest currency unit.
    #[arg(long, default_value_t = 0)]
    pub cost: u64,
    #[arg(long)]
    pub supplier: Option<String>,
    #[arg(long)]
    pub barcode: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Expiry date, YYYY-MM-DD.
    #[arg(long)]
    pub expiry: Option<NaiveDate>,
}

impl From<DetailsArgs> for ItemDetails {
    fn from(args: DetailsArgs) -> Self {
        ItemDetails {
            name: args.name,
            category: args.category,
            unit: args.unit,
            location: args.location,
            supplier: args.supplier,
            barcode: args.barcode,
            description: args.description,
            expiry_date: args.expiry,
            min_stock: args.min,
            max_stock: args.max,
            cost_per_unit: args.cost,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[command(flatten)]
    pub details: DetailsArgs,
    /// Opening stock.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub stock: i64,
}

#[derive(Args, Debug, Clone)]
pub struct MoveArgs {
    pub item: ItemId,
    /// in, out, adjustment or transfer.
    pub kind: MovementType,
    #[arg(allow_negative_numbers = true)]
    pub quantity: i64,
    #[arg(long)]
    pub reason: String,
    #[arg(long)]
    pub reference: Option<String>,
    /// Effective date (RFC 3339); defaults to now.
    #[arg(long)]
    pub date: Option<DateTime<Utc>>,
}

/// Run one command against `ledger`, persisting through `snapshots` when it
/// changed something.
pub fn run<B, S>(
    command: Command,
    ledger: &StockLedger<B>,
    snapshots: &InventorySnapshots<S>,
    actor: Option<UserId>,
    now: DateTime<Utc>,
) -> Result<Value>
where
    B: EventBus<LedgerEnvelope>,
    S: KeyValueStore,
{
    let persist = command.is_mutation();

    let output = match command {
        Command::Register(args) => {
            let item = ledger.register_item(NewItem {
                details: args.details.into(),
                initial_stock: args.stock,
                created_by: actor,
                occurred_at: now,
            })?;
            serde_json::to_value(item)?
        }
        Command::Move(args) => {
            let item = ledger.apply_movement(
                args.item,
                NewMovement {
                    kind: args.kind,
                    quantity: args.quantity,
                    reason: args.reason,
                    reference: args.reference,
                    date: args.date,
                    created_by: actor,
                    occurred_at: now,
                },
            )?;
            serde_json::to_value(item)?
        }
        Command::Discontinue { item, off } => serde_json::to_value(ledger.set_discontinued(item, !off, now)?)?,
        Command::Edit { item, details } => {
            serde_json::to_value(ledger.update_details(item, details.into(), now)?)?
        }
        Command::Show { item } => serde_json::to_value(ledger.get(item)?)?,
        Command::List => serde_json::to_value(ledger.list()?)?,
        Command::LowStock => serde_json::to_value(ledger.query_low_stock()?)?,
        Command::History { item } => {
            let history = ledger.movement_history(item)?;
            serde_json::to_value(history.iter().collect::<Vec<_>>())?
        }
        Command::Feed { limit } => {
            let mut feed = ledger.movement_feed()?;
            if let Some(limit) = limit {
                feed.truncate(limit);
            }
            serde_json::to_value(feed)?
        }
        Command::Summary => {
            let summary = ledger.summary()?;
            json!({ "summary": summary, "underflowPolicy": ledger.config().underflow.to_string() })
        }
    };

    if persist {
        let saved = snapshots.persist(ledger)?;
        tracing::debug!(items = saved, "snapshot persisted");
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use stockroom_infra::{INVENTORY_KEY, InMemoryStore};

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["stockroom"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn register_args() -> Vec<&'static str> {
        vec![
            "register", "--name", "Denim 12oz", "--category", "fabric", "--unit", "m",
            "--location", "Rack 2", "--min", "20", "--max", "100", "--cost", "650", "--stock", "15",
        ]
    }

    #[test]
    fn parses_register_with_defaults() {
        let cli = parse(&register_args());
        assert_eq!(cli.log_format, None);
        assert_eq!(cli.underflow, None);
        match cli.command {
            Command::Register(args) => {
                assert_eq!(args.stock, 15);
                assert_eq!(args.details.cost, 650);
                assert_eq!(args.details.supplier, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn policy_and_log_format_are_not_read_by_the_parser() {
        let command = Cli::command();
        for id in ["underflow", "log_format"] {
            let arg = command
                .get_arguments()
                .find(|a| a.get_id().as_str() == id)
                .unwrap();
            assert_eq!(arg.get_env(), None, "{id} must leave its variable to the config layer");
        }
    }

    #[test]
    fn underflow_flag_overrides_environment_config() {
        let from_env = LedgerConfig::new(UnderflowPolicy::Reject);

        let cli = parse(&["list"]);
        assert_eq!(cli.ledger_config_over(from_env).underflow, UnderflowPolicy::Reject);

        let cli = parse(&["--underflow", "floor", "list"]);
        assert_eq!(cli.ledger_config_over(from_env).underflow, UnderflowPolicy::Floor);

        let cli = parse(&["--log-format", "pretty", "summary"]);
        assert_eq!(cli.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn rejects_unknown_movement_kind() {
        let id = ItemId::new().to_string();
        let result = Cli::try_parse_from(["stockroom", "move", id.as_str(), "gift", "3", "--reason", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn mutations_persist_and_queries_do_not() {
        let ledger = StockLedger::in_memory(LedgerConfig::default());
        let snapshots = InventorySnapshots::new(InMemoryStore::new());
        let now = Utc::now();

        let out = run(parse(&["list"]).command, &ledger, &snapshots, None, now).unwrap();
        assert_eq!(out, json!([]));
        assert_eq!(snapshots.store().get(INVENTORY_KEY).unwrap(), None);

        let item = run(parse(&register_args()).command, &ledger, &snapshots, None, now).unwrap();
        assert_eq!(item["status"], "low_stock");
        let id = item["id"].as_str().unwrap().to_string();

        let moved = run(
            parse(&["move", &id, "in", "50", "--reason", "delivery"]).command,
            &ledger,
            &snapshots,
            None,
            now,
        )
        .unwrap();
        assert_eq!(moved["currentStock"], 65);
        assert_eq!(moved["status"], "in_stock");

        assert_eq!(snapshots.load().unwrap().len(), 1);
        assert_eq!(snapshots.load().unwrap()[0].current_stock(), 65);
    }

    #[test]
    fn failed_mutation_reports_fields_and_saves_nothing() {
        let ledger = StockLedger::in_memory(LedgerConfig::default());
        let snapshots = InventorySnapshots::new(InMemoryStore::new());

        let mut args = register_args();
        let min = args.iter().position(|a| *a == "--min").unwrap();
        args[min + 1] = "500";

        let err = run(parse(&args).command, &ledger, &snapshots, None, Utc::now()).unwrap_err();
        assert!(err.to_string().contains("min_stock"));
        assert_eq!(snapshots.store().get(INVENTORY_KEY).unwrap(), None);
    }
}
