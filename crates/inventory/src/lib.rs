//! Inventory stock ledger.
//!
//! Business rules for on-hand stock, implemented as deterministic domain logic
//! (no IO, no HTTP, no storage). The `StockLedger` service wraps the
//! `InventoryItem` aggregate with a lock, id assignment and event publication;
//! persisting its snapshots is left to the caller.

pub mod config;
pub mod item;
pub mod ledger;
pub mod movement;
pub mod query;
pub mod status;

pub use config::{LedgerConfig, UnderflowPolicy};
pub use item::{
    DetailsUpdated, DiscontinuedChanged, InventoryCommand, InventoryEvent, InventoryItem,
    ItemDetails, ItemRegistered, RecordMovement, RegisterItem, SetDiscontinued, StockMoved,
    UpdateDetails,
};
pub use ledger::{LedgerEnvelope, MovementHistory, NewItem, NewMovement, StockLedger};
pub use movement::{MovementType, StockMovement};
pub use query::{InventorySummary, MovementFeedEntry};
pub use status::{StockStatus, derive_status};
