//! Infrastructure layer: snapshot persistence for the stock ledger.

pub mod kv;
pub mod snapshots;

pub use kv::{FileStore, InMemoryStore, KeyValueStore, StoreError};
pub use snapshots::{INVENTORY_KEY, InventorySnapshots};
