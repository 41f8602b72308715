//! Inventory snapshot persistence.
//!
//! The whole item list is serialized as one JSON array under a single key,
//! reloaded at startup and rewritten after each mutation. It is a cache of the
//! ledger, not a log: a blob that fails to parse (or fails the ledger's
//! integrity checks) is dropped and the ledger starts empty.

use stockroom_events::EventBus;
use stockroom_inventory::{InventoryItem, LedgerEnvelope, StockLedger};

use crate::kv::{KeyValueStore, StoreError, validate_key};

/// Key the inventory list lives under.
pub const INVENTORY_KEY: &str = "inventory";

#[derive(Debug, Clone)]
pub struct InventorySnapshots<S> {
    store: S,
    key: String,
}

impl<S> InventorySnapshots<S>
where
    S: KeyValueStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            key: INVENTORY_KEY.to_string(),
        }
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Result<Self, StoreError> {
        let key = key.into();
        validate_key(&key)?;
        Ok(Self { store, key })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored items; an absent key is an empty list.
    pub fn load(&self) -> Result<Vec<InventoryItem>, StoreError> {
        match self.store.get(&self.key)? {
            None => Ok(Vec::new()),
            Some(raw) => Ok(serde_json::from_str(&raw)?),
        }
    }

    /// Like `load`, but any failure yields an empty list and a warning.
    pub fn load_or_empty(&self) -> Vec<InventoryItem> {
        self.load().unwrap_or_else(|err| {
            tracing::warn!(key = %self.key, "discarding unreadable inventory snapshot: {err}");
            Vec::new()
        })
    }

    pub fn save(&self, items: &[InventoryItem]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(items)?;
        self.store.set(&self.key, &raw)?;
        tracing::debug!(key = %self.key, items = items.len(), "inventory snapshot saved");
        Ok(())
    }

    /// Fill `ledger` from the stored snapshot. Returns the number of items loaded.
    ///
    /// A snapshot the ledger refuses leaves it empty.
    pub fn hydrate<B>(&self, ledger: &StockLedger<B>) -> Result<usize, StoreError>
    where
        B: EventBus<LedgerEnvelope>,
    {
        let items = self.load_or_empty();
        match ledger.restore(items) {
            Ok(count) => Ok(count),
            Err(err) => {
                tracing::warn!(key = %self.key, "inventory snapshot failed integrity checks: {err}");
                ledger.reset()?;
                Ok(0)
            }
        }
    }

    /// Write the ledger's current contents. Returns the number of items saved.
    pub fn persist<B>(&self, ledger: &StockLedger<B>) -> Result<usize, StoreError>
    where
        B: EventBus<LedgerEnvelope>,
    {
        let items = ledger.snapshot()?;
        self.save(&items)?;
        Ok(items.len())
    }
}
