//! `StockLedger`: the owned, injectable home of all inventory items.
//!
//! Every mutation runs inside one per-ledger critical section:
//!
//! ```text
//! lock → look up item → handle (validate, decide) → apply (commit) → publish → unlock
//! ```
//!
//! `handle` never mutates and `apply` never fails, so a call either commits all
//! of its changes or leaves the ledger untouched. Publishing inside the lock
//! keeps each item's events in sequence order for subscribers.

use std::collections::HashMap;
use std::slice;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use stockroom_core::{Aggregate, AggregateRoot, DomainError, DomainResult, ItemId, MovementId, UserId};
use stockroom_events::{Event, EventBus, EventEnvelope, InMemoryEventBus};

use crate::config::LedgerConfig;
use crate::item::{
    InventoryCommand, InventoryEvent, InventoryItem, ItemDetails, RecordMovement, RegisterItem,
    SetDiscontinued, UpdateDetails,
};
use crate::movement::{MovementType, StockMovement};
use crate::query::{self, InventorySummary, MovementFeedEntry};

/// Envelope type the ledger publishes after each committed event.
pub type LedgerEnvelope = EventEnvelope<InventoryEvent>;

/// Input for `StockLedger::register_item`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub details: ItemDetails,
    pub initial_stock: i64,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Input for `StockLedger::apply_movement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovement {
    pub kind: MovementType,
    pub quantity: i64,
    pub reason: String,
    pub reference: Option<String>,
    /// Effective date; `None` means `occurred_at`.
    pub date: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// A point-in-time copy of one item's movements, oldest first.
///
/// Taken under the ledger lock and then released, so a caller walking it never
/// blocks writers and never sees a movement recorded afterwards. Iterating
/// never consumes it, so the same history can be walked any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementHistory {
    item_id: ItemId,
    movements: Arc<[StockMovement]>,
}

impl MovementHistory {
    pub fn item_id(&self) -> ItemId {
        self.item_id
    }

    pub fn iter(&self) -> slice::Iter<'_, StockMovement> {
        self.movements.iter()
    }

    pub fn len(&self) -> usize {
        self.movements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movements.is_empty()
    }
}

impl<'a> IntoIterator for &'a MovementHistory {
    type Item = &'a StockMovement;
    type IntoIter = slice::Iter<'a, StockMovement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Items in registration order plus an id index.
#[derive(Debug, Default)]
struct LedgerState {
    items: Vec<InventoryItem>,
    index: HashMap<ItemId, usize>,
}

impl LedgerState {
    fn get(&self, item_id: ItemId) -> Option<&InventoryItem> {
        self.index.get(&item_id).map(|&idx| &self.items[idx])
    }

    fn get_mut(&mut self, item_id: ItemId) -> Option<&mut InventoryItem> {
        let idx = *self.index.get(&item_id)?;
        self.items.get_mut(idx)
    }

    fn insert(&mut self, item: InventoryItem) -> DomainResult<()> {
        let item_id = item.id_typed();
        if self.index.contains_key(&item_id) {
            return Err(DomainError::invariant(format!("duplicate item id {item_id}")));
        }
        self.index.insert(item_id, self.items.len());
        self.items.push(item);
        Ok(())
    }
}

/// Result of one committed command.
struct Committed {
    item: InventoryItem,
    stock_before: i64,
}

/// Inventory stock ledger.
///
/// Owns every `InventoryItem` and applies typed commands to them. Construct one
/// per application and pass it to whatever needs it; `reset`/`restore` cover the
/// rest of its lifecycle.
#[derive(Debug)]
pub struct StockLedger<B> {
    config: LedgerConfig,
    state: Mutex<LedgerState>,
    bus: B,
}

impl StockLedger<Arc<InMemoryEventBus<LedgerEnvelope>>> {
    /// Ledger publishing to a fresh in-memory bus.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(config, Arc::new(InMemoryEventBus::new()))
    }
}

impl<B> StockLedger<B>
where
    B: EventBus<LedgerEnvelope>,
{
    pub fn new(config: LedgerConfig, bus: B) -> Self {
        Self {
            config,
            state: Mutex::new(LedgerState::default()),
            bus,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Register a new item with a fresh id and an empty movement history.
    pub fn register_item(&self, spec: NewItem) -> DomainResult<InventoryItem> {
        let item_id = ItemId::new();
        let mut item = InventoryItem::empty(item_id);
        let command = InventoryCommand::RegisterItem(RegisterItem {
            item_id,
            details: spec.details,
            initial_stock: spec.initial_stock,
            created_by: spec.created_by,
            occurred_at: spec.occurred_at,
        });

        let mut state = self.lock()?;
        let events = item.execute(&command)?;
        state.insert(item.clone())?;
        self.publish(item_id, 0, events);
        drop(state);

        tracing::info!(
            item_id = %item_id,
            name = %item.name(),
            stock = item.current_stock(),
            status = %item.status(),
            "inventory item registered"
        );
        Ok(item)
    }

    /// Record a stock movement and return the updated item.
    ///
    /// Outbound movements larger than the stock on hand are floored at zero or
    /// rejected, depending on `LedgerConfig::underflow`.
    pub fn apply_movement(&self, item_id: ItemId, spec: NewMovement) -> DomainResult<InventoryItem> {
        let command = InventoryCommand::RecordMovement(RecordMovement {
            item_id,
            movement_id: MovementId::new(),
            kind: spec.kind,
            quantity: spec.quantity,
            reason: spec.reason,
            reference: spec.reference,
            date: spec.date,
            created_by: spec.created_by,
            underflow: self.config.underflow,
            occurred_at: spec.occurred_at,
        });

        let Committed { item, stock_before } = self.execute(item_id, &command)?;

        if !spec.kind.is_inbound() && spec.quantity > stock_before {
            tracing::warn!(
                item_id = %item_id,
                requested = spec.quantity,
                available = stock_before,
                "outbound movement exceeds stock; stock floored at zero"
            );
        }
        tracing::info!(
            item_id = %item_id,
            kind = %spec.kind,
            quantity = spec.quantity,
            stock = item.current_stock(),
            status = %item.status(),
            "stock movement recorded"
        );
        Ok(item)
    }

    /// Set or clear the manual `discontinued` state.
    ///
    /// Clearing it re-derives the status from current stock.
    pub fn set_discontinued(
        &self,
        item_id: ItemId,
        discontinued: bool,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<InventoryItem> {
        let command = InventoryCommand::SetDiscontinued(SetDiscontinued {
            item_id,
            discontinued,
            occurred_at,
        });
        let Committed { item, .. } = self.execute(item_id, &command)?;
        tracing::info!(item_id = %item_id, discontinued, status = %item.status(), "discontinued flag set");
        Ok(item)
    }

    /// Replace an item's descriptive details and thresholds. Stock is untouched.
    pub fn update_details(
        &self,
        item_id: ItemId,
        details: ItemDetails,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<InventoryItem> {
        let command = InventoryCommand::UpdateDetails(UpdateDetails {
            item_id,
            details,
            occurred_at,
        });
        let Committed { item, .. } = self.execute(item_id, &command)?;
        tracing::info!(item_id = %item_id, status = %item.status(), "item details updated");
        Ok(item)
    }

    pub fn get(&self, item_id: ItemId) -> DomainResult<InventoryItem> {
        self.lock()?
            .get(item_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("inventory item", item_id))
    }

    /// All items in registration order.
    pub fn list(&self) -> DomainResult<Vec<InventoryItem>> {
        Ok(self.lock()?.items.clone())
    }

    pub fn len(&self) -> DomainResult<usize> {
        Ok(self.lock()?.items.len())
    }

    pub fn is_empty(&self) -> DomainResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Low and out-of-stock items, ascending by stock then name.
    pub fn query_low_stock(&self) -> DomainResult<Vec<InventoryItem>> {
        let items = query::low_stock(&self.lock()?.items);
        tracing::debug!(count = items.len(), "low stock query");
        Ok(items)
    }

    /// One item's movements in insertion order, oldest first.
    pub fn movement_history(&self, item_id: ItemId) -> DomainResult<MovementHistory> {
        let state = self.lock()?;
        let item = state
            .get(item_id)
            .ok_or_else(|| DomainError::not_found("inventory item", item_id))?;
        Ok(MovementHistory {
            item_id,
            movements: Arc::from(item.movements()),
        })
    }

    /// Movements of every item, newest effective date first.
    pub fn movement_feed(&self) -> DomainResult<Vec<MovementFeedEntry>> {
        Ok(query::movement_feed(&self.lock()?.items))
    }

    pub fn summary(&self) -> DomainResult<InventorySummary> {
        Ok(query::summarize(&self.lock()?.items))
    }

    /// Copy of every item, suitable for persisting.
    pub fn snapshot(&self) -> DomainResult<Vec<InventoryItem>> {
        self.list()
    }

    /// Replace the ledger's contents with `items`.
    ///
    /// Every item is integrity-checked first; one bad item rejects the whole
    /// snapshot and the current contents stay in place.
    pub fn restore(&self, items: Vec<InventoryItem>) -> DomainResult<usize> {
        let mut next = LedgerState::default();
        for item in items {
            item.verify_integrity()?;
            next.insert(item)?;
        }

        let count = next.items.len();
        *self.lock()? = next;
        tracing::info!(items = count, "ledger restored from snapshot");
        Ok(count)
    }

    /// Drop every item.
    pub fn reset(&self) -> DomainResult<()> {
        *self.lock()? = LedgerState::default();
        tracing::info!("ledger reset");
        Ok(())
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, LedgerState>> {
        self.state
            .lock()
            .map_err(|_| DomainError::invariant("ledger lock poisoned"))
    }

    fn execute(&self, item_id: ItemId, command: &InventoryCommand) -> DomainResult<Committed> {
        let mut state = self.lock()?;
        let item = state
            .get_mut(item_id)
            .ok_or_else(|| DomainError::not_found("inventory item", item_id))?;

        let stock_before = item.current_stock();
        let base_version = item.version();
        let events = item.execute(command)?;
        let snapshot = item.clone();

        self.publish(item_id, base_version, events);
        Ok(Committed {
            item: snapshot,
            stock_before,
        })
    }

    fn publish(&self, item_id: ItemId, base_version: u64, events: Vec<InventoryEvent>) {
        for (offset, event) in (1u64..).zip(events) {
            let event_type = event.event_type();
            let envelope = EventEnvelope::new(Uuid::now_v7(), item_id, event_type, base_version + offset, event);
            if let Err(err) = self.bus.publish(envelope) {
                tracing::warn!("failed to publish {event_type} for item {item_id}: {err:?}");
            }
        }
    }
}
