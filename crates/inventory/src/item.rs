use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    Aggregate, AggregateRoot, DomainError, DomainResult, FieldErrors, ItemId, MovementId, UserId,
};
use stockroom_events::Event;

use crate::config::UnderflowPolicy;
use crate::movement::{MovementType, StockMovement, apply_delta, replay_stock};
use crate::status::{StockStatus, derive_status};

/// Editable description and thresholds of an item.
///
/// Deliberately has no stock field: on-hand quantity only changes through
/// movements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    pub name: String,
    pub category: String,
    pub unit: String,
    pub location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    pub min_stock: i64,
    pub max_stock: i64,
    /// Price in smallest currency unit.
    pub cost_per_unit: u64,
}

impl ItemDetails {
    /// Push every problem with these details into `errors`.
    pub fn validate_into(&self, errors: &mut FieldErrors) {
        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("unit", &self.unit),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                errors.push(field, "is required");
            }
        }

        if self.min_stock < 0 {
            errors.push("min_stock", "cannot be negative");
        }
        if self.max_stock < 0 {
            errors.push("max_stock", "cannot be negative");
        }
        if self.min_stock > self.max_stock {
            errors.push(
                "min_stock",
                format!(
                    "must not exceed max_stock ({} > {})",
                    self.min_stock, self.max_stock
                ),
            );
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        self.validate_into(&mut errors);
        errors.into_result()
    }
}

/// Aggregate root: InventoryItem.
///
/// Serialized as one flat record (details inline) so a list of items is the
/// persisted snapshot format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    id: ItemId,
    #[serde(flatten)]
    details: ItemDetails,
    initial_stock: i64,
    current_stock: i64,
    status: StockStatus,
    discontinued: bool,
    movements: Vec<StockMovement>,
    last_restocked: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_by: Option<UserId>,
    version: u64,
}

impl InventoryItem {
    /// Create an empty, not-yet-registered aggregate instance for rehydration.
    pub fn empty(id: ItemId) -> Self {
        Self {
            id,
            details: ItemDetails::default(),
            initial_stock: 0,
            current_stock: 0,
            status: StockStatus::OutOfStock,
            discontinued: false,
            movements: Vec::new(),
            last_restocked: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
            created_by: None,
            version: 0,
        }
    }

    /// Rebuild an item by applying its events from scratch.
    pub fn from_events<'a>(id: ItemId, events: impl IntoIterator<Item = &'a InventoryEvent>) -> Self {
        let mut item = Self::empty(id);
        for event in events {
            item.apply(event);
        }
        item
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn is_registered(&self) -> bool {
        self.version > 0
    }

    pub fn details(&self) -> &ItemDetails {
        &self.details
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }

    pub fn min_stock(&self) -> i64 {
        self.details.min_stock
    }

    pub fn max_stock(&self) -> i64 {
        self.details.max_stock
    }

    pub fn cost_per_unit(&self) -> u64 {
        self.details.cost_per_unit
    }

    pub fn initial_stock(&self) -> i64 {
        self.initial_stock
    }

    pub fn current_stock(&self) -> i64 {
        self.current_stock
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    pub fn is_discontinued(&self) -> bool {
        self.discontinued
    }

    /// Movements in ledger (insertion) order, oldest first.
    pub fn movements(&self) -> &[StockMovement] {
        &self.movements
    }

    pub fn last_restocked(&self) -> DateTime<Utc> {
        self.last_restocked
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn created_by(&self) -> Option<UserId> {
        self.created_by
    }

    /// Stock value in smallest currency unit.
    pub fn stock_value(&self) -> u64 {
        (self.current_stock.max(0) as u64).saturating_mul(self.details.cost_per_unit)
    }

    /// Stock recomputed from `initial_stock` and the movement history.
    pub fn replayed_stock(&self) -> i64 {
        replay_stock(self.initial_stock, &self.movements)
    }

    /// Check every invariant a registered item must hold.
    ///
    /// Used on records that did not come through `handle`/`apply`, such as a
    /// reloaded snapshot.
    pub fn verify_integrity(&self) -> DomainResult<()> {
        if !self.is_registered() {
            return Err(DomainError::invariant(format!("item {} was never registered", self.id)));
        }
        self.details.validate()?;

        if self.initial_stock < 0 || self.current_stock < 0 {
            return Err(DomainError::invariant(format!("item {} has negative stock", self.id)));
        }

        let replayed = self.replayed_stock();
        if replayed != self.current_stock {
            return Err(DomainError::invariant(format!(
                "item {}: movement replay gives {replayed}, recorded stock is {}",
                self.id, self.current_stock
            )));
        }

        if let Some(bad) = self.movements.iter().find(|m| m.quantity <= 0) {
            return Err(DomainError::invariant(format!(
                "item {}: movement {} has non-positive quantity",
                self.id, bad.id
            )));
        }

        let expected = derive_status(self.current_stock, self.details.min_stock, self.discontinued);
        if self.status != expected {
            return Err(DomainError::invariant(format!(
                "item {}: status is {}, stock implies {expected}",
                self.id, self.status
            )));
        }

        Ok(())
    }
}

impl AggregateRoot for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub item_id: ItemId,
    pub details: ItemDetails,
    pub initial_stock: i64,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordMovement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMovement {
    pub item_id: ItemId,
    pub movement_id: MovementId,
    pub kind: MovementType,
    pub quantity: i64,
    pub reason: String,
    pub reference: Option<String>,
    /// Effective date; defaults to `occurred_at`.
    pub date: Option<DateTime<Utc>>,
    pub created_by: Option<UserId>,
    pub underflow: UnderflowPolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SetDiscontinued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDiscontinued {
    pub item_id: ItemId,
    pub discontinued: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateDetails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateDetails {
    pub item_id: ItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    RegisterItem(RegisterItem),
    RecordMovement(RecordMovement),
    SetDiscontinued(SetDiscontinued),
    UpdateDetails(UpdateDetails),
}

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub item_id: ItemId,
    pub details: ItemDetails,
    pub initial_stock: i64,
    pub created_by: Option<UserId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockMoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoved {
    pub item_id: ItemId,
    pub movement: StockMovement,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DiscontinuedChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscontinuedChanged {
    pub item_id: ItemId,
    pub discontinued: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DetailsUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsUpdated {
    pub item_id: ItemId,
    pub details: ItemDetails,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemRegistered(ItemRegistered),
    StockMoved(StockMoved),
    DiscontinuedChanged(DiscontinuedChanged),
    DetailsUpdated(DetailsUpdated),
}

impl InventoryEvent {
    pub fn item_id(&self) -> ItemId {
        match self {
            InventoryEvent::ItemRegistered(e) => e.item_id,
            InventoryEvent::StockMoved(e) => e.item_id,
            InventoryEvent::DiscontinuedChanged(e) => e.item_id,
            InventoryEvent::DetailsUpdated(e) => e.item_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemRegistered(_) => "inventory.item.registered",
            InventoryEvent::StockMoved(_) => "inventory.item.stock_moved",
            InventoryEvent::DiscontinuedChanged(_) => "inventory.item.discontinued_changed",
            InventoryEvent::DetailsUpdated(_) => "inventory.item.details_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemRegistered(e) => e.occurred_at,
            InventoryEvent::StockMoved(e) => e.occurred_at,
            InventoryEvent::DiscontinuedChanged(e) => e.occurred_at,
            InventoryEvent::DetailsUpdated(e) => e.occurred_at,
        }
    }
}

impl Aggregate for InventoryItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemRegistered(e) => {
                self.id = e.item_id;
                self.details = e.details.clone();
                self.initial_stock = e.initial_stock;
                self.current_stock = e.initial_stock;
                self.discontinued = false;
                self.movements.clear();
                self.created_by = e.created_by;
                self.last_restocked = e.occurred_at;
            }
            InventoryEvent::StockMoved(e) => {
                self.current_stock = apply_delta(self.current_stock, e.movement.signed_delta());
                if e.movement.kind == MovementType::In && e.movement.date > self.last_restocked {
                    self.last_restocked = e.movement.date;
                }
                self.movements.push(e.movement.clone());
            }
            InventoryEvent::DiscontinuedChanged(e) => {
                self.discontinued = e.discontinued;
            }
            InventoryEvent::DetailsUpdated(e) => {
                self.details = e.details.clone();
            }
        }

        self.updated_at = event.occurred_at();
        self.status = derive_status(self.current_stock, self.details.min_stock, self.discontinued);
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::RegisterItem(cmd) => self.handle_register(cmd),
            InventoryCommand::RecordMovement(cmd) => self.handle_record_movement(cmd),
            InventoryCommand::SetDiscontinued(cmd) => self.handle_set_discontinued(cmd),
            InventoryCommand::UpdateDetails(cmd) => self.handle_update_details(cmd),
        }
    }
}

impl InventoryItem {
    fn ensure_registered(&self, item_id: ItemId) -> Result<(), DomainError> {
        if !self.is_registered() || self.id != item_id {
            return Err(DomainError::not_found("inventory item", item_id));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.is_registered() {
            return Err(DomainError::invariant(format!("item {} already registered", self.id)));
        }
        if self.id != cmd.item_id {
            return Err(DomainError::invariant("item_id mismatch"));
        }

        let mut errors = FieldErrors::new();
        cmd.details.validate_into(&mut errors);
        if cmd.initial_stock < 0 {
            errors.push("initial_stock", "cannot be negative");
        }
        errors.into_result()?;

        Ok(vec![InventoryEvent::ItemRegistered(ItemRegistered {
            item_id: cmd.item_id,
            details: cmd.details.clone(),
            initial_stock: cmd.initial_stock,
            created_by: cmd.created_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_movement(&self, cmd: &RecordMovement) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_registered(cmd.item_id)?;

        let mut errors = FieldErrors::new();
        if cmd.quantity <= 0 {
            errors.push("quantity", "must be greater than zero");
        }
        if cmd.reason.trim().is_empty() {
            errors.push("reason", "is required");
        }
        errors.into_result()?;

        if cmd.underflow == UnderflowPolicy::Reject
            && !cmd.kind.is_inbound()
            && cmd.quantity > self.current_stock
        {
            return Err(DomainError::InsufficientStock {
                item: self.id.to_string(),
                available: self.current_stock,
                requested: cmd.quantity,
            });
        }

        let reference = cmd
            .reference
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        Ok(vec![InventoryEvent::StockMoved(StockMoved {
            item_id: cmd.item_id,
            movement: StockMovement {
                id: cmd.movement_id,
                kind: cmd.kind,
                quantity: cmd.quantity,
                reason: cmd.reason.trim().to_string(),
                reference,
                date: cmd.date.unwrap_or(cmd.occurred_at),
                created_by: cmd.created_by,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_set_discontinued(&self, cmd: &SetDiscontinued) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_registered(cmd.item_id)?;

        if self.discontinued == cmd.discontinued {
            return Ok(vec![]);
        }

        Ok(vec![InventoryEvent::DiscontinuedChanged(DiscontinuedChanged {
            item_id: cmd.item_id,
            discontinued: cmd.discontinued,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update_details(&self, cmd: &UpdateDetails) -> Result<Vec<InventoryEvent>, DomainError> {
        self.ensure_registered(cmd.item_id)?;
        cmd.details.validate()?;

        if self.details == cmd.details {
            return Ok(vec![]);
        }

        Ok(vec![InventoryEvent::DetailsUpdated(DetailsUpdated {
            item_id: cmd.item_id,
            details: cmd.details.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
