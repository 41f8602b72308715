//! Read helpers over item lists. Pure functions; the ledger calls them on a
//! consistent view taken under its lock.

use core::cmp::Ordering;

use serde::{Deserialize, Serialize};

use stockroom_core::ItemId;

use crate::item::InventoryItem;
use crate::movement::StockMovement;
use crate::status::StockStatus;

/// Dashboard totals for the whole stock room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub item_count: usize,
    pub total_units: i64,
    /// Σ current stock × cost per unit, smallest currency unit.
    pub total_value: u64,
    pub in_stock: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub discontinued: usize,
}

/// A movement tagged with the item it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementFeedEntry {
    pub item_id: ItemId,
    pub item_name: String,
    pub movement: StockMovement,
}

/// Low/empty items, ascending by stock, then name, then id.
pub fn low_stock<'a>(items: impl IntoIterator<Item = &'a InventoryItem>) -> Vec<InventoryItem> {
    let mut out: Vec<InventoryItem> = items
        .into_iter()
        .filter(|item| item.status().needs_attention())
        .cloned()
        .collect();
    out.sort_by(reorder_priority);
    out
}

fn reorder_priority(a: &InventoryItem, b: &InventoryItem) -> Ordering {
    a.current_stock()
        .cmp(&b.current_stock())
        .then_with(|| a.name().cmp(b.name()))
        .then_with(|| a.id_typed().cmp(&b.id_typed()))
}

pub fn summarize<'a>(items: impl IntoIterator<Item = &'a InventoryItem>) -> InventorySummary {
    items
        .into_iter()
        .fold(InventorySummary::default(), |mut summary, item| {
            summary.item_count += 1;
            summary.total_units = summary.total_units.saturating_add(item.current_stock());
            summary.total_value = summary.total_value.saturating_add(item.stock_value());
            match item.status() {
                StockStatus::InStock => summary.in_stock += 1,
                StockStatus::LowStock => summary.low_stock += 1,
                StockStatus::OutOfStock => summary.out_of_stock += 1,
                StockStatus::Discontinued => summary.discontinued += 1,
            }
            summary
        })
}

/// Every movement across `items`, newest effective date first.
///
/// Equal dates keep item order, then ledger order within the item.
pub fn movement_feed<'a>(items: impl IntoIterator<Item = &'a InventoryItem>) -> Vec<MovementFeedEntry> {
    let mut feed: Vec<MovementFeedEntry> = items
        .into_iter()
        .flat_map(|item| {
            item.movements().iter().map(move |movement| MovementFeedEntry {
                item_id: item.id_typed(),
                item_name: item.name().to_string(),
                movement: movement.clone(),
            })
        })
        .collect();
    feed.sort_by(|a, b| b.movement.date.cmp(&a.movement.date));
    feed
}
