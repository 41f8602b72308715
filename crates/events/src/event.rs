use chrono::{DateTime, Utc};

/// A committed change to one inventory item.
///
/// The ledger emits these from `handle`, applies them to the item and then
/// publishes each one wrapped in an `EventEnvelope`. Once published an event is
/// never edited: a later correction is a new movement, not a rewrite.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name subscribers match on, e.g. `inventory.item.stock_moved`.
    fn event_type(&self) -> &'static str;

    /// Payload schema version; bumped when a snapshot reader must branch on it.
    fn version(&self) -> u32;

    /// Business time supplied with the command, not the wall clock at publish.
    fn occurred_at(&self) -> DateTime<Utc>;
}
