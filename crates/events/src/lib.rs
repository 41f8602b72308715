//! Domain events and their distribution.
//!
//! Events describe committed ledger changes; the bus fans them out to whoever
//! the surrounding application wires up (persistence, notifications, logs).

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
