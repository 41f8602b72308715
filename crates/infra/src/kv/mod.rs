//! String key/value persistence, the shape of a browser's local storage.
//!
//! Values are opaque blobs. Nothing here is transactional: a write either
//! replaces the previous value or fails, and a crash mid-write may lose it.

pub mod file;
pub mod in_memory;
pub mod r#trait;

pub use file::FileStore;
pub use in_memory::InMemoryStore;
pub use r#trait::{KeyValueStore, StoreError, validate_key};
