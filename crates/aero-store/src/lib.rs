//! Reactive key-value store for the Aero shell
//!
//! Every durable piece of shell state (process records, window geometry,
//! hook flags, per-app data) goes through this crate:
//!
//! - **StorageBackend**: pluggable persistence (browser storage, REST, or
//!   the in-memory backend used in tests)
//! - **Store / Collection**: namespaced maps with an explicit
//!   `get`/`set`/`subscribe` API
//! - Change notification, including ingestion of changes made by another
//!   browsing context (cross-tab broadcast)
//!
//! The store is single-threaded and cooperative; handles are cheap clones
//! sharing one interior. Writes serialize per key by construction.

mod backend;
mod error;
mod store;

pub use backend::{MemoryBackend, StorageBackend};
pub use error::StoreError;
pub use store::{Collection, Store, SubscriptionId};
