//! Component J: the persistent typed object store.

pub mod persistent_store;
pub mod signature;

pub use persistent_store::{Handle, MonoidStore, PersistentStore};
pub use signature::make_signature;
