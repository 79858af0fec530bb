//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_store;
mod store_handle;

pub use in_memory_store::InMemoryStore;
pub use store_handle::StoreHandle;
