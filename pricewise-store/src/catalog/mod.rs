//! Catalog store implementations.
//!
//! - [`MemoryCatalogStore`] - `HashMap` behind a tokio `RwLock`
//! - [`SqliteCatalogStore`] - one SQLite table keyed by `(provider_id, model_id)`
//!
//! Both apply a change batch all-or-nothing.

mod memory;
mod sqlite;

pub use memory::MemoryCatalogStore;
pub use sqlite::SqliteCatalogStore;
