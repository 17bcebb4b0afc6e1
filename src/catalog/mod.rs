//! Catalog metadata: table shapes and the cache that holds them.

mod cache;
mod store;
mod types;

pub use cache::ReadThroughCache;
pub use store::MetadataStore;
pub(crate) use store::bounded;
pub use types::*;
