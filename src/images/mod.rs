//! Persistent image cache.
//!
//! Image bytes are stored in a local SQLite database keyed by source URL
//! and survive restarts. Every operation is best-effort: a broken store
//! degrades to a cache miss, and a failed download degrades to the remote
//! URL, so displaying an image never fails because of the cache.

mod cache;
mod store;

pub use cache::{CacheStats, ImageCache, ImageRef};
pub use store::{BlobStore, ImageEntry, SqliteBlobStore};
