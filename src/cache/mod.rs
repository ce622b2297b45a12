//! Shared expiring response cache.
//!
//! This module wraps an external key/value store with expiry (Redis in
//! production) and exposes a best-effort read/write contract:
//! - Values are JSON-serialized by the cache, never by the caller
//! - Every accessor returns a value or nothing; store failures are logged
//!   and swallowed so a broken cache can never fail a request
//! - Expiry is delegated to the store

mod layer;
mod storage;
mod traits;

pub use layer::ResponseCache;
pub use storage::{MemoryStore, RedisStore};
pub use traits::KvStore;
