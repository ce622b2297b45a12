//! Cache layer that serializes values in and out of the key/value store.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::traits::KvStore;

/// Best-effort response cache over a shared expiring store.
///
/// Reads return `None` and writes return `()` no matter what the store
/// does, so callers always keep an authoritative fetch path.
pub struct ResponseCache<S: KvStore> {
  store: Arc<S>,
  /// Expiry applied by callers that do not pick their own
  ttl_seconds: u64,
}

impl<S: KvStore> ResponseCache<S> {
  /// Create a new response cache with the given store backend.
  pub fn new(store: S) -> Self {
    Self::from_arc(Arc::new(store))
  }

  /// Create a response cache sharing an existing store handle.
  pub fn from_arc(store: Arc<S>) -> Self {
    Self {
      store,
      ttl_seconds: 300,
    }
  }

  /// Set the default expiry window.
  pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
    self.ttl_seconds = ttl_seconds;
    self
  }

  pub fn ttl_seconds(&self) -> u64 {
    self.ttl_seconds
  }

  /// Read and deserialize the value under `key`.
  ///
  /// Store failures and undecodable payloads both read as a miss.
  pub async fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
    let raw = match self.store.get(key).await {
      Ok(Some(raw)) => raw,
      Ok(None) => {
        debug!(key, "Cache miss");
        return None;
      }
      Err(e) => {
        warn!(key, error = %e, "Error reading cache");
        return None;
      }
    };

    match serde_json::from_str(&raw) {
      Ok(value) => {
        debug!(key, "Cache hit");
        Some(value)
      }
      Err(e) => {
        warn!(key, error = %e, "Discarding undecodable cache entry");
        None
      }
    }
  }

  /// Serialize and store `value` under `key` for `ttl_seconds`.
  ///
  /// Failures are logged and swallowed.
  pub async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl_seconds: u64) {
    let raw = match serde_json::to_string(value) {
      Ok(raw) => raw,
      Err(e) => {
        warn!(key, error = %e, "Failed to serialize cache value");
        return;
      }
    };

    match self.store.set_ex(key, raw, ttl_seconds).await {
      Ok(()) => debug!(key, ttl_seconds, "Cached value"),
      Err(e) => warn!(key, error = %e, "Error writing cache"),
    }
  }
}

impl<S: KvStore> Clone for ResponseCache<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
      ttl_seconds: self.ttl_seconds,
    }
  }
}
