//! Store abstraction behind the response cache.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::StoreError;

/// A shared key/value store whose entries expire on their own.
///
/// Implementations deal in raw strings; serialization belongs to
/// [`ResponseCache`](super::ResponseCache).
#[async_trait]
pub trait KvStore: Send + Sync {
  /// Fetch the raw value for `key`, `None` if absent or expired.
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

  /// Store `value` under `key`, expiring after `ttl_seconds`.
  async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError>;
}

#[async_trait]
impl<S: KvStore + ?Sized> KvStore for Arc<S> {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    (**self).get(key).await
  }

  async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
    (**self).set_ex(key, value, ttl_seconds).await
  }
}
