//! Key/value store implementations: Redis and an in-process map.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::info;

use super::traits::KvStore;
use crate::error::StoreError;

/// Redis-backed store.
///
/// The connection is established on first use, so an unreachable server
/// never blocks startup; a failed connect is retried on the next access.
pub struct RedisStore {
  client: redis::Client,
  conn: OnceCell<ConnectionManager>,
}

impl RedisStore {
  /// Create a store for the given connection string without connecting.
  pub fn open(url: &str) -> Result<Self, StoreError> {
    let client = redis::Client::open(url)?;
    Ok(Self {
      client,
      conn: OnceCell::new(),
    })
  }

  async fn connection(&self) -> Result<ConnectionManager, StoreError> {
    let conn = self
      .conn
      .get_or_try_init(|| async {
        let manager = self.client.get_connection_manager().await?;
        info!("Connected to Redis");
        Ok::<_, StoreError>(manager)
      })
      .await?;
    Ok(conn.clone())
  }
}

#[async_trait]
impl KvStore for RedisStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let mut conn = self.connection().await?;
    let value: Option<String> = conn.get(key).await?;
    Ok(value)
  }

  async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
    let mut conn = self.connection().await?;
    conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await?;
    Ok(())
  }
}

/// In-process store with per-entry expiry.
///
/// Single-instance only; useful for local runs and tests.
#[derive(Default)]
pub struct MemoryStore {
  entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Number of live (unexpired) entries.
  pub fn len(&self) -> usize {
    let now = Instant::now();
    self
      .entries
      .lock()
      .map(|entries| entries.values().filter(|(_, exp)| *exp > now).count())
      .unwrap_or(0)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

#[async_trait]
impl KvStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
    let mut entries = self
      .entries
      .lock()
      .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?;

    if let Some((value, expires_at)) = entries.get(key) {
      if *expires_at > Instant::now() {
        return Ok(Some(value.clone()));
      }
    }
    entries.remove(key);
    Ok(None)
  }

  async fn set_ex(&self, key: &str, value: String, ttl_seconds: u64) -> Result<(), StoreError> {
    let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
    self
      .entries
      .lock()
      .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?
      .insert(key.to_string(), (value, expires_at));
    Ok(())
  }
}
