//! Blob store trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::cache::CacheStats;
use crate::error::BlobStoreError;

/// A cached image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEntry {
  /// Source URL, the primary key
  pub url: String,
  pub blob: Vec<u8>,
  /// When the entry was written
  pub timestamp: DateTime<Utc>,
}

/// Trait for image blob storage backends.
pub trait BlobStore: Send + Sync {
  /// Get the entry stored for exactly this URL.
  fn get(&self, url: &str) -> Result<Option<ImageEntry>, BlobStoreError>;

  /// Insert or overwrite the entry for `entry.url`.
  fn put(&self, entry: &ImageEntry) -> Result<(), BlobStoreError>;

  /// Entry count and total blob size.
  fn stats(&self) -> Result<CacheStats, BlobStoreError>;

  /// Delete every entry.
  fn clear(&self) -> Result<(), BlobStoreError>;
}

/// SQLite-based blob store.
pub struct SqliteBlobStore {
  conn: Mutex<Connection>,
}

/// Schema for the image table.
const IMAGE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS images (
    url TEXT PRIMARY KEY,
    blob BLOB NOT NULL,
    timestamp INTEGER NOT NULL
);
"#;

impl SqliteBlobStore {
  /// Open or create the store at `path`.
  pub fn open(path: &Path) -> Result<Self, BlobStoreError> {
    if let Some(parent) = path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)?;
      }
    }

    let conn = Connection::open(path)?;
    Self::with_connection(conn)
  }

  /// A throwaway store that lives as long as the value.
  pub fn open_in_memory() -> Result<Self, BlobStoreError> {
    Self::with_connection(Connection::open_in_memory()?)
  }

  fn with_connection(conn: Connection) -> Result<Self, BlobStoreError> {
    conn.execute_batch(IMAGE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, BlobStoreError> {
    self.conn.lock().map_err(|_| BlobStoreError::Poisoned)
  }
}

impl BlobStore for SqliteBlobStore {
  fn get(&self, url: &str) -> Result<Option<ImageEntry>, BlobStoreError> {
    let conn = self.conn()?;
    let row: Option<(Vec<u8>, i64)> = conn
      .query_row(
        "SELECT blob, timestamp FROM images WHERE url = ?",
        params![url],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()?;

    Ok(row.map(|(blob, millis)| ImageEntry {
      url: url.to_string(),
      blob,
      timestamp: DateTime::from_timestamp_millis(millis).unwrap_or_default(),
    }))
  }

  fn put(&self, entry: &ImageEntry) -> Result<(), BlobStoreError> {
    let conn = self.conn()?;
    conn.execute(
      "INSERT OR REPLACE INTO images (url, blob, timestamp) VALUES (?, ?, ?)",
      params![entry.url, entry.blob, entry.timestamp.timestamp_millis()],
    )?;
    Ok(())
  }

  fn stats(&self) -> Result<CacheStats, BlobStoreError> {
    let conn = self.conn()?;
    let (count, total): (i64, i64) = conn.query_row(
      "SELECT COUNT(*), COALESCE(SUM(LENGTH(blob)), 0) FROM images",
      [],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    Ok(CacheStats {
      count: count.max(0) as u64,
      total_bytes: total.max(0) as u64,
    })
  }

  fn clear(&self) -> Result<(), BlobStoreError> {
    let conn = self.conn()?;
    conn.execute("DELETE FROM images", [])?;
    Ok(())
  }
}
