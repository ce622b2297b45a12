use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

use super::store::{BlobStore, ImageEntry, SqliteBlobStore};

/// Cache introspection result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
  pub count: u64,
  pub total_bytes: u64,
}

/// Something the display layer can render.
///
/// A `Cached` reference owns its bytes; dropping it releases them, so
/// holders should drop it once the image is no longer shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
  /// Bytes served from the local store or freshly downloaded
  Cached { url: String, bytes: Vec<u8> },
  /// Degraded path: let the display layer load the remote URL itself
  Remote { url: String },
  /// No source at all; show the fallback element
  Placeholder,
}

impl ImageRef {
  pub fn is_cached(&self) -> bool {
    matches!(self, ImageRef::Cached { .. })
  }

  pub fn bytes(&self) -> Option<&[u8]> {
    match self {
      ImageRef::Cached { bytes, .. } => Some(bytes),
      _ => None,
    }
  }

  pub fn source_url(&self) -> Option<&str> {
    match self {
      ImageRef::Cached { url, .. } | ImageRef::Remote { url } => Some(url),
      ImageRef::Placeholder => None,
    }
  }
}

/// Persistent image cache keyed by source URL.
///
/// Concurrent first-time resolves of the same URL may both download and
/// both write; the last write wins.
pub struct ImageCache<S: BlobStore = SqliteBlobStore> {
  /// `None` when the store could not be opened; every lookup then misses
  store: Option<S>,
  http: reqwest::Client,
}

impl ImageCache<SqliteBlobStore> {
  /// Open the cache at `path`, running without persistence if that fails.
  pub fn open(path: &Path, http: reqwest::Client) -> Self {
    match SqliteBlobStore::open(path) {
      Ok(store) => {
        info!("Image cache database: {}", path.display());
        Self::with_store(store, http)
      }
      Err(e) => {
        warn!(error = %e, "Failed to open image cache, images will not be cached");
        Self {
          store: None,
          http,
        }
      }
    }
  }
}

impl<S: BlobStore> ImageCache<S> {
  pub fn with_store(store: S, http: reqwest::Client) -> Self {
    Self {
      store: Some(store),
      http,
    }
  }

  /// Look up `url`; `None` on a miss or any store failure.
  pub fn get(&self, url: &str) -> Option<ImageRef> {
    if url.is_empty() {
      return None;
    }
    let store = self.store.as_ref()?;

    match store.get(url) {
      Ok(Some(entry)) => {
        debug!(url, "Image cache hit");
        Some(ImageRef::Cached {
          url: entry.url,
          bytes: entry.blob,
        })
      }
      Ok(None) => None,
      Err(e) => {
        warn!(url, error = %e, "Failed to read image cache");
        None
      }
    }
  }

  /// Store or overwrite the bytes for `url`, stamped with the current time.
  pub fn put(&self, url: &str, bytes: &[u8]) {
    let Some(store) = self.store.as_ref() else {
      return;
    };

    let entry = ImageEntry {
      url: url.to_string(),
      blob: bytes.to_vec(),
      timestamp: Utc::now(),
    };

    match store.put(&entry) {
      Ok(()) => debug!(url, size = bytes.len(), "Cached image"),
      Err(e) => warn!(url, error = %e, "Failed to cache image"),
    }
  }

  /// Cached bytes for `url`, downloading and caching them on a miss.
  ///
  /// A failed download returns the remote URL instead of an error.
  pub async fn resolve(&self, url: &str) -> ImageRef {
    if url.is_empty() {
      return ImageRef::Placeholder;
    }

    if let Some(cached) = self.get(url) {
      return cached;
    }

    match self.download(url).await {
      Ok(bytes) => {
        self.put(url, &bytes);
        ImageRef::Cached {
          url: url.to_string(),
          bytes,
        }
      }
      Err(e) => {
        warn!(url, error = %e, "Failed to fetch image");
        ImageRef::Remote {
          url: url.to_string(),
        }
      }
    }
  }

  async fn download(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = self.http.get(url).send().await?.error_for_status()?;
    let bytes = response.bytes().await?;
    Ok(bytes.to_vec())
  }

  /// Entry count and total size; zeros when the store is unavailable.
  pub fn stats(&self) -> CacheStats {
    let Some(store) = self.store.as_ref() else {
      return CacheStats::default();
    };

    store.stats().unwrap_or_else(|e| {
      warn!(error = %e, "Failed to read image cache stats");
      CacheStats::default()
    })
  }

  /// Drop every cached image. Safe to call repeatedly.
  pub fn clear(&self) {
    let Some(store) = self.store.as_ref() else {
      return;
    };

    match store.clear() {
      Ok(()) => info!("Image cache cleared"),
      Err(e) => warn!(error = %e, "Failed to clear image cache"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::BlobStoreError;

  struct BrokenStore;

  impl BlobStore for BrokenStore {
    fn get(&self, _url: &str) -> Result<Option<ImageEntry>, BlobStoreError> {
      Err(BlobStoreError::Poisoned)
    }

    fn put(&self, _entry: &ImageEntry) -> Result<(), BlobStoreError> {
      Err(BlobStoreError::Poisoned)
    }

    fn stats(&self) -> Result<CacheStats, BlobStoreError> {
      Err(BlobStoreError::Poisoned)
    }

    fn clear(&self) -> Result<(), BlobStoreError> {
      Err(BlobStoreError::Poisoned)
    }
  }

  fn memory_cache() -> ImageCache<SqliteBlobStore> {
    ImageCache::with_store(
      SqliteBlobStore::open_in_memory().unwrap(),
      reqwest::Client::new(),
    )
  }

  #[test]
  fn empty_url_is_not_found() {
    assert!(memory_cache().get("").is_none());
  }

  #[test]
  fn put_then_get() {
    let cache = memory_cache();
    cache.put("https://img/a.png", &[1, 2, 3]);

    let hit = cache.get("https://img/a.png").unwrap();
    assert!(hit.is_cached());
    assert_eq!(hit.bytes(), Some(&[1u8, 2, 3][..]));
    assert_eq!(hit.source_url(), Some("https://img/a.png"));
  }

  #[test]
  fn stats_count_and_bytes() {
    let cache = memory_cache();
    cache.put("a", &[0; 10]);
    cache.put("b", &[0; 5]);
    cache.put("c", &[0; 1]);

    assert_eq!(
      cache.stats(),
      CacheStats {
        count: 3,
        total_bytes: 16
      }
    );
  }

  #[test]
  fn clear_is_idempotent() {
    let cache = memory_cache();
    cache.put("a", &[1]);
    cache.clear();
    cache.clear();
    assert_eq!(cache.stats().count, 0);
    assert!(cache.get("a").is_none());
  }

  #[test]
  fn broken_store_degrades_quietly() {
    let cache = ImageCache::with_store(BrokenStore, reqwest::Client::new());
    cache.put("a", &[1]);
    assert!(cache.get("a").is_none());
    assert_eq!(cache.stats(), CacheStats::default());
    cache.clear();
  }

  #[tokio::test]
  async fn resolve_empty_url_is_placeholder() {
    assert_eq!(memory_cache().resolve("").await, ImageRef::Placeholder);
  }

  #[test]
  fn unopenable_store_runs_without_persistence() {
    let dir = tempfile::TempDir::new().unwrap();
    // A directory cannot be opened as a database file.
    let cache = ImageCache::open(dir.path(), reqwest::Client::new());
    cache.put("a", &[1]);
    assert!(cache.get("a").is_none());
    assert_eq!(cache.stats().count, 0);
  }
}
