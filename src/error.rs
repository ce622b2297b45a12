//! Error types shared across the proxy and the browsing client.

use thiserror::Error;

/// Failure while aggregating a resource from the upstream API.
///
/// Cloneable so every waiter on a de-duplicated fetch receives the same error.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
  /// Upstream answered with a non-success status; no partial data is kept.
  #[error("MetaForge API error: {status}")]
  Upstream { status: u16 },
  /// The request never produced a response (DNS, connect, timeout, ...).
  #[error("MetaForge request failed: {0}")]
  Transport(String),
  /// The response body was not valid JSON.
  #[error("MetaForge response could not be decoded: {0}")]
  Decode(String),
}

impl LoadError {
  /// Upstream status code, if the failure carried one.
  pub fn status(&self) -> Option<u16> {
    match self {
      LoadError::Upstream { status } => Some(*status),
      _ => None,
    }
  }
}

impl From<reqwest::Error> for LoadError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_decode() {
      LoadError::Decode(err.to_string())
    } else {
      LoadError::Transport(err.to_string())
    }
  }
}

/// Failure talking to the shared key/value store.
///
/// Never leaves the cache layer: `ResponseCache` logs it and degrades to a miss.
#[derive(Debug, Error)]
pub enum StoreError {
  #[error("Redis error: {0}")]
  Redis(#[from] redis::RedisError),
  #[error("{0}")]
  Backend(String),
}

/// Failure talking to the local image blob store.
#[derive(Debug, Error)]
pub enum BlobStoreError {
  #[error("Image store error: {0}")]
  Sqlite(#[from] rusqlite::Error),
  #[error("Failed to create image store directory: {0}")]
  Io(#[from] std::io::Error),
  #[error("Image store lock poisoned")]
  Poisoned,
}

/// Failure reported by the browsing client.
#[derive(Debug, Error)]
pub enum ClientError {
  #[error("Request to arcfinder server failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("Invalid server URL: {0}")]
  InvalidUrl(#[from] url::ParseError),
  #[error("Server returned {status}: {message}")]
  Server { status: u16, message: String },
}
