//! Resource loader: cache lookup, paginated aggregation and fetch de-duplication.

use futures::future::{BoxFuture, FutureExt, Shared};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use super::api_types::{has_next_page, normalize};
use super::client::MetaForgeClient;
use super::types::{decode_records, Item, Record, ResourceKind};
use crate::cache::{KvStore, ResponseCache};
use crate::catalog;
use crate::error::LoadError;

type LoadResult = Result<Arc<Vec<Value>>, LoadError>;
type PendingFetch = Shared<BoxFuture<'static, LoadResult>>;

/// In-flight aggregations, at most one per resource type.
///
/// Entries are removed by the aggregation itself when it finishes, whether
/// it succeeded or not, so a failed fetch can be retried by the next caller.
#[derive(Default)]
struct InFlight {
  pending: Mutex<HashMap<ResourceKind, PendingFetch>>,
}

impl InFlight {
  fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ResourceKind, PendingFetch>> {
    self.pending.lock().unwrap_or_else(|e| e.into_inner())
  }

  fn release(&self, kind: ResourceKind) {
    self.lock().remove(&kind);
  }

  fn is_pending(&self, kind: ResourceKind) -> bool {
    self.lock().contains_key(&kind)
  }
}

/// Produces complete resource lists, hiding upstream pagination.
///
/// Cloning is cheap and clones share the cache and the in-flight registry,
/// so de-duplication holds across every handle in the process.
pub struct ResourceLoader<S: KvStore> {
  client: MetaForgeClient,
  cache: ResponseCache<S>,
  in_flight: Arc<InFlight>,
  page_size: u32,
  max_pages: u32,
}

impl<S: KvStore + 'static> ResourceLoader<S> {
  pub fn new(client: MetaForgeClient, cache: ResponseCache<S>) -> Self {
    Self {
      client,
      cache,
      in_flight: Arc::new(InFlight::default()),
      page_size: 50,
      max_pages: 20,
    }
  }

  /// Override the page size and the page ceiling.
  pub fn with_pagination(mut self, page_size: u32, max_pages: u32) -> Self {
    self.page_size = page_size;
    self.max_pages = max_pages.max(1);
    self
  }

  /// Whether an aggregation for `kind` is currently running.
  pub fn is_loading(&self, kind: ResourceKind) -> bool {
    self.in_flight.is_pending(kind)
  }

  /// Complete list for `kind`.
  ///
  /// 1. Serve from the response cache when fresh
  /// 2. Join an aggregation already in flight for this type
  /// 3. Otherwise start one; it caches its result and releases the marker
  pub async fn load(&self, kind: ResourceKind) -> LoadResult {
    if let Some(cached) = self.cache.read::<Vec<Value>>(kind.cache_key()).await {
      return Ok(Arc::new(cached));
    }

    let pending = {
      let mut in_flight = self.in_flight.lock();
      match in_flight.get(&kind) {
        Some(existing) => {
          info!(resource = kind.label(), "Waiting for existing fetch");
          existing.clone()
        }
        None => {
          let fut = self.clone().aggregate_and_release(kind).boxed().shared();
          in_flight.insert(kind, fut.clone());
          fut
        }
      }
    };

    pending.await
  }

  async fn aggregate_and_release(self, kind: ResourceKind) -> LoadResult {
    let result = self.aggregate(kind).await;
    self.in_flight.release(kind);
    result
  }

  async fn aggregate(&self, kind: ResourceKind) -> LoadResult {
    let records = if kind.is_paginated() {
      self.fetch_all_pages(kind).await?
    } else {
      let body = self.client.fetch(kind).await?;
      normalize(kind, body)
    };

    info!(resource = kind.label(), count = records.len(), "Fetched from MetaForge");
    self
      .cache
      .write(kind.cache_key(), &records, self.cache.ttl_seconds())
      .await;

    Ok(Arc::new(records))
  }

  /// Walk pages in order until the upstream reports no next page or the
  /// ceiling is reached. Any failed page aborts the whole walk.
  async fn fetch_all_pages(&self, kind: ResourceKind) -> Result<Vec<Value>, LoadError> {
    let mut all = Vec::new();
    let mut page = 1u32;

    loop {
      let body = self.client.fetch_page(kind, page, self.page_size).await?;
      let has_next = has_next_page(&body);
      all.extend(normalize(kind, body));

      if !has_next {
        break;
      }
      if page >= self.max_pages {
        warn!(
          resource = kind.label(),
          max_pages = self.max_pages,
          "Page ceiling reached, stopping aggregation"
        );
        break;
      }
      page += 1;
    }

    Ok(all)
  }

  /// All items as typed records.
  pub async fn items(&self) -> Result<Vec<Item>, LoadError> {
    self.records(ResourceKind::Items).await
  }

  /// Typed records for any resource type.
  pub async fn records(&self, kind: ResourceKind) -> Result<Vec<Record>, LoadError> {
    let values = self.load(kind).await?;
    Ok(decode_records(&values))
  }

  /// Look an item up by id or slug.
  pub async fn find_item(&self, id: &str) -> Result<Option<Item>, LoadError> {
    let items = self.items().await?;
    Ok(catalog::find_by_id(&items, id).cloned())
  }
}

impl<S: KvStore> Clone for ResourceLoader<S> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      cache: self.cache.clone(),
      in_flight: Arc::clone(&self.in_flight),
      page_size: self.page_size,
      max_pages: self.max_pages,
    }
  }
}
