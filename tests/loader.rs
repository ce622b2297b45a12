//! Resource loader against a mocked MetaForge API.

use std::sync::Arc;
use std::time::Duration;

use arcfinder::cache::{KvStore, MemoryStore, ResponseCache};
use arcfinder::error::{LoadError, StoreError};
use arcfinder::metaforge::{MetaForgeClient, ResourceKind, ResourceLoader};
use async_trait::async_trait;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One page of the paginated item endpoint.
fn item_page(page: u32, ids: &[&str], has_next: bool) -> Value {
  let data: Vec<Value> = ids
    .iter()
    .map(|id| json!({"id": id, "name": format!("Item {}", id)}))
    .collect();
  json!({
    "data": data,
    "pagination": {
      "page": page,
      "limit": 50,
      "hasNextPage": has_next,
      "hasPrevPage": page > 1
    }
  })
}

fn loader_for<S: KvStore + 'static>(server: &MockServer, store: Arc<S>) -> ResourceLoader<S> {
  let client = MetaForgeClient::with_http(reqwest::Client::new(), &server.uri()).unwrap();
  ResourceLoader::new(client, ResponseCache::from_arc(store).with_ttl(300))
}

fn ids(list: &[Value]) -> Vec<&str> {
  list.iter().map(|v| v["id"].as_str().unwrap()).collect()
}

/// Reads always miss, writes always fail.
struct WriteFailingStore;

#[async_trait]
impl KvStore for WriteFailingStore {
  async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
    Ok(None)
  }

  async fn set_ex(&self, _key: &str, _value: String, _ttl: u64) -> Result<(), StoreError> {
    Err(StoreError::Backend("READONLY".into()))
  }
}

// ── pagination ───────────────────────────────────────────────────────

#[tokio::test]
async fn aggregates_pages_in_order() {
  let server = MockServer::start().await;
  let pages: [(u32, [&str; 2], bool); 3] = [
    (1, ["a", "b"], true),
    (2, ["c", "d"], true),
    (3, ["e", "f"], false),
  ];
  for (page, page_ids, next) in pages {
    Mock::given(method("GET"))
      .and(path("/items"))
      .and(query_param("page", page.to_string()))
      .and(query_param("limit", "50"))
      .respond_with(ResponseTemplate::new(200).set_body_json(item_page(page, &page_ids, next)))
      .expect(1)
      .mount(&server)
      .await;
  }
  Mock::given(method("GET"))
    .and(path("/items"))
    .and(query_param("page", "4"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(4, &["z"], false)))
    .expect(0)
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let items = loader.load(ResourceKind::Items).await.unwrap();

  assert_eq!(ids(&items), vec!["a", "b", "c", "d", "e", "f"]);
  server.verify().await;
}

#[tokio::test]
async fn stops_at_page_ceiling() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(1, &["x"], true)))
    .expect(20)
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let items = loader.load(ResourceKind::Items).await.unwrap();

  assert_eq!(items.len(), 20);
  server.verify().await;
}

#[tokio::test]
async fn custom_ceiling_is_honoured() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .and(query_param("limit", "10"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(1, &["x"], true)))
    .expect(3)
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new())).with_pagination(10, 3);
  assert_eq!(loader.load(ResourceKind::Items).await.unwrap().len(), 3);
  server.verify().await;
}

#[tokio::test]
async fn failed_page_aborts_without_partial_data() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .and(query_param("page", "1"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(1, &["a"], true)))
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .and(query_param("page", "2"))
    .respond_with(ResponseTemplate::new(503))
    .mount(&server)
    .await;

  let store = Arc::new(MemoryStore::new());
  let loader = loader_for(&server, store.clone());
  let err = loader.load(ResourceKind::Items).await.unwrap_err();

  assert_eq!(err, LoadError::Upstream { status: 503 });
  assert!(store.is_empty(), "nothing may be cached after a failed aggregation");
  assert!(!loader.is_loading(ResourceKind::Items));
}

#[tokio::test]
async fn failure_releases_marker_for_retry() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .respond_with(ResponseTemplate::new(500))
    .up_to_n_times(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(1, &["a"], false)))
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  assert!(loader.load(ResourceKind::Items).await.is_err());

  let retried = loader.load(ResourceKind::Items).await.unwrap();
  assert_eq!(ids(&retried), vec!["a"]);
}

// ── caching & de-duplication ─────────────────────────────────────────

#[tokio::test]
async fn second_load_is_served_from_cache() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(1, &["a", "b"], false)))
    .expect(1)
    .mount(&server)
    .await;

  let store = Arc::new(MemoryStore::new());
  let loader = loader_for(&server, store.clone());

  let first = loader.load(ResourceKind::Items).await.unwrap();
  let second = loader.load(ResourceKind::Items).await.unwrap();

  assert_eq!(first, second);
  assert!(store.get("arcfinder:items").await.unwrap().is_some());
  server.verify().await;
}

#[tokio::test]
async fn concurrent_loads_share_one_aggregation() {
  let server = MockServer::start().await;
  for (page, next) in [(1u32, true), (2, false)] {
    Mock::given(method("GET"))
      .and(path("/items"))
      .and(query_param("page", page.to_string()))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(item_page(page, &[&format!("p{}", page)], next))
          .set_delay(Duration::from_millis(150)),
      )
      .expect(1)
      .mount(&server)
      .await;
  }

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let other_handle = loader.clone();

  let (a, b, c) = tokio::join!(
    loader.load(ResourceKind::Items),
    loader.load(ResourceKind::Items),
    other_handle.load(ResourceKind::Items),
  );

  let a = a.unwrap();
  assert_eq!(ids(&a), vec!["p1", "p2"]);
  assert_eq!(a, b.unwrap());
  assert_eq!(a, c.unwrap());
  assert!(!loader.is_loading(ResourceKind::Items));
  server.verify().await;
}

#[tokio::test]
async fn concurrent_waiters_all_see_the_failure() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/quests"))
    .respond_with(ResponseTemplate::new(502).set_delay(Duration::from_millis(100)))
    .expect(1)
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let (a, b) = tokio::join!(
    loader.load(ResourceKind::Quests),
    loader.load(ResourceKind::Quests)
  );

  assert_eq!(a.unwrap_err(), LoadError::Upstream { status: 502 });
  assert_eq!(b.unwrap_err(), LoadError::Upstream { status: 502 });
  server.verify().await;
}

#[tokio::test]
async fn different_resources_fetch_independently() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/quests"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "q1"}])))
    .expect(1)
    .mount(&server)
    .await;
  Mock::given(method("GET"))
    .and(path("/arcs"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": [{"id": "tick"}]})))
    .expect(1)
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let (quests, arcs) = tokio::join!(
    loader.load(ResourceKind::Quests),
    loader.load(ResourceKind::Arcs)
  );

  assert_eq!(ids(&quests.unwrap()), vec!["q1"]);
  assert_eq!(ids(&arcs.unwrap()), vec!["tick"]);
  server.verify().await;
}

#[tokio::test]
async fn cached_value_skips_upstream() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .respond_with(ResponseTemplate::new(500))
    .expect(0)
    .mount(&server)
    .await;

  let store = Arc::new(MemoryStore::new());
  store
    .set_ex("arcfinder:quests", r#"[{"id":"cached"}]"#.into(), 300)
    .await
    .unwrap();

  let loader = loader_for(&server, store);
  let quests = loader.load(ResourceKind::Quests).await.unwrap();

  assert_eq!(ids(&quests), vec!["cached"]);
  server.verify().await;
}

#[tokio::test]
async fn cache_write_failure_still_returns_data() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .respond_with(ResponseTemplate::new(200).set_body_json(item_page(1, &["a", "b"], false)))
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(WriteFailingStore));
  let items = loader.load(ResourceKind::Items).await.unwrap();

  assert_eq!(ids(&items), vec!["a", "b"]);
}

// ── normalization & lookup ───────────────────────────────────────────

#[tokio::test]
async fn traders_are_normalized() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/traders"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "success": true,
      "data": {"Apollo": [{"id": "gun", "trader_price": 100}]}
    })))
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let traders = loader.load(ResourceKind::Traders).await.unwrap();

  assert_eq!(
    *traders,
    vec![json!({
      "id": "apollo",
      "name": "Apollo",
      "items": [{"id": "gun", "trader_price": 100}],
      "description": "Trader Apollo"
    })]
  );
}

#[tokio::test]
async fn unrecognized_shape_yields_empty_list() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/quests"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({"quests": "soon"})))
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  assert!(loader.load(ResourceKind::Quests).await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/arcs"))
    .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));
  let err = loader.load(ResourceKind::Arcs).await.unwrap_err();
  assert!(matches!(err, LoadError::Decode(_)), "{:?}", err);
}

#[tokio::test]
async fn find_item_by_slug() {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/items"))
    .respond_with(ResponseTemplate::new(200).set_body_json(json!({
      "data": [{"id": "abc123", "name": "Plasma Rifle"}],
      "pagination": {"hasNextPage": false}
    })))
    .mount(&server)
    .await;

  let loader = loader_for(&server, Arc::new(MemoryStore::new()));

  for key in ["abc123", "ABC123", "plasma-rifle"] {
    let item = loader.find_item(key).await.unwrap();
    assert_eq!(item.map(|i| i.id), Some("abc123".to_string()), "{}", key);
  }
  assert!(loader.find_item("plasma_rifle").await.unwrap().is_none());
}
