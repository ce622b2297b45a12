//! Image cache against a mocked image host and a real SQLite file.

use arcfinder::images::{CacheStats, ImageCache, ImageRef, SqliteBlobStore};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn cache_in(dir: &TempDir) -> ImageCache<SqliteBlobStore> {
  ImageCache::open(&dir.path().join("images.db"), reqwest::Client::new())
}

async fn image_host(expected_hits: u64) -> MockServer {
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/icons/rifle.png"))
    .respond_with(ResponseTemplate::new(200).set_body_bytes(PNG))
    .expect(expected_hits)
    .mount(&server)
    .await;
  server
}

#[tokio::test]
async fn second_resolve_does_not_hit_network() {
  let dir = TempDir::new().unwrap();
  let server = image_host(1).await;
  let cache = cache_in(&dir);
  let url = format!("{}/icons/rifle.png", server.uri());

  let first = cache.resolve(&url).await;
  let second = cache.resolve(&url).await;

  assert!(first.is_cached());
  assert_eq!(first.bytes(), Some(PNG));
  assert_eq!(first, second);
  assert_eq!(
    cache.stats(),
    CacheStats {
      count: 1,
      total_bytes: PNG.len() as u64
    }
  );
  server.verify().await;
}

#[tokio::test]
async fn cache_survives_reopen() {
  let dir = TempDir::new().unwrap();
  let server = image_host(1).await;
  let url = format!("{}/icons/rifle.png", server.uri());

  {
    let cache = cache_in(&dir);
    assert!(cache.resolve(&url).await.is_cached());
  }

  let reopened = cache_in(&dir);
  assert_eq!(reopened.get(&url).and_then(|r| r.bytes().map(<[u8]>::to_vec)), Some(PNG.to_vec()));
  assert!(reopened.resolve(&url).await.is_cached());
  server.verify().await;
}

#[tokio::test]
async fn failed_download_falls_back_to_remote_url() {
  let dir = TempDir::new().unwrap();
  let server = MockServer::start().await;
  Mock::given(method("GET"))
    .and(path("/missing.png"))
    .respond_with(ResponseTemplate::new(404))
    .expect(2)
    .mount(&server)
    .await;

  let cache = cache_in(&dir);
  let url = format!("{}/missing.png", server.uri());

  for _ in 0..2 {
    assert_eq!(cache.resolve(&url).await, ImageRef::Remote { url: url.clone() });
  }
  assert_eq!(cache.stats().count, 0);
  server.verify().await;
}

#[tokio::test]
async fn unreachable_host_falls_back_to_remote_url() {
  let dir = TempDir::new().unwrap();
  let cache = cache_in(&dir);
  let url = "http://127.0.0.1:1/nothing.png";

  let resolved = cache.resolve(url).await;
  assert_eq!(resolved.source_url(), Some(url));
  assert!(!resolved.is_cached());
}

#[tokio::test]
async fn stats_and_clear() {
  let dir = TempDir::new().unwrap();
  let cache = cache_in(&dir);

  let blobs: [(&str, &[u8]); 3] = [
    ("https://cdn/a.png", &[1; 100]),
    ("https://cdn/b.png", &[2; 20]),
    ("https://cdn/c.png", &[3; 3]),
  ];
  for (url, bytes) in blobs {
    cache.put(url, bytes);
  }

  assert_eq!(
    cache.stats(),
    CacheStats {
      count: 3,
      total_bytes: 123
    }
  );

  cache.clear();
  assert_eq!(cache.stats().count, 0);
  cache.clear();
  assert_eq!(cache.stats(), CacheStats::default());
}

#[tokio::test]
async fn put_overwrites_previous_bytes() {
  let dir = TempDir::new().unwrap();
  let cache = cache_in(&dir);

  cache.put("https://cdn/a.png", &[1, 1]);
  cache.put("https://cdn/a.png", &[2]);

  assert_eq!(cache.get("https://cdn/a.png").unwrap().bytes(), Some(&[2u8][..]));
  assert_eq!(cache.stats().count, 1);
}
