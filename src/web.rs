//! HTTP front of the caching proxy.
//!
//! Every list endpoint returns the complete, normalized JSON array for its
//! resource type; failures come back as `{ "error": "..." }`.

use axum::{
  extract::{Path, State},
  http::{header, StatusCode},
  response::{IntoResponse, Response},
  routing::get,
  Json, Router,
};
use color_eyre::{eyre::eyre, Result};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cache::{KvStore, RedisStore, ResponseCache};
use crate::config::Config;
use crate::error::LoadError;
use crate::maps::{self, MAPS};
use crate::metaforge::{MetaForgeClient, ResourceKind, ResourceLoader};

/// Lets shared caches keep a single item page for a while.
const ITEM_CACHE_CONTROL: &str = "public, s-maxage=900, stale-while-revalidate=1800";

/// Shared application state
struct AppState<S: KvStore> {
  loader: ResourceLoader<S>,
}

impl<S: KvStore> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      loader: self.loader.clone(),
    }
  }
}

/// JSON error body
#[derive(Debug, Serialize)]
struct ErrorBody {
  error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
  (
    status,
    Json(ErrorBody {
      error: message.into(),
    }),
  )
    .into_response()
}

/// Map a loader failure to a response.
///
/// Upstream status failures keep their status code; anything else is a 500.
fn load_error_response(kind: ResourceKind, err: &LoadError) -> Response {
  error!(resource = kind.label(), error = %err, "Failed to load resource");
  match err {
    LoadError::Upstream { status } => error_response(
      StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
      err.to_string(),
    ),
    _ => error_response(
      StatusCode::INTERNAL_SERVER_ERROR,
      format!("Failed to fetch {} from MetaForge", kind.label()),
    ),
  }
}

async fn list_response<S: KvStore + 'static>(state: &AppState<S>, kind: ResourceKind) -> Response {
  match state.loader.load(kind).await {
    Ok(list) => Json(list).into_response(),
    Err(e) => load_error_response(kind, &e),
  }
}

/// GET /api/items
async fn items_handler<S: KvStore + 'static>(State(state): State<AppState<S>>) -> Response {
  list_response(&state, ResourceKind::Items).await
}

/// GET /api/quests
async fn quests_handler<S: KvStore + 'static>(State(state): State<AppState<S>>) -> Response {
  list_response(&state, ResourceKind::Quests).await
}

/// GET /api/traders
async fn traders_handler<S: KvStore + 'static>(State(state): State<AppState<S>>) -> Response {
  list_response(&state, ResourceKind::Traders).await
}

/// GET /api/arcs
async fn arcs_handler<S: KvStore + 'static>(State(state): State<AppState<S>>) -> Response {
  list_response(&state, ResourceKind::Arcs).await
}

/// GET /api/items/{id} - lookup by id, case-insensitive id, or name slug
async fn item_handler<S: KvStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<String>,
) -> Response {
  let found = match state.loader.find_item(&id).await {
    Ok(found) => found,
    Err(e) => return load_error_response(ResourceKind::Items, &e),
  };

  match found {
    Some(item) => (
      [(header::CACHE_CONTROL, ITEM_CACHE_CONTROL)],
      Json(item),
    )
      .into_response(),
    None => error_response(StatusCode::NOT_FOUND, "Item not found"),
  }
}

/// Map metadata with its interactive embed
#[derive(Serialize)]
struct MapResponse {
  #[serde(flatten)]
  map: maps::MapDef,
  embed_url: String,
}

impl From<&maps::MapDef> for MapResponse {
  fn from(map: &maps::MapDef) -> Self {
    Self {
      map: *map,
      embed_url: maps::embed_url(map),
    }
  }
}

/// GET /api/maps
async fn maps_handler() -> Json<Vec<MapResponse>> {
  Json(MAPS.iter().map(MapResponse::from).collect())
}

/// GET /api/maps/{slug}
async fn map_handler(Path(slug): Path<String>) -> Response {
  match maps::map_by_slug(&slug) {
    Some(map) => Json(MapResponse::from(map)).into_response(),
    None => error_response(StatusCode::NOT_FOUND, "Map not found"),
  }
}

/// GET /health
async fn health_handler() -> &'static str {
  "ok"
}

/// Build the proxy router
pub fn create_router<S: KvStore + 'static>(loader: ResourceLoader<S>) -> Router {
  let state = AppState { loader };

  Router::new()
    .route("/health", get(health_handler))
    .route("/api/items", get(items_handler::<S>))
    .route("/api/items/{id}", get(item_handler::<S>))
    .route("/api/quests", get(quests_handler::<S>))
    .route("/api/traders", get(traders_handler::<S>))
    .route("/api/arcs", get(arcs_handler::<S>))
    .route("/api/maps", get(maps_handler))
    .route("/api/maps/{slug}", get(map_handler))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

/// Start the proxy and serve until Ctrl-C.
///
/// Fails immediately when no Redis connection string is configured; an
/// unreachable Redis is only logged, per request, as a cache miss.
pub async fn serve(config: &Config) -> Result<()> {
  let redis_url = config.redis_url()?;
  let store =
    RedisStore::open(redis_url).map_err(|e| eyre!("Invalid SERVICE_URI '{}': {}", redis_url, e))?;
  let cache = ResponseCache::new(store).with_ttl(config.cache.ttl_seconds);

  let client = MetaForgeClient::new(&config.upstream)?;
  let loader = ResourceLoader::new(client, cache)
    .with_pagination(config.upstream.page_size, config.upstream.max_pages);

  let app = create_router(loader);
  let listener = tokio::net::TcpListener::bind(&config.server.listen)
    .await
    .map_err(|e| eyre!("Failed to bind {}: {}", config.server.listen, e))?;

  info!("arcfinder listening on {}", config.server.listen);
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    error!(error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!("Shutting down");
}
