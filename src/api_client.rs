//! Client for a running arcfinder proxy, used by the browsing commands.

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::error::ClientError;
use crate::metaforge::types::decode_records;
use crate::metaforge::{ArcUnit, Item, Quest, Record, Trader};

#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

/// arcfinder HTTP API client wrapper
#[derive(Clone)]
pub struct ArcfinderClient {
  http: reqwest::Client,
  base_url: Url,
}

impl ArcfinderClient {
  pub fn new(base_url: &str) -> Result<Self, ClientError> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(60))
      .build()?;

    Ok(Self {
      http,
      base_url: Url::parse(base_url)?,
    })
  }

  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn send(&self, url: Url) -> Result<Response, ClientError> {
    Ok(self.http.get(url).send().await?)
  }

  /// Turn a non-success response into the server's error message.
  async fn server_error(response: Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorBody>().await {
      Ok(body) => body.error,
      Err(_) => status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string(),
    };
    ClientError::Server {
      status: status.as_u16(),
      message,
    }
  }

  /// A list endpoint; records that do not decode are skipped, not fatal.
  async fn list(&self, resource: &str) -> Result<Vec<Record>, ClientError> {
    let response = self.send(self.endpoint(&["api", resource])).await?;
    if !response.status().is_success() {
      return Err(Self::server_error(response).await);
    }
    let values: Vec<Value> = response.json().await?;
    Ok(decode_records(&values))
  }

  /// Get all items
  pub async fn items(&self) -> Result<Vec<Item>, ClientError> {
    self.list("items").await
  }

  /// Get a single item by id or slug; `None` when it does not exist
  pub async fn item(&self, id: &str) -> Result<Option<Item>, ClientError> {
    let response = self.send(self.endpoint(&["api", "items", id])).await?;
    match response.status() {
      StatusCode::NOT_FOUND => Ok(None),
      s if s.is_success() => Ok(Some(response.json().await?)),
      _ => Err(Self::server_error(response).await),
    }
  }

  pub async fn quests(&self) -> Result<Vec<Quest>, ClientError> {
    self.list("quests").await
  }

  pub async fn traders(&self) -> Result<Vec<Trader>, ClientError> {
    self.list("traders").await
  }

  pub async fn arcs(&self) -> Result<Vec<ArcUnit>, ClientError> {
    self.list("arcs").await
  }
}
