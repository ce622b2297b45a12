use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

use super::types::ResourceKind;
use crate::config::UpstreamConfig;
use crate::error::LoadError;

/// MetaForge API client wrapper
#[derive(Clone)]
pub struct MetaForgeClient {
  http: reqwest::Client,
  base_url: String,
}

impl MetaForgeClient {
  pub fn new(config: &UpstreamConfig) -> color_eyre::Result<Self> {
    let http = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.timeout_secs))
      .user_agent(concat!("arcfinder/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Self::with_http(http, &config.base_url)
  }

  /// Build a client around an existing HTTP client.
  pub fn with_http(http: reqwest::Client, base_url: &str) -> color_eyre::Result<Self> {
    let base_url = base_url.trim_end_matches('/').to_string();
    Url::parse(&base_url)
      .map_err(|e| color_eyre::eyre::eyre!("Invalid MetaForge base URL '{}': {}", base_url, e))?;

    Ok(Self { http, base_url })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn endpoint(&self, kind: ResourceKind) -> Result<Url, LoadError> {
    Url::parse(&format!("{}/{}", self.base_url, kind.path()))
      .map_err(|e| LoadError::Transport(format!("invalid endpoint URL: {}", e)))
  }

  /// Get one page of a paginated endpoint
  pub async fn fetch_page(
    &self,
    kind: ResourceKind,
    page: u32,
    limit: u32,
  ) -> Result<Value, LoadError> {
    let mut url = self.endpoint(kind)?;
    url
      .query_pairs_mut()
      .append_pair("page", &page.to_string())
      .append_pair("limit", &limit.to_string());

    debug!(resource = kind.label(), page, "Fetching page");
    self.get_json(url).await
  }

  /// Get the whole body of an unpaginated endpoint
  pub async fn fetch(&self, kind: ResourceKind) -> Result<Value, LoadError> {
    let url = self.endpoint(kind)?;
    debug!(resource = kind.label(), "Fetching");
    self.get_json(url).await
  }

  async fn get_json(&self, url: Url) -> Result<Value, LoadError> {
    let response = self
      .http
      .get(url.clone())
      .header(ACCEPT, "application/json")
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      error!(%url, status = status.as_u16(), "MetaForge API error");
      return Err(LoadError::Upstream {
        status: status.as_u16(),
      });
    }

    response
      .json::<Value>()
      .await
      .map_err(|e| LoadError::Decode(e.to_string()))
  }
}
