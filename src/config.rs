use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://metaforge.app/api/arc-raiders";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  #[serde(default)]
  pub upstream: UpstreamConfig,
  #[serde(default)]
  pub cache: CacheConfig,
  #[serde(default)]
  pub server: ServerConfig,
  #[serde(default)]
  pub client: ClientConfig,
  #[serde(default)]
  pub images: ImagesConfig,
  #[serde(default)]
  pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
  #[serde(default = "default_base_url")]
  pub base_url: String,
  /// Items requested per page during aggregation
  #[serde(default = "default_page_size")]
  pub page_size: u32,
  /// Hard ceiling on pages walked per aggregation
  #[serde(default = "default_max_pages")]
  pub max_pages: u32,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
  fn default() -> Self {
    Self {
      base_url: default_base_url(),
      page_size: default_page_size(),
      max_pages: default_max_pages(),
      timeout_secs: default_timeout_secs(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// Redis connection string; required by `serve`
  pub redis_url: Option<String>,
  #[serde(default = "default_ttl")]
  pub ttl_seconds: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      redis_url: None,
      ttl_seconds: default_ttl(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_listen")]
  pub listen: String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      listen: default_listen(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
  /// Base URL of a running `arcfinder serve`
  #[serde(default = "default_server_url")]
  pub server_url: String,
}

impl Default for ClientConfig {
  fn default() -> Self {
    Self {
      server_url: default_server_url(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImagesConfig {
  /// SQLite file backing the image cache (defaults under the XDG data dir)
  pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
  /// Directory for daily-rolling log files; stderr only when unset
  pub file_dir: Option<PathBuf>,
}

fn default_base_url() -> String {
  DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
  50
}

fn default_max_pages() -> u32 {
  20
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_ttl() -> u64 {
  300
}

fn default_listen() -> String {
  "0.0.0.0:3000".to_string()
}

fn default_server_url() -> String {
  "http://localhost:3000".to_string()
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./arcfinder.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/arcfinder/config.yaml
  ///
  /// Unlike an explicit path, a missing default file just means defaults.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };
    config.apply_env(|name| std::env::var(name).ok())?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("arcfinder.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("arcfinder").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Overlay environment variables on top of file values.
  fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(url) = var("METAFORGE_BASE_URL") {
      self.upstream.base_url = url;
    }
    if let Some(uri) = var("SERVICE_URI") {
      self.cache.redis_url = Some(uri);
    }
    if let Some(ttl) = var("ARCFINDER_CACHE_TTL") {
      self.cache.ttl_seconds = ttl
        .parse()
        .map_err(|e| eyre!("Invalid ARCFINDER_CACHE_TTL '{}': {}", ttl, e))?;
    }
    if let Some(listen) = var("ARCFINDER_LISTEN") {
      self.server.listen = listen;
    }
    if let Some(server) = var("ARCFINDER_SERVER") {
      self.client.server_url = server;
    }
    if let Some(path) = var("ARCFINDER_IMAGE_DB") {
      self.images.db_path = Some(PathBuf::from(path));
    }
    Ok(())
  }

  /// Redis connection string, or the fatal configuration error for its absence.
  pub fn redis_url(&self) -> Result<&str> {
    self
      .cache
      .redis_url
      .as_deref()
      .filter(|s| !s.trim().is_empty())
      .ok_or_else(|| eyre!("SERVICE_URI environment variable is not set (needed for the response cache)"))
  }

  /// Path of the image cache database.
  pub fn image_db_path(&self) -> Result<PathBuf> {
    if let Some(p) = &self.images.db_path {
      return Ok(p.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("arcfinder").join("images.db"))
  }
}
