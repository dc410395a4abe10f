use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheSettings;
use crate::retry::RetryPolicy;

pub const TOKEN_ENV: &str = "STOREFRONT_API_TOKEN";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for header (defaults to the API host if not set)
  pub title: Option<String>,
  #[serde(default)]
  pub sync: SyncConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the storefront API, e.g. https://shop.example.com/api
  pub url: String,
}

/// Freshness, retry and paging defaults shared by every list view.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SyncConfig {
  /// Seconds a fetched page is served without revalidation
  pub stale_time_secs: u64,
  /// Additional attempts after a transient failure
  pub retry_count: u32,
  pub retry_interval_secs: u64,
  /// Quiet period before a search is committed
  pub debounce_ms: u64,
  pub page_size: u32,
  /// Maximum number of cached pages per resource
  pub cache_capacity: usize,
  /// Seconds an unused page stays cached
  pub cache_ttl_secs: u64,
}

impl Default for SyncConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 30,
      retry_count: 2,
      retry_interval_secs: 3,
      debounce_ms: 500,
      page_size: 10,
      cache_capacity: 64,
      cache_ttl_secs: 600,
    }
  }
}

impl SyncConfig {
  pub fn cache_settings(&self) -> CacheSettings {
    CacheSettings {
      stale_time: Duration::from_secs(self.stale_time_secs),
      ttl: Duration::from_secs(self.cache_ttl_secs),
      capacity: self.cache_capacity,
    }
  }

  pub fn retry_policy(&self) -> RetryPolicy {
    RetryPolicy::new(
      self.retry_count,
      Duration::from_secs(self.retry_interval_secs),
    )
  }

  pub fn debounce(&self) -> Duration {
    Duration::from_millis(self.debounce_ms)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./storefront-admin.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/storefront-admin/config.yaml
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

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/storefront-admin/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from("storefront-admin.yaml");
    if local.exists() {
      return Some(local);
    }

    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("storefront-admin").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    if config.sync.page_size == 0 {
      return Err(eyre!("sync.page_size must be greater than zero"));
    }
    if config.sync.cache_capacity == 0 {
      return Err(eyre!("sync.cache_capacity must be greater than zero"));
    }
    Ok(config)
  }

  /// Get the API bearer token from the environment, if set.
  pub fn get_api_token() -> Option<String> {
    std::env::var(TOKEN_ENV)
      .ok()
      .filter(|token| !token.trim().is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_minimal_config_uses_sync_defaults() {
    let config = Config::parse("api:\n  url: https://shop.example.com/api\n").unwrap();
    assert_eq!(config.api.url, "https://shop.example.com/api");
    assert_eq!(config.title, None);
    assert_eq!(config.sync, SyncConfig::default());

    let settings = config.sync.cache_settings();
    assert_eq!(settings.stale_time, Duration::from_secs(30));
    assert_eq!(settings.capacity, 64);
    let retry = config.sync.retry_policy();
    assert_eq!(retry.max_retries(), 2);
    assert_eq!(retry.interval(), Duration::from_secs(3));
    assert_eq!(config.sync.debounce(), Duration::from_millis(500));
  }

  #[test]
  fn test_partial_sync_section_overrides_only_given_fields() {
    let yaml = r#"
api:
  url: http://localhost:5000/api
title: Shop Admin
sync:
  retry_count: 1
  page_size: 25
"#;
    let config = Config::parse(yaml).unwrap();
    assert_eq!(config.title.as_deref(), Some("Shop Admin"));
    assert_eq!(config.sync.retry_count, 1);
    assert_eq!(config.sync.page_size, 25);
    assert_eq!(config.sync.stale_time_secs, 30);
  }

  #[test]
  fn test_zero_page_size_is_rejected() {
    let yaml = "api:\n  url: http://localhost\nsync:\n  page_size: 0\n";
    assert!(Config::parse(yaml).is_err());
  }

  #[test]
  fn test_missing_api_section_is_rejected() {
    assert!(Config::parse("title: nope\n").is_err());
  }

  #[test]
  fn test_explicit_missing_path_is_error() {
    let err = Config::load(Some(Path::new("/nonexistent/storefront-admin.yaml"))).unwrap_err();
    assert!(err.to_string().contains("Config file not found"));
  }
}
