use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that overrides `api.base_url`.
pub const API_BASE_ENV: &str = "WZM_API_BASE";

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  pub cache: CacheConfig,
  pub jobs: JobsConfig,
  /// Custom title for the header (defaults to "WeezMon")
  pub title: Option<String>,
  /// Log file path (defaults to <data dir>/wzm/wzm.log)
  pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
  pub base_url: String,
  pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: "http://localhost:8000".to_string(),
      request_timeout_ms: 10_000,
    }
  }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
  /// How long a fetched value counts as fresh
  pub stale_time_secs: u64,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      stale_time_secs: 60,
    }
  }
}

impl CacheConfig {
  pub fn stale_time(&self) -> Duration {
    Duration::from_secs(self.stale_time_secs)
  }
}

/// Delays between a successful job trigger and the refetch of its result.
///
/// The backend has no job status endpoint, so these are guesses at how long a
/// job takes, not completion signals.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct JobsConfig {
  pub report_refresh_delay_ms: u64,
  pub sync_refresh_delay_ms: u64,
  pub finance_refresh_delay_ms: u64,
}

impl Default for JobsConfig {
  fn default() -> Self {
    Self {
      report_refresh_delay_ms: 1_500,
      sync_refresh_delay_ms: 1_500,
      finance_refresh_delay_ms: 1_500,
    }
  }
}

impl JobsConfig {
  pub fn report_refresh_delay(&self) -> Duration {
    Duration::from_millis(self.report_refresh_delay_ms)
  }

  pub fn sync_refresh_delay(&self) -> Duration {
    Duration::from_millis(self.sync_refresh_delay_ms)
  }

  pub fn finance_refresh_delay(&self) -> Duration {
    Duration::from_millis(self.finance_refresh_delay_ms)
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./wzm.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/wzm/config.yaml
  ///
  /// Defaults are used when no file is found. `WZM_API_BASE` overrides the
  /// base address either way.
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

    if let Ok(base_url) = std::env::var(API_BASE_ENV) {
      if !base_url.trim().is_empty() {
        config.api.base_url = base_url;
      }
    }

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("wzm.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("wzm").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    // An empty file is valid and means "all defaults".
    if contents.trim().is_empty() {
      return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  pub fn title(&self) -> &str {
    self.title.as_deref().unwrap_or("WeezMon")
  }

  /// Where logs go when `log_file` is not set.
  pub fn log_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.log_file {
      return Ok(path.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("wzm").join("wzm.log"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::default();
    assert_eq!(config.api.base_url, "http://localhost:8000");
    assert_eq!(config.jobs.report_refresh_delay(), Duration::from_millis(1_500));
    assert_eq!(config.jobs.finance_refresh_delay(), Duration::from_millis(1_500));
    assert_eq!(config.cache.stale_time(), Duration::from_secs(60));
    assert_eq!(config.title(), "WeezMon");
  }

  #[test]
  fn test_partial_file_keeps_defaults() {
    let config = Config::parse(
      r#"
api:
  base_url: https://weezmon.example.com
jobs:
  report_refresh_delay_ms: 3000
  finance_refresh_delay_ms: 4000
"#,
    )
    .unwrap();

    assert_eq!(config.api.base_url, "https://weezmon.example.com");
    assert_eq!(config.api.request_timeout_ms, 10_000);
    assert_eq!(config.jobs.report_refresh_delay_ms, 3_000);
    assert_eq!(config.jobs.sync_refresh_delay_ms, 1_500);
    assert_eq!(config.jobs.finance_refresh_delay(), Duration::from_millis(4_000));
  }

  #[test]
  fn test_empty_file_is_default() {
    assert_eq!(Config::parse("\n").unwrap(), Config::default());
  }

  #[test]
  fn test_missing_explicit_path_is_error() {
    let result = Config::load(Some(Path::new("/definitely/not/here/wzm.yaml")));
    assert!(result.is_err());
  }
}
