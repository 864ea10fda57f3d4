use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Dataset served by the fixture backend
  pub fixture: Option<PathBuf>,
  /// Transactions per page served by the fixture backend
  pub page_size: usize,
  /// Simulated latency of every remote call, in milliseconds
  pub latency_ms: u64,
  pub cache: CacheConfig,
  /// Log file location (defaults to the data directory)
  pub log_file: Option<PathBuf>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      fixture: None,
      page_size: DEFAULT_PAGE_SIZE,
      latency_ms: 0,
      cache: CacheConfig::default(),
      log_file: None,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  /// When false, every read goes to the remote
  pub enabled: bool,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self { enabled: true }
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./txreview.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/txreview/config.yaml
  ///
  /// Falls back to defaults when no file is found.
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
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("txreview.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("txreview").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  pub fn from_yaml_str(contents: &str) -> Result<Self> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    Ok(serde_yaml::from_str(contents)?)
  }

  /// The fixture dataset path, which must be configured.
  pub fn fixture_path(&self) -> Result<&Path> {
    self.fixture.as_deref().ok_or_else(|| {
      eyre!("No fixture dataset configured. Pass --fixture or set `fixture` in txreview.yaml.")
    })
  }

  pub fn latency(&self) -> Duration {
    Duration::from_millis(self.latency_ms)
  }

  /// Where logs are written.
  pub fn log_path(&self) -> Result<PathBuf> {
    if let Some(path) = &self.log_file {
      return Ok(path.clone());
    }

    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or_else(|| eyre!("Could not determine data directory"))?;

    Ok(data_dir.join("txreview").join("txreview.log"))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let config = Config::from_yaml_str("").unwrap();
    assert_eq!(config.page_size, 5);
    assert!(config.cache.enabled);
    assert!(config.fixture_path().is_err());
  }

  #[test]
  fn test_parse_full_config() {
    let config = Config::from_yaml_str(
      "fixture: ./data.json\n\
       page_size: 3\n\
       latency_ms: 250\n\
       cache:\n  enabled: false\n\
       log_file: /tmp/tx.log\n",
    )
    .unwrap();

    assert_eq!(config.fixture_path().unwrap(), Path::new("./data.json"));
    assert_eq!(config.page_size, 3);
    assert_eq!(config.latency(), Duration::from_millis(250));
    assert!(!config.cache.enabled);
    assert_eq!(config.log_path().unwrap(), PathBuf::from("/tmp/tx.log"));
  }

  #[test]
  fn test_partial_config_keeps_defaults() {
    let config = Config::from_yaml_str("latency_ms: 10\n").unwrap();
    assert_eq!(config.page_size, 5);
    assert!(config.cache.enabled);
  }

  #[test]
  fn test_missing_explicit_path_is_an_error() {
    assert!(Config::load(Some(Path::new("/nonexistent/txreview.yaml"))).is_err());
  }
}
