//! Runtime settings, layered from an optional TOML file and `SENSORSYNC__*`
//! environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use config::{Config, ConfigError, Environment, File};
use sensorsync_core::RetryPolicy;
use sensorsync_ingest::SyncOptions;
use sensorsync_store_sqlite::{REQUEST_TIMEOUT, StoreOptions};
use sensorsync_yolink::{DEFAULT_API_URL, DEFAULT_TOKEN_URL, YoLinkConfig};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  pub database_path:     PathBuf,
  pub export_dir:        PathBuf,
  pub destructive_setup: bool,
  pub yolink:            YoLinkSettings,
  pub sync:              SyncSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct YoLinkSettings {
  pub client_id:           String,
  pub client_secret:       String,
  pub token_url:           String,
  pub api_url:             String,
  pub refresh_buffer_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
  pub interval_secs:     u64,
  pub retry_attempts:    u32,
  pub device_delay_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      database_path:     PathBuf::from("sensorsync.db"),
      export_dir:        PathBuf::from("exports"),
      destructive_setup: false,
      yolink:            YoLinkSettings::default(),
      sync:              SyncSettings::default(),
    }
  }
}

impl Default for YoLinkSettings {
  fn default() -> Self {
    Self {
      client_id:           String::new(),
      client_secret:       String::new(),
      token_url:           DEFAULT_TOKEN_URL.to_owned(),
      api_url:             DEFAULT_API_URL.to_owned(),
      refresh_buffer_secs: 30 * 60,
    }
  }
}

impl Default for SyncSettings {
  fn default() -> Self {
    Self {
      interval_secs:     15 * 60,
      retry_attempts:    3,
      device_delay_secs: 10,
    }
  }
}

impl Settings {
  /// Read `path` if it exists, then apply environment overrides such as
  /// `SENSORSYNC__YOLINK__CLIENT_ID`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let settings: Self = Config::builder()
      .add_source(File::from(path).required(false))
      .add_source(
        Environment::with_prefix("SENSORSYNC")
          .separator("__")
          .try_parsing(true),
      )
      .build()?
      .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
  }

  fn validate(&self) -> Result<(), ConfigError> {
    if self.sync.interval_secs == 0 {
      return Err(ConfigError::Message("sync.interval_secs must be at least 1".into()));
    }
    Ok(())
  }

  pub fn store_options(&self, destructive: bool) -> StoreOptions {
    StoreOptions {
      export_dir:        self.export_dir.clone(),
      destructive_setup: destructive,
      request_timeout:   REQUEST_TIMEOUT,
    }
  }

  pub fn yolink_config(&self) -> YoLinkConfig {
    YoLinkConfig {
      client_id:      self.yolink.client_id.clone(),
      client_secret:  self.yolink.client_secret.clone(),
      token_url:      self.yolink.token_url.clone(),
      api_url:        self.yolink.api_url.clone(),
      refresh_buffer: Duration::from_secs(self.yolink.refresh_buffer_secs),
    }
  }

  pub fn sync_options(&self) -> SyncOptions {
    SyncOptions {
      retry:        RetryPolicy::new(self.sync.retry_attempts),
      device_delay: Duration::from_secs(self.sync.device_delay_secs),
    }
  }

  pub fn sync_interval(&self) -> Duration { Duration::from_secs(self.sync.interval_secs) }

  pub fn has_credentials(&self) -> bool {
    !self.yolink.client_id.is_empty() && !self.yolink.client_secret.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn from_toml(toml: &str) -> Settings {
    Config::builder()
      .add_source(File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn missing_keys_fall_back_to_defaults() {
    let settings = from_toml("");
    assert_eq!(settings.database_path, PathBuf::from("sensorsync.db"));
    assert_eq!(settings.yolink.token_url, DEFAULT_TOKEN_URL);
    assert_eq!(settings.sync.retry_attempts, 3);
    assert!(!settings.has_credentials());
  }

  #[test]
  fn nested_sections_override_defaults() {
    let settings = from_toml(
      r#"
        database_path = "/var/lib/sensorsync/data.db"

        [yolink]
        client_id = "uid"
        client_secret = "key"
        refresh_buffer_secs = 600

        [sync]
        retry_attempts = 0
        device_delay_secs = 2
      "#,
    );
    assert!(settings.has_credentials());
    assert_eq!(settings.yolink_config().refresh_buffer, Duration::from_secs(600));
    assert_eq!(settings.yolink_config().api_url, DEFAULT_API_URL);

    let options = settings.sync_options();
    assert_eq!(options.retry.attempts(), 1);
    assert_eq!(options.device_delay, Duration::from_secs(2));
    assert_eq!(settings.sync_interval(), Duration::from_secs(15 * 60));
  }

  #[test]
  fn zero_interval_is_rejected() {
    let settings = from_toml("[sync]\ninterval_secs = 0\n");
    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("interval_secs"));

    assert!(from_toml("[sync]\ninterval_secs = 1\n").validate().is_ok());
  }

  #[test]
  fn missing_file_is_not_an_error() {
    let settings = Settings::load(Path::new("/nonexistent/sensorsync.toml")).unwrap();
    assert!(!settings.destructive_setup);
  }
}
