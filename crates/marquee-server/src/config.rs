//! Runtime configuration.
//!
//! Values come from an optional TOML file, then `MARQUEE_*` environment
//! variables (nested keys use `__`, e.g. `MARQUEE_QUOTA__COMPLETE=5`), then
//! command-line overrides.

use std::path::PathBuf;

use anyhow::Context as _;
use marquee_core::plan::QuotaTable;
use serde::Deserialize;

/// Runtime server configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Allowed CORS origins. Empty means any origin.
  pub cors_origins: Vec<String>,
  pub quota:        QuotaTable,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_string(),
      port:         3000,
      store_path:   PathBuf::from("marquee.db"),
      cors_origins: Vec::new(),
      quota:        QuotaTable::default(),
    }
  }
}

impl ServerConfig {
  /// `host:port`, suitable for binding.
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Overrides supplied on the command line.
#[derive(Debug, Default)]
pub struct Overrides {
  pub host: Option<String>,
  pub port: Option<u16>,
}

/// Layer the config file, the environment and `overrides`.
pub fn load(path: PathBuf, overrides: Overrides) -> anyhow::Result<ServerConfig> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("MARQUEE")
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("cors_origins")
        .try_parsing(true),
    )
    .set_override_option("host", overrides.host)
    .context("invalid host override")?
    .set_override_option("port", overrides.port.map(i64::from))
    .context("invalid port override")?
    .build()
    .context("failed to read config file")?;

  settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")
}
