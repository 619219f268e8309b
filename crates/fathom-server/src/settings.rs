//! Runtime configuration.
//!
//! Layered, lowest precedence first: defaults below, then the TOML file
//! passed with `--config`, then `FATHOM_*` environment variables
//! (`FATHOM_TOKEN_SECRET`, `FATHOM_ACCOUNT_PORT`, …).

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use fathom_api::{client::DEFAULT_TIMEOUT, token::DEFAULT_TTL_SECS};
use serde::Deserialize;

/// Runtime configuration for both services.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                   String,
  pub observation_port:       u16,
  pub account_port:           u16,
  pub observation_store_path: PathBuf,
  pub account_store_path:     PathBuf,
  /// Shared HMAC secret for bearer tokens. Must be identical on both services.
  pub token_secret:           String,
  pub token_ttl_secs:         i64,
  /// Credential the observation service presents to the ledger endpoint.
  pub service_key:            String,
  /// Base URL of the account service, as seen from the observation service.
  pub ledger_url:             String,
  pub ledger_timeout_ms:      u64,
}

impl ServerConfig {
  /// Refuse to start without the shared secrets.
  pub fn check_secrets(&self) -> Result<(), String> {
    if self.token_secret.is_empty() {
      return Err("token_secret is not set (FATHOM_TOKEN_SECRET)".into());
    }
    if self.service_key.is_empty() {
      return Err("service_key is not set (FATHOM_SERVICE_KEY)".into());
    }
    Ok(())
  }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
  Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("observation_port", 5000_i64)?
    .set_default("account_port", 4000_i64)?
    .set_default("observation_store_path", "~/.local/share/fathom/observations.db")?
    .set_default("account_store_path", "~/.local/share/fathom/accounts.db")?
    .set_default("token_secret", "")?
    .set_default("token_ttl_secs", DEFAULT_TTL_SECS)?
    .set_default("service_key", "")?
    .set_default("ledger_url", "http://127.0.0.1:4000")?
    .set_default("ledger_timeout_ms", DEFAULT_TIMEOUT.as_millis() as i64)
}

fn environment() -> Environment { Environment::with_prefix("FATHOM").try_parsing(true) }

/// Load configuration. An explicitly named file must exist.
pub fn load(path: Option<&Path>) -> Result<ServerConfig, ConfigError> {
  let mut builder = defaults()?;
  if let Some(path) = path {
    builder = builder.add_source(File::from(path).required(true));
  }
  builder.add_source(environment()).build()?.try_deserialize()
}
