//! HTTP client for the account service's reputation endpoint.

use std::time::Duration;

use fathom_core::{propagation::ReputationLedger, subject::ReputationTotal};
use reqwest::{Client, StatusCode};
use thiserror::Error;
use uuid::Uuid;

use crate::accounts::IncrementBody;

/// Default bound on a single ledger call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum LedgerClientError {
  #[error("ledger request failed: {0}")]
  Network(#[from] reqwest::Error),

  #[error("ledger answered {0}")]
  Status(StatusCode),
}

/// [`ReputationLedger`] backed by `PATCH {base_url}/subjects/{id}/reputation`.
///
/// Cheap to clone: the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct HttpLedger {
  client:      Client,
  base_url:    String,
  service_key: String,
}

impl HttpLedger {
  pub fn new(
    base_url: impl Into<String>,
    service_key: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, LedgerClientError> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.into(),
      service_key: service_key.into(),
    })
  }

  fn url(&self, subject_id: Uuid) -> String {
    format!(
      "{}/subjects/{subject_id}/reputation",
      self.base_url.trim_end_matches('/')
    )
  }
}

impl ReputationLedger for HttpLedger {
  type Error = LedgerClientError;

  async fn increment(
    &self,
    subject_id: Uuid,
    amount: i64,
  ) -> Result<ReputationTotal, LedgerClientError> {
    let resp = self
      .client
      .patch(self.url(subject_id))
      .bearer_auth(&self.service_key)
      .json(&IncrementBody { amount })
      .send()
      .await?;

    if !resp.status().is_success() {
      return Err(LedgerClientError::Status(resp.status()));
    }
    Ok(resp.json().await?)
  }
}
