//! JSON REST API for Fathom.
//!
//! Two routers, one per service:
//!
//! - [`observation_router`] serves species, observations, moderation and the
//!   taxonomy report from any [`ObservationStore`], and pushes reputation
//!   deltas to a [`ReputationLedger`].
//! - [`account_router`] serves registration, login, role administration and
//!   the reputation increment endpoint from any [`LedgerStore`].
//!
//! Both authenticate callers with bearer tokens signed by a shared
//! [`TokenKey`]. TLS and request tracing are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = fathom_api::observation_router(state).layer(TraceLayer::new_for_http());
//! ```

pub mod accounts;
pub mod client;
pub mod error;
pub mod identity;
pub mod observations;
pub mod password;
pub mod species;
pub mod taxonomy;
pub mod token;


use std::sync::Arc;

use axum::{
  Router,
  extract::FromRef,
  routing::{get, patch, post},
};
use fathom_core::{ledger::LedgerStore, propagation::ReputationLedger, store::ObservationStore};

pub use client::{HttpLedger, LedgerClientError};
pub use error::ApiError;
pub use identity::{Caller, ServiceCaller};
pub use token::TokenKey;

// ─── Observation service ──────────────────────────────────────────────────────

/// Shared state of the observation service.
pub struct ObservationState<S, L> {
  pub store:  Arc<S>,
  /// Where reputation deltas are sent after a moderation decision.
  pub ledger: Arc<L>,
  pub tokens: TokenKey,
}

impl<S, L> Clone for ObservationState<S, L> {
  fn clone(&self) -> Self {
    Self {
      store:  Arc::clone(&self.store),
      ledger: Arc::clone(&self.ledger),
      tokens: self.tokens.clone(),
    }
  }
}

impl<S, L> FromRef<ObservationState<S, L>> for TokenKey {
  fn from_ref(state: &ObservationState<S, L>) -> Self { state.tokens.clone() }
}

/// Build the observation-service router.
pub fn observation_router<S, L>(state: ObservationState<S, L>) -> Router<()>
where
  S: ObservationStore + 'static,
  L: ReputationLedger + 'static,
{
  Router::new()
    // Species
    .route("/species", get(species::list::<S, L>).post(species::create::<S, L>))
    .route("/species/{id}", get(species::get_one::<S, L>))
    .route("/species/{id}/observations", get(species::observations::<S, L>))
    // Observations
    .route("/observations", post(observations::create::<S, L>))
    .route("/observations/{id}/validate", post(observations::validate::<S, L>))
    .route("/observations/{id}/reject", post(observations::reject::<S, L>))
    // Taxonomy
    .route("/taxonomy/stats", get(taxonomy::stats::<S, L>))
    .with_state(state)
}

// ─── Account service ──────────────────────────────────────────────────────────

/// Shared state of the account service.
pub struct AccountState<L> {
  pub ledger:      Arc<L>,
  pub tokens:      TokenKey,
  /// Bearer credential expected on service-to-service calls.
  pub service_key: Arc<str>,
}

impl<L> Clone for AccountState<L> {
  fn clone(&self) -> Self {
    Self {
      ledger:      Arc::clone(&self.ledger),
      tokens:      self.tokens.clone(),
      service_key: Arc::clone(&self.service_key),
    }
  }
}

impl<L> FromRef<AccountState<L>> for TokenKey {
  fn from_ref(state: &AccountState<L>) -> Self { state.tokens.clone() }
}

/// Build the account-service router.
pub fn account_router<L>(state: AccountState<L>) -> Router<()>
where
  L: LedgerStore + 'static,
{
  Router::new()
    .route("/auth/register", post(accounts::register::<L>))
    .route("/auth/login", post(accounts::login::<L>))
    .route("/auth/me", get(accounts::me::<L>))
    .route("/admin/users", get(accounts::list::<L>))
    .route("/subjects/{id}/role", patch(accounts::set_role::<L>))
    .route("/subjects/{id}/reputation", patch(accounts::increment::<L>))
    .with_state(state)
}
