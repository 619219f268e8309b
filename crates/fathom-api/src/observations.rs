//! Handlers for `/observations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/observations` | Bearer; body [`Submission`]; 201, 400, 429 |
//! | `POST` | `/observations/{id}/validate` | Bearer, `EXPERT`/`ADMIN`; returns [`DecisionBody`] |
//! | `POST` | `/observations/{id}/reject` | Same as validate |
//!
//! A committed decision spawns reputation propagation as a detached task and
//! answers without waiting for it.

use std::sync::Arc;

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use fathom_core::{
  moderation,
  observation::{Observation, Outcome, Submission},
  propagation::{ReputationDelta, ReputationLedger, propagate},
  store::ObservationStore,
  subject::Identity,
  workflow,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ObservationState, error::ApiError, identity::Caller};

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /observations`: returns 201 + the pending observation.
pub async fn create<S, L>(
  State(state): State<ObservationState<S, L>>,
  Caller(caller): Caller,
  body: Result<Json<Submission>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger,
{
  let Json(submission) = body?;
  let observation =
    workflow::submit_observation(state.store.as_ref(), caller, submission, Utc::now()).await?;
  Ok((StatusCode::CREATED, Json(observation)))
}

// ─── Decide ───────────────────────────────────────────────────────────────────

/// Response body of a moderation decision.
#[derive(Debug, Serialize)]
pub struct DecisionBody {
  pub message:     &'static str,
  pub observation: Observation,
}

/// `POST /observations/{id}/validate`
pub async fn validate<S, L>(
  State(state): State<ObservationState<S, L>>,
  Caller(caller): Caller,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DecisionBody>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger + 'static,
{
  decide(state, caller, id, Outcome::Validate).await
}

/// `POST /observations/{id}/reject`
pub async fn reject<S, L>(
  State(state): State<ObservationState<S, L>>,
  Caller(caller): Caller,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DecisionBody>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger + 'static,
{
  decide(state, caller, id, Outcome::Reject).await
}

async fn decide<S, L>(
  state: ObservationState<S, L>,
  moderator: Identity,
  id: Result<Path<Uuid>, PathRejection>,
  outcome: Outcome,
) -> Result<Json<DecisionBody>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger + 'static,
{
  // A USER is refused before the id is even parsed.
  moderation::check_role(moderator)?;
  let Path(id) = id?;

  let decision =
    workflow::decide_observation(state.store.as_ref(), moderator, id, outcome, Utc::now()).await?;

  dispatch(Arc::clone(&state.ledger), decision.deltas);

  Ok(Json(DecisionBody {
    message:     decision.message,
    observation: decision.observation,
  }))
}

/// Send `deltas` to the ledger on a detached task.
fn dispatch<L>(ledger: Arc<L>, deltas: Vec<ReputationDelta>)
where
  L: ReputationLedger + 'static,
{
  if deltas.is_empty() {
    return;
  }
  tokio::spawn(async move {
    propagate(ledger.as_ref(), &deltas).await;
  });
}
