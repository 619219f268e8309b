//! Handlers for `/species` endpoints.
//!
//! Every route requires a bearer token.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/species` | All species, oldest first |
//! | `POST` | `/species` | Body `{"name":"..."}`; 400 on blank or duplicate name |
//! | `GET`  | `/species/{id}` | 404 if not found |
//! | `GET`  | `/species/{id}/observations` | 404 if the species is not found |

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
  observation::Observation,
  propagation::ReputationLedger,
  species::Species,
  store::ObservationStore,
  workflow,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ObservationState, error::ApiError, identity::Caller};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /species`
pub async fn list<S, L>(
  State(state): State<ObservationState<S, L>>,
  _caller: Caller,
) -> Result<Json<Vec<Species>>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger,
{
  let species = state.store.list_species().await.map_err(ApiError::store)?;
  Ok(Json(species))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name: String,
}

/// `POST /species`: returns 201 + the stored species.
pub async fn create<S, L>(
  State(state): State<ObservationState<S, L>>,
  Caller(caller): Caller,
  body: Result<Json<CreateBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger,
{
  let Json(body) = body?;
  let species = workflow::create_species(state.store.as_ref(), caller, &body.name, Utc::now()).await?;
  tracing::info!(species_id = %species.id, name = %species.name, "species created");
  Ok((StatusCode::CREATED, Json(species)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

async fn find<S>(store: &S, id: Uuid) -> Result<Species, ApiError>
where
  S: ObservationStore,
{
  store
    .get_species(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("species {id} not found")))
}

/// `GET /species/{id}`
pub async fn get_one<S, L>(
  State(state): State<ObservationState<S, L>>,
  _caller: Caller,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Species>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger,
{
  let Path(id) = id?;
  Ok(Json(find(state.store.as_ref(), id).await?))
}

/// `GET /species/{id}/observations`
pub async fn observations<S, L>(
  State(state): State<ObservationState<S, L>>,
  _caller: Caller,
  id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Vec<Observation>>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger,
{
  let Path(id) = id?;
  find(state.store.as_ref(), id).await?;
  let observations = state.store.list_observations(id).await.map_err(ApiError::store)?;
  Ok(Json(observations))
}
