//! Handler for `GET /taxonomy/stats`.

use axum::{Json, extract::State};
use fathom_core::{
  propagation::ReputationLedger, store::ObservationStore, taxonomy::TaxonomyReport, workflow,
};

use crate::{ObservationState, error::ApiError, identity::Caller};

/// `GET /taxonomy/stats`: bearer; read-only aggregate of the local store.
pub async fn stats<S, L>(
  State(state): State<ObservationState<S, L>>,
  _caller: Caller,
) -> Result<Json<TaxonomyReport>, ApiError>
where
  S: ObservationStore,
  L: ReputationLedger,
{
  Ok(Json(workflow::taxonomy_report(state.store.as_ref()).await?))
}
