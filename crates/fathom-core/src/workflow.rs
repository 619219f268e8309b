//! Observation-service workflows built from the store trait and pure rules.
//!
//! The HTTP layer calls these and maps [`Error`] to status codes. Reputation
//! propagation is *not* performed here: [`decide_observation`] returns the
//! deltas it owes and the caller dispatches them once the response is
//! determined.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  Error, Result, moderation,
  observation::{NewObservation, Observation, Outcome, Submission, Transition},
  propagation::ReputationDelta,
  rarity,
  species::{NewSpecies, Species},
  store::ObservationStore,
  subject::Identity,
  taxonomy::{self, TaxonomyReport},
  throttle,
};

/// Register a new species authored by `author`.
pub async fn create_species<S>(
  store: &S,
  author: Identity,
  name: &str,
  now: DateTime<Utc>,
) -> Result<Species>
where
  S: ObservationStore,
{
  let input = NewSpecies::new(name, author.subject_id)?;
  store
    .insert_species(input.into_species(now))
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::Validation("species already exists".into()))
}

/// Validate, throttle and persist a submission.
///
/// Shape validation runs before the throttle lookup. A `species_id` that
/// does not exist fails at insert time as a store error.
pub async fn submit_observation<S>(
  store: &S,
  author: Identity,
  submission: Submission,
  now: DateTime<Utc>,
) -> Result<Observation>
where
  S: ObservationStore,
{
  let input = NewObservation::validate(submission, author.subject_id)?;

  let latest = store
    .latest_observation(input.author_id, input.species_id)
    .await
    .map_err(Error::store)?;
  throttle::check(latest.map(|o| o.created_at), now)?;

  store
    .insert_observation(input.into_observation(now))
    .await
    .map_err(Error::store)
}

/// A committed moderation decision and the follow-up it owes.
#[derive(Debug, Clone)]
pub struct Decision {
  pub observation: Observation,
  /// Ledger adjustments still to be propagated.
  pub deltas:      Vec<ReputationDelta>,
  pub message:     &'static str,
}

/// Run the moderation guards, commit the transition and, for a validation,
/// recompute the species' rarity.
///
/// A rarity failure is logged; the transition is already durable and the
/// decision is still returned.
pub async fn decide_observation<S>(
  store: &S,
  moderator: Identity,
  observation_id: Uuid,
  outcome: Outcome,
  now: DateTime<Utc>,
) -> Result<Decision>
where
  S: ObservationStore,
{
  moderation::check_role(moderator)?;

  let observation = store
    .get_observation(observation_id)
    .await
    .map_err(Error::store)?
    .ok_or(Error::ObservationNotFound(observation_id))?;

  moderation::check_observation(&observation, moderator)?;

  // The store only applies this to a still-pending row, which closes the
  // window between the guard above and the write.
  let committed = store
    .apply_transition(Transition {
      observation_id,
      status: outcome.target_status(),
      moderator_id: moderator.subject_id,
      at: now,
    })
    .await
    .map_err(Error::store)?
    .ok_or(Error::AlreadyModerated(observation_id))?;

  tracing::info!(
    observation_id = %committed.id,
    moderator_id = %moderator.subject_id,
    status = committed.status.as_str(),
    "moderation decision committed"
  );

  if outcome == Outcome::Validate {
    if let Err(e) = recalculate_rarity(store, committed.species_id).await {
      tracing::warn!(
        species_id = %committed.species_id,
        error = %e,
        "rarity recalculation failed"
      );
    }
  }

  Ok(Decision {
    deltas: moderation::reputation_deltas(outcome, committed.author_id, moderator),
    message: moderation::confirmation(outcome),
    observation: committed,
  })
}

/// Recount validated observations of a species and raise its rarity.
pub async fn recalculate_rarity<S>(store: &S, species_id: Uuid) -> Result<Species>
where
  S: ObservationStore,
{
  let validated = store.count_validated(species_id).await.map_err(Error::store)?;
  store
    .raise_rarity(species_id, rarity::score(validated))
    .await
    .map_err(Error::store)?
    .ok_or(Error::SpeciesNotFound(species_id))
}

pub async fn taxonomy_report<S>(store: &S) -> Result<TaxonomyReport>
where
  S: ObservationStore,
{
  let counts = store.observation_counts().await.map_err(Error::store)?;
  Ok(taxonomy::report(counts))
}
