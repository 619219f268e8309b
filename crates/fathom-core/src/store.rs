//! The `ObservationStore` trait.
//!
//! Implemented by storage backends (e.g. `fathom-store-sqlite`). The workflow
//! functions in [`crate::workflow`] and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  observation::{Observation, Transition},
  species::Species,
};

/// Abstraction over the observation service's storage backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ObservationStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Species ───────────────────────────────────────────────────────────

  /// Persist a species. Returns `None` if the name is already taken.
  fn insert_species(
    &self,
    species: Species,
  ) -> impl Future<Output = Result<Option<Species>, Self::Error>> + Send + '_;

  fn get_species(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Species>, Self::Error>> + Send + '_;

  fn list_species(
    &self,
  ) -> impl Future<Output = Result<Vec<Species>, Self::Error>> + Send + '_;

  /// Raise the species' rarity score to `score` if it is currently lower.
  /// Returns the species as stored afterwards, or `None` if it is missing.
  fn raise_rarity(
    &self,
    species_id: Uuid,
    score: f64,
  ) -> impl Future<Output = Result<Option<Species>, Self::Error>> + Send + '_;

  // ── Observations ──────────────────────────────────────────────────────

  /// Persist a new observation. A dangling `species_id` is an error.
  fn insert_observation(
    &self,
    observation: Observation,
  ) -> impl Future<Output = Result<Observation, Self::Error>> + Send + '_;

  fn get_observation(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Observation>, Self::Error>> + Send + '_;

  /// The most recently created observation for an (author, species) pair.
  fn latest_observation(
    &self,
    author_id: Uuid,
    species_id: Uuid,
  ) -> impl Future<Output = Result<Option<Observation>, Self::Error>> + Send + '_;

  fn list_observations(
    &self,
    species_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Observation>, Self::Error>> + Send + '_;

  /// Number of `VALIDATED` observations of a species.
  fn count_validated(
    &self,
    species_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Apply a status transition, but only if the observation is still
  /// `PENDING`. Returns `None` if no pending observation matched.
  fn apply_transition(
    &self,
    transition: Transition,
  ) -> impl Future<Output = Result<Option<Observation>, Self::Error>> + Send + '_;

  /// Every species with its total number of observations.
  fn observation_counts(
    &self,
  ) -> impl Future<Output = Result<Vec<(Species, u64)>, Self::Error>> + Send + '_;
}
