//! Workflow tests against an in-memory [`ObservationStore`].

use std::{convert::Infallible, sync::Mutex};

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
  Error,
  observation::{Observation, ObservationStatus, Outcome, Submission, Transition},
  propagation::ReputationDelta,
  species::Species,
  store::ObservationStore,
  subject::{Identity, Role},
  workflow::{create_species, decide_observation, submit_observation},
};

#[derive(Default)]
struct MemoryStore {
  species:      Mutex<Vec<Species>>,
  observations: Mutex<Vec<Observation>>,
}

impl ObservationStore for MemoryStore {
  type Error = Infallible;

  async fn insert_species(&self, species: Species) -> Result<Option<Species>, Infallible> {
    let mut all = self.species.lock().unwrap();
    if all.iter().any(|s| s.name == species.name) {
      return Ok(None);
    }
    all.push(species.clone());
    Ok(Some(species))
  }

  async fn get_species(&self, id: Uuid) -> Result<Option<Species>, Infallible> {
    Ok(self.species.lock().unwrap().iter().find(|s| s.id == id).cloned())
  }

  async fn list_species(&self) -> Result<Vec<Species>, Infallible> {
    Ok(self.species.lock().unwrap().clone())
  }

  async fn raise_rarity(&self, species_id: Uuid, score: f64) -> Result<Option<Species>, Infallible> {
    let mut all = self.species.lock().unwrap();
    Ok(all.iter_mut().find(|s| s.id == species_id).map(|s| {
      s.rarity_score = s.rarity_score.max(score);
      s.clone()
    }))
  }

  async fn insert_observation(&self, observation: Observation) -> Result<Observation, Infallible> {
    self.observations.lock().unwrap().push(observation.clone());
    Ok(observation)
  }

  async fn get_observation(&self, id: Uuid) -> Result<Option<Observation>, Infallible> {
    Ok(self.observations.lock().unwrap().iter().find(|o| o.id == id).cloned())
  }

  async fn latest_observation(
    &self,
    author_id: Uuid,
    species_id: Uuid,
  ) -> Result<Option<Observation>, Infallible> {
    Ok(
      self
        .observations
        .lock()
        .unwrap()
        .iter()
        .filter(|o| o.author_id == author_id && o.species_id == species_id)
        .max_by_key(|o| o.created_at)
        .cloned(),
    )
  }

  async fn list_observations(&self, species_id: Uuid) -> Result<Vec<Observation>, Infallible> {
    Ok(
      self
        .observations
        .lock()
        .unwrap()
        .iter()
        .filter(|o| o.species_id == species_id)
        .cloned()
        .collect(),
    )
  }

  async fn count_validated(&self, species_id: Uuid) -> Result<u64, Infallible> {
    Ok(
      self
        .observations
        .lock()
        .unwrap()
        .iter()
        .filter(|o| o.species_id == species_id && o.status == ObservationStatus::Validated)
        .count() as u64,
    )
  }

  async fn apply_transition(&self, t: Transition) -> Result<Option<Observation>, Infallible> {
    let mut all = self.observations.lock().unwrap();
    Ok(
      all
        .iter_mut()
        .find(|o| o.id == t.observation_id && o.status == ObservationStatus::Pending)
        .map(|o| {
          o.status = t.status;
          o.validated_by = Some(t.moderator_id);
          o.validated_at = Some(t.at);
          o.clone()
        }),
    )
  }

  async fn observation_counts(&self) -> Result<Vec<(Species, u64)>, Infallible> {
    let observations = self.observations.lock().unwrap();
    Ok(
      self
        .species
        .lock()
        .unwrap()
        .iter()
        .map(|s| {
          let n = observations.iter().filter(|o| o.species_id == s.id).count() as u64;
          (s.clone(), n)
        })
        .collect(),
    )
  }
}

fn who(role: Role) -> Identity { Identity { subject_id: Uuid::new_v4(), role } }

fn t0() -> DateTime<Utc> { DateTime::from_timestamp(1_700_000_000, 0).unwrap() }

fn sighting(species_id: Uuid, danger_level: i64) -> Submission {
  Submission {
    species_id,
    description: "seen near trench".into(),
    danger_level,
  }
}

async fn seeded() -> (MemoryStore, Species, Identity) {
  let store = MemoryStore::default();
  let author = who(Role::User);
  let species = create_species(&store, author, "Giant Squid", t0()).await.unwrap();
  (store, species, author)
}

// ─── Species ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn duplicate_species_name_is_validation_error() {
  let (store, _, author) = seeded().await;
  let err = create_species(&store, author, "  Giant Squid ", t0()).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn blank_species_name_rejected() {
  let store = MemoryStore::default();
  let err = create_species(&store, who(Role::User), "   ", t0()).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Submission ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submission_starts_pending() {
  let (store, species, author) = seeded().await;
  let obs = submit_observation(&store, author, sighting(species.id, 3), t0()).await.unwrap();
  assert_eq!(obs.status, ObservationStatus::Pending);
  assert_eq!(obs.author_id, author.subject_id);
  assert_eq!(obs.created_at, t0());
  assert!(obs.validated_by.is_none());
}

#[tokio::test]
async fn danger_level_out_of_range_rejected() {
  let (store, species, author) = seeded().await;
  for level in [0, 6, -1, 100] {
    let err = submit_observation(&store, author, sighting(species.id, level), t0())
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Validation(_)), "level {level}");
  }
}

#[tokio::test]
async fn blank_description_rejected() {
  let (store, species, author) = seeded().await;
  let mut input = sighting(species.id, 2);
  input.description = " \t\n".into();
  let err = submit_observation(&store, author, input, t0()).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn validation_runs_before_throttle() {
  let (store, species, author) = seeded().await;
  submit_observation(&store, author, sighting(species.id, 3), t0()).await.unwrap();

  let err = submit_observation(&store, author, sighting(species.id, 9), t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

#[tokio::test]
async fn resubmission_within_window_throttled() {
  let (store, species, author) = seeded().await;
  submit_observation(&store, author, sighting(species.id, 3), t0()).await.unwrap();

  let err = submit_observation(
    &store,
    author,
    sighting(species.id, 3),
    t0() + Duration::seconds(90),
  )
  .await
  .unwrap_err();
  assert!(matches!(err, Error::Throttled { minutes: 4 }));

  submit_observation(&store, author, sighting(species.id, 3), t0() + Duration::minutes(5))
    .await
    .unwrap();
}

#[tokio::test]
async fn throttle_is_per_species_and_author() {
  let (store, squid, author) = seeded().await;
  let shark = create_species(&store, author, "Frilled Shark", t0()).await.unwrap();
  submit_observation(&store, author, sighting(squid.id, 3), t0()).await.unwrap();

  submit_observation(&store, author, sighting(shark.id, 3), t0()).await.unwrap();
  submit_observation(&store, who(Role::User), sighting(squid.id, 3), t0()).await.unwrap();
}

// ─── Moderation ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_forbidden_before_existence_check() {
  let store = MemoryStore::default();
  let err = decide_observation(&store, who(Role::User), Uuid::new_v4(), Outcome::Validate, t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Forbidden(_)));
}

#[tokio::test]
async fn missing_observation_not_found() {
  let store = MemoryStore::default();
  let id = Uuid::new_v4();
  let err = decide_observation(&store, who(Role::Expert), id, Outcome::Reject, t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::ObservationNotFound(x) if x == id));
}

#[tokio::test]
async fn own_submission_cannot_be_moderated() {
  let (store, species, _) = seeded().await;
  let expert = who(Role::Expert);
  let obs = submit_observation(&store, expert, sighting(species.id, 1), t0()).await.unwrap();
  let err = decide_observation(&store, expert, obs.id, Outcome::Validate, t0())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::SelfModeration));
}

#[tokio::test]
async fn expert_validation_commits_and_recomputes_rarity() {
  let (store, species, author) = seeded().await;
  let expert = who(Role::Expert);
  let obs = submit_observation(&store, author, sighting(species.id, 3), t0()).await.unwrap();
  let later = t0() + Duration::minutes(1);

  let decision = decide_observation(&store, expert, obs.id, Outcome::Validate, later)
    .await
    .unwrap();

  assert_eq!(decision.observation.status, ObservationStatus::Validated);
  assert_eq!(decision.observation.validated_by, Some(expert.subject_id));
  assert_eq!(decision.observation.validated_at, Some(later));
  assert_eq!(decision.deltas, vec![
    ReputationDelta { subject_id: author.subject_id, amount: 3 },
    ReputationDelta { subject_id: expert.subject_id, amount: 1 },
  ]);

  let stored = store.get_species(species.id).await.unwrap().unwrap();
  assert!((stored.rarity_score - 1.2).abs() < 1e-9);
}

#[tokio::test]
async fn rejection_leaves_rarity_alone() {
  let (store, species, author) = seeded().await;
  let obs = submit_observation(&store, author, sighting(species.id, 3), t0()).await.unwrap();

  let decision = decide_observation(&store, who(Role::Admin), obs.id, Outcome::Reject, t0())
    .await
    .unwrap();

  assert_eq!(decision.observation.status, ObservationStatus::Rejected);
  assert_eq!(decision.deltas, vec![ReputationDelta {
    subject_id: author.subject_id,
    amount:     -1,
  }]);
  let stored = store.get_species(species.id).await.unwrap().unwrap();
  assert_eq!(stored.rarity_score, 1.0);
}

#[tokio::test]
async fn terminal_observation_is_immutable() {
  let (store, species, author) = seeded().await;
  let first = who(Role::Expert);
  let obs = submit_observation(&store, author, sighting(species.id, 3), t0()).await.unwrap();
  decide_observation(&store, first, obs.id, Outcome::Validate, t0()).await.unwrap();

  for outcome in [Outcome::Validate, Outcome::Reject] {
    let err = decide_observation(&store, who(Role::Admin), obs.id, outcome, t0() + Duration::hours(1))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::AlreadyModerated(_)));
  }

  let stored = store.get_observation(obs.id).await.unwrap().unwrap();
  assert_eq!(stored.status, ObservationStatus::Validated);
  assert_eq!(stored.validated_by, Some(first.subject_id));
  assert_eq!(stored.validated_at, Some(t0()));
  let species = store.get_species(species.id).await.unwrap().unwrap();
  assert!((species.rarity_score - 1.2).abs() < 1e-9);
}
