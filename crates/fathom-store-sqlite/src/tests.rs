//! Integration tests for the SQLite stores against in-memory databases.

use chrono::{Duration, Utc};
use fathom_core::{
  Error as CoreError,
  ledger::LedgerStore,
  observation::{ObservationStatus, Outcome, Submission, Transition},
  propagation::{LocalLedger, propagate},
  species::NewSpecies,
  store::ObservationStore,
  subject::{Identity, NewAccount, Role},
  workflow::{create_species, decide_observation, submit_observation},
};
use uuid::Uuid;

use crate::{SqliteLedgerStore, SqliteObservationStore};

async fn observations() -> SqliteObservationStore {
  SqliteObservationStore::open_in_memory()
    .await
    .expect("in-memory observation store")
}

async fn ledger() -> SqliteLedgerStore {
  SqliteLedgerStore::open_in_memory()
    .await
    .expect("in-memory ledger store")
}

fn new_account(name: &str) -> NewAccount {
  NewAccount {
    email:         format!("{name}@example.com"),
    username:      name.into(),
    password_hash: "$argon2id$placeholder".into(),
  }
}

fn sighting(species_id: Uuid) -> Submission {
  Submission {
    species_id,
    description: "seen near trench".into(),
    danger_level: 3,
  }
}

// ─── Species ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_species() {
  let s = observations().await;
  let author = Uuid::new_v4();
  let species = NewSpecies::new("Giant Squid", author).unwrap().into_species(Utc::now());

  let stored = s.insert_species(species.clone()).await.unwrap().unwrap();
  assert_eq!(stored.id, species.id);

  let fetched = s.get_species(species.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Giant Squid");
  assert_eq!(fetched.author_id, author);
  assert_eq!(fetched.rarity_score, 1.0);
}

#[tokio::test]
async fn duplicate_species_name_returns_none() {
  let s = observations().await;
  let first = NewSpecies::new("Frilled Shark", Uuid::new_v4()).unwrap();
  let second = NewSpecies::new("Frilled Shark", Uuid::new_v4()).unwrap();

  assert!(s.insert_species(first.into_species(Utc::now())).await.unwrap().is_some());
  assert!(s.insert_species(second.into_species(Utc::now())).await.unwrap().is_none());
  assert_eq!(s.list_species().await.unwrap().len(), 1);
}

#[tokio::test]
async fn get_species_missing_returns_none() {
  let s = observations().await;
  assert!(s.get_species(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn raise_rarity_never_lowers() {
  let s = observations().await;
  let species = NewSpecies::new("Vampire Squid", Uuid::new_v4()).unwrap().into_species(Utc::now());
  s.insert_species(species.clone()).await.unwrap();

  let raised = s.raise_rarity(species.id, 1.6).await.unwrap().unwrap();
  assert_eq!(raised.rarity_score, 1.6);

  let kept = s.raise_rarity(species.id, 1.2).await.unwrap().unwrap();
  assert_eq!(kept.rarity_score, 1.6);

  assert!(s.raise_rarity(Uuid::new_v4(), 2.0).await.unwrap().is_none());
}

// ─── Observations ────────────────────────────────────────────────────────────

#[tokio::test]
async fn observation_with_unknown_species_fails() {
  let s = observations().await;
  let author = Identity { subject_id: Uuid::new_v4(), role: Role::User };

  let err = submit_observation(&s, author, sighting(Uuid::new_v4()), Utc::now())
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Store(_)));
}

#[tokio::test]
async fn latest_observation_orders_by_creation() {
  let s = observations().await;
  let author = Identity { subject_id: Uuid::new_v4(), role: Role::User };
  let species = create_species(&s, author, "Anglerfish", Utc::now()).await.unwrap();
  let t0 = Utc::now() - Duration::hours(1);

  let older = submit_observation(&s, author, sighting(species.id), t0).await.unwrap();
  let newer = submit_observation(&s, author, sighting(species.id), t0 + Duration::minutes(10))
    .await
    .unwrap();

  let latest = s
    .latest_observation(author.subject_id, species.id)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(latest.id, newer.id);
  assert_ne!(latest.id, older.id);

  let all = s.list_observations(species.id).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].id, older.id);
}

#[tokio::test]
async fn throttle_reads_persisted_observation() {
  let s = observations().await;
  let author = Identity { subject_id: Uuid::new_v4(), role: Role::User };
  let species = create_species(&s, author, "Gulper Eel", Utc::now()).await.unwrap();
  let now = Utc::now();

  submit_observation(&s, author, sighting(species.id), now).await.unwrap();
  let err = submit_observation(&s, author, sighting(species.id), now + Duration::seconds(30))
    .await
    .unwrap_err();
  assert!(matches!(err, CoreError::Throttled { minutes: 5 }));
}

#[tokio::test]
async fn transition_applies_only_once() {
  let s = observations().await;
  let author = Identity { subject_id: Uuid::new_v4(), role: Role::User };
  let species = create_species(&s, author, "Barreleye", Utc::now()).await.unwrap();
  let obs = submit_observation(&s, author, sighting(species.id), Utc::now()).await.unwrap();

  let first = Transition {
    observation_id: obs.id,
    status:         ObservationStatus::Validated,
    moderator_id:   Uuid::new_v4(),
    at:             Utc::now(),
  };
  let applied = s.apply_transition(first).await.unwrap().unwrap();
  assert_eq!(applied.status, ObservationStatus::Validated);
  assert_eq!(applied.validated_by, Some(first.moderator_id));

  let second = Transition { status: ObservationStatus::Rejected, ..first };
  assert!(s.apply_transition(second).await.unwrap().is_none());

  let stored = s.get_observation(obs.id).await.unwrap().unwrap();
  assert_eq!(stored.status, ObservationStatus::Validated);
}

#[tokio::test]
async fn validation_recounts_rarity() {
  let s = observations().await;
  let expert = Identity { subject_id: Uuid::new_v4(), role: Role::Expert };
  let species = create_species(&s, expert, "Dumbo Octopus", Utc::now()).await.unwrap();

  for _ in 0..2 {
    let author = Identity { subject_id: Uuid::new_v4(), role: Role::User };
    let obs = submit_observation(&s, author, sighting(species.id), Utc::now()).await.unwrap();
    decide_observation(&s, expert, obs.id, Outcome::Validate, Utc::now()).await.unwrap();
  }

  let stored = s.get_species(species.id).await.unwrap().unwrap();
  assert!((stored.rarity_score - 1.4).abs() < 1e-9);
  assert_eq!(s.count_validated(species.id).await.unwrap(), 2);
}

#[tokio::test]
async fn observation_counts_include_empty_species() {
  let s = observations().await;
  let author = Identity { subject_id: Uuid::new_v4(), role: Role::User };
  let squid = create_species(&s, author, "Giant Squid", Utc::now()).await.unwrap();
  create_species(&s, author, "Sperm Whale", Utc::now()).await.unwrap();
  submit_observation(&s, author, sighting(squid.id), Utc::now()).await.unwrap();

  let counts = s.observation_counts().await.unwrap();
  assert_eq!(counts.len(), 2);
  assert_eq!(counts[0].0.name, "Giant Squid");
  assert_eq!(counts[0].1, 1);
  assert_eq!(counts[1].1, 0);
}

// ─── Ledger ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_starts_as_user_with_zero() {
  let l = ledger().await;
  let account = l.register(new_account("alice")).await.unwrap().unwrap();
  assert_eq!(account.role, Role::User);
  assert_eq!(account.reputation, 0);

  let fetched = l.get_account(account.id).await.unwrap().unwrap();
  assert_eq!(fetched.username, "alice");
  assert_eq!(fetched.password_hash, "$argon2id$placeholder");
}

#[tokio::test]
async fn register_duplicate_email_or_username() {
  let l = ledger().await;
  l.register(new_account("alice")).await.unwrap().unwrap();

  let mut same_email = new_account("bob");
  same_email.email = "ALICE@example.com".into();
  assert!(l.register(same_email).await.unwrap().is_none());

  let mut same_name = new_account("alice");
  same_name.email = "other@example.com".into();
  assert!(l.register(same_name).await.unwrap().is_none());

  assert_eq!(l.list_accounts().await.unwrap().len(), 1);
}

#[tokio::test]
async fn find_by_email_is_case_insensitive() {
  let l = ledger().await;
  let account = l.register(new_account("carol")).await.unwrap().unwrap();
  let found = l.find_by_email("Carol@Example.com").await.unwrap().unwrap();
  assert_eq!(found.id, account.id);
  assert!(l.find_by_email("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn increment_promotes_at_threshold_and_never_demotes() {
  let l = ledger().await;
  let account = l.register(new_account("dave")).await.unwrap().unwrap();

  let t = l.increment_reputation(account.id, 9).await.unwrap().unwrap();
  assert_eq!((t.reputation, t.role), (9, Role::User));

  let t = l.increment_reputation(account.id, 1).await.unwrap().unwrap();
  assert_eq!((t.reputation, t.role), (10, Role::Expert));

  let t = l.increment_reputation(account.id, -4).await.unwrap().unwrap();
  assert_eq!((t.reputation, t.role), (6, Role::Expert));

  let stored = l.get_account(account.id).await.unwrap().unwrap();
  assert_eq!(stored.role, Role::Expert);
}

#[tokio::test]
async fn increment_leaves_admin_alone() {
  let l = ledger().await;
  let account = l.register(new_account("erin")).await.unwrap().unwrap();
  l.set_role(account.id, Role::Admin).await.unwrap().unwrap();

  let t = l.increment_reputation(account.id, 50).await.unwrap().unwrap();
  assert_eq!(t.role, Role::Admin);
}

#[tokio::test]
async fn increment_unknown_subject_returns_none() {
  let l = ledger().await;
  assert!(l.increment_reputation(Uuid::new_v4(), 3).await.unwrap().is_none());
  assert!(l.set_role(Uuid::new_v4(), Role::Expert).await.unwrap().is_none());
}

#[tokio::test]
async fn concurrent_increments_do_not_lose_updates() {
  let l = ledger().await;
  let account = l.register(new_account("frank")).await.unwrap().unwrap();

  let handles: Vec<_> = (0..20)
    .map(|_| {
      let l = l.clone();
      tokio::spawn(async move { l.increment_reputation(account.id, 1).await })
    })
    .collect();
  for h in handles {
    h.await.unwrap().unwrap().unwrap();
  }

  let stored = l.get_account(account.id).await.unwrap().unwrap();
  assert_eq!(stored.reputation, 20);
  assert_eq!(stored.role, Role::Expert);
}

// ─── Moderation across both stores ───────────────────────────────────────────

/// Register an account and bring it to `reputation` through the ledger.
async fn account_with(l: &SqliteLedgerStore, name: &str, role: Role, reputation: i64) -> Identity {
  let account = l.register(new_account(name)).await.unwrap().unwrap();
  if role != Role::User {
    l.set_role(account.id, role).await.unwrap().unwrap();
  }
  if reputation != 0 {
    l.increment_reputation(account.id, reputation).await.unwrap().unwrap();
  }
  Identity { subject_id: account.id, role }
}

#[tokio::test]
async fn expert_validation_promotes_author_and_credits_expert() {
  let s = observations().await;
  let l = ledger().await;
  let author = account_with(&l, "author", Role::User, 8).await;
  let expert = account_with(&l, "expert", Role::Expert, 0).await;

  let species = create_species(&s, author, "Giant Isopod", Utc::now()).await.unwrap();
  let obs = submit_observation(&s, author, sighting(species.id), Utc::now()).await.unwrap();
  let decision = decide_observation(&s, expert, obs.id, Outcome::Validate, Utc::now())
    .await
    .unwrap();
  propagate(&LocalLedger(l.clone()), &decision.deltas).await;

  let a = l.get_account(author.subject_id).await.unwrap().unwrap();
  assert_eq!((a.reputation, a.role), (11, Role::Expert));
  let e = l.get_account(expert.subject_id).await.unwrap().unwrap();
  assert_eq!(e.reputation, 1);
}

#[tokio::test]
async fn admin_validation_promotes_author_without_bonus() {
  let s = observations().await;
  let l = ledger().await;
  let author = account_with(&l, "author", Role::User, 9).await;
  let admin = account_with(&l, "admin", Role::Admin, 0).await;

  let species = create_species(&s, author, "Sea Pig", Utc::now()).await.unwrap();
  let obs = submit_observation(&s, author, sighting(species.id), Utc::now()).await.unwrap();
  let decision = decide_observation(&s, admin, obs.id, Outcome::Validate, Utc::now())
    .await
    .unwrap();
  propagate(&LocalLedger(l.clone()), &decision.deltas).await;

  let a = l.get_account(author.subject_id).await.unwrap().unwrap();
  assert_eq!((a.reputation, a.role), (12, Role::Expert));
  let ad = l.get_account(admin.subject_id).await.unwrap().unwrap();
  assert_eq!((ad.reputation, ad.role), (0, Role::Admin));
}

#[tokio::test]
async fn rejection_debits_author() {
  let s = observations().await;
  let l = ledger().await;
  let author = account_with(&l, "author", Role::User, 0).await;
  let expert = account_with(&l, "expert", Role::Expert, 0).await;

  let species = create_species(&s, author, "Blobfish", Utc::now()).await.unwrap();
  let obs = submit_observation(&s, author, sighting(species.id), Utc::now()).await.unwrap();
  let decision = decide_observation(&s, expert, obs.id, Outcome::Reject, Utc::now())
    .await
    .unwrap();
  propagate(&LocalLedger(l.clone()), &decision.deltas).await;

  let a = l.get_account(author.subject_id).await.unwrap().unwrap();
  assert_eq!(a.reputation, -1);
  let e = l.get_account(expert.subject_id).await.unwrap().unwrap();
  assert_eq!(e.reputation, 0);
  let sp = s.get_species(species.id).await.unwrap().unwrap();
  assert_eq!(sp.rarity_score, 1.0);
}
