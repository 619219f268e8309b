//! Observations and their moderation status.
//!
//! An observation is created `PENDING` by its author and moves at most once
//! to one of the terminal states. Terminal observations are immutable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

pub const MIN_DANGER_LEVEL: i64 = 1;
pub const MAX_DANGER_LEVEL: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ObservationStatus {
  Pending,
  Validated,
  Rejected,
}

impl ObservationStatus {
  pub fn is_terminal(self) -> bool { !matches!(self, Self::Pending) }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Pending => "PENDING",
      Self::Validated => "VALIDATED",
      Self::Rejected => "REJECTED",
    }
  }
}

/// The two moderation outcomes a moderator may choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
  Validate,
  Reject,
}

impl Outcome {
  /// The status an observation ends in after this outcome.
  pub fn target_status(self) -> ObservationStatus {
    match self {
      Outcome::Validate => ObservationStatus::Validated,
      Outcome::Reject => ObservationStatus::Rejected,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
  pub id:           Uuid,
  pub species_id:   Uuid,
  /// Subject id from the account service; not a foreign key.
  pub author_id:    Uuid,
  pub description:  String,
  pub danger_level: i64,
  pub status:       ObservationStatus,
  pub validated_by: Option<Uuid>,
  pub validated_at: Option<DateTime<Utc>>,
  pub created_at:   DateTime<Utc>,
}

/// Raw submission fields as received from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
  pub species_id:   Uuid,
  pub description:  String,
  pub danger_level: i64,
}

/// A validated submission, ready to be throttled and persisted.
#[derive(Debug, Clone)]
pub struct NewObservation {
  pub species_id:   Uuid,
  pub author_id:    Uuid,
  pub description:  String,
  pub danger_level: i64,
}

impl NewObservation {
  /// Check the shape of a submission. Runs before any store access.
  pub fn validate(submission: Submission, author_id: Uuid) -> Result<Self> {
    if submission.description.trim().is_empty() {
      return Err(Error::Validation("description is required".into()));
    }
    if !(MIN_DANGER_LEVEL..=MAX_DANGER_LEVEL).contains(&submission.danger_level) {
      return Err(Error::Validation(format!(
        "danger level must be between {MIN_DANGER_LEVEL} and {MAX_DANGER_LEVEL}"
      )));
    }
    Ok(Self {
      species_id: submission.species_id,
      author_id,
      description: submission.description,
      danger_level: submission.danger_level,
    })
  }

  pub fn into_observation(self, created_at: DateTime<Utc>) -> Observation {
    Observation {
      id: Uuid::new_v4(),
      species_id: self.species_id,
      author_id: self.author_id,
      description: self.description,
      danger_level: self.danger_level,
      status: ObservationStatus::Pending,
      validated_by: None,
      validated_at: None,
      created_at,
    }
  }
}

/// A committed-to status change, applied by
/// [`ObservationStore::apply_transition`](crate::store::ObservationStore::apply_transition).
#[derive(Debug, Clone, Copy)]
pub struct Transition {
  pub observation_id: Uuid,
  pub status:         ObservationStatus,
  pub moderator_id:   Uuid,
  pub at:             DateTime<Utc>,
}
