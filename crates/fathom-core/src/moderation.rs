//! Moderation guards and the reputation consequences of a decision.
//!
//! Guards run in a fixed order and the first failure wins:
//!
//! 1. role: `USER` may not moderate (checked before the observation is
//!    even looked up);
//! 2. existence: checked by the caller against the store;
//! 3. self-moderation: nobody moderates their own submission;
//! 4. terminality: a `VALIDATED` or `REJECTED` observation is final.

use uuid::Uuid;

use crate::{
  Error, Result,
  observation::{Observation, Outcome},
  propagation::ReputationDelta,
  subject::{Identity, Role},
};

/// Points credited to the author of a validated observation.
pub const VALIDATED_AUTHOR_POINTS: i64 = 3;
/// Points credited to an `EXPERT` who validates someone else's observation.
pub const EXPERT_VALIDATOR_POINTS: i64 = 1;
/// Points debited from the author of a rejected observation.
pub const REJECTED_AUTHOR_POINTS: i64 = -1;

/// Guard 1.
pub fn check_role(moderator: Identity) -> Result<()> {
  if moderator.role.can_moderate() {
    Ok(())
  } else {
    Err(Error::Forbidden("moderation is restricted to experts and admins".into()))
  }
}

/// Guards 3 and 4, against an observation that is known to exist.
pub fn check_observation(observation: &Observation, moderator: Identity) -> Result<()> {
  if observation.author_id == moderator.subject_id {
    return Err(Error::SelfModeration);
  }
  if observation.status.is_terminal() {
    return Err(Error::AlreadyModerated(observation.id));
  }
  Ok(())
}

/// The ledger adjustments owed for a committed decision.
///
/// Validation credits the author and, for an `EXPERT` moderator, the
/// moderator too; `ADMIN` moderators earn nothing. Rejection debits the
/// author only.
pub fn reputation_deltas(
  outcome: Outcome,
  author_id: Uuid,
  moderator: Identity,
) -> Vec<ReputationDelta> {
  match outcome {
    Outcome::Validate => {
      let mut deltas = vec![ReputationDelta {
        subject_id: author_id,
        amount:     VALIDATED_AUTHOR_POINTS,
      }];
      match moderator.role {
        Role::Expert => deltas.push(ReputationDelta {
          subject_id: moderator.subject_id,
          amount:     EXPERT_VALIDATOR_POINTS,
        }),
        Role::Admin | Role::User => {}
      }
      deltas
    }
    Outcome::Reject => vec![ReputationDelta {
      subject_id: author_id,
      amount:     REJECTED_AUTHOR_POINTS,
    }],
  }
}

/// Human-readable confirmation returned with a decision.
pub fn confirmation(outcome: Outcome) -> &'static str {
  match outcome {
    Outcome::Validate => "Observation validated.",
    Outcome::Reject => "Observation rejected.",
  }
}
