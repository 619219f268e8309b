//! Reputation propagation: best-effort delivery of ledger deltas.
//!
//! Runs only after a moderation decision has been committed. Every delta is
//! one independent increment call; a failed call is logged with the subject
//! and the attempted amount and then dropped. There is no retry and no
//! compensation: the moderation decision stands regardless of the outcome
//! here, and the ledger may drift if a call is lost.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Error,
  ledger::LedgerStore,
  subject::ReputationTotal,
};

/// A signed adjustment owed to one subject's ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReputationDelta {
  pub subject_id: Uuid,
  pub amount:     i64,
}

/// The remote increment operation exposed by the account service.
pub trait ReputationLedger: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn increment(
    &self,
    subject_id: Uuid,
    amount: i64,
  ) -> impl Future<Output = Result<ReputationTotal, Self::Error>> + Send + '_;
}

/// What happened to one delta.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
  Applied(ReputationTotal),
  Failed { error: String },
}

/// Attempt every delta once, in order. Failures are isolated per call.
pub async fn propagate<L>(ledger: &L, deltas: &[ReputationDelta]) -> Vec<(ReputationDelta, Delivery)>
where
  L: ReputationLedger,
{
  let mut outcomes = Vec::with_capacity(deltas.len());
  for delta in deltas {
    let delivery = match ledger.increment(delta.subject_id, delta.amount).await {
      Ok(total) => {
        tracing::debug!(
          subject_id = %delta.subject_id,
          amount = delta.amount,
          reputation = total.reputation,
          role = %total.role,
          "reputation delta applied"
        );
        Delivery::Applied(total)
      }
      Err(e) => {
        tracing::warn!(
          subject_id = %delta.subject_id,
          amount = delta.amount,
          error = %e,
          "reputation delta lost; ledger needs manual reconciliation"
        );
        Delivery::Failed { error: e.to_string() }
      }
    };
    outcomes.push((*delta, delivery));
  }
  outcomes
}

/// Adapter that applies deltas straight to an in-process [`LedgerStore`].
///
/// Useful when both services share a process, and in tests.
pub struct LocalLedger<S>(pub S);

impl<S> ReputationLedger for LocalLedger<S>
where
  S: LedgerStore,
{
  type Error = Error;

  async fn increment(&self, subject_id: Uuid, amount: i64) -> Result<ReputationTotal, Error> {
    self
      .0
      .increment_reputation(subject_id, amount)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubjectNotFound(subject_id))
  }
}
