//! The reputation ledger owned by the account service.
//!
//! Reputation only moves through [`LedgerStore::increment_reputation`], which
//! applies a relative delta and the promotion rule in one atomic update.

use std::future::Future;

use uuid::Uuid;

use crate::subject::{Account, NewAccount, ReputationTotal, Role};

/// Reputation at which a `USER` becomes an `EXPERT`.
pub const PROMOTION_THRESHOLD: i64 = 10;

/// The role a subject holds after its reputation changes to `reputation`.
///
/// Only `USER` is ever raised, and never lowered again: crossing back below
/// the threshold keeps `EXPERT`. `EXPERT` and `ADMIN` are left untouched.
pub fn promoted_role(current: Role, reputation: i64) -> Role {
  match current {
    Role::User if reputation >= PROMOTION_THRESHOLD => Role::Expert,
    Role::User | Role::Expert | Role::Admin => current,
  }
}

/// Abstraction over the account service's storage backend.
pub trait LedgerStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new `USER` account with zero reputation.
  ///
  /// Returns `None` if the email or username is already taken.
  fn register(
    &self,
    input: NewAccount,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  fn get_account(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Look up an account by its (case-insensitive) email.
  fn find_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + 'a;

  fn list_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<Account>, Self::Error>> + Send + '_;

  /// Explicitly set a role. Returns `None` if the account does not exist.
  fn set_role(
    &self,
    id: Uuid,
    role: Role,
  ) -> impl Future<Output = Result<Option<Account>, Self::Error>> + Send + '_;

  /// Atomically add `delta` to the subject's reputation and apply
  /// [`promoted_role`] to the new total.
  ///
  /// Must be a relative update so concurrent increments do not lose writes.
  /// Returns `None` if the subject does not exist.
  fn increment_reputation(
    &self,
    id: Uuid,
    delta: i64,
  ) -> impl Future<Output = Result<Option<ReputationTotal>, Self::Error>> + Send + '_;
}
