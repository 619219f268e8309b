//! Subjects: the authenticated actors of both services.
//!
//! The account service owns [`Account`] records. Everything the observation
//! service knows about a caller is the [`Identity`] carried by its bearer
//! token; it never joins against accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The privilege level of a subject.
///
/// Ordering is meaningful: `User < Expert < Admin`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  User,
  Expert,
  Admin,
}

impl Role {
  /// Whether this role may validate or reject observations.
  pub fn can_moderate(self) -> bool {
    match self {
      Role::User => false,
      Role::Expert | Role::Admin => true,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Role::User => "USER",
      Role::Expert => "EXPERT",
      Role::Admin => "ADMIN",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

impl std::str::FromStr for Role {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_uppercase().as_str() {
      "USER" => Ok(Role::User),
      "EXPERT" => Ok(Role::Expert),
      "ADMIN" => Ok(Role::Admin),
      other => Err(crate::Error::Validation(format!("unknown role: {other:?}"))),
    }
  }
}

/// A verified identity assertion: who is calling and with which role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
  pub subject_id: Uuid,
  pub role:       Role,
}

/// An account record held by the account service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
  pub id:            Uuid,
  pub email:         String,
  pub username:      String,
  /// Argon2 PHC string. Never leaves the account service.
  #[serde(skip)]
  pub password_hash: String,
  pub role:          Role,
  pub reputation:    i64,
  pub created_at:    DateTime<Utc>,
}

impl Account {
  pub fn identity(&self) -> Identity {
    Identity { subject_id: self.id, role: self.role }
  }
}

/// Input to [`LedgerStore::register`](crate::ledger::LedgerStore::register).
#[derive(Debug, Clone)]
pub struct NewAccount {
  pub email:         String,
  pub username:      String,
  pub password_hash: String,
}

/// The result of a reputation increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReputationTotal {
  pub id:         Uuid,
  pub reputation: i64,
  pub role:       Role,
}
