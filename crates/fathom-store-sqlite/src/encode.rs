//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microsecond
//! precision, `Z` suffix) so that `ORDER BY` on the text column is
//! chronological. UUIDs are stored as hyphenated lowercase strings. Enums are
//! stored as their upper-case wire names.

use chrono::{DateTime, SecondsFormat, Utc};
use fathom_core::{
  observation::{Observation, ObservationStatus},
  species::Species,
  subject::{Account, Role},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> &'static str { r.as_str() }

pub fn decode_role(s: &str) -> Result<Role> {
  match s {
    "USER" => Ok(Role::User),
    "EXPERT" => Ok(Role::Expert),
    "ADMIN" => Ok(Role::Admin),
    other => Err(Error::Decode(format!("unknown role: {other:?}"))),
  }
}

/// Surface a decode failure from inside a connection closure.
pub fn conversion_failure(column: usize, e: Error) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

// ─── ObservationStatus ───────────────────────────────────────────────────────

pub fn encode_status(s: ObservationStatus) -> &'static str { s.as_str() }

pub fn decode_status(s: &str) -> Result<ObservationStatus> {
  match s {
    "PENDING" => Ok(ObservationStatus::Pending),
    "VALIDATED" => Ok(ObservationStatus::Validated),
    "REJECTED" => Ok(ObservationStatus::Rejected),
    other => Err(Error::Decode(format!("unknown observation status: {other:?}"))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const SPECIES_COLUMNS: &str = "species_id, name, author_id, rarity_score, created_at";

/// Raw values read directly from a `species` row.
pub struct RawSpecies {
  pub species_id:   String,
  pub name:         String,
  pub author_id:    String,
  pub rarity_score: f64,
  pub created_at:   String,
}

impl RawSpecies {
  /// Read the [`SPECIES_COLUMNS`] starting at column `offset`.
  pub fn from_row(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      species_id:   row.get(offset)?,
      name:         row.get(offset + 1)?,
      author_id:    row.get(offset + 2)?,
      rarity_score: row.get(offset + 3)?,
      created_at:   row.get(offset + 4)?,
    })
  }

  pub fn into_species(self) -> Result<Species> {
    Ok(Species {
      id:           decode_uuid(&self.species_id)?,
      name:         self.name,
      author_id:    decode_uuid(&self.author_id)?,
      rarity_score: self.rarity_score,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const OBSERVATION_COLUMNS: &str = "observation_id, species_id, author_id, description, \
   danger_level, status, validated_by, validated_at, created_at";

/// Raw values read directly from an `observations` row.
pub struct RawObservation {
  pub observation_id: String,
  pub species_id:     String,
  pub author_id:      String,
  pub description:    String,
  pub danger_level:   i64,
  pub status:         String,
  pub validated_by:   Option<String>,
  pub validated_at:   Option<String>,
  pub created_at:     String,
}

impl RawObservation {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      observation_id: row.get(0)?,
      species_id:     row.get(1)?,
      author_id:      row.get(2)?,
      description:    row.get(3)?,
      danger_level:   row.get(4)?,
      status:         row.get(5)?,
      validated_by:   row.get(6)?,
      validated_at:   row.get(7)?,
      created_at:     row.get(8)?,
    })
  }

  pub fn into_observation(self) -> Result<Observation> {
    Ok(Observation {
      id:           decode_uuid(&self.observation_id)?,
      species_id:   decode_uuid(&self.species_id)?,
      author_id:    decode_uuid(&self.author_id)?,
      description:  self.description,
      danger_level: self.danger_level,
      status:       decode_status(&self.status)?,
      validated_by: self.validated_by.as_deref().map(decode_uuid).transpose()?,
      validated_at: self.validated_at.as_deref().map(decode_dt).transpose()?,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const ACCOUNT_COLUMNS: &str =
  "account_id, email, username, password_hash, role, reputation, created_at";

/// Raw values read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:    String,
  pub email:         String,
  pub username:      String,
  pub password_hash: String,
  pub role:          String,
  pub reputation:    i64,
  pub created_at:    String,
}

impl RawAccount {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      account_id:    row.get(0)?,
      email:         row.get(1)?,
      username:      row.get(2)?,
      password_hash: row.get(3)?,
      role:          row.get(4)?,
      reputation:    row.get(5)?,
      created_at:    row.get(6)?,
    })
  }

  pub fn into_account(self) -> Result<Account> {
    Ok(Account {
      id:            decode_uuid(&self.account_id)?,
      email:         self.email,
      username:      self.username,
      password_hash: self.password_hash,
      role:          decode_role(&self.role)?,
      reputation:    self.reputation,
      created_at:    decode_dt(&self.created_at)?,
    })
  }
}
