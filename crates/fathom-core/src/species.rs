//! Species: the catalog entries observations refer to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, rarity::BASE_RARITY};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Species {
  pub id:           Uuid,
  /// Unique across the catalog.
  pub name:         String,
  pub author_id:    Uuid,
  /// Derived from the number of validated observations; never below 1.0.
  pub rarity_score: f64,
  pub created_at:   DateTime<Utc>,
}

/// Input to [`ObservationStore::insert_species`](crate::store::ObservationStore::insert_species).
#[derive(Debug, Clone)]
pub struct NewSpecies {
  pub name:      String,
  pub author_id: Uuid,
}

impl NewSpecies {
  /// Trim and validate a requested species name.
  pub fn new(name: &str, author_id: Uuid) -> Result<Self> {
    let name = name.trim();
    if name.is_empty() {
      return Err(Error::Validation("species name is required".into()));
    }
    Ok(Self { name: name.to_owned(), author_id })
  }

  /// Materialise the record a store will persist.
  pub fn into_species(self, created_at: DateTime<Utc>) -> Species {
    Species {
      id: Uuid::new_v4(),
      name: self.name,
      author_id: self.author_id,
      rarity_score: BASE_RARITY,
      created_at,
    }
  }
}
