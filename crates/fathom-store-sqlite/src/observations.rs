//! [`SqliteObservationStore`]: the SQLite implementation of
//! [`ObservationStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use fathom_core::{
  observation::{Observation, ObservationStatus, Transition},
  species::Species,
  store::ObservationStore,
};

use crate::{
  Error, Result,
  encode::{
    OBSERVATION_COLUMNS, RawObservation, RawSpecies, SPECIES_COLUMNS, encode_dt, encode_status,
    encode_uuid,
  },
  schema::OBSERVATION_SCHEMA,
};

/// The observation service's store, backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteObservationStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteObservationStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(OBSERVATION_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_observations(
    &self,
    sql: String,
    params: Vec<String>,
  ) -> Result<Vec<Observation>> {
    let raws: Vec<RawObservation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params.iter()), RawObservation::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawObservation::into_observation).collect()
  }
}

impl ObservationStore for SqliteObservationStore {
  type Error = Error;

  // ── Species ───────────────────────────────────────────────────────────────

  async fn insert_species(&self, species: Species) -> Result<Option<Species>> {
    let id_str     = encode_uuid(species.id);
    let name       = species.name.clone();
    let author_str = encode_uuid(species.author_id);
    let rarity     = species.rarity_score;
    let at_str     = encode_dt(species.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO species (species_id, name, author_id, rarity_score, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT(name) DO NOTHING",
          rusqlite::params![id_str, name, author_str, rarity, at_str],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(species))
  }

  async fn get_species(&self, id: Uuid) -> Result<Option<Species>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawSpecies> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SPECIES_COLUMNS} FROM species WHERE species_id = ?1"),
            rusqlite::params![id_str],
            |row| RawSpecies::from_row(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSpecies::into_species).transpose()
  }

  async fn list_species(&self) -> Result<Vec<Species>> {
    let raws: Vec<RawSpecies> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {SPECIES_COLUMNS} FROM species ORDER BY created_at, name"))?;
        let rows = stmt
          .query_map([], |row| RawSpecies::from_row(row, 0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSpecies::into_species).collect()
  }

  async fn raise_rarity(&self, species_id: Uuid, score: f64) -> Result<Option<Species>> {
    let id_str = encode_uuid(species_id);

    // MAX() keeps the score non-decreasing when recalculations interleave.
    let raw: Option<RawSpecies> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE species SET rarity_score = MAX(rarity_score, ?2)
               WHERE species_id = ?1
               RETURNING {SPECIES_COLUMNS}"
            ),
            rusqlite::params![id_str, score],
            |row| RawSpecies::from_row(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSpecies::into_species).transpose()
  }

  // ── Observations ──────────────────────────────────────────────────────────

  async fn insert_observation(&self, observation: Observation) -> Result<Observation> {
    let id_str       = encode_uuid(observation.id);
    let species_str  = encode_uuid(observation.species_id);
    let author_str   = encode_uuid(observation.author_id);
    let description  = observation.description.clone();
    let danger_level = observation.danger_level;
    let status_str   = encode_status(observation.status);
    let by_str       = observation.validated_by.map(encode_uuid);
    let at_str       = observation.validated_at.map(encode_dt);
    let created_str  = encode_dt(observation.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!("INSERT INTO observations ({OBSERVATION_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
          rusqlite::params![
            id_str,
            species_str,
            author_str,
            description,
            danger_level,
            status_str,
            by_str,
            at_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(observation)
  }

  async fn get_observation(&self, id: Uuid) -> Result<Option<Observation>> {
    let sql = format!("SELECT {OBSERVATION_COLUMNS} FROM observations WHERE observation_id = ?1");
    Ok(self.query_observations(sql, vec![encode_uuid(id)]).await?.pop())
  }

  async fn latest_observation(
    &self,
    author_id: Uuid,
    species_id: Uuid,
  ) -> Result<Option<Observation>> {
    let sql = format!(
      "SELECT {OBSERVATION_COLUMNS} FROM observations
       WHERE author_id = ?1 AND species_id = ?2
       ORDER BY created_at DESC
       LIMIT 1"
    );
    Ok(
      self
        .query_observations(sql, vec![encode_uuid(author_id), encode_uuid(species_id)])
        .await?
        .pop(),
    )
  }

  async fn list_observations(&self, species_id: Uuid) -> Result<Vec<Observation>> {
    let sql = format!(
      "SELECT {OBSERVATION_COLUMNS} FROM observations
       WHERE species_id = ?1
       ORDER BY created_at"
    );
    self.query_observations(sql, vec![encode_uuid(species_id)]).await
  }

  async fn count_validated(&self, species_id: Uuid) -> Result<u64> {
    let id_str        = encode_uuid(species_id);
    let validated_str = encode_status(ObservationStatus::Validated);

    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM observations WHERE species_id = ?1 AND status = ?2",
          rusqlite::params![id_str, validated_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(count as u64)
  }

  async fn apply_transition(&self, transition: Transition) -> Result<Option<Observation>> {
    let id_str      = encode_uuid(transition.observation_id);
    let status_str  = encode_status(transition.status);
    let pending_str = encode_status(ObservationStatus::Pending);
    let by_str      = encode_uuid(transition.moderator_id);
    let at_str      = encode_dt(transition.at);

    let raw: Option<RawObservation> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "UPDATE observations
               SET status = ?2, validated_by = ?3, validated_at = ?4
               WHERE observation_id = ?1 AND status = ?5
               RETURNING {OBSERVATION_COLUMNS}"
            ),
            rusqlite::params![id_str, status_str, by_str, at_str, pending_str],
            RawObservation::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawObservation::into_observation).transpose()
  }

  async fn observation_counts(&self) -> Result<Vec<(Species, u64)>> {
    let raws: Vec<(RawSpecies, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT COUNT(o.observation_id),
                  s.species_id, s.name, s.author_id, s.rarity_score, s.created_at
           FROM species s
           LEFT JOIN observations o ON o.species_id = s.species_id
           GROUP BY s.species_id
           ORDER BY s.name",
        )?;
        let rows = stmt
          .query_map([], |row| Ok((RawSpecies::from_row(row, 1)?, row.get(0)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, count)| Ok((raw.into_species()?, count as u64)))
      .collect()
  }
}
