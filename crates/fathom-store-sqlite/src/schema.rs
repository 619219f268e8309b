//! SQL schemas for the two service databases.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Observation-service DDL; idempotent thanks to `IF NOT EXISTS`.
pub const OBSERVATION_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS species (
    species_id    TEXT PRIMARY KEY,
    name          TEXT NOT NULL UNIQUE,
    author_id     TEXT NOT NULL,
    rarity_score  REAL NOT NULL DEFAULT 1.0 CHECK (rarity_score >= 1.0),
    created_at    TEXT NOT NULL
);

-- author_id and validated_by are account-service ids; no foreign key.
CREATE TABLE IF NOT EXISTS observations (
    observation_id TEXT PRIMARY KEY,
    species_id     TEXT NOT NULL REFERENCES species(species_id),
    author_id      TEXT NOT NULL,
    description    TEXT NOT NULL,
    danger_level   INTEGER NOT NULL CHECK (danger_level BETWEEN 1 AND 5),
    status         TEXT NOT NULL DEFAULT 'PENDING'
                   CHECK (status IN ('PENDING', 'VALIDATED', 'REJECTED')),
    validated_by   TEXT,
    validated_at   TEXT,
    created_at     TEXT NOT NULL   -- fixed-width RFC 3339, sorts lexically
);

CREATE INDEX IF NOT EXISTS observations_throttle_idx
    ON observations(author_id, species_id, created_at);
CREATE INDEX IF NOT EXISTS observations_species_status_idx
    ON observations(species_id, status);

PRAGMA user_version = 1;
";

/// Account-service DDL.
pub const LEDGER_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS accounts (
    account_id    TEXT PRIMARY KEY,
    email         TEXT NOT NULL UNIQUE COLLATE NOCASE,
    username      TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role          TEXT NOT NULL DEFAULT 'USER'
                  CHECK (role IN ('USER', 'EXPERT', 'ADMIN')),
    reputation    INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

PRAGMA user_version = 1;
";
