//! [`SqliteLedgerStore`]: the SQLite implementation of [`LedgerStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, TransactionBehavior};
use uuid::Uuid;

use fathom_core::{
  ledger::{LedgerStore, promoted_role},
  subject::{Account, NewAccount, ReputationTotal, Role},
};

use crate::{
  Error, Result,
  encode::{
    ACCOUNT_COLUMNS, RawAccount, conversion_failure, decode_role, encode_dt, encode_role,
    encode_uuid,
  },
  schema::LEDGER_SCHEMA,
};

/// The account service's store, backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteLedgerStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteLedgerStore {
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
        conn.execute_batch(LEDGER_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn query_account(&self, sql: String, param: String) -> Result<Option<Account>> {
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(&sql, rusqlite::params![param], RawAccount::from_row)
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }
}

impl LedgerStore for SqliteLedgerStore {
  type Error = Error;

  async fn register(&self, input: NewAccount) -> Result<Option<Account>> {
    let account = Account {
      id:            Uuid::new_v4(),
      email:         input.email,
      username:      input.username,
      password_hash: input.password_hash,
      role:          Role::User,
      reputation:    0,
      created_at:    Utc::now(),
    };

    let id_str   = encode_uuid(account.id);
    let email    = account.email.clone();
    let username = account.username.clone();
    let hash     = account.password_hash.clone();
    let role_str = encode_role(account.role);
    let at_str   = encode_dt(account.created_at);

    // Without a conflict target this absorbs both the email and the username
    // uniqueness constraints.
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("INSERT INTO accounts ({ACCOUNT_COLUMNS})
           VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)
           ON CONFLICT DO NOTHING"),
          rusqlite::params![id_str, email, username, hash, role_str, at_str],
        )?)
      })
      .await?;

    Ok((inserted == 1).then_some(account))
  }

  async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
    self
      .query_account(
        format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE account_id = ?1"),
        encode_uuid(id),
      )
      .await
  }

  async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
    self
      .query_account(
        format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?1"),
        email.trim().to_owned(),
      )
      .await
  }

  async fn list_accounts(&self) -> Result<Vec<Account>> {
    let raws: Vec<RawAccount> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at"))?;
        let rows = stmt
          .query_map([], RawAccount::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }

  async fn set_role(&self, id: Uuid, role: Role) -> Result<Option<Account>> {
    let id_str   = encode_uuid(id);
    let role_str = encode_role(role);

    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("UPDATE accounts SET role = ?2 WHERE account_id = ?1 RETURNING {ACCOUNT_COLUMNS}"),
            rusqlite::params![id_str, role_str],
            RawAccount::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn increment_reputation(&self, id: Uuid, delta: i64) -> Result<Option<ReputationTotal>> {
    let id_str = encode_uuid(id);

    // The relative UPDATE and the promotion run in one IMMEDIATE transaction,
    // so concurrent increments serialise instead of overwriting each other.
    let row: Option<(i64, Role)> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let updated: Option<(i64, String)> = tx
          .query_row(
            "UPDATE accounts SET reputation = reputation + ?2
             WHERE account_id = ?1
             RETURNING reputation, role",
            rusqlite::params![id_str, delta],
            |r| Ok((r.get(0)?, r.get(1)?)),
          )
          .optional()?;

        let Some((reputation, role_str)) = updated else {
          return Ok(None);
        };

        let role = decode_role(&role_str).map_err(|e| conversion_failure(1, e))?;
        let next = promoted_role(role, reputation);
        if next != role {
          tx.execute(
            "UPDATE accounts SET role = ?2 WHERE account_id = ?1",
            rusqlite::params![id_str, encode_role(next)],
          )?;
        }

        tx.commit()?;
        Ok(Some((reputation, next)))
      })
      .await?;

    Ok(row.map(|(reputation, role)| ReputationTotal { id, reputation, role }))
  }
}
