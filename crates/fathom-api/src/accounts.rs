//! Handlers for the account service.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `POST`  | `/auth/register` | Body [`RegisterBody`]; always creates a `USER` |
//! | `POST`  | `/auth/login` | Body [`LoginBody`]; returns [`LoginResponse`] |
//! | `GET`   | `/auth/me` | Bearer |
//! | `GET`   | `/admin/users` | Bearer, `ADMIN` |
//! | `PATCH` | `/subjects/{id}/role` | Bearer, `ADMIN`; body `{"role":"EXPERT"}` |
//! | `PATCH` | `/subjects/{id}/reputation` | Service key; body `{"amount":3}` |

use axum::{
  Json,
  extract::{
    Path, State,
    rejection::{JsonRejection, PathRejection},
  },
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use fathom_core::{
  ledger::LedgerStore,
  subject::{Account, NewAccount, ReputationTotal, Role},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AccountState,
  error::ApiError,
  identity::{Caller, ServiceCaller},
  password,
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub email:    String,
  pub username: String,
  pub password: String,
}

impl RegisterBody {
  fn check(&self) -> Result<(), ApiError> {
    let email = self.email.trim();
    if email.is_empty() || self.username.trim().is_empty() || self.password.is_empty() {
      return Err(ApiError::BadRequest("email, username and password are required".into()));
    }
    if !email.contains('@') {
      return Err(ApiError::BadRequest("email is not valid".into()));
    }
    Ok(())
  }
}

/// `POST /auth/register`: returns 201 + the new account.
pub async fn register<L>(
  State(state): State<AccountState<L>>,
  body: Result<Json<RegisterBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  L: LedgerStore,
{
  let Json(body) = body?;
  body.check()?;

  let input = NewAccount {
    email:         body.email.trim().to_owned(),
    username:      body.username.trim().to_owned(),
    password_hash: password::hash(&body.password)?,
  };
  let account = state
    .ledger
    .register(input)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::BadRequest("email or username already registered".into()))?;

  tracing::info!(subject_id = %account.id, username = %account.username, "account registered");
  Ok((StatusCode::CREATED, Json(account)))
}

// ─── Login ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token:   String,
  pub account: Account,
}

/// `POST /auth/login`
pub async fn login<L>(
  State(state): State<AccountState<L>>,
  body: Result<Json<LoginBody>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError>
where
  L: LedgerStore,
{
  let Json(body) = body?;
  let invalid = || ApiError::Unauthorized("invalid email or password".into());

  let account = state
    .ledger
    .find_by_email(&body.email)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(invalid)?;

  if !password::verify(&body.password, &account.password_hash) {
    return Err(invalid());
  }

  let token = state.tokens.issue(account.identity(), Utc::now());
  Ok(Json(LoginResponse { token, account }))
}

// ─── Me ───────────────────────────────────────────────────────────────────────

/// `GET /auth/me`
pub async fn me<L>(
  State(state): State<AccountState<L>>,
  Caller(caller): Caller,
) -> Result<Json<Account>, ApiError>
where
  L: LedgerStore,
{
  let account = state
    .ledger
    .get_account(caller.subject_id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("account {} not found", caller.subject_id)))?;
  Ok(Json(account))
}

// ─── Administration ───────────────────────────────────────────────────────────

/// `GET /admin/users`
pub async fn list<L>(
  State(state): State<AccountState<L>>,
  caller: Caller,
) -> Result<Json<Vec<Account>>, ApiError>
where
  L: LedgerStore,
{
  caller.require_admin()?;
  let accounts = state.ledger.list_accounts().await.map_err(ApiError::store)?;
  Ok(Json(accounts))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `PATCH /subjects/{id}/role`
pub async fn set_role<L>(
  State(state): State<AccountState<L>>,
  caller: Caller,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<RoleBody>, JsonRejection>,
) -> Result<Json<Account>, ApiError>
where
  L: LedgerStore,
{
  let admin = caller.require_admin()?;
  let Path(id) = id?;
  let Json(body) = body?;

  let account = state
    .ledger
    .set_role(id, body.role)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("account {id} not found")))?;

  tracing::info!(subject_id = %id, role = %body.role, by = %admin.subject_id, "role set");
  Ok(Json(account))
}

// ─── Reputation ───────────────────────────────────────────────────────────────

/// Body of `PATCH /subjects/{id}/reputation`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IncrementBody {
  pub amount: i64,
}

/// `PATCH /subjects/{id}/reputation`: service-to-service only.
pub async fn increment<L>(
  State(state): State<AccountState<L>>,
  _service: ServiceCaller,
  id: Result<Path<Uuid>, PathRejection>,
  body: Result<Json<IncrementBody>, JsonRejection>,
) -> Result<Json<ReputationTotal>, ApiError>
where
  L: LedgerStore,
{
  let Path(id) = id?;
  let Json(body) = body?;
  let total = state
    .ledger
    .increment_reputation(id, body.amount)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("subject {id} not found")))?;

  tracing::debug!(
    subject_id = %id,
    amount = body.amount,
    reputation = total.reputation,
    role = %total.role,
    "reputation incremented"
  );
  Ok(Json(total))
}
