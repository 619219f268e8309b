//! Bearer-token extractors.

use axum::{
  extract::{FromRef, FromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use chrono::Utc;
use fathom_core::subject::{Identity, Role};
use subtle::ConstantTimeEq;

use crate::{AccountState, error::ApiError, token::TokenKey};

/// The verified identity of the calling subject.
#[derive(Debug, Clone, Copy)]
pub struct Caller(pub Identity);

impl Caller {
  /// Fail with 403 unless the caller is an `ADMIN`.
  pub fn require_admin(self) -> Result<Identity, ApiError> {
    match self.0.role {
      Role::Admin => Ok(self.0),
      Role::User | Role::Expert => Err(ApiError::Forbidden("admin role required".into())),
    }
  }
}

/// Zero-size marker: the request carried the service key.
pub struct ServiceCaller;

/// Pull the credential out of an `Authorization: Bearer …` header.
pub fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
  let value = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))?;

  value
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))
}

impl<S> FromRequestParts<S> for Caller
where
  S: Send + Sync,
  TokenKey: FromRef<S>,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
    let token = bearer(&parts.headers)?;
    TokenKey::from_ref(state)
      .verify(token, Utc::now())
      .map(Caller)
      .map_err(|e| ApiError::Unauthorized(e.to_string()))
  }
}

impl<L> FromRequestParts<AccountState<L>> for ServiceCaller
where
  L: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AccountState<L>,
  ) -> Result<Self, Self::Rejection> {
    let presented = bearer(&parts.headers)?;
    let matches = bool::from(presented.as_bytes().ct_eq(state.service_key.as_bytes()));
    if state.service_key.is_empty() || !matches {
      return Err(ApiError::Unauthorized("invalid service key".into()));
    }
    Ok(ServiceCaller)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{body::Body, http::Request};
  use chrono::Duration;
  use uuid::Uuid;

  use super::*;

  #[derive(Clone)]
  struct KeyOnly(TokenKey);

  impl FromRef<KeyOnly> for TokenKey {
    fn from_ref(s: &KeyOnly) -> Self { s.0.clone() }
  }

  fn state() -> KeyOnly {
    KeyOnly(TokenKey::new(b"secret", Duration::hours(1)).unwrap())
  }

  async fn extract(req: Request<Body>, state: &KeyOnly) -> Result<Caller, ApiError> {
    let (mut parts, _) = req.into_parts();
    Caller::from_request_parts(&mut parts, state).await
  }

  #[tokio::test]
  async fn valid_token() {
    let s = state();
    let id = Identity { subject_id: Uuid::new_v4(), role: Role::User };
    let req = Request::builder()
      .header(header::AUTHORIZATION, format!("Bearer {}", s.0.issue(id, Utc::now())))
      .body(Body::empty())
      .unwrap();
    assert_eq!(extract(req, &s).await.unwrap().0, id);
  }

  #[tokio::test]
  async fn missing_header() {
    let req = Request::builder().body(Body::empty()).unwrap();
    assert!(matches!(extract(req, &state()).await, Err(ApiError::Unauthorized(_))));
  }

  #[tokio::test]
  async fn basic_scheme_rejected() {
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract(req, &state()).await, Err(ApiError::Unauthorized(_))));
  }

  #[tokio::test]
  async fn forged_token_rejected() {
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Bearer e30.00")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract(req, &state()).await, Err(ApiError::Unauthorized(_))));
  }

  #[tokio::test]
  async fn service_key_must_match() {
    let s = AccountState {
      ledger:      Arc::new(()),
      tokens:      state().0,
      service_key: Arc::from("svc"),
    };
    let check = |value: &'static str| {
      let req = Request::builder()
        .header(header::AUTHORIZATION, value)
        .body(Body::empty())
        .unwrap();
      req.into_parts().0
    };

    let mut ok = check("Bearer svc");
    assert!(ServiceCaller::from_request_parts(&mut ok, &s).await.is_ok());

    let mut bad = check("Bearer nope");
    assert!(ServiceCaller::from_request_parts(&mut bad, &s).await.is_err());

    let mut prefix = check("Bearer sv");
    assert!(ServiceCaller::from_request_parts(&mut prefix, &s).await.is_err());

    let mut longer = check("Bearer svc2");
    assert!(ServiceCaller::from_request_parts(&mut longer, &s).await.is_err());
  }

  #[tokio::test]
  async fn empty_service_key_admits_nobody() {
    let s = AccountState {
      ledger:      Arc::new(()),
      tokens:      state().0,
      service_key: Arc::from(""),
    };
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Bearer x")
      .body(Body::empty())
      .unwrap();
    let mut parts = req.into_parts().0;
    assert!(matches!(
      ServiceCaller::from_request_parts(&mut parts, &s).await,
      Err(ApiError::Unauthorized(_))
    ));
  }

  #[test]
  fn only_admin_passes() {
    let id = |role| Caller(Identity { subject_id: Uuid::new_v4(), role });
    assert!(id(Role::Admin).require_admin().is_ok());
    assert!(matches!(id(Role::Expert).require_admin(), Err(ApiError::Forbidden(_))));
    assert!(matches!(id(Role::User).require_admin(), Err(ApiError::Forbidden(_))));
  }
}
