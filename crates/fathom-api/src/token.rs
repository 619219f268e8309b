//! Signed bearer tokens carrying an [`Identity`].
//!
//! Format: `base64url(json claims) "." hex(hmac_sha256(secret, encoded claims))`
//! where the claims are `{"sub", "role", "exp"}` and `exp` is a Unix
//! timestamp in seconds. Both services hold the same secret; the account
//! service issues tokens at login, either service verifies them.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as B64;
use chrono::{DateTime, Duration, Utc};
use fathom_core::subject::{Identity, Role};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Default lifetime of an issued token.
pub const DEFAULT_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
  #[error("token secret must not be empty")]
  EmptySecret,
  #[error("malformed token")]
  Malformed,
  #[error("invalid token signature")]
  BadSignature,
  #[error("token expired")]
  Expired,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
  sub:  Uuid,
  role: Role,
  exp:  i64,
}

/// Issues and verifies tokens with one shared secret.
#[derive(Clone)]
pub struct TokenKey {
  mac: HmacSha256,
  ttl: Duration,
}

impl std::fmt::Debug for TokenKey {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("TokenKey").field("ttl", &self.ttl).finish_non_exhaustive()
  }
}

impl TokenKey {
  pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
    if secret.is_empty() {
      return Err(TokenError::EmptySecret);
    }
    let mac = HmacSha256::new_from_slice(secret).map_err(|_| TokenError::EmptySecret)?;
    Ok(Self { mac, ttl })
  }

  /// Sign a token for `identity`, valid until `now + ttl`.
  pub fn issue(&self, identity: Identity, now: DateTime<Utc>) -> String {
    let claims = Claims {
      sub:  identity.subject_id,
      role: identity.role,
      exp:  (now + self.ttl).timestamp(),
    };
    // Claims are a uuid, a unit enum and an integer; serialisation cannot fail.
    let json = serde_json::to_vec(&claims).unwrap_or_default();
    let payload = B64.encode(json);

    let mut mac = self.mac.clone();
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("{payload}.{signature}")
  }

  /// Check the signature, then the expiry, and return the carried identity.
  pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let signature = hex::decode(signature).map_err(|_| TokenError::Malformed)?;

    let mut mac = self.mac.clone();
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature).map_err(|_| TokenError::BadSignature)?;

    let json = B64.decode(payload).map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&json).map_err(|_| TokenError::Malformed)?;

    if now.timestamp() >= claims.exp {
      return Err(TokenError::Expired);
    }
    Ok(Identity { subject_id: claims.sub, role: claims.role })
  }
}
