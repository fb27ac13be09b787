//! Session tokens: the Identity & Session Resolver.
//!
//! A token is `base64url(claims JSON) "." base64url(HMAC-SHA256(claims))`,
//! signed with the server secret. The role in the claims is the only role the
//! gate ever sees; it is fixed when the token is issued.
//!
//! Tokens are read from `Authorization: Bearer <token>` or from the
//! [`SESSION_COOKIE`] cookie.

use axum::http::{HeaderMap, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use muster_core::user::{Principal, Role};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "muster_session";

/// Minimum secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Error)]
pub enum SessionError {
  #[error("session secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
  SecretTooShort(usize),

  #[error("session secret is not valid hex: {0}")]
  SecretHex(#[from] hex::FromHexError),

  #[error("malformed session token")]
  Malformed,

  #[error("session token signature mismatch")]
  BadSignature,

  #[error("session token expired at {0}")]
  Expired(DateTime<Utc>),

  #[error("could not encode session claims: {0}")]
  Encode(#[from] serde_json::Error),
}

/// Signed claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Claims {
  sub:   Uuid,
  email: String,
  role:  Role,
  /// Expiry, unix seconds.
  exp:   i64,
}

/// Issues and verifies session tokens.
#[derive(Clone)]
pub struct SessionKey {
  mac: Hmac<Sha256>,
}

impl SessionKey {
  pub fn new(secret: &[u8]) -> Result<Self, SessionError> {
    if secret.len() < MIN_SECRET_LEN {
      return Err(SessionError::SecretTooShort(secret.len()));
    }
    let mac = Hmac::<Sha256>::new_from_slice(secret)
      .map_err(|_| SessionError::SecretTooShort(secret.len()))?;
    Ok(Self { mac })
  }

  /// Build a key from a hex-encoded secret, as stored in configuration.
  pub fn from_hex(secret: &str) -> Result<Self, SessionError> {
    Self::new(&hex::decode(secret.trim())?)
  }

  /// Issue a token for `principal` valid for `ttl` from now.
  pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String, SessionError> {
    self.issue_until(principal, Utc::now() + ttl)
  }

  pub fn issue_until(
    &self,
    principal: &Principal,
    expires_at: DateTime<Utc>,
  ) -> Result<String, SessionError> {
    let claims = Claims {
      sub:   principal.user_id,
      email: principal.email.clone(),
      role:  principal.role,
      exp:   expires_at.timestamp(),
    };
    let payload = serde_json::to_vec(&claims)?;

    let mut mac = self.mac.clone();
    mac.update(&payload);
    let signature = mac.finalize().into_bytes();

    Ok(format!(
      "{}.{}",
      URL_SAFE_NO_PAD.encode(&payload),
      URL_SAFE_NO_PAD.encode(signature)
    ))
  }

  /// Verify `token` and return its principal as of `now`.
  pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, SessionError> {
    let (payload_b64, signature_b64) = token.trim().split_once('.').ok_or(SessionError::Malformed)?;
    let payload = URL_SAFE_NO_PAD
      .decode(payload_b64)
      .map_err(|_| SessionError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
      .decode(signature_b64)
      .map_err(|_| SessionError::Malformed)?;

    let mut mac = self.mac.clone();
    mac.update(&payload);
    mac
      .verify_slice(&signature)
      .map_err(|_| SessionError::BadSignature)?;

    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| SessionError::Malformed)?;
    if now.timestamp() >= claims.exp {
      let expired_at = DateTime::from_timestamp(claims.exp, 0).unwrap_or(now);
      return Err(SessionError::Expired(expired_at));
    }

    Ok(Principal {
      user_id: claims.sub,
      email:   claims.email,
      role:    claims.role,
    })
  }

  /// Resolve the principal of a request.
  ///
  /// Never fails: a missing, malformed, forged or expired token yields `None`
  /// and the request proceeds unauthenticated.
  pub fn resolve(&self, headers: &HeaderMap) -> Option<Principal> {
    let token = token_from_headers(headers)?;
    match self.verify(token, Utc::now()) {
      Ok(principal) => Some(principal),
      Err(e) => {
        tracing::debug!(error = %e, "ignoring unusable session token");
        None
      }
    }
  }
}

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
  let bearer = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "));
  if bearer.is_some() {
    return bearer;
  }

  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(name, _)| *name == SESSION_COOKIE)
    .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn key() -> SessionKey { SessionKey::new(&[7u8; 32]).unwrap() }

  fn principal(role: Role) -> Principal {
    Principal {
      user_id: Uuid::new_v4(),
      email:   "ada@example.com".into(),
      role,
    }
  }

  #[test]
  fn issued_token_verifies() {
    let p = principal(Role::Admin);
    let token = key().issue(&p, Duration::hours(1)).unwrap();
    assert_eq!(key().verify(&token, Utc::now()).unwrap(), p);
  }

  #[test]
  fn short_secret_rejected() {
    assert!(matches!(SessionKey::new(b"short"), Err(SessionError::SecretTooShort(5))));
    assert!(SessionKey::from_hex("zz").is_err());
    assert!(SessionKey::from_hex(&"ab".repeat(32)).is_ok());
  }

  #[test]
  fn tampered_claims_rejected() {
    let token = key().issue(&principal(Role::Participant), Duration::hours(1)).unwrap();
    let (_, sig) = token.split_once('.').unwrap();
    let forged_claims = Claims {
      sub:   Uuid::new_v4(),
      email: "mallory@example.com".into(),
      role:  Role::Admin,
      exp:   (Utc::now() + Duration::hours(1)).timestamp(),
    };
    let forged = format!(
      "{}.{sig}",
      URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged_claims).unwrap())
    );
    assert!(matches!(key().verify(&forged, Utc::now()), Err(SessionError::BadSignature)));
  }

  #[test]
  fn token_from_other_key_rejected() {
    let other = SessionKey::new(&[9u8; 32]).unwrap();
    let token = other.issue(&principal(Role::Admin), Duration::hours(1)).unwrap();
    assert!(matches!(key().verify(&token, Utc::now()), Err(SessionError::BadSignature)));
  }

  #[test]
  fn expired_token_rejected() {
    let now = Utc::now();
    let token = key().issue_until(&principal(Role::Admin), now).unwrap();
    assert!(matches!(key().verify(&token, now), Err(SessionError::Expired(_))));
  }

  #[test]
  fn garbage_is_malformed() {
    for token in ["", "no-dot", "a.b", "!!!.???"] {
      assert!(key().verify(token, Utc::now()).is_err(), "{token:?}");
    }
  }

  #[test]
  fn resolve_reads_bearer_and_cookie() {
    let p = principal(Role::Participant);
    let token = key().issue(&p, Duration::hours(1)).unwrap();

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap());
    assert_eq!(key().resolve(&headers), Some(p.clone()));

    let mut headers = HeaderMap::new();
    headers.insert(
      header::COOKIE,
      HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}")).unwrap(),
    );
    assert_eq!(key().resolve(&headers), Some(p));
  }

  #[test]
  fn resolve_degrades_to_anonymous() {
    assert_eq!(key().resolve(&HeaderMap::new()), None);

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer not.a-token"));
    assert_eq!(key().resolve(&headers), None);
  }
}
