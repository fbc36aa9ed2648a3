//! Bearer-token identity.
//!
//! Tokens are HS256 JWTs carrying `{userId, email, name, iat, exp}`. The
//! [`identify`] middleware verifies a token when one is presented and puts
//! the resulting [`CurrentUser`] into the request extensions. Requests with
//! no `Authorization` header pass through anonymously; the API rejects them
//! on routes that need an identity.

use std::sync::Arc;

use axum::{
  extract::{Request, State},
  http::header,
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use clubhub_api::{ApiError, CurrentUser};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Shortest secret accepted for HMAC signing.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
  pub user_id: String,
  pub email:   Option<String>,
  pub name:    Option<String>,
  pub iat:     i64,
  pub exp:     i64,
}

impl From<Claims> for CurrentUser {
  fn from(c: Claims) -> Self {
    CurrentUser { id: c.user_id.into(), email: c.email, name: c.name }
  }
}

/// Signs and verifies bearer tokens with one shared secret.
#[derive(Clone)]
pub struct JwtKeys {
  encoding:   EncodingKey,
  decoding:   DecodingKey,
  validation: Validation,
  ttl_secs:   i64,
}

impl JwtKeys {
  pub fn new(secret: &str, ttl_secs: i64) -> Result<Self> {
    if secret.len() < MIN_SECRET_LEN {
      return Err(Error::Config(format!(
        "jwt_secret must be at least {MIN_SECRET_LEN} characters"
      )));
    }
    Ok(Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      validation: Validation::new(Algorithm::HS256),
      ttl_secs,
    })
  }

  /// Mint a token for `user_id`, valid for the configured lifetime.
  pub fn issue(&self, user_id: &str, email: Option<String>, name: Option<String>) -> Result<String> {
    let now = Utc::now().timestamp();
    let claims = Claims {
      user_id: user_id.to_owned(),
      email,
      name,
      iat: now,
      exp: now + self.ttl_secs,
    };
    self.sign(&claims)
  }

  pub fn sign(&self, claims: &Claims) -> Result<String> {
    Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding)?)
  }

  /// Check signature and expiry, returning the claims.
  pub fn verify(&self, token: &str) -> Result<Claims> {
    Ok(decode::<Claims>(token, &self.decoding, &self.validation)?.claims)
  }
}

/// Resolve the caller from an optional `Authorization: Bearer` header.
///
/// A header that is present but malformed, expired or badly signed is a 401;
/// it is never downgraded to an anonymous request.
pub async fn identify(State(keys): State<Arc<JwtKeys>>, mut req: Request, next: Next) -> Response {
  let Some(value) = req.headers().get(header::AUTHORIZATION) else {
    return next.run(req).await;
  };

  let token = match value.to_str().ok().and_then(|v| v.strip_prefix("Bearer ")) {
    Some(t) => t.trim(),
    None => return ApiError::Unauthorized("expected a bearer token".into()).into_response(),
  };

  match keys.verify(token) {
    Ok(claims) => {
      req.extensions_mut().insert(CurrentUser::from(claims));
      next.run(req).await
    }
    Err(e) => {
      debug!(error = %e, "rejected bearer token");
      ApiError::Unauthorized("invalid or expired token".into()).into_response()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "a-test-secret-that-is-long-enough-1234";

  #[test]
  fn short_secret_is_rejected() {
    assert!(matches!(JwtKeys::new("short", 60), Err(Error::Config(_))));
  }

  #[test]
  fn issued_token_verifies() {
    let keys = JwtKeys::new(SECRET, 3600).unwrap();
    let token = keys.issue("u1", Some("u1@club.test".into()), None).unwrap();
    let claims = keys.verify(&token).unwrap();
    assert_eq!(claims.user_id, "u1");
    assert_eq!(claims.email.as_deref(), Some("u1@club.test"));
    assert!(claims.exp > claims.iat);
  }

  #[test]
  fn token_from_another_secret_fails() {
    let ours = JwtKeys::new(SECRET, 3600).unwrap();
    let theirs = JwtKeys::new("another-secret-that-is-long-enough-5678", 3600).unwrap();
    let token = theirs.issue("u1", None, None).unwrap();
    assert!(ours.verify(&token).is_err());
  }

  #[test]
  fn expired_token_fails() {
    let keys = JwtKeys::new(SECRET, 3600).unwrap();
    let now = Utc::now().timestamp();
    let token = keys
      .sign(&Claims { user_id: "u1".into(), email: None, name: None, iat: now - 7200, exp: now - 3600 })
      .unwrap();
    assert!(keys.verify(&token).is_err());
  }
}
