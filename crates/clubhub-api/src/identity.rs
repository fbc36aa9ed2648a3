//! The authenticated caller, as seen by handlers.
//!
//! This crate does not verify credentials. Whatever sits in front of the
//! router (the server's bearer-token middleware, or a test) inserts a
//! [`CurrentUser`] into the request extensions; handlers that need an
//! identity extract it and reject the request with 401 when it is absent.

use axum::{extract::FromRequestParts, http::request::Parts};
use clubhub_core::content::UserId;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
  pub id:    UserId,
  pub email: Option<String>,
  pub name:  Option<String>,
}

impl CurrentUser {
  pub fn new(id: impl Into<UserId>) -> Self {
    Self { id: id.into(), email: None, name: None }
  }
}

impl<S> FromRequestParts<S> for CurrentUser
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .cloned()
      .ok_or_else(|| ApiError::Unauthorized("authentication required".into()))
  }
}
