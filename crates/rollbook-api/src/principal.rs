//! Principal extractor.
//!
//! The session layer in front of this API authenticates the caller and
//! forwards who they are in three headers:
//!
//! | Header | Value |
//! |--------|-------|
//! | `x-user-id` | Opaque id from the identity provider |
//! | `x-user-email` | Email address |
//! | `x-user-role` | `teacher`, `student` or `admin` |
//!
//! All three are required. The headers are trusted as-is, so this router
//! must only be reachable through that proxy.

use std::str::FromStr as _;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, request::Parts},
};
use rollbook_core::user::{Principal, Role};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller, as forwarded by the session layer.
pub struct Authenticated(pub Principal);

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|v| !v.is_empty())
    .ok_or(ApiError::Unauthenticated)
}

/// Read the principal headers. Any missing, empty or unparseable header is
/// [`ApiError::Unauthenticated`].
pub fn principal_from_headers(headers: &HeaderMap) -> Result<Principal, ApiError> {
  let id = header(headers, USER_ID_HEADER)?;
  let email = header(headers, USER_EMAIL_HEADER)?;
  let role = Role::from_str(&header(headers, USER_ROLE_HEADER)?.to_ascii_lowercase())
    .map_err(|_| ApiError::Unauthenticated)?;
  Ok(Principal::new(id, email, role))
}

impl<St> FromRequestParts<St> for Authenticated
where
  St: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
    principal_from_headers(&parts.headers).map(Authenticated)
  }
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
    let mut map = HeaderMap::new();
    for (k, v) in pairs {
      map.insert(*k, HeaderValue::from_static(v));
    }
    map
  }

  #[test]
  fn reads_all_three_headers() {
    let p = principal_from_headers(&headers(&[
      (USER_ID_HEADER, "auth0|77"),
      (USER_EMAIL_HEADER, "t@school.test"),
      (USER_ROLE_HEADER, "Teacher"),
    ]))
    .unwrap();
    assert_eq!(p.id, "auth0|77");
    assert_eq!(p.email, "t@school.test");
    assert_eq!(p.role, Role::Teacher);
  }

  #[test]
  fn missing_or_bad_headers_are_unauthenticated() {
    let no_role = headers(&[(USER_ID_HEADER, "1"), (USER_EMAIL_HEADER, "t@school.test")]);
    assert!(matches!(principal_from_headers(&no_role), Err(ApiError::Unauthenticated)));

    let bad_role = headers(&[
      (USER_ID_HEADER, "1"),
      (USER_EMAIL_HEADER, "t@school.test"),
      (USER_ROLE_HEADER, "janitor"),
    ]);
    assert!(matches!(principal_from_headers(&bad_role), Err(ApiError::Unauthenticated)));

    let blank_email = headers(&[
      (USER_ID_HEADER, "1"),
      (USER_EMAIL_HEADER, "  "),
      (USER_ROLE_HEADER, "student"),
    ]);
    assert!(matches!(principal_from_headers(&blank_email), Err(ApiError::Unauthenticated)));
  }
}
