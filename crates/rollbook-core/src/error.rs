//! Error types for `rollbook-core`.

use thiserror::Error;

/// The kind of entity a [`Error::ResourceNotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
  User,
  Stream,
  Subject,
}

#[derive(Debug, Error)]
pub enum Error {
  /// Neither the principal's id nor its `(email, role)` pair matched a user.
  #[error("actor could not be resolved")]
  ActorNotFound,

  #[error("access denied")]
  AccessDenied,

  /// The parent resource does not exist at all. Checked before
  /// authorization so callers can tell absence from denial.
  #[error("{kind} {id} not found")]
  ResourceNotFound { kind: ResourceKind, id: i64 },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("stream {0} has no subjects")]
  NoSubjectsInStream(i64),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Box a backend error. Used as `.map_err(Error::store)` on store calls.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn not_found(kind: ResourceKind, id: i64) -> Self {
    Self::ResourceNotFound { kind, id }
  }

  pub(crate) fn validation(msg: impl Into<String>) -> Self {
    Self::Validation(msg.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
