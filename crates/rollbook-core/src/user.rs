//! Users and the inbound principal supplied by the identity layer.

use serde::{Deserialize, Serialize};

pub type UserId = i64;

/// A user's role. Fixed once the user row is created.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  Teacher,
  Student,
  Admin,
}

/// A canonical user row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:    UserId,
  pub name:  String,
  pub email: String,
  pub role:  Role,
}

impl User {
  pub fn is_teacher(&self) -> bool { self.role == Role::Teacher }

  pub fn is_student(&self) -> bool { self.role == Role::Student }
}

/// Input to [`crate::store::RollStore::create_user`].
#[derive(Debug, Clone)]
pub struct NewUser {
  pub name:       String,
  pub email:      String,
  pub role:       Role,
  /// Opaque credential material. Hashing happens outside this crate; the
  /// store only persists what it is given.
  pub credential: Option<String>,
}

impl NewUser {
  pub fn new(name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
    Self {
      name: name.into(),
      email: email.into(),
      role,
      credential: None,
    }
  }
}

/// The authenticated caller as reported by the external session layer.
///
/// `id` is kept as the raw string the identity provider handed over. It may
/// not be numeric, and it may not match the store's primary key; email is
/// the durable join key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
  pub id:    String,
  pub email: String,
  pub role:  Role,
}

impl Principal {
  pub fn new(id: impl ToString, email: impl Into<String>, role: Role) -> Self {
    Self {
      id: id.to_string(),
      email: email.into(),
      role,
    }
  }

  /// The principal id as a store key, if it parses as one.
  pub fn numeric_id(&self) -> Option<UserId> { self.id.trim().parse().ok() }
}
