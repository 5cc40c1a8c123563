//! Streams (teacher-owned groupings) and the subjects inside them.

use serde::{Deserialize, Serialize};

use crate::user::UserId;

pub type StreamId = i64;
pub type SubjectId = i64;

/// A teacher-owned grouping of subjects. Deleting a stream cascades to its
/// subjects, their enrollments, and their attendance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
  pub id:          StreamId,
  pub name:        String,
  pub description: Option<String>,
  pub teacher_id:  UserId,
}

/// An attendance-tracked unit inside exactly one stream. Names are unique
/// within a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
  pub id:          SubjectId,
  pub stream_id:   StreamId,
  pub name:        String,
  pub description: Option<String>,
}

/// Input to [`crate::store::RollStore::create_stream`].
#[derive(Debug, Clone)]
pub struct NewStream {
  pub name:        String,
  pub description: Option<String>,
  pub teacher_id:  UserId,
}

/// Input to [`crate::store::RollStore::create_subject`].
#[derive(Debug, Clone)]
pub struct NewSubject {
  pub stream_id:   StreamId,
  pub name:        String,
  pub description: Option<String>,
}

/// Partial update for a stream or subject. `None` leaves a field untouched;
/// `Some(None)` clears the description.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patch {
  pub name:        Option<String>,
  #[serde(default, deserialize_with = "double_option")]
  pub description: Option<Option<String>>,
}

impl Patch {
  pub fn is_empty(&self) -> bool { self.name.is_none() && self.description.is_none() }
}

fn double_option<'de, D>(de: D) -> Result<Option<Option<String>>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  Option::<String>::deserialize(de).map(Some)
}

/// Trim a user-supplied name and reject it if nothing is left.
pub(crate) fn clean_name(raw: &str, what: &str) -> crate::Result<String> {
  let name = raw.trim();
  if name.is_empty() {
    return Err(crate::Error::validation(format!("{what} name is required")));
  }
  Ok(name.to_owned())
}
