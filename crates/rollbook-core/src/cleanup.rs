//! The Cleanup Engine: teacher-issued retention rules that bulk-delete rows.
//!
//! Every run is single-shot and irreversible. Requests are validated in
//! full before any query runs. Deletes are not rolled back on a mid-run
//! failure; re-running the same request is safe.

use std::str::FromStr as _;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Error, Result,
  access::{AccessEvaluator, Operation, Resource, require_teacher},
  attendance::parse_calendar_date,
  error::ResourceKind,
  store::RollStore,
  stream::{StreamId, SubjectId},
  user::User,
};

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::EnumString, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CleanupKind {
  Attendance,
  Subjects,
  InactiveStudents,
}

/// A cleanup request as it arrives from a caller, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
  #[serde(rename = "type")]
  pub kind:        Option<String>,
  pub before_date: Option<String>,
  pub stream_id:   Option<StreamId>,
  pub subject_id:  Option<SubjectId>,
}

/// A validated cleanup rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cleanup {
  /// Delete attendance under a stream (optionally one subject) dated before
  /// the cutoff.
  Attendance {
    stream_id:  StreamId,
    subject_id: Option<SubjectId>,
    before:     NaiveDate,
  },
  /// Delete subjects in a stream with no attendance on or after the cutoff.
  Subjects { stream_id: StreamId, before: NaiveDate },
  /// Delete the accounts of the teacher's students who have no attendance
  /// on or after the cutoff in any of the teacher's subjects.
  InactiveStudents { before: NaiveDate },
}

impl Cleanup {
  pub fn kind(&self) -> CleanupKind {
    match self {
      Self::Attendance { .. } => CleanupKind::Attendance,
      Self::Subjects { .. } => CleanupKind::Subjects,
      Self::InactiveStudents { .. } => CleanupKind::InactiveStudents,
    }
  }
}

impl CleanupRequest {
  pub fn validate(&self) -> Result<Cleanup> {
    let raw_kind = self
      .kind
      .as_deref()
      .ok_or_else(|| Error::validation("cleanup type is required"))?;
    let kind = CleanupKind::from_str(raw_kind)
      .map_err(|_| Error::validation(format!("unknown cleanup type {raw_kind:?}")))?;
    let before = parse_calendar_date(
      self
        .before_date
        .as_deref()
        .ok_or_else(|| Error::validation("beforeDate is required"))?,
    )?;
    let stream_id = || {
      self
        .stream_id
        .ok_or_else(|| Error::validation(format!("streamId is required for {kind} cleanup")))
    };

    Ok(match kind {
      CleanupKind::Attendance => Cleanup::Attendance {
        stream_id: stream_id()?,
        subject_id: self.subject_id,
        before,
      },
      CleanupKind::Subjects => Cleanup::Subjects {
        stream_id: stream_id()?,
        before,
      },
      CleanupKind::InactiveStudents => Cleanup::InactiveStudents { before },
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupOutcome {
  #[serde(rename = "type")]
  pub kind:          CleanupKind,
  pub deleted_count: u64,
}

pub struct CleanupEngine<'a, S> {
  store: &'a S,
}

impl<'a, S: RollStore> CleanupEngine<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// `cleanup(type, beforeDate, scope)`. Returns the number of rows removed.
  pub async fn run(&self, actor: &User, cleanup: Cleanup) -> Result<CleanupOutcome> {
    require_teacher(actor)?;
    let access = AccessEvaluator::new(self.store);

    let deleted = match cleanup {
      Cleanup::Attendance {
        stream_id,
        subject_id,
        before,
      } => {
        access.authorize(actor, Resource::Stream(stream_id), Operation::Write).await?;
        if let Some(subject_id) = subject_id {
          let scope = access.locate(Resource::Subject(subject_id)).await?;
          if scope.stream.id != stream_id {
            return Err(Error::not_found(ResourceKind::Subject, subject_id));
          }
        }
        self
          .store
          .delete_attendance_before(stream_id, subject_id, before)
          .await
          .map_err(Error::store)?
      }
      Cleanup::Subjects { stream_id, before } => {
        access.authorize(actor, Resource::Stream(stream_id), Operation::Write).await?;
        let idle = self
          .store
          .idle_subjects(stream_id, before)
          .await
          .map_err(Error::store)?;
        if idle.is_empty() {
          0
        } else {
          let ids = idle.iter().map(|s| s.id).collect();
          self.store.delete_subjects(ids).await.map_err(Error::store)?
        }
      }
      Cleanup::InactiveStudents { before } => {
        let inactive = self
          .store
          .inactive_students(actor.id, before)
          .await
          .map_err(Error::store)?;
        if inactive.is_empty() {
          0
        } else {
          self.store.delete_users(inactive).await.map_err(Error::store)?
        }
      }
    };

    info!(
      teacher_id = actor.id,
      kind = %cleanup.kind(),
      deleted,
      "cleanup finished"
    );
    Ok(CleanupOutcome {
      kind:          cleanup.kind(),
      deleted_count: deleted,
    })
  }
}
