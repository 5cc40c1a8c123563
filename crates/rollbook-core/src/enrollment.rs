//! The Enrollment Store: which students belong to which subjects.
//!
//! A student is "in" a stream iff enrolled in at least one of its subjects.
//! These operations assume the caller has already been authorized.

use tracing::{debug, info};

use crate::{
  Error, Result,
  store::RollStore,
  stream::{StreamId, SubjectId},
  user::{User, UserId},
};

/// Which roster to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Roster {
  Subject(SubjectId),
  Stream(StreamId),
}

pub struct Enrollments<'a, S> {
  store: &'a S,
}

impl<'a, S: RollStore> Enrollments<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Idempotent insert. Returns `true` if a new row was created and `false`
  /// if the student was already enrolled; either way exactly one row exists.
  pub async fn enroll(&self, student_id: UserId, subject_id: SubjectId) -> Result<bool> {
    let inserted = self
      .store
      .insert_enrollment(student_id, subject_id)
      .await
      .map_err(Error::store)?;
    debug!(student_id, subject_id, inserted, "enroll");
    Ok(inserted)
  }

  /// Enroll a student in every subject currently in a stream.
  ///
  /// Already-enrolled subjects are skipped. Any other failure aborts the
  /// loop and is returned; subjects enrolled before it stay enrolled.
  /// Returns the number of newly created enrollments.
  pub async fn enroll_in_stream(&self, student_id: UserId, stream_id: StreamId) -> Result<usize> {
    let subjects = self.store.list_subjects(stream_id).await.map_err(Error::store)?;
    if subjects.is_empty() {
      return Err(Error::NoSubjectsInStream(stream_id));
    }

    let mut created = 0;
    for subject in &subjects {
      if self.enroll(student_id, subject.id).await? {
        created += 1;
      }
    }
    info!(
      student_id,
      stream_id,
      subjects = subjects.len(),
      created,
      "enrolled student in stream"
    );
    Ok(created)
  }

  /// Returns the number of rows removed (zero or one).
  pub async fn unenroll(&self, student_id: UserId, subject_id: SubjectId) -> Result<u64> {
    self
      .store
      .delete_enrollment(student_id, subject_id)
      .await
      .map_err(Error::store)
  }

  /// Remove a student from every subject in a stream. Returns `false` if the
  /// stream has no subjects.
  pub async fn unenroll_from_stream(&self, student_id: UserId, stream_id: StreamId) -> Result<bool> {
    let subjects = self.store.list_subjects(stream_id).await.map_err(Error::store)?;
    if subjects.is_empty() {
      return Ok(false);
    }
    let removed = self
      .store
      .delete_stream_enrollments(student_id, stream_id)
      .await
      .map_err(Error::store)?;
    info!(student_id, stream_id, removed, "unenrolled student from stream");
    Ok(true)
  }

  /// Distinct students, name-sorted.
  pub async fn list_students(&self, roster: Roster) -> Result<Vec<User>> {
    match roster {
      Roster::Subject(id) => self.store.list_subject_students(id).await,
      Roster::Stream(id) => self.store.list_stream_students(id).await,
    }
    .map_err(Error::store)
  }

  pub async fn is_enrolled(&self, student_id: UserId, stream_id: StreamId) -> Result<bool> {
    let n = self
      .store
      .count_stream_enrollments(student_id, stream_id)
      .await
      .map_err(Error::store)?;
    Ok(n > 0)
  }
}
