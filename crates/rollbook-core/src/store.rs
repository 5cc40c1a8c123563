//! The `RollStore` trait: the query contract every component runs against.
//!
//! The trait is implemented by storage backends (e.g.
//! `rollbook-store-sqlite`). Implementations must bind every caller-supplied
//! value as a query parameter. Each method is a single round-trip; nothing
//! here opens a transaction that spans calls.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  attendance::{AttendanceEntry, AttendanceQuery, AttendanceRecord, NewMark},
  stream::{NewStream, NewSubject, Patch, Stream, StreamId, Subject, SubjectId},
  user::{NewUser, Role, User, UserId},
};

/// A `LIMIT`/`OFFSET` pair applied after filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
  pub limit:  u64,
  pub offset: u64,
}

impl From<crate::page::Page> for Window {
  fn from(p: crate::page::Page) -> Self {
    Self {
      limit:  p.limit(),
      offset: p.offset(),
    }
  }
}

/// Abstraction over a Rollbook store backend.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RollStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user by the secondary unique key `(email, role)`.
  fn find_user_by_email(
    &self,
    email: String,
    role: Role,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Delete user rows outright. Enrollments and attendance go with them.
  /// Returns the number of users removed.
  fn delete_users(
    &self,
    ids: Vec<UserId>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── Streams ───────────────────────────────────────────────────────────

  fn create_stream(
    &self,
    input: NewStream,
  ) -> impl Future<Output = Result<Stream, Self::Error>> + Send + '_;

  fn get_stream(
    &self,
    id: StreamId,
  ) -> impl Future<Output = Result<Option<Stream>, Self::Error>> + Send + '_;

  /// Streams owned by a teacher, name-sorted.
  fn list_teacher_streams(
    &self,
    teacher_id: UserId,
  ) -> impl Future<Output = Result<Vec<Stream>, Self::Error>> + Send + '_;

  /// Streams in which a student is enrolled in at least one subject,
  /// name-sorted.
  fn list_student_streams(
    &self,
    student_id: UserId,
  ) -> impl Future<Output = Result<Vec<Stream>, Self::Error>> + Send + '_;

  /// Apply a partial update. Returns `None` if the stream does not exist.
  fn update_stream(
    &self,
    id: StreamId,
    patch: Patch,
  ) -> impl Future<Output = Result<Option<Stream>, Self::Error>> + Send + '_;

  /// Delete a stream and everything under it. Returns `false` if it did not
  /// exist.
  fn delete_stream(
    &self,
    id: StreamId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Subjects ──────────────────────────────────────────────────────────

  fn create_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  fn find_subject_by_name(
    &self,
    stream_id: StreamId,
    name: String,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Subjects in a stream, name-sorted.
  fn list_subjects(
    &self,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  fn update_subject(
    &self,
    id: SubjectId,
    patch: Patch,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Delete subjects and their enrollments and attendance. Returns the
  /// number of subjects removed.
  fn delete_subjects(
    &self,
    ids: Vec<SubjectId>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Subjects in a stream with no attendance row dated on or after `since`.
  fn idle_subjects(
    &self,
    stream_id: StreamId,
    since: NaiveDate,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  // ── Enrollments ───────────────────────────────────────────────────────

  /// Insert `(student, subject)` unless it already exists. Returns `true` if
  /// a row was inserted and `false` if the pair was already enrolled.
  fn insert_enrollment(
    &self,
    student_id: UserId,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn delete_enrollment(
    &self,
    student_id: UserId,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Remove a student from every subject in a stream.
  fn delete_stream_enrollments(
    &self,
    student_id: UserId,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn is_enrolled_in_subject(
    &self,
    student_id: UserId,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Number of subjects in `stream_id` the student is enrolled in.
  fn count_stream_enrollments(
    &self,
    student_id: UserId,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Distinct students enrolled in a subject, name-sorted.
  fn list_subject_students(
    &self,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Distinct students enrolled in any subject of a stream, name-sorted.
  fn list_stream_students(
    &self,
    stream_id: StreamId,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// Students enrolled under `teacher_id`'s streams who have no attendance
  /// row dated on or after `since` in any of that teacher's subjects.
  fn inactive_students(
    &self,
    teacher_id: UserId,
    since: NaiveDate,
  ) -> impl Future<Output = Result<Vec<UserId>, Self::Error>> + Send + '_;

  // ── Attendance ────────────────────────────────────────────────────────

  /// Insert a mark, or overwrite the status of the existing row with the
  /// same `(student_id, subject_id, date)`. Atomic by way of the unique
  /// constraint; concurrent writers race on last-write-wins.
  fn upsert_attendance(
    &self,
    mark: NewMark,
  ) -> impl Future<Output = Result<AttendanceRecord, Self::Error>> + Send + '_;

  /// Rows matching `query`, newest date first, optionally windowed.
  fn query_attendance<'a>(
    &'a self,
    query: &'a AttendanceQuery,
    window: Option<Window>,
  ) -> impl Future<Output = Result<Vec<AttendanceEntry>, Self::Error>> + Send + 'a;

  /// Size of the full filtered set, ignoring any window.
  fn count_attendance<'a>(
    &'a self,
    query: &'a AttendanceQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// Delete rows under a stream (optionally one subject) dated strictly
  /// before `before`. Returns the number of rows removed.
  fn delete_attendance_before(
    &self,
    stream_id: StreamId,
    subject_id: Option<SubjectId>,
    before: NaiveDate,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
