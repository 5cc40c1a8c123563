//! [`Rollbook`]: the request-scoped entry point.
//!
//! Each method takes the caller's [`Principal`], resolves it, checks access,
//! and then touches the store. Nothing is carried between calls.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::{
  Error, Result,
  access::{AccessEvaluator, Operation, Resource, Scope, require_teacher, scoped_student},
  attendance::{AttendanceEntry, AttendanceQuery, AttendanceRecord, NewMark, Status},
  cleanup::{CleanupEngine, CleanupOutcome, CleanupRequest},
  enrollment::{Enrollments, Roster},
  error::ResourceKind,
  identity::IdentityResolver,
  ledger::{AttendanceReport, BatchMark, Ledger},
  page::Page,
  stats::{self, AttendanceStats, GroupBy, Grouped},
  store::RollStore,
  stream::{NewStream, NewSubject, Patch, Stream, StreamId, Subject, SubjectId, clean_name},
  user::{Principal, Role, User, UserId},
};

/// Overall stats for a filtered set plus the same set regrouped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
  pub stats:   AttendanceStats,
  #[serde(flatten)]
  pub grouped: Grouped,
}

/// Filters a caller may supply for attendance reads.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
  pub stream_id:  Option<StreamId>,
  pub subject_id: Option<SubjectId>,
  pub student_id: Option<UserId>,
  pub period:     crate::attendance::Period,
}

pub struct Rollbook<S> {
  store: Arc<S>,
}

impl<S> Clone for Rollbook<S> {
  fn clone(&self) -> Self {
    Self {
      store: Arc::clone(&self.store),
    }
  }
}

impl<S: RollStore> Rollbook<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub fn store(&self) -> &S { &self.store }

  fn access(&self) -> AccessEvaluator<'_, S> { AccessEvaluator::new(&*self.store) }

  fn enrollments(&self) -> Enrollments<'_, S> { Enrollments::new(&*self.store) }

  fn ledger(&self) -> Ledger<'_, S> { Ledger::new(&*self.store) }

  /// Resolve the principal without creating anything.
  pub async fn actor(&self, principal: &Principal) -> Result<User> {
    IdentityResolver::new(&*self.store).resolve(principal).await
  }

  async fn teacher(&self, principal: &Principal) -> Result<User> {
    let actor = self.actor(principal).await?;
    require_teacher(&actor)?;
    Ok(actor)
  }

  async fn authorize(
    &self,
    principal: &Principal,
    resource: Resource,
    op: Operation,
  ) -> Result<(User, Scope)> {
    let actor = self.actor(principal).await?;
    let scope = self.access().authorize(&actor, resource, op).await?;
    Ok((actor, scope))
  }

  // ─── Streams ─────────────────────────────────────────────────────────────

  /// The only write path that may auto-provision an unknown teacher.
  pub async fn create_stream(
    &self,
    principal: &Principal,
    name: &str,
    description: Option<String>,
  ) -> Result<Stream> {
    if principal.role != Role::Teacher {
      // Non-teachers are never provisioned: unknown callers are reported as
      // such, known ones are denied.
      self.teacher(principal).await?;
      return Err(Error::AccessDenied);
    }
    let name = clean_name(name, "stream")?;
    let teacher = IdentityResolver::new(&*self.store)
      .resolve_or_provision(principal)
      .await?;
    let stream = self
      .store
      .create_stream(NewStream {
        name,
        description,
        teacher_id: teacher.id,
      })
      .await
      .map_err(Error::store)?;
    info!(stream_id = stream.id, teacher_id = teacher.id, "created stream");
    Ok(stream)
  }

  /// Teachers see the streams they own; students see the streams they are
  /// enrolled in.
  pub async fn list_streams(&self, principal: &Principal) -> Result<Vec<Stream>> {
    let actor = self.actor(principal).await?;
    match actor.role {
      Role::Teacher => self.store.list_teacher_streams(actor.id).await,
      Role::Student => self.store.list_student_streams(actor.id).await,
      Role::Admin => return Err(Error::AccessDenied),
    }
    .map_err(Error::store)
  }

  pub async fn get_stream(&self, principal: &Principal, id: StreamId) -> Result<Stream> {
    let (_, scope) = self.authorize(principal, Resource::Stream(id), Operation::Read).await?;
    Ok(scope.stream)
  }

  pub async fn update_stream(&self, principal: &Principal, id: StreamId, mut patch: Patch) -> Result<Stream> {
    let (_, scope) = self.authorize(principal, Resource::Stream(id), Operation::Write).await?;
    if let Some(name) = patch.name.as_deref() {
      patch.name = Some(clean_name(name, "stream")?);
    }
    if patch.is_empty() {
      return Ok(scope.stream);
    }
    self
      .store
      .update_stream(id, patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found(ResourceKind::Stream, id))
  }

  /// Irreversible. Subjects, enrollments, and attendance under the stream
  /// go with it.
  pub async fn delete_stream(&self, principal: &Principal, id: StreamId) -> Result<()> {
    let (actor, _) = self.authorize(principal, Resource::Stream(id), Operation::Write).await?;
    if !self.store.delete_stream(id).await.map_err(Error::store)? {
      return Err(Error::not_found(ResourceKind::Stream, id));
    }
    info!(stream_id = id, teacher_id = actor.id, "deleted stream");
    Ok(())
  }

  // ─── Subjects ────────────────────────────────────────────────────────────

  pub async fn create_subject(
    &self,
    principal: &Principal,
    stream_id: StreamId,
    name: &str,
    description: Option<String>,
  ) -> Result<Subject> {
    self
      .authorize(principal, Resource::Stream(stream_id), Operation::Write)
      .await?;
    let name = clean_name(name, "subject")?;
    self.ensure_subject_name_free(stream_id, &name, None).await?;
    self
      .store
      .create_subject(NewSubject {
        stream_id,
        name,
        description,
      })
      .await
      .map_err(Error::store)
  }

  pub async fn list_subjects(&self, principal: &Principal, stream_id: StreamId) -> Result<Vec<Subject>> {
    self
      .authorize(principal, Resource::Stream(stream_id), Operation::Read)
      .await?;
    self.store.list_subjects(stream_id).await.map_err(Error::store)
  }

  pub async fn update_subject(&self, principal: &Principal, id: SubjectId, mut patch: Patch) -> Result<Subject> {
    let (_, scope) = self.authorize(principal, Resource::Subject(id), Operation::Write).await?;
    let current = scope.subject.ok_or(Error::not_found(ResourceKind::Subject, id))?;
    if let Some(name) = patch.name.as_deref() {
      let name = clean_name(name, "subject")?;
      self.ensure_subject_name_free(current.stream_id, &name, Some(id)).await?;
      patch.name = Some(name);
    }
    if patch.is_empty() {
      return Ok(current);
    }
    self
      .store
      .update_subject(id, patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found(ResourceKind::Subject, id))
  }

  pub async fn delete_subject(&self, principal: &Principal, id: SubjectId) -> Result<()> {
    self.authorize(principal, Resource::Subject(id), Operation::Write).await?;
    self.store.delete_subjects(vec![id]).await.map_err(Error::store)?;
    info!(subject_id = id, "deleted subject");
    Ok(())
  }

  async fn ensure_subject_name_free(
    &self,
    stream_id: StreamId,
    name: &str,
    except: Option<SubjectId>,
  ) -> Result<()> {
    let existing = self
      .store
      .find_subject_by_name(stream_id, name.to_owned())
      .await
      .map_err(Error::store)?;
    match existing {
      Some(s) if Some(s.id) != except => Err(Error::Conflict(format!(
        "a subject named {name:?} already exists in stream {stream_id}"
      ))),
      _ => Ok(()),
    }
  }

  // ─── Enrollment ──────────────────────────────────────────────────────────

  async fn student(&self, id: UserId) -> Result<User> {
    let user = self
      .store
      .get_user(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found(ResourceKind::User, id))?;
    if !user.is_student() {
      return Err(Error::Validation(format!("user {id} is not a student")));
    }
    Ok(user)
  }

  /// An explicit single enroll. Enrolling an already-enrolled pair leaves
  /// the one existing row in place and reports [`Error::Conflict`].
  pub async fn enroll(&self, principal: &Principal, student_id: UserId, subject_id: SubjectId) -> Result<()> {
    self
      .authorize(principal, Resource::Subject(subject_id), Operation::Write)
      .await?;
    self.student(student_id).await?;
    if !self.enrollments().enroll(student_id, subject_id).await? {
      return Err(Error::Conflict(format!(
        "student {student_id} is already enrolled in subject {subject_id}"
      )));
    }
    Ok(())
  }

  /// Enroll in every subject of a stream. Returns the number of new rows.
  pub async fn enroll_in_stream(
    &self,
    principal: &Principal,
    student_id: UserId,
    stream_id: StreamId,
  ) -> Result<usize> {
    self
      .authorize(principal, Resource::Stream(stream_id), Operation::Write)
      .await?;
    self.student(student_id).await?;
    self.enrollments().enroll_in_stream(student_id, stream_id).await
  }

  pub async fn unenroll(&self, principal: &Principal, student_id: UserId, subject_id: SubjectId) -> Result<u64> {
    self
      .authorize(principal, Resource::Subject(subject_id), Operation::Write)
      .await?;
    self.enrollments().unenroll(student_id, subject_id).await
  }

  pub async fn unenroll_from_stream(
    &self,
    principal: &Principal,
    student_id: UserId,
    stream_id: StreamId,
  ) -> Result<bool> {
    self
      .authorize(principal, Resource::Stream(stream_id), Operation::Write)
      .await?;
    self.enrollments().unenroll_from_stream(student_id, stream_id).await
  }

  /// Roster of a subject or stream. Teacher-only: students do not list
  /// their classmates.
  pub async fn list_students(&self, principal: &Principal, roster: Roster) -> Result<Vec<User>> {
    let actor = self.teacher(principal).await?;
    let resource = match roster {
      Roster::Subject(id) => Resource::Subject(id),
      Roster::Stream(id) => Resource::Stream(id),
    };
    self.access().authorize(&actor, resource, Operation::Read).await?;
    self.enrollments().list_students(roster).await
  }

  /// Whether a student is in a stream. Students may only ask about
  /// themselves.
  pub async fn is_enrolled(&self, principal: &Principal, student_id: UserId, stream_id: StreamId) -> Result<bool> {
    let actor = self.actor(principal).await?;
    if actor.is_student() {
      self.access().locate(Resource::Stream(stream_id)).await?;
      return self.enrollments().is_enrolled(actor.id, stream_id).await;
    }
    self
      .access()
      .authorize(&actor, Resource::Stream(stream_id), Operation::Read)
      .await?;
    self.enrollments().is_enrolled(student_id, stream_id).await
  }

  // ─── Attendance ──────────────────────────────────────────────────────────

  pub async fn mark_attendance(
    &self,
    principal: &Principal,
    student_id: UserId,
    subject_id: SubjectId,
    status: Status,
    date: NaiveDate,
  ) -> Result<AttendanceRecord> {
    self
      .authorize(principal, Resource::Subject(subject_id), Operation::Write)
      .await?;
    self
      .ledger()
      .mark(NewMark {
        student_id,
        subject_id,
        date,
        status,
      })
      .await
  }

  /// Every subject named in the batch is authorized before anything is
  /// written. The writes themselves are best-effort; see
  /// [`Ledger::mark_batch`].
  pub async fn mark_batch(
    &self,
    principal: &Principal,
    date: NaiveDate,
    marks: &[BatchMark],
  ) -> Result<Vec<AttendanceRecord>> {
    let actor = self.teacher(principal).await?;
    let mut subjects: Vec<SubjectId> = marks.iter().map(|m| m.subject_id).collect();
    subjects.sort_unstable();
    subjects.dedup();
    for subject_id in subjects {
      self
        .access()
        .authorize(&actor, Resource::Subject(subject_id), Operation::Write)
        .await?;
    }
    self.ledger().mark_batch(date, marks).await
  }

  /// Authorize a read filter and turn it into a store query.
  async fn scoped_query(&self, principal: &Principal, filter: AttendanceFilter) -> Result<AttendanceQuery> {
    let actor = self.actor(principal).await?;
    if actor.role == Role::Admin {
      return Err(Error::AccessDenied);
    }

    let mut stream_id = filter.stream_id;
    if let Some(subject_id) = filter.subject_id {
      let scope = self
        .access()
        .authorize(&actor, Resource::Subject(subject_id), Operation::Read)
        .await?;
      if stream_id.is_some_and(|id| id != scope.stream.id) {
        return Err(Error::not_found(ResourceKind::Subject, subject_id));
      }
      stream_id = Some(scope.stream.id);
    } else if let Some(id) = stream_id {
      self
        .access()
        .authorize(&actor, Resource::Stream(id), Operation::Read)
        .await?;
    }

    Ok(AttendanceQuery {
      teacher_id: actor.is_teacher().then_some(actor.id),
      stream_id,
      subject_id: filter.subject_id,
      student_id: scoped_student(&actor, filter.student_id),
      period: filter.period,
    })
  }

  /// A page of ledger rows, newest first, with stats over the whole
  /// filtered set.
  pub async fn attendance_report(
    &self,
    principal: &Principal,
    filter: AttendanceFilter,
    page: Page,
  ) -> Result<AttendanceReport> {
    let query = self.scoped_query(principal, filter).await?;
    self.ledger().report(&query, page).await
  }

  pub async fn attendance_summary(
    &self,
    principal: &Principal,
    filter: AttendanceFilter,
    group_by: GroupBy,
  ) -> Result<AttendanceSummary> {
    let query = self.scoped_query(principal, filter).await?;
    let entries: Vec<AttendanceEntry> = self.ledger().query(&query, None).await?;
    Ok(AttendanceSummary {
      stats:   stats::compute_entry_stats(&entries),
      grouped: stats::group(&entries, group_by),
    })
  }

  /// Stats for one student in one subject.
  pub async fn student_subject_stats(
    &self,
    principal: &Principal,
    student_id: UserId,
    subject_id: SubjectId,
  ) -> Result<AttendanceStats> {
    let filter = AttendanceFilter {
      subject_id: Some(subject_id),
      student_id: Some(student_id),
      ..Default::default()
    };
    let query = self.scoped_query(principal, filter).await?;
    let entries = self.ledger().query(&query, None).await?;
    Ok(stats::compute_entry_stats(&entries))
  }

  // ─── Cleanup ─────────────────────────────────────────────────────────────

  pub async fn cleanup(&self, principal: &Principal, request: &CleanupRequest) -> Result<CleanupOutcome> {
    let cleanup = request.validate()?;
    let actor = self.teacher(principal).await?;
    CleanupEngine::new(&*self.store).run(&actor, cleanup).await
  }
}
