//! The Access Evaluator: decides whether a resolved actor may perform an
//! operation on a stream-scoped resource.
//!
//! Decisions are evaluated fresh on every call. Nothing is cached and no
//! grant outlives the request that asked for it.
//!
//! | Actor role | Rule |
//! |------------|------|
//! | teacher    | allowed iff the stream's `teacher_id` is the actor's id |
//! | student    | reads allowed iff enrolled in any subject of the stream; writes denied |
//! | admin      | not modelled here; always denied |

use tracing::debug;

use crate::{
  Error, Result,
  error::ResourceKind,
  store::RollStore,
  stream::{Stream, StreamId, Subject, SubjectId},
  user::{Role, User, UserId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Operation {
  Read,
  Write,
}

/// Something that lives under a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  Stream(StreamId),
  /// A subject, or anything under it (enrollments, attendance).
  Subject(SubjectId),
}

/// The located parent rows for a [`Resource`].
#[derive(Debug, Clone)]
pub struct Scope {
  pub stream:  Stream,
  pub subject: Option<Subject>,
}

pub struct AccessEvaluator<'a, S> {
  store: &'a S,
}

impl<'a, S: RollStore> AccessEvaluator<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// Load the stream (and subject) a resource lives under.
  ///
  /// Fails with [`Error::ResourceNotFound`] if either is missing. This runs
  /// before any permission check so absence is distinguishable from denial.
  pub async fn locate(&self, resource: Resource) -> Result<Scope> {
    let (stream_id, subject) = match resource {
      Resource::Stream(id) => (id, None),
      Resource::Subject(id) => {
        let subject = self
          .store
          .get_subject(id)
          .await
          .map_err(Error::store)?
          .ok_or(Error::not_found(ResourceKind::Subject, id))?;
        (subject.stream_id, Some(subject))
      }
    };

    let stream = self
      .store
      .get_stream(stream_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::not_found(ResourceKind::Stream, stream_id))?;

    Ok(Scope { stream, subject })
  }

  /// `canAccess(actor, resource, operation)`.
  pub async fn can_access(
    &self,
    actor: &User,
    resource: Resource,
    op: Operation,
  ) -> Result<bool> {
    let scope = self.locate(resource).await?;
    self.permits(actor, &scope.stream, op).await
  }

  /// The decision table, applied to an already-located stream.
  pub async fn permits(&self, actor: &User, stream: &Stream, op: Operation) -> Result<bool> {
    match (actor.role, op) {
      (Role::Teacher, _) => Ok(stream.teacher_id == actor.id),
      (Role::Student, Operation::Read) => {
        let n = self
          .store
          .count_stream_enrollments(actor.id, stream.id)
          .await
          .map_err(Error::store)?;
        Ok(n > 0)
      }
      (Role::Student, Operation::Write) | (Role::Admin, _) => Ok(false),
    }
  }

  /// Locate and check in one step, failing with [`Error::AccessDenied`].
  pub async fn authorize(&self, actor: &User, resource: Resource, op: Operation) -> Result<Scope> {
    let scope = self.locate(resource).await?;
    if !self.permits(actor, &scope.stream, op).await? {
      debug!(
        actor_id = actor.id,
        role = %actor.role,
        stream_id = scope.stream.id,
        %op,
        "access denied"
      );
      return Err(Error::AccessDenied);
    }
    Ok(scope)
  }
}

/// Reject actors whose role cannot perform teacher-only actions.
pub fn require_teacher(actor: &User) -> Result<()> {
  if actor.is_teacher() { Ok(()) } else { Err(Error::AccessDenied) }
}

/// Narrow a requested student id for a read.
///
/// Students only ever see their own rows: whatever id they ask for is
/// silently replaced by their own. Other roles get what they asked for.
pub fn scoped_student(actor: &User, requested: Option<UserId>) -> Option<UserId> {
  if !actor.is_student() {
    return requested;
  }
  if let Some(other) = requested.filter(|id| *id != actor.id) {
    debug!(
      actor_id = actor.id,
      requested = other,
      "student requested another student's rows; substituting own id"
    );
  }
  Some(actor.id)
}
