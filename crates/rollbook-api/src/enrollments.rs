//! Enrollment and roster handlers.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/subjects/:id/enrollments` | Body: `{"studentId":1}`; 409 if already enrolled |
//! | `DELETE` | `/subjects/:id/enrollments/:student_id` | |
//! | `POST`   | `/streams/:id/enrollments` | Every subject in the stream; duplicates skipped |
//! | `GET`    | `/streams/:id/enrollments/:student_id` | `{"enrolled":bool}` |
//! | `DELETE` | `/streams/:id/enrollments/:student_id` | |
//! | `GET`    | `/subjects/:id/students` | Roster, name-sorted |
//! | `GET`    | `/streams/:id/students` | Distinct roster across the stream |

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use rollbook_core::{
  Rollbook,
  enrollment::Roster,
  store::RollStore,
  stream::{StreamId, SubjectId},
  user::{User, UserId},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  error::ApiError,
  extract::{Json, Path},
  principal::Authenticated,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollBody {
  pub student_id: UserId,
}

// ─── Subject ──────────────────────────────────────────────────────────────────

/// `POST /subjects/:id/enrollments`
pub async fn enroll_subject<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(subject_id): Path<SubjectId>,
  Json(body): Json<EnrollBody>,
) -> Result<impl IntoResponse, ApiError> {
  book.enroll(&principal, body.student_id, subject_id).await?;
  Ok((
    StatusCode::CREATED,
    Json(json!({ "studentId": body.student_id, "subjectId": subject_id })),
  ))
}

/// `DELETE /subjects/:id/enrollments/:student_id`
pub async fn unenroll_subject<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path((subject_id, student_id)): Path<(SubjectId, UserId)>,
) -> Result<Json<Value>, ApiError> {
  let removed = book.unenroll(&principal, student_id, subject_id).await?;
  Ok(Json(json!({ "removed": removed })))
}

/// `GET /subjects/:id/students`
pub async fn subject_roster<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(subject_id): Path<SubjectId>,
) -> Result<Json<Vec<User>>, ApiError> {
  Ok(Json(book.list_students(&principal, Roster::Subject(subject_id)).await?))
}

// ─── Stream ───────────────────────────────────────────────────────────────────

/// `POST /streams/:id/enrollments`
pub async fn enroll_stream<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(stream_id): Path<StreamId>,
  Json(body): Json<EnrollBody>,
) -> Result<Json<Value>, ApiError> {
  let created = book
    .enroll_in_stream(&principal, body.student_id, stream_id)
    .await?;
  Ok(Json(json!({ "created": created })))
}

/// `GET /streams/:id/enrollments/:student_id`
pub async fn check_stream<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path((stream_id, student_id)): Path<(StreamId, UserId)>,
) -> Result<Json<Value>, ApiError> {
  let enrolled = book.is_enrolled(&principal, student_id, stream_id).await?;
  Ok(Json(json!({ "enrolled": enrolled })))
}

/// `DELETE /streams/:id/enrollments/:student_id`
pub async fn unenroll_stream<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path((stream_id, student_id)): Path<(StreamId, UserId)>,
) -> Result<Json<Value>, ApiError> {
  let removed = book
    .unenroll_from_stream(&principal, student_id, stream_id)
    .await?;
  Ok(Json(json!({ "removed": removed })))
}

/// `GET /streams/:id/students`
pub async fn stream_roster<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(stream_id): Path<StreamId>,
) -> Result<Json<Vec<User>>, ApiError> {
  Ok(Json(book.list_students(&principal, Roster::Stream(stream_id)).await?))
}
