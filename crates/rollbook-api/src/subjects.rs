//! Handlers for subjects.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/streams/:id/subjects` | Name-sorted |
//! | `POST`   | `/streams/:id/subjects` | 409 if the name is taken in that stream |
//! | `PATCH`  | `/subjects/:id` | Body: [`Patch`] |
//! | `DELETE` | `/subjects/:id` | Cascades to enrollments and attendance |

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use rollbook_core::{
  Rollbook,
  store::RollStore,
  stream::{Patch, StreamId, Subject, SubjectId},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{Json, Path},
  principal::Authenticated,
};

/// `GET /streams/:id/subjects`
pub async fn list<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(stream_id): Path<StreamId>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  Ok(Json(book.list_subjects(&principal, stream_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub description: Option<String>,
}

/// `POST /streams/:id/subjects`
pub async fn create<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(stream_id): Path<StreamId>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = book
    .create_subject(&principal, stream_id, &body.name, body.description)
    .await?;
  Ok((StatusCode::CREATED, Json(subject)))
}

/// `PATCH /subjects/:id`
pub async fn update<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<SubjectId>,
  Json(patch): Json<Patch>,
) -> Result<Json<Subject>, ApiError> {
  Ok(Json(book.update_subject(&principal, id, patch).await?))
}

/// `DELETE /subjects/:id`
pub async fn remove<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<SubjectId>,
) -> Result<StatusCode, ApiError> {
  book.delete_subject(&principal, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
