//! Handlers for `/streams` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/streams` | Teachers: owned streams. Students: enrolled streams |
//! | `POST`   | `/streams` | Body: `{"name":"...","description":"..."}`; teachers only |
//! | `GET`    | `/streams/:id` | |
//! | `PATCH`  | `/streams/:id` | Body: [`Patch`] |
//! | `DELETE` | `/streams/:id` | Cascades to subjects, enrollments and attendance |

use axum::{
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use rollbook_core::{
  Rollbook,
  store::RollStore,
  stream::{Patch, Stream, StreamId},
};
use serde::Deserialize;

use crate::{
  error::ApiError,
  extract::{Json, Path},
  principal::Authenticated,
};

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /streams`
pub async fn list<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
) -> Result<Json<Vec<Stream>>, ApiError> {
  Ok(Json(book.list_streams(&principal).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub name:        String,
  pub description: Option<String>,
}

/// `POST /streams`. The first write by an unknown teacher provisions their
/// account.
pub async fn create<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let stream = book
    .create_stream(&principal, &body.name, body.description)
    .await?;
  Ok((StatusCode::CREATED, Json(stream)))
}

// ─── Single stream ────────────────────────────────────────────────────────────

/// `GET /streams/:id`
pub async fn get_one<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<StreamId>,
) -> Result<Json<Stream>, ApiError> {
  Ok(Json(book.get_stream(&principal, id).await?))
}

/// `PATCH /streams/:id`
pub async fn update<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<StreamId>,
  Json(patch): Json<Patch>,
) -> Result<Json<Stream>, ApiError> {
  Ok(Json(book.update_stream(&principal, id, patch).await?))
}

/// `DELETE /streams/:id`
pub async fn remove<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path(id): Path<StreamId>,
) -> Result<StatusCode, ApiError> {
  book.delete_stream(&principal, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
