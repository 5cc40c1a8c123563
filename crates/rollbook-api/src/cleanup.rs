//! Handler for `POST /cleanup`.
//!
//! Body: `{"type":"attendance|subjects|inactive_students","beforeDate":"YYYY-MM-DD",
//! "streamId":1,"subjectId":2}`. `streamId` is required for the first two
//! types. Deletes are irreversible and not rolled back if a later step fails.

use axum::extract::State;
use rollbook_core::{
  Rollbook,
  cleanup::{CleanupOutcome, CleanupRequest},
  store::RollStore,
};

use crate::{error::ApiError, extract::Json, principal::Authenticated};

/// `POST /cleanup`
pub async fn handler<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Json(request): Json<CleanupRequest>,
) -> Result<Json<CleanupOutcome>, ApiError> {
  Ok(Json(book.cleanup(&principal, &request).await?))
}
