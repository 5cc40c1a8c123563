//! JSON REST API for Rollbook.
//!
//! Exposes an axum [`Router`] backed by any [`rollbook_core::store::RollStore`].
//! Authentication happens upstream; this layer only reads the principal the
//! session proxy forwards (see [`principal`]).
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", rollbook_api::api_router(rollbook.clone()))
//! ```

pub mod attendance;
pub mod cleanup;
pub mod enrollments;
pub mod error;
pub mod extract;
pub mod principal;
pub mod streams;
pub mod subjects;

use axum::{
  Router,
  routing::{delete, get, patch, post},
};
use rollbook_core::{Rollbook, store::RollStore};

pub use error::ApiError;
pub use principal::Authenticated;

/// Build a fully-materialised API router over `rollbook`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(rollbook: Rollbook<S>) -> Router<()>
where
  S: RollStore + 'static,
{
  Router::new()
    // Streams
    .route("/streams", get(streams::list::<S>).post(streams::create::<S>))
    .route(
      "/streams/{id}",
      get(streams::get_one::<S>)
        .patch(streams::update::<S>)
        .delete(streams::remove::<S>),
    )
    .route(
      "/streams/{id}/subjects",
      get(subjects::list::<S>).post(subjects::create::<S>),
    )
    .route("/streams/{id}/students", get(enrollments::stream_roster::<S>))
    .route("/streams/{id}/enrollments", post(enrollments::enroll_stream::<S>))
    .route(
      "/streams/{id}/enrollments/{student_id}",
      get(enrollments::check_stream::<S>).delete(enrollments::unenroll_stream::<S>),
    )
    // Subjects
    .route(
      "/subjects/{id}",
      patch(subjects::update::<S>).delete(subjects::remove::<S>),
    )
    .route("/subjects/{id}/students", get(enrollments::subject_roster::<S>))
    .route(
      "/subjects/{id}/students/{student_id}/stats",
      get(attendance::student_stats::<S>),
    )
    .route("/subjects/{id}/enrollments", post(enrollments::enroll_subject::<S>))
    .route(
      "/subjects/{id}/enrollments/{student_id}",
      delete(enrollments::unenroll_subject::<S>),
    )
    // Attendance
    .route(
      "/attendance",
      get(attendance::report::<S>).post(attendance::mark::<S>),
    )
    .route("/attendance/batch", post(attendance::batch::<S>))
    .route("/attendance/summary", get(attendance::summary::<S>))
    // Cleanup
    .route("/cleanup", post(cleanup::handler::<S>))
    .with_state(rollbook)
}
