//! Handlers for `/attendance` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/attendance` | Body: [`MarkBody`]; re-marking a day overwrites it |
//! | `POST` | `/attendance/batch` | Body: [`BatchBody`]; best-effort, stops at the first failure |
//! | `GET`  | `/attendance` | [`FilterParams`] + [`PageParams`]; page of rows plus stats |
//! | `GET`  | `/attendance/summary` | [`FilterParams`] + `groupBy=subject\|month` |
//! | `GET`  | `/subjects/:id/students/:student_id/stats` | One student in one subject |
//!
//! Dates are strict `YYYY-MM-DD`. An exact `date` wins over `month`/`year`.

use std::str::FromStr as _;

use axum::extract::State;
use rollbook_core::{
  Rollbook,
  attendance::{AttendanceRecord, Period, Status, parse_calendar_date},
  ledger::{AttendanceReport, BatchMark},
  page::Page,
  service::{AttendanceFilter, AttendanceSummary},
  stats::{AttendanceStats, GroupBy},
  store::RollStore,
  stream::{StreamId, SubjectId},
  user::UserId,
};
use serde::{Deserialize, Serialize};

use crate::{
  error::ApiError,
  extract::{Json, Path, Query},
  principal::Authenticated,
};

// ─── Params ───────────────────────────────────────────────────────────────────

/// Read filters, all optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
  pub stream_id:  Option<StreamId>,
  pub subject_id: Option<SubjectId>,
  pub student_id: Option<UserId>,
  pub date:       Option<String>,
  pub month:      Option<u32>,
  pub year:       Option<i32>,
}

impl FilterParams {
  pub fn into_filter(self) -> Result<AttendanceFilter, ApiError> {
    let date = self.date.as_deref().map(parse_calendar_date).transpose()?;
    Ok(AttendanceFilter {
      stream_id:  self.stream_id,
      subject_id: self.subject_id,
      student_id: self.student_id,
      period:     Period::from_parts(date, self.month, self.year)?,
    })
  }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupParams {
  pub group_by: Option<String>,
}

// ─── Write ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkBody {
  pub student_id: UserId,
  pub subject_id: SubjectId,
  pub status:     String,
  pub date:       String,
}

/// `POST /attendance`
pub async fn mark<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Json(body): Json<MarkBody>,
) -> Result<Json<AttendanceRecord>, ApiError> {
  let status = Status::parse(&body.status)?;
  let date = parse_calendar_date(&body.date)?;
  let record = book
    .mark_attendance(&principal, body.student_id, body.subject_id, status, date)
    .await?;
  Ok(Json(record))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
  pub student_id: UserId,
  pub subject_id: SubjectId,
  pub status:     String,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub date:    String,
  pub records: Vec<BatchItem>,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
  pub records: Vec<AttendanceRecord>,
}

/// `POST /attendance/batch`. The whole body is validated before any write.
pub async fn batch<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Json(body): Json<BatchBody>,
) -> Result<Json<BatchResponse>, ApiError> {
  let date = parse_calendar_date(&body.date)?;
  let marks = body
    .records
    .iter()
    .map(|item| {
      Ok(BatchMark {
        student_id: item.student_id,
        subject_id: item.subject_id,
        status:     Status::parse(&item.status)?,
      })
    })
    .collect::<rollbook_core::Result<Vec<_>>>()?;
  let records = book.mark_batch(&principal, date, &marks).await?;
  Ok(Json(BatchResponse { records }))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /attendance`
pub async fn report<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Query(filter): Query<FilterParams>,
  Query(paging): Query<PageParams>,
) -> Result<Json<AttendanceReport>, ApiError> {
  let filter = filter.into_filter()?;
  let page = Page::new(paging.page, paging.page_size);
  Ok(Json(book.attendance_report(&principal, filter, page).await?))
}

/// `GET /attendance/summary`. Groups by subject unless `groupBy=month`.
pub async fn summary<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Query(filter): Query<FilterParams>,
  Query(group): Query<GroupParams>,
) -> Result<Json<AttendanceSummary>, ApiError> {
  let filter = filter.into_filter()?;
  let group_by = match group.group_by.as_deref() {
    None => GroupBy::Subject,
    Some(raw) => GroupBy::from_str(raw)
      .map_err(|_| ApiError::BadRequest(format!("unknown groupBy {raw:?}")))?,
  };
  Ok(Json(book.attendance_summary(&principal, filter, group_by).await?))
}

/// `GET /subjects/:id/students/:student_id/stats`
pub async fn student_stats<S: RollStore>(
  State(book): State<Rollbook<S>>,
  Authenticated(principal): Authenticated,
  Path((subject_id, student_id)): Path<(SubjectId, UserId)>,
) -> Result<Json<AttendanceStats>, ApiError> {
  Ok(Json(
    book
      .student_subject_stats(&principal, student_id, subject_id)
      .await?,
  ))
}
