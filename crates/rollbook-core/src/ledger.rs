//! The Attendance Ledger: one status per `(student, subject, date)`.
//!
//! Writes are upserts keyed on that triple: a second mark for the same key
//! overwrites the status in place and no history is kept. A mark may only be
//! written for a pair that has an enrollment.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
  Error, Result,
  attendance::{AttendanceEntry, AttendanceQuery, AttendanceRecord, NewMark, Status},
  page::{Page, Paginated},
  stats::{self, AttendanceStats},
  store::{RollStore, Window},
  stream::SubjectId,
  user::UserId,
};

/// One element of a batch write. The date is shared by the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchMark {
  pub student_id: UserId,
  pub subject_id: SubjectId,
  pub status:     Status,
}

/// A page of ledger rows plus stats over the whole filtered set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceReport {
  pub records: Paginated<AttendanceEntry>,
  pub stats:   AttendanceStats,
}

pub struct Ledger<'a, S> {
  store: &'a S,
}

impl<'a, S: RollStore> Ledger<'a, S> {
  pub fn new(store: &'a S) -> Self { Self { store } }

  /// `markAttendance`. Rejects marks for pairs with no enrollment.
  pub async fn mark(&self, mark: NewMark) -> Result<AttendanceRecord> {
    let enrolled = self
      .store
      .is_enrolled_in_subject(mark.student_id, mark.subject_id)
      .await
      .map_err(Error::store)?;
    if !enrolled {
      return Err(Error::Validation(format!(
        "student {} is not enrolled in subject {}",
        mark.student_id, mark.subject_id
      )));
    }
    self.store.upsert_attendance(mark).await.map_err(Error::store)
  }

  /// `markBatch`. Applies each mark in order through [`Ledger::mark`].
  ///
  /// Not transactional: if a mark fails, marks before it stay committed and
  /// the error is returned. Every step is an upsert, so re-running the whole
  /// batch is safe.
  pub async fn mark_batch(&self, date: NaiveDate, marks: &[BatchMark]) -> Result<Vec<AttendanceRecord>> {
    let mut written = Vec::with_capacity(marks.len());
    for m in marks {
      let mark = NewMark {
        student_id: m.student_id,
        subject_id: m.subject_id,
        date,
        status: m.status,
      };
      match self.mark(mark).await {
        Ok(record) => written.push(record),
        Err(e) => {
          warn!(
            %date,
            committed = written.len(),
            requested = marks.len(),
            error = %e,
            "batch attendance stopped partway; earlier marks remain"
          );
          return Err(e);
        }
      }
    }
    info!(%date, count = written.len(), "recorded attendance batch");
    Ok(written)
  }

  pub async fn get_by_student_and_subject(
    &self,
    student_id: UserId,
    subject_id: SubjectId,
  ) -> Result<Vec<AttendanceEntry>> {
    self
      .query(&AttendanceQuery::for_student_and_subject(student_id, subject_id), None)
      .await
  }

  pub async fn get_by_subject_and_date(
    &self,
    subject_id: SubjectId,
    date: NaiveDate,
  ) -> Result<Vec<AttendanceEntry>> {
    self.query(&AttendanceQuery::for_subject_on(subject_id, date), None).await
  }

  pub async fn get_by_student_id(&self, student_id: UserId) -> Result<Vec<AttendanceEntry>> {
    self.query(&AttendanceQuery::for_student(student_id), None).await
  }

  pub async fn query(
    &self,
    query: &AttendanceQuery,
    window: Option<Window>,
  ) -> Result<Vec<AttendanceEntry>> {
    self.store.query_attendance(query, window).await.map_err(Error::store)
  }

  /// One page of rows. The total is counted before the window is applied,
  /// and the stats cover every filtered row, not just the visible page.
  pub async fn report(&self, query: &AttendanceQuery, page: Page) -> Result<AttendanceReport> {
    let total = self.store.count_attendance(query).await.map_err(Error::store)?;
    let items = self.query(query, Some(page.into())).await?;
    let all = self.query(query, None).await?;
    Ok(AttendanceReport {
      records: Paginated::new(items, total, page),
      stats:   stats::compute_entry_stats(&all),
    })
  }
}
