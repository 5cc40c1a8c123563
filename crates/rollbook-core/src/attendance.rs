//! Attendance marks, ledger rows, and the filters used to query them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result,
  stream::{StreamId, SubjectId},
  user::UserId,
};

pub type RecordId = i64;

// ─── Status ──────────────────────────────────────────────────────────────────

/// One attendance mark. Stored and serialised in lowercase.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
  strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
  Present,
  Absent,
  Late,
  Excused,
}

impl Status {
  pub const ALL: [Self; 4] = [Self::Present, Self::Absent, Self::Late, Self::Excused];

  /// Parse a status supplied by a caller, mapping failures to a validation
  /// error that names the accepted values.
  pub fn parse(raw: &str) -> Result<Self> {
    raw.trim().to_ascii_lowercase().parse().map_err(|_| {
      Error::validation(format!(
        "invalid status {raw:?}; expected one of present, absent, late, excused"
      ))
    })
  }

  /// Whether this mark earns attendance credit. Late counts, excused does not.
  pub fn is_credited(self) -> bool { matches!(self, Self::Present | Self::Late) }
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// A ledger row. Unique per `(student_id, subject_id, date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
  pub id:         RecordId,
  pub student_id: UserId,
  pub subject_id: SubjectId,
  pub date:       NaiveDate,
  pub status:     Status,
}

/// A ledger row joined with display names for reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
  #[serde(flatten)]
  pub record:       AttendanceRecord,
  pub stream_id:    StreamId,
  pub subject_name: String,
  pub student_name: String,
}

/// Input to [`crate::store::RollStore::upsert_attendance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMark {
  pub student_id: UserId,
  pub subject_id: SubjectId,
  pub date:       NaiveDate,
  pub status:     Status,
}

// ─── Dates ───────────────────────────────────────────────────────────────────

/// Parse a strict `YYYY-MM-DD` calendar date.
///
/// chrono alone accepts unpadded fields such as `2024-3-1`; those are
/// rejected here so that stored dates always compare lexicographically.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate> {
  let bytes = raw.as_bytes();
  let shaped = bytes.len() == 10
    && bytes.iter().enumerate().all(|(i, b)| match i {
      4 | 7 => *b == b'-',
      _ => b.is_ascii_digit(),
    });
  if !shaped {
    return Err(Error::validation(format!(
      "invalid date {raw:?}; expected YYYY-MM-DD"
    )));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map_err(|_| Error::validation(format!("invalid calendar date {raw:?}")))
}

// ─── Query ───────────────────────────────────────────────────────────────────

/// The single temporal filter applied to a ledger query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
  #[default]
  All,
  Day(NaiveDate),
  Month { year: i32, month: u32 },
  Year(i32),
}

impl Period {
  /// Pick the temporal filter from loosely supplied parts. An exact date
  /// wins over month/year; a month without a year is rejected.
  pub fn from_parts(
    date: Option<NaiveDate>,
    month: Option<u32>,
    year: Option<i32>,
  ) -> Result<Self> {
    let period = match (date, month, year) {
      (Some(d), _, _) => Self::Day(d),
      (None, Some(month), Some(year)) => Self::Month { year, month },
      (None, Some(_), None) => {
        return Err(Error::validation("month filter requires a year"));
      }
      (None, None, Some(year)) => Self::Year(year),
      (None, None, None) => Self::All,
    };
    // Reject out-of-range months and years up front.
    period.bounds()?;
    Ok(period)
  }

  /// Half-open `[start, end)` date range covered by this period, or `None`
  /// for [`Period::All`].
  pub fn bounds(&self) -> Result<Option<(NaiveDate, NaiveDate)>> {
    let out_of_range = || Error::validation(format!("date filter out of range: {self:?}"));
    let range = match *self {
      Self::All => return Ok(None),
      Self::Day(d) => (d, d.succ_opt().ok_or_else(out_of_range)?),
      Self::Month { year, month } => {
        let start = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(out_of_range)?;
        let end = if month == 12 {
          NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
          NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .ok_or_else(out_of_range)?;
        (start, end)
      }
      Self::Year(year) => (
        NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(out_of_range)?,
        NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(out_of_range)?,
      ),
    };
    Ok(Some(range))
  }
}

/// Composable filters for [`crate::store::RollStore::query_attendance`].
/// All set fields are ANDed together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceQuery {
  /// Restrict to streams owned by this teacher.
  pub teacher_id: Option<UserId>,
  pub stream_id:  Option<StreamId>,
  pub subject_id: Option<SubjectId>,
  pub student_id: Option<UserId>,
  pub period:     Period,
}

impl AttendanceQuery {
  pub fn for_student_and_subject(student_id: UserId, subject_id: SubjectId) -> Self {
    Self {
      student_id: Some(student_id),
      subject_id: Some(subject_id),
      ..Default::default()
    }
  }

  pub fn for_subject_on(subject_id: SubjectId, date: NaiveDate) -> Self {
    Self {
      subject_id: Some(subject_id),
      period: Period::Day(date),
      ..Default::default()
    }
  }

  pub fn for_student(student_id: UserId) -> Self {
    Self {
      student_id: Some(student_id),
      ..Default::default()
    }
  }
}
