//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings; calendar dates are `YYYY-MM-DD` so that
//! string comparison orders them correctly. Enums are stored as their
//! lowercase names.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rollbook_core::{
  attendance::{AttendanceEntry, AttendanceRecord, Status},
  stream::{Stream, Subject},
  user::{Role, User},
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  T::from_str(s).map_err(|_| Error::UnknownVariant {
    column,
    value: s.to_owned(),
  })
}

pub fn decode_role(s: &str) -> Result<Role> { decode_enum("role", s) }

pub fn decode_status(s: &str) -> Result<Status> { decode_enum("status", s) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawUser::from_row`].
pub const USER_COLUMNS: &str = "u.id, u.name, u.email, u.role";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub id:    i64,
  pub name:  String,
  pub email: String,
  pub role:  String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:    row.get(0)?,
      name:  row.get(1)?,
      email: row.get(2)?,
      role:  row.get(3)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      id:    self.id,
      name:  self.name,
      email: self.email,
      role:  decode_role(&self.role)?,
    })
  }
}

/// Column list matching [`stream_from_row`].
pub const STREAM_COLUMNS: &str = "st.id, st.name, st.description, st.teacher_id";

/// Streams hold no encoded columns, so they map straight from the row.
pub fn stream_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Stream> {
  Ok(Stream {
    id:          row.get(0)?,
    name:        row.get(1)?,
    description: row.get(2)?,
    teacher_id:  row.get(3)?,
  })
}

/// Column list matching [`subject_from_row`].
pub const SUBJECT_COLUMNS: &str = "sub.id, sub.stream_id, sub.name, sub.description";

pub fn subject_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Subject> {
  Ok(Subject {
    id:          row.get(0)?,
    stream_id:   row.get(1)?,
    name:        row.get(2)?,
    description: row.get(3)?,
  })
}

/// Column list matching [`RawEntry::from_row`].
pub const ENTRY_COLUMNS: &str =
  "a.id, a.student_id, a.subject_id, a.date, a.status, sub.stream_id, sub.name, u.name";

/// Raw values read from an `attendance` row joined with its subject and
/// student.
pub struct RawEntry {
  pub id:           i64,
  pub student_id:   i64,
  pub subject_id:   i64,
  pub date:         String,
  pub status:       String,
  pub stream_id:    i64,
  pub subject_name: String,
  pub student_name: String,
}

impl RawEntry {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:           row.get(0)?,
      student_id:   row.get(1)?,
      subject_id:   row.get(2)?,
      date:         row.get(3)?,
      status:       row.get(4)?,
      stream_id:    row.get(5)?,
      subject_name: row.get(6)?,
      student_name: row.get(7)?,
    })
  }

  pub fn into_entry(self) -> Result<AttendanceEntry> {
    Ok(AttendanceEntry {
      record:       AttendanceRecord {
        id:         self.id,
        student_id: self.student_id,
        subject_id: self.subject_id,
        date:       decode_date(&self.date)?,
        status:     decode_status(&self.status)?,
      },
      stream_id:    self.stream_id,
      subject_name: self.subject_name,
      student_name: self.student_name,
    })
  }
}
