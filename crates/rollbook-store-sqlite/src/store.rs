//! [`SqliteStore`]: the SQLite implementation of [`RollStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};
use tracing::debug;

use rollbook_core::{
  attendance::{AttendanceEntry, AttendanceQuery, AttendanceRecord, NewMark},
  store::{RollStore, Window},
  stream::{NewStream, NewSubject, Patch, Stream, StreamId, Subject, SubjectId},
  user::{NewUser, Role, User, UserId},
};

use crate::{
  Result,
  encode::{
    ENTRY_COLUMNS, RawEntry, RawUser, STREAM_COLUMNS, SUBJECT_COLUMNS, USER_COLUMNS,
    encode_date, encode_dt, stream_from_row, subject_from_row,
  },
  schema::SCHEMA,
};

/// Joins shared by every ledger read.
const ATTENDANCE_FROM: &str = "
  FROM attendance a
  JOIN subjects sub ON sub.id = a.subject_id
  JOIN streams  st  ON st.id  = sub.stream_id
  JOIN users    u   ON u.id   = a.student_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Rollbook store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Used by tests and `:memory:` configs.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    debug!("schema initialised");
    Ok(())
  }

  async fn users_where(&self, clause: &'static str, args: Vec<Value>) -> Result<Vec<User>> {
    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT DISTINCT {USER_COLUMNS} FROM users u {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawUser::into_user).collect()
  }

  async fn streams_where(&self, clause: &'static str, id: i64) -> Result<Vec<Stream>> {
    let streams = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT DISTINCT {STREAM_COLUMNS} FROM streams st {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params![id], stream_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(streams)
  }

  async fn subjects_where(&self, clause: &'static str, args: Vec<Value>) -> Result<Vec<Subject>> {
    let subjects = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {SUBJECT_COLUMNS} FROM subjects sub {clause}");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args.iter()), subject_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(subjects)
  }

  /// Delete rows by primary key one statement at a time. Returns the number
  /// of rows removed.
  async fn delete_ids(&self, table: &'static str, ids: Vec<i64>) -> Result<u64> {
    let removed = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!("DELETE FROM {table} WHERE id = ?1"))?;
        let mut removed = 0u64;
        for id in ids {
          removed += stmt.execute(params![id])? as u64;
        }
        Ok(removed)
      })
      .await?;
    Ok(removed)
  }
}

/// Build the `WHERE` clause and bound values for a ledger query.
///
/// Only static column names reach the SQL text; every caller-supplied value
/// is bound as a numbered parameter.
fn attendance_filter(q: &AttendanceQuery) -> Result<(String, Vec<Value>)> {
  let mut conds: Vec<String> = Vec::new();
  let mut values: Vec<Value> = Vec::new();
  let mut push = |column: &str, op: &str, value: Value| {
    values.push(value);
    conds.push(format!("{column} {op} ?{}", values.len()));
  };

  if let Some(id) = q.teacher_id {
    push("st.teacher_id", "=", Value::Integer(id));
  }
  if let Some(id) = q.stream_id {
    push("sub.stream_id", "=", Value::Integer(id));
  }
  if let Some(id) = q.subject_id {
    push("a.subject_id", "=", Value::Integer(id));
  }
  if let Some(id) = q.student_id {
    push("a.student_id", "=", Value::Integer(id));
  }
  if let Some((start, end)) = q.period.bounds()? {
    push("a.date", ">=", Value::Text(encode_date(start)));
    push("a.date", "<", Value::Text(encode_date(end)));
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  Ok((where_clause, values))
}

// ─── RollStore impl ──────────────────────────────────────────────────────────

impl RollStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = encode_dt(Utc::now());
    let role = input.role.as_ref().to_owned();
    let (name, email, credential) = (input.name, input.email, input.credential);

    let (id, name, email) = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (name, email, role, credential, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          params![name, email, role, credential, now],
        )?;
        Ok((conn.last_insert_rowid(), name, email))
      })
      .await?;

    Ok(User {
      id,
      name,
      email,
      role: input.role,
    })
  }

  async fn get_user(&self, id: UserId) -> Result<Option<User>> {
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1"),
              params![id],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user_by_email(&self, email: String, role: Role) -> Result<Option<User>> {
    let role = role.as_ref().to_owned();
    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.email = ?1 AND u.role = ?2"),
              params![email, role],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn delete_users(&self, ids: Vec<UserId>) -> Result<u64> {
    self.delete_ids("users", ids).await
  }

  // ── Streams ───────────────────────────────────────────────────────────────

  async fn create_stream(&self, input: NewStream) -> Result<Stream> {
    let now = encode_dt(Utc::now());
    let NewStream {
      name,
      description,
      teacher_id,
    } = input;

    let stream = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO streams (name, description, teacher_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![name, description, teacher_id, now],
        )?;
        Ok(Stream {
          id: conn.last_insert_rowid(),
          name,
          description,
          teacher_id,
        })
      })
      .await?;
    Ok(stream)
  }

  async fn get_stream(&self, id: StreamId) -> Result<Option<Stream>> {
    Ok(self.streams_where("WHERE st.id = ?1", id).await?.into_iter().next())
  }

  async fn list_teacher_streams(&self, teacher_id: UserId) -> Result<Vec<Stream>> {
    self
      .streams_where("WHERE st.teacher_id = ?1 ORDER BY st.name, st.id", teacher_id)
      .await
  }

  async fn list_student_streams(&self, student_id: UserId) -> Result<Vec<Stream>> {
    self
      .streams_where(
        "JOIN subjects sub   ON sub.stream_id = st.id
         JOIN enrollments e  ON e.subject_id  = sub.id
         WHERE e.student_id = ?1
         ORDER BY st.name, st.id",
        student_id,
      )
      .await
  }

  async fn update_stream(&self, id: StreamId, patch: Patch) -> Result<Option<Stream>> {
    let touch_description = patch.description.is_some();
    let description = patch.description.flatten();
    let name = patch.name;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE streams
              SET name        = COALESCE(?2, name),
                  description = CASE WHEN ?3 THEN ?4 ELSE description END
            WHERE id = ?1",
          params![id, name, touch_description, description],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_stream(id).await
  }

  async fn delete_stream(&self, id: StreamId) -> Result<bool> {
    Ok(self.delete_ids("streams", vec![id]).await? > 0)
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn create_subject(&self, input: NewSubject) -> Result<Subject> {
    let now = encode_dt(Utc::now());
    let NewSubject {
      stream_id,
      name,
      description,
    } = input;

    let subject = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (stream_id, name, description, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          params![stream_id, name, description, now],
        )?;
        Ok(Subject {
          id: conn.last_insert_rowid(),
          stream_id,
          name,
          description,
        })
      })
      .await?;
    Ok(subject)
  }

  async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>> {
    Ok(
      self
        .subjects_where("WHERE sub.id = ?1", vec![Value::Integer(id)])
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn find_subject_by_name(&self, stream_id: StreamId, name: String) -> Result<Option<Subject>> {
    Ok(
      self
        .subjects_where(
          "WHERE sub.stream_id = ?1 AND sub.name = ?2",
          vec![Value::Integer(stream_id), Value::Text(name)],
        )
        .await?
        .into_iter()
        .next(),
    )
  }

  async fn list_subjects(&self, stream_id: StreamId) -> Result<Vec<Subject>> {
    self
      .subjects_where(
        "WHERE sub.stream_id = ?1 ORDER BY sub.name, sub.id",
        vec![Value::Integer(stream_id)],
      )
      .await
  }

  async fn update_subject(&self, id: SubjectId, patch: Patch) -> Result<Option<Subject>> {
    let touch_description = patch.description.is_some();
    let description = patch.description.flatten();
    let name = patch.name;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects
              SET name        = COALESCE(?2, name),
                  description = CASE WHEN ?3 THEN ?4 ELSE description END
            WHERE id = ?1",
          params![id, name, touch_description, description],
        )?)
      })
      .await?;

    if changed == 0 {
      return Ok(None);
    }
    self.get_subject(id).await
  }

  async fn delete_subjects(&self, ids: Vec<SubjectId>) -> Result<u64> {
    self.delete_ids("subjects", ids).await
  }

  async fn idle_subjects(&self, stream_id: StreamId, since: NaiveDate) -> Result<Vec<Subject>> {
    self
      .subjects_where(
        "WHERE sub.stream_id = ?1
           AND NOT EXISTS (
             SELECT 1 FROM attendance a
              WHERE a.subject_id = sub.id AND a.date >= ?2
           )
         ORDER BY sub.name, sub.id",
        vec![Value::Integer(stream_id), Value::Text(encode_date(since))],
      )
      .await
  }

  // ── Enrollments ───────────────────────────────────────────────────────────

  async fn insert_enrollment(&self, student_id: UserId, subject_id: SubjectId) -> Result<bool> {
    let now = encode_dt(Utc::now());
    let inserted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "INSERT INTO enrollments (student_id, subject_id, enrolled_at)
           VALUES (?1, ?2, ?3)
           ON CONFLICT (student_id, subject_id) DO NOTHING",
          params![student_id, subject_id, now],
        )?)
      })
      .await?;
    Ok(inserted > 0)
  }

  async fn delete_enrollment(&self, student_id: UserId, subject_id: SubjectId) -> Result<u64> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM enrollments WHERE student_id = ?1 AND subject_id = ?2",
          params![student_id, subject_id],
        )?)
      })
      .await?;
    Ok(removed as u64)
  }

  async fn delete_stream_enrollments(&self, student_id: UserId, stream_id: StreamId) -> Result<u64> {
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM enrollments
            WHERE student_id = ?1
              AND subject_id IN (SELECT id FROM subjects WHERE stream_id = ?2)",
          params![student_id, stream_id],
        )?)
      })
      .await?;
    Ok(removed as u64)
  }

  async fn is_enrolled_in_subject(&self, student_id: UserId, subject_id: SubjectId) -> Result<bool> {
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM enrollments WHERE student_id = ?1 AND subject_id = ?2",
              params![student_id, subject_id],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn count_stream_enrollments(&self, student_id: UserId, stream_id: StreamId) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*)
             FROM enrollments e
             JOIN subjects sub ON sub.id = e.subject_id
            WHERE e.student_id = ?1 AND sub.stream_id = ?2",
          params![student_id, stream_id],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(n as u64)
  }

  async fn list_subject_students(&self, subject_id: SubjectId) -> Result<Vec<User>> {
    self
      .users_where(
        "JOIN enrollments e ON e.student_id = u.id
         WHERE e.subject_id = ?1
         ORDER BY u.name, u.id",
        vec![Value::Integer(subject_id)],
      )
      .await
  }

  async fn list_stream_students(&self, stream_id: StreamId) -> Result<Vec<User>> {
    self
      .users_where(
        "JOIN enrollments e ON e.student_id = u.id
         JOIN subjects sub  ON sub.id = e.subject_id
         WHERE sub.stream_id = ?1
         ORDER BY u.name, u.id",
        vec![Value::Integer(stream_id)],
      )
      .await
  }

  async fn inactive_students(&self, teacher_id: UserId, since: NaiveDate) -> Result<Vec<UserId>> {
    let since = encode_date(since);
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT DISTINCT e.student_id
             FROM enrollments e
             JOIN subjects sub ON sub.id = e.subject_id
             JOIN streams  st  ON st.id  = sub.stream_id
            WHERE st.teacher_id = ?1
              AND NOT EXISTS (
                SELECT 1
                  FROM attendance a
                  JOIN subjects s2 ON s2.id = a.subject_id
                  JOIN streams  t2 ON t2.id = s2.stream_id
                 WHERE a.student_id = e.student_id
                   AND t2.teacher_id = ?1
                   AND a.date >= ?2
              )
            ORDER BY e.student_id",
        )?;
        let rows = stmt
          .query_map(params![teacher_id, since], |r| r.get(0))?
          .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(ids)
  }

  // ── Attendance ────────────────────────────────────────────────────────────

  async fn upsert_attendance(&self, mark: NewMark) -> Result<AttendanceRecord> {
    let now = encode_dt(Utc::now());
    let date = encode_date(mark.date);
    let status = mark.status.as_ref().to_owned();
    let (student_id, subject_id) = (mark.student_id, mark.subject_id);

    let id: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "INSERT INTO attendance (student_id, subject_id, date, status, recorded_at)
           VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (student_id, subject_id, date)
           DO UPDATE SET status = excluded.status, recorded_at = excluded.recorded_at
           RETURNING id",
          params![student_id, subject_id, date, status, now],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(AttendanceRecord {
      id,
      student_id,
      subject_id,
      date: mark.date,
      status: mark.status,
    })
  }

  async fn query_attendance(
    &self,
    query: &AttendanceQuery,
    window: Option<Window>,
  ) -> Result<Vec<AttendanceEntry>> {
    let (where_clause, mut values) = attendance_filter(query)?;
    let mut limit_clause = String::new();
    if let Some(w) = window {
      values.push(Value::Integer(w.limit as i64));
      values.push(Value::Integer(w.offset as i64));
      limit_clause = format!("LIMIT ?{} OFFSET ?{}", values.len() - 1, values.len());
    }

    let raws: Vec<RawEntry> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {ENTRY_COLUMNS} {ATTENDANCE_FROM}
           {where_clause}
           ORDER BY a.date DESC, sub.name, u.name, a.id
           {limit_clause}"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values.iter()), RawEntry::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawEntry::into_entry).collect()
  }

  async fn count_attendance(&self, query: &AttendanceQuery) -> Result<u64> {
    let (where_clause, values) = attendance_filter(query)?;
    let n: i64 = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT COUNT(*) {ATTENDANCE_FROM} {where_clause}");
        Ok(conn.query_row(&sql, params_from_iter(values.iter()), |r| r.get(0))?)
      })
      .await?;
    Ok(n as u64)
  }

  async fn delete_attendance_before(
    &self,
    stream_id: StreamId,
    subject_id: Option<SubjectId>,
    before: NaiveDate,
  ) -> Result<u64> {
    let before = encode_date(before);
    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM attendance
            WHERE date < ?1
              AND subject_id IN (SELECT id FROM subjects WHERE stream_id = ?2)
              AND (?3 IS NULL OR subject_id = ?3)",
          params![before, stream_id, subject_id],
        )?)
      })
      .await?;
    Ok(removed as u64)
  }
}
