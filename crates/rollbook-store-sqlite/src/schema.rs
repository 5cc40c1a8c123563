//! SQL schema for the Rollbook SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Deletes cascade: stream -> subjects -> enrollments -> attendance, and
/// user -> enrollments -> attendance. Attendance references its enrollment
/// directly, so a mark can never outlive the enrollment it belongs to.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    email       TEXT NOT NULL COLLATE NOCASE,
    role        TEXT NOT NULL CHECK (role IN ('teacher', 'student', 'admin')),
    credential  TEXT,              -- opaque; NULL or an unusable placeholder
    created_at  TEXT NOT NULL,     -- RFC 3339 UTC
    UNIQUE (email, role)
);

CREATE TABLE IF NOT EXISTS streams (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT,
    teacher_id  INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS subjects (
    id          INTEGER PRIMARY KEY,
    stream_id   INTEGER NOT NULL REFERENCES streams(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    description TEXT,
    created_at  TEXT NOT NULL,
    UNIQUE (stream_id, name)
);

CREATE TABLE IF NOT EXISTS enrollments (
    student_id  INTEGER NOT NULL REFERENCES users(id)    ON DELETE CASCADE,
    subject_id  INTEGER NOT NULL REFERENCES subjects(id) ON DELETE CASCADE,
    enrolled_at TEXT NOT NULL,
    PRIMARY KEY (student_id, subject_id)
);

-- One status per (student, subject, date); writes are upserts.
CREATE TABLE IF NOT EXISTS attendance (
    id          INTEGER PRIMARY KEY,
    student_id  INTEGER NOT NULL,
    subject_id  INTEGER NOT NULL,
    date        TEXT NOT NULL,     -- YYYY-MM-DD
    status      TEXT NOT NULL CHECK (status IN ('present', 'absent', 'late', 'excused')),
    recorded_at TEXT NOT NULL,
    UNIQUE (student_id, subject_id, date),
    FOREIGN KEY (student_id, subject_id)
        REFERENCES enrollments(student_id, subject_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS streams_teacher_idx     ON streams(teacher_id);
CREATE INDEX IF NOT EXISTS enrollments_subject_idx ON enrollments(subject_id);
CREATE INDEX IF NOT EXISTS attendance_subject_idx  ON attendance(subject_id, date);
CREATE INDEX IF NOT EXISTS attendance_date_idx     ON attendance(date);

PRAGMA user_version = 1;
";
