//! The Aggregator: counts and percentages computed from ledger rows.
//!
//! Everything here is a pure function of the rows passed in. Stats are never
//! cached; callers recompute from current ledger state on every request so
//! that last-write-wins upserts are always reflected.

use std::collections::BTreeMap;

use chrono::Datelike as _;
use serde::{Deserialize, Serialize};

use crate::{
  attendance::{AttendanceEntry, AttendanceRecord, Status},
  stream::SubjectId,
};

/// Totals for a set of ledger rows.
///
/// `total` counts rows actually present in the ledger. A class day with no
/// mark is not part of the denominator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
  pub total:      u64,
  pub present:    u64,
  pub absent:     u64,
  pub late:       u64,
  pub excused:    u64,
  /// Credited marks (see [`Status::is_credited`]) as a rounded percentage of
  /// `total`, or `0` for an empty set.
  pub percentage: u32,
}

impl AttendanceStats {
  fn tally(&mut self, status: Status) {
    self.total += 1;
    match status {
      Status::Present => self.present += 1,
      Status::Absent => self.absent += 1,
      Status::Late => self.late += 1,
      Status::Excused => self.excused += 1,
    }
  }

  fn count(&self, status: Status) -> u64 {
    match status {
      Status::Present => self.present,
      Status::Absent => self.absent,
      Status::Late => self.late,
      Status::Excused => self.excused,
    }
  }

  fn finish(mut self) -> Self {
    let credited = Status::ALL
      .into_iter()
      .filter(|s| s.is_credited())
      .map(|s| self.count(s))
      .sum();
    self.percentage = percentage(credited, self.total);
    self
  }
}

fn percentage(credited: u64, total: u64) -> u32 {
  if total == 0 {
    return 0;
  }
  (credited as f64 / total as f64 * 100.0).round() as u32
}

/// Compute totals over any iterator of statuses.
pub fn compute_from_statuses<I>(statuses: I) -> AttendanceStats
where
  I: IntoIterator<Item = Status>,
{
  statuses
    .into_iter()
    .fold(AttendanceStats::default(), |mut acc, s| {
      acc.tally(s);
      acc
    })
    .finish()
}

/// `computeStats(records)`.
pub fn compute_stats<'a, I>(records: I) -> AttendanceStats
where
  I: IntoIterator<Item = &'a AttendanceRecord>,
{
  compute_from_statuses(records.into_iter().map(|r| r.status))
}

/// Stats for report entries, which carry the record plus display names.
pub fn compute_entry_stats(entries: &[AttendanceEntry]) -> AttendanceStats {
  compute_from_statuses(entries.iter().map(|e| e.record.status))
}

// ─── Grouping ────────────────────────────────────────────────────────────────

/// How a summary should reshape its record set.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Deserialize, strum::EnumString, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GroupBy {
  Subject,
  Month,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
  pub subject_id:   SubjectId,
  pub subject_name: String,
  #[serde(flatten)]
  pub stats:        AttendanceStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthStats {
  pub year:  i32,
  pub month: u32,
  #[serde(flatten)]
  pub stats: AttendanceStats,
}

/// A grouped view of the same record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "groupBy", content = "groups", rename_all = "lowercase")]
pub enum Grouped {
  Subject(Vec<SubjectStats>),
  Month(Vec<MonthStats>),
}

/// Per-subject stats, ordered by subject name.
pub fn group_by_subject(entries: &[AttendanceEntry]) -> Vec<SubjectStats> {
  let mut groups: BTreeMap<(&str, SubjectId), AttendanceStats> = BTreeMap::new();
  for e in entries {
    groups
      .entry((e.subject_name.as_str(), e.record.subject_id))
      .or_default()
      .tally(e.record.status);
  }
  groups
    .into_iter()
    .map(|((name, subject_id), stats)| SubjectStats {
      subject_id,
      subject_name: name.to_owned(),
      stats: stats.finish(),
    })
    .collect()
}

/// Per-calendar-month stats, newest month first to match ledger ordering.
pub fn group_by_month(entries: &[AttendanceEntry]) -> Vec<MonthStats> {
  let mut groups: BTreeMap<(i32, u32), AttendanceStats> = BTreeMap::new();
  for e in entries {
    let d = e.record.date;
    groups.entry((d.year(), d.month())).or_default().tally(e.record.status);
  }
  groups
    .into_iter()
    .rev()
    .map(|((year, month), stats)| MonthStats {
      year,
      month,
      stats: stats.finish(),
    })
    .collect()
}

pub fn group(entries: &[AttendanceEntry], by: GroupBy) -> Grouped {
  match by {
    GroupBy::Subject => Grouped::Subject(group_by_subject(entries)),
    GroupBy::Month => Grouped::Month(group_by_month(entries)),
  }
}
