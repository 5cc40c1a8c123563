//! End-to-end behaviour of [`Rollbook`] running over an in-memory
//! `SqliteStore`.

use std::sync::Arc;

use chrono::NaiveDate;
use rollbook_core::{
  Error, Rollbook,
  access::{AccessEvaluator, Operation, Resource},
  attendance::{Period, Status},
  cleanup::{CleanupKind, CleanupRequest},
  enrollment::Roster,
  error::ResourceKind,
  identity::IdentityResolver,
  ledger::{BatchMark, Ledger},
  page::Page,
  service::AttendanceFilter,
  stats::{GroupBy, Grouped, compute_stats},
  store::RollStore,
  stream::{Patch, Stream, Subject},
  user::{NewUser, Principal, Role, User},
};

use crate::SqliteStore;

async fn book() -> Rollbook<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  Rollbook::new(Arc::new(store))
}

fn day(raw: &str) -> NaiveDate { NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap() }

async fn account(book: &Rollbook<SqliteStore>, name: &str, role: Role) -> (User, Principal) {
  let email = format!("{}@school.test", name.to_lowercase());
  let user = book
    .store()
    .create_user(NewUser::new(name, email, role))
    .await
    .unwrap();
  let principal = Principal::new(user.id, user.email.clone(), role);
  (user, principal)
}

/// A teacher with one stream holding one subject.
async fn classroom(book: &Rollbook<SqliteStore>, teacher: &Principal) -> (Stream, Subject) {
  let stream = book.create_stream(teacher, "Form 3", None).await.unwrap();
  let subject = book
    .create_subject(teacher, stream.id, "Math", None)
    .await
    .unwrap();
  (stream, subject)
}

// ─── Documented scenarios ────────────────────────────────────────────────────

#[tokio::test]
async fn remarking_a_day_keeps_one_row_with_latest_status() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (_, math) = classroom(&b, &teacher).await;
  b.enroll(&teacher, pupil.id, math.id).await.unwrap();

  let date = day("2024-03-01");
  b.mark_attendance(&teacher, pupil.id, math.id, Status::Present, date)
    .await
    .unwrap();
  b.mark_attendance(&teacher, pupil.id, math.id, Status::Late, date)
    .await
    .unwrap();

  let stats = b
    .student_subject_stats(&teacher, pupil.id, math.id)
    .await
    .unwrap();
  assert_eq!(stats.total, 1);
  assert_eq!(stats.present, 0);
  assert_eq!(stats.late, 1);
  assert_eq!(stats.absent, 0);
  assert_eq!(stats.excused, 0);
  assert_eq!(stats.percentage, 100);
}

#[tokio::test]
async fn enrolling_in_empty_stream_is_rejected() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let empty = b.create_stream(&teacher, "Empty", None).await.unwrap();

  let err = b.enroll_in_stream(&teacher, pupil.id, empty.id).await.unwrap_err();
  assert!(matches!(err, Error::NoSubjectsInStream(id) if id == empty.id));
}

#[tokio::test]
async fn marking_in_another_teachers_stream_is_denied() {
  let b = book().await;
  let (_, alice) = account(&b, "Alice", Role::Teacher).await;
  let (_, bob) = account(&b, "Bob", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  classroom(&b, &alice).await;
  let (_, bobs_subject) = classroom(&b, &bob).await;
  b.enroll(&bob, pupil.id, bobs_subject.id).await.unwrap();

  let err = b
    .mark_attendance(&alice, pupil.id, bobs_subject.id, Status::Present, day("2024-03-01"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AccessDenied));
}

#[tokio::test]
async fn attendance_cleanup_only_touches_old_rows_in_its_stream() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (target, math) = classroom(&b, &teacher).await;
  let other = b.create_stream(&teacher, "Form 4", None).await.unwrap();
  let art = b.create_subject(&teacher, other.id, "Art", None).await.unwrap();

  for subject in [&math, &art] {
    b.enroll(&teacher, pupil.id, subject.id).await.unwrap();
    for date in ["2023-12-31", "2024-01-01", "2024-02-01"] {
      b.mark_attendance(&teacher, pupil.id, subject.id, Status::Present, day(date))
        .await
        .unwrap();
    }
  }

  let outcome = b
    .cleanup(&teacher, &CleanupRequest {
      kind:        Some("attendance".into()),
      before_date: Some("2024-01-01".into()),
      stream_id:   Some(target.id),
      subject_id:  None,
    })
    .await
    .unwrap();
  assert_eq!(outcome.kind, CleanupKind::Attendance);
  assert_eq!(outcome.deleted_count, 1);

  let remaining = b
    .attendance_report(&teacher, AttendanceFilter::default(), Page::default())
    .await
    .unwrap();
  assert_eq!(remaining.records.total, 5);
  assert!(
    remaining
      .records
      .items
      .iter()
      .all(|e| e.stream_id != target.id || e.record.date >= day("2024-01-01"))
  );
}

// ─── Identity ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unknown_teacher_is_provisioned_once_on_create_stream() {
  let b = book().await;
  let stranger = Principal::new("sso|abc", "new.teacher@school.test", Role::Teacher);

  let first = b.create_stream(&stranger, "First", None).await.unwrap();
  let second = b.create_stream(&stranger, "Second", None).await.unwrap();
  assert_eq!(first.teacher_id, second.teacher_id);

  let user = b
    .store()
    .find_user_by_email("new.teacher@school.test".into(), Role::Teacher)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(user.id, first.teacher_id);
  assert_eq!(b.list_streams(&stranger).await.unwrap().len(), 2);
}

#[tokio::test]
async fn reads_never_provision() {
  let b = book().await;
  let stranger = Principal::new("sso|abc", "ghost@school.test", Role::Teacher);

  let err = b.list_streams(&stranger).await.unwrap_err();
  assert!(matches!(err, Error::ActorNotFound));
  let found = b
    .store()
    .find_user_by_email("ghost@school.test".into(), Role::Teacher)
    .await
    .unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn only_teachers_create_streams() {
  let b = book().await;
  let (_, pupil) = account(&b, "Pupil", Role::Student).await;
  let (_, admin) = account(&b, "Root", Role::Admin).await;
  for principal in [&pupil, &admin] {
    let err = b.create_stream(principal, "Nope", None).await.unwrap_err();
    assert!(matches!(err, Error::AccessDenied));
  }
}

#[tokio::test]
async fn unknown_student_creating_a_stream_is_not_found_rather_than_denied() {
  let b = book().await;
  let stranger = Principal::new("sso|kid", "kid@school.test", Role::Student);

  let err = b.create_stream(&stranger, "Nope", None).await.unwrap_err();
  assert!(matches!(err, Error::ActorNotFound));
  let found = b
    .store()
    .find_user_by_email("kid@school.test".into(), Role::Student)
    .await
    .unwrap();
  assert!(found.is_none());
}

#[tokio::test]
async fn foreign_id_falls_back_to_email() {
  let b = book().await;
  let (teacher, direct) = account(&b, "Teach", Role::Teacher).await;
  let (stream, _) = classroom(&b, &direct).await;

  let via_email = Principal::new("idp-7f3e", teacher.email.clone(), Role::Teacher);
  let fetched = b.get_stream(&via_email, stream.id).await.unwrap();
  assert_eq!(fetched.id, stream.id);

  // A numeric id that belongs to someone else is not trusted either.
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let mismatched = Principal::new(pupil.id, teacher.email.clone(), Role::Teacher);
  assert_eq!(b.actor(&mismatched).await.unwrap().id, teacher.id);
}

// ─── Access ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_resource_is_reported_before_denial() {
  let b = book().await;
  let (_, alice) = account(&b, "Alice", Role::Teacher).await;
  let (_, bob) = account(&b, "Bob", Role::Teacher).await;
  let (_, pupil) = account(&b, "Pupil", Role::Student).await;
  let (stream, _) = classroom(&b, &alice).await;

  let err = b.get_stream(&pupil, 9_999).await.unwrap_err();
  assert!(matches!(
    err,
    Error::ResourceNotFound {
      kind: ResourceKind::Stream,
      id:   9_999,
    }
  ));

  let err = b.delete_stream(&bob, stream.id).await.unwrap_err();
  assert!(matches!(err, Error::AccessDenied));
}

#[tokio::test]
async fn enrolled_student_reads_but_cannot_write() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, as_pupil) = account(&b, "Pupil", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;

  let err = b.list_subjects(&as_pupil, stream.id).await.unwrap_err();
  assert!(matches!(err, Error::AccessDenied));

  b.enroll(&teacher, pupil.id, math.id).await.unwrap();
  assert_eq!(b.list_subjects(&as_pupil, stream.id).await.unwrap().len(), 1);
  assert!(b.is_enrolled(&as_pupil, pupil.id, stream.id).await.unwrap());

  let err = b
    .mark_attendance(&as_pupil, pupil.id, math.id, Status::Present, day("2024-03-01"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::AccessDenied));
}

#[tokio::test]
async fn student_reads_are_pinned_to_themselves() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (me, as_me) = account(&b, "Me", Role::Student).await;
  let (peer, _) = account(&b, "Peer", Role::Student).await;
  let (_, math) = classroom(&b, &teacher).await;

  for (student, status) in [(&me, Status::Present), (&peer, Status::Absent)] {
    b.enroll(&teacher, student.id, math.id).await.unwrap();
    b.mark_attendance(&teacher, student.id, math.id, status, day("2024-03-01"))
      .await
      .unwrap();
  }

  let filter = AttendanceFilter {
    student_id: Some(peer.id),
    ..Default::default()
  };
  let report = b
    .attendance_report(&as_me, filter, Page::default())
    .await
    .unwrap();
  assert_eq!(report.records.total, 1);
  assert_eq!(report.records.items[0].record.student_id, me.id);
  assert_eq!(report.stats.present, 1);
}

// ─── Enrollment ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn explicit_duplicate_enroll_conflicts_but_stream_enroll_does_not() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;
  b.create_subject(&teacher, stream.id, "Art", None).await.unwrap();

  b.enroll(&teacher, pupil.id, math.id).await.unwrap();
  let err = b.enroll(&teacher, pupil.id, math.id).await.unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));

  // Only Art is new.
  assert_eq!(b.enroll_in_stream(&teacher, pupil.id, stream.id).await.unwrap(), 1);
  assert_eq!(b.enroll_in_stream(&teacher, pupil.id, stream.id).await.unwrap(), 0);

  let roster = b.list_students(&teacher, Roster::Stream(stream.id)).await.unwrap();
  assert_eq!(roster.len(), 1);

  assert!(b.unenroll_from_stream(&teacher, pupil.id, stream.id).await.unwrap());
  assert!(!b.is_enrolled(&teacher, pupil.id, stream.id).await.unwrap());
}

#[tokio::test]
async fn unenrolling_from_an_empty_stream_reports_false() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let empty = b.create_stream(&teacher, "Empty", None).await.unwrap();

  assert!(!b.unenroll_from_stream(&teacher, pupil.id, empty.id).await.unwrap());
}

#[tokio::test]
async fn unenrolling_one_subject_drops_its_marks() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;

  b.enroll(&teacher, pupil.id, math.id).await.unwrap();
  b.mark_attendance(&teacher, pupil.id, math.id, Status::Present, day("2024-03-01"))
    .await
    .unwrap();

  assert_eq!(b.unenroll(&teacher, pupil.id, math.id).await.unwrap(), 1);
  assert_eq!(b.unenroll(&teacher, pupil.id, math.id).await.unwrap(), 0);

  let report = b
    .attendance_report(&teacher, AttendanceFilter::default(), Page::default())
    .await
    .unwrap();
  assert_eq!(report.records.total, 0);
  assert_eq!(report.stats.total, 0);
  assert!(!b.is_enrolled(&teacher, pupil.id, stream.id).await.unwrap());
}

#[tokio::test]
async fn only_students_can_be_enrolled() {
  let b = book().await;
  let (other, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (_, math) = classroom(&b, &teacher).await;

  let err = b.enroll(&teacher, other.id, math.id).await.unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
  let err = b.enroll(&teacher, 12_345, math.id).await.unwrap_err();
  assert!(matches!(
    err,
    Error::ResourceNotFound {
      kind: ResourceKind::User,
      ..
    }
  ));
}

#[tokio::test]
async fn marking_an_unenrolled_pair_is_rejected() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (_, math) = classroom(&b, &teacher).await;

  let err = b
    .mark_attendance(&teacher, pupil.id, math.id, Status::Present, day("2024-03-01"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));
}

// ─── Batch and reporting ─────────────────────────────────────────────────────

#[tokio::test]
async fn batch_stops_at_first_failure_and_keeps_earlier_marks() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (first, _) = account(&b, "First", Role::Student).await;
  let (stray, _) = account(&b, "Stray", Role::Student).await;
  let (last, _) = account(&b, "Last", Role::Student).await;
  let (_, math) = classroom(&b, &teacher).await;
  b.enroll(&teacher, first.id, math.id).await.unwrap();
  b.enroll(&teacher, last.id, math.id).await.unwrap();

  let marks = [first.id, stray.id, last.id].map(|student_id| BatchMark {
    student_id,
    subject_id: math.id,
    status: Status::Present,
  });
  let err = b
    .mark_batch(&teacher, day("2024-03-04"), &marks)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Validation(_)));

  let report = b
    .attendance_report(&teacher, AttendanceFilter::default(), Page::default())
    .await
    .unwrap();
  assert_eq!(report.records.total, 1);
  assert_eq!(report.records.items[0].record.student_id, first.id);
}

#[tokio::test]
async fn report_pages_rows_but_stats_cover_everything() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (_, math) = classroom(&b, &teacher).await;
  b.enroll(&teacher, pupil.id, math.id).await.unwrap();

  let statuses = [Status::Present, Status::Absent, Status::Late, Status::Excused, Status::Present];
  for (i, status) in statuses.into_iter().enumerate() {
    let date = day("2024-04-01") + chrono::Days::new(i as u64);
    b.mark_attendance(&teacher, pupil.id, math.id, status, date)
      .await
      .unwrap();
  }

  let report = b
    .attendance_report(&teacher, AttendanceFilter::default(), Page::new(Some(3), Some(2)))
    .await
    .unwrap();
  assert_eq!(report.records.items.len(), 1);
  assert_eq!(report.records.items[0].record.date, day("2024-04-01"));
  assert_eq!(report.records.total, 5);
  assert_eq!(report.records.total_pages, 3);
  assert_eq!(report.stats.total, 5);
  // present + late = 3 of 5.
  assert_eq!(report.stats.percentage, 60);
}

#[tokio::test]
async fn summary_groups_by_subject_and_month() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;
  let art = b.create_subject(&teacher, stream.id, "Art", None).await.unwrap();
  b.enroll_in_stream(&teacher, pupil.id, stream.id).await.unwrap();

  for (subject, date) in [(&math, "2024-01-15"), (&art, "2024-02-15"), (&math, "2024-02-16")] {
    b.mark_attendance(&teacher, pupil.id, subject.id, Status::Present, day(date))
      .await
      .unwrap();
  }

  let filter = AttendanceFilter {
    stream_id: Some(stream.id),
    ..Default::default()
  };
  let by_subject = b
    .attendance_summary(&teacher, filter.clone(), GroupBy::Subject)
    .await
    .unwrap();
  assert_eq!(by_subject.stats.total, 3);
  let Grouped::Subject(groups) = by_subject.grouped else {
    panic!("expected subject grouping");
  };
  let names: Vec<_> = groups.iter().map(|g| (g.subject_name.as_str(), g.stats.total)).collect();
  assert_eq!(names, vec![("Art", 1), ("Math", 2)]);

  let feb = AttendanceFilter {
    period: Period::Month { year: 2024, month: 2 },
    ..filter
  };
  let by_month = b
    .attendance_summary(&teacher, feb, GroupBy::Month)
    .await
    .unwrap();
  let Grouped::Month(months) = by_month.grouped else {
    panic!("expected month grouping");
  };
  assert_eq!(months.len(), 1);
  assert_eq!((months[0].year, months[0].month, months[0].stats.total), (2024, 2, 2));
}

// ─── Streams, subjects, cleanup ──────────────────────────────────────────────

#[tokio::test]
async fn subject_names_conflict_within_a_stream() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (stream, math) = classroom(&b, &teacher).await;
  let art = b.create_subject(&teacher, stream.id, "Art", None).await.unwrap();

  let err = b
    .create_subject(&teacher, stream.id, "Math", None)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));

  let err = b
    .update_subject(&teacher, art.id, Patch {
      name:        Some("Math".into()),
      description: None,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Conflict(_)));

  // Renaming a subject to its own name is fine.
  let same = b
    .update_subject(&teacher, math.id, Patch {
      name:        Some("Math".into()),
      description: Some(Some("algebra".into())),
    })
    .await
    .unwrap();
  assert_eq!(same.description.as_deref(), Some("algebra"));
}

#[tokio::test]
async fn deleting_a_stream_removes_everything_under_it() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;
  b.enroll(&teacher, pupil.id, math.id).await.unwrap();
  b.mark_attendance(&teacher, pupil.id, math.id, Status::Present, day("2024-03-01"))
    .await
    .unwrap();

  b.delete_stream(&teacher, stream.id).await.unwrap();

  let err = b.get_stream(&teacher, stream.id).await.unwrap_err();
  assert!(matches!(err, Error::ResourceNotFound { .. }));
  let report = b
    .attendance_report(&teacher, AttendanceFilter::default(), Page::default())
    .await
    .unwrap();
  assert_eq!(report.records.total, 0);
}

#[tokio::test]
async fn subject_and_inactive_student_cleanup() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (active, _) = account(&b, "Active", Role::Student).await;
  let (dormant, _) = account(&b, "Dormant", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;
  let art = b.create_subject(&teacher, stream.id, "Art", None).await.unwrap();

  b.enroll(&teacher, active.id, math.id).await.unwrap();
  b.enroll(&teacher, dormant.id, art.id).await.unwrap();
  b.mark_attendance(&teacher, active.id, math.id, Status::Present, day("2024-05-01"))
    .await
    .unwrap();
  b.mark_attendance(&teacher, dormant.id, art.id, Status::Absent, day("2023-05-01"))
    .await
    .unwrap();

  let students = b
    .cleanup(&teacher, &CleanupRequest {
      kind:        Some("inactive_students".into()),
      before_date: Some("2024-01-01".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(students.deleted_count, 1);
  assert!(b.store().get_user(dormant.id).await.unwrap().is_none());

  let subjects = b
    .cleanup(&teacher, &CleanupRequest {
      kind:        Some("subjects".into()),
      before_date: Some("2024-01-01".into()),
      stream_id:   Some(stream.id),
      subject_id:  None,
    })
    .await
    .unwrap();
  assert_eq!(subjects.kind, CleanupKind::Subjects);
  assert_eq!(subjects.deleted_count, 1);

  let left = b.list_subjects(&teacher, stream.id).await.unwrap();
  assert_eq!(left.iter().map(|s| s.id).collect::<Vec<_>>(), vec![math.id]);
}

#[tokio::test]
async fn cleanup_validates_before_touching_anything() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;

  let bad_type = CleanupRequest {
    kind: Some("everything".into()),
    before_date: Some("2024-01-01".into()),
    ..Default::default()
  };
  assert!(matches!(b.cleanup(&teacher, &bad_type).await, Err(Error::Validation(_))));

  let no_stream = CleanupRequest {
    kind: Some("attendance".into()),
    before_date: Some("2024-01-01".into()),
    ..Default::default()
  };
  assert!(matches!(b.cleanup(&teacher, &no_stream).await, Err(Error::Validation(_))));
}

// ─── Components ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn ownership_decides_access_however_the_teacher_resolved() {
  let b = book().await;
  let (owner, by_id) = account(&b, "Owner", Role::Teacher).await;
  let (_, stranger) = account(&b, "Stranger", Role::Teacher).await;
  let (stream, math) = classroom(&b, &by_id).await;
  let by_email = Principal::new("opaque", owner.email.clone(), Role::Teacher);

  let resolver = IdentityResolver::new(b.store());
  let access = AccessEvaluator::new(b.store());
  for principal in [&by_id, &by_email] {
    let actor = resolver.resolve(principal).await.unwrap();
    assert_eq!(actor.id, owner.id);
    for resource in [Resource::Stream(stream.id), Resource::Subject(math.id)] {
      for op in [Operation::Read, Operation::Write] {
        assert!(access.can_access(&actor, resource, op).await.unwrap());
      }
    }
  }

  let other = resolver.resolve(&stranger).await.unwrap();
  assert!(
    !access
      .can_access(&other, Resource::Stream(stream.id), Operation::Read)
      .await
      .unwrap()
  );
}

#[tokio::test]
async fn ledger_lookups_join_names_and_feed_stats() {
  let b = book().await;
  let (_, teacher) = account(&b, "Teach", Role::Teacher).await;
  let (pupil, _) = account(&b, "Pupil", Role::Student).await;
  let (stream, math) = classroom(&b, &teacher).await;
  let art = b.create_subject(&teacher, stream.id, "Art", None).await.unwrap();
  b.enroll_in_stream(&teacher, pupil.id, stream.id).await.unwrap();

  let marks = [
    (&math, "2024-03-01", Status::Present),
    (&math, "2024-03-02", Status::Excused),
    (&art, "2024-03-01", Status::Absent),
  ];
  for (subject, date, status) in marks {
    b.mark_attendance(&teacher, pupil.id, subject.id, status, day(date))
      .await
      .unwrap();
  }

  let ledger = Ledger::new(b.store());

  let math_rows = ledger
    .get_by_student_and_subject(pupil.id, math.id)
    .await
    .unwrap();
  assert_eq!(math_rows.len(), 2);
  assert_eq!(math_rows[0].record.date, day("2024-03-02"));
  let stats = compute_stats(math_rows.iter().map(|e| &e.record));
  assert_eq!((stats.total, stats.excused, stats.percentage), (2, 1, 50));

  let on_day = ledger
    .get_by_subject_and_date(art.id, day("2024-03-01"))
    .await
    .unwrap();
  assert_eq!(on_day.len(), 1);
  assert_eq!(on_day[0].student_name, "Pupil");
  assert_eq!(on_day[0].record.status, Status::Absent);

  let everything = ledger.get_by_student_id(pupil.id).await.unwrap();
  assert_eq!(everything.len(), 3);
  assert!(everything.iter().any(|e| e.subject_name == "Art"));
}
