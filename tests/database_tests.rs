#![allow(clippy::unwrap_used)]

use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;
use tutor_scheduler_bot::database::connection::DatabaseManager;
use tutor_scheduler_bot::database::models::{Lesson, LessonStatus, Request, RequestStatus};

async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db = DatabaseManager::new(&database_url).await.unwrap();
    db.run_migrations().await.unwrap();

    (db, temp_dir)
}

#[tokio::test]
async fn test_lesson_create_and_find() {
    let (db, _temp) = setup_test_db().await;
    let start = Utc.with_ymd_and_hms(2030, 2, 15, 11, 0, 0).unwrap();

    let lesson = Lesson::create(&db.pool, start, "Maria", Some("algebra"))
        .await
        .unwrap();
    assert_eq!(lesson.status, LessonStatus::Planned);
    assert!(!lesson.reminder_sent);

    let found = Lesson::find_by_id(&db.pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(found.id, lesson.id);
    assert_eq!(found.start_time, start);
    assert_eq!(found.student_name, "Maria");
    assert_eq!(found.comment.as_deref(), Some("algebra"));
    assert_eq!(found.status, LessonStatus::Planned);
    assert!(!found.reminder_sent);
}

#[tokio::test]
async fn test_lesson_delete_returns_removed_row() {
    let (db, _temp) = setup_test_db().await;
    let start = Utc.with_ymd_and_hms(2030, 3, 1, 9, 0, 0).unwrap();
    let lesson = Lesson::create(&db.pool, start, "Petya", None).await.unwrap();

    let removed = Lesson::delete(&db.pool, lesson.id).await.unwrap().unwrap();
    assert_eq!(removed.student_name, "Petya");

    assert!(Lesson::find_by_id(&db.pool, lesson.id).await.unwrap().is_none());
    assert!(Lesson::delete(&db.pool, lesson.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_lesson_in_range_is_half_open_and_sorted() {
    let (db, _temp) = setup_test_db().await;
    let day_start = Utc.with_ymd_and_hms(2030, 5, 10, 0, 0, 0).unwrap();
    let day_end = day_start + Duration::days(1);

    // Inserted out of order on purpose
    Lesson::create(&db.pool, day_start + Duration::hours(15), "Late", None)
        .await
        .unwrap();
    Lesson::create(&db.pool, day_start, "Midnight", None).await.unwrap();
    Lesson::create(&db.pool, day_start + Duration::hours(9), "Morning", None)
        .await
        .unwrap();
    // Exactly at the end bound, must be excluded
    Lesson::create(&db.pool, day_end, "Tomorrow", None).await.unwrap();

    let lessons = Lesson::in_range(&db.pool, day_start, day_end).await.unwrap();
    let names: Vec<&str> = lessons.iter().map(|l| l.student_name.as_str()).collect();
    assert_eq!(names, vec!["Midnight", "Morning", "Late"]);
}

#[tokio::test]
async fn test_due_for_reminder_window_is_inclusive() {
    let (db, _temp) = setup_test_db().await;
    let from = Utc.with_ymd_and_hms(2030, 6, 1, 10, 59, 0).unwrap();
    let to = Utc.with_ymd_and_hms(2030, 6, 1, 11, 1, 0).unwrap();

    let at_from = Lesson::create(&db.pool, from, "AtFrom", None).await.unwrap();
    let at_to = Lesson::create(&db.pool, to, "AtTo", None).await.unwrap();
    Lesson::create(&db.pool, to + Duration::minutes(1), "Past", None)
        .await
        .unwrap();
    Lesson::create(&db.pool, from - Duration::minutes(1), "Early", None)
        .await
        .unwrap();

    let due = Lesson::due_for_reminder(&db.pool, from, to).await.unwrap();
    let ids: Vec<i64> = due.iter().map(|l| l.id).collect();
    assert_eq!(ids, vec![at_from.id, at_to.id]);
}

#[tokio::test]
async fn test_due_for_reminder_skips_already_reminded() {
    let (db, _temp) = setup_test_db().await;
    let start = Utc.with_ymd_and_hms(2030, 6, 1, 11, 0, 0).unwrap();
    let lesson = Lesson::create(&db.pool, start, "Maria", None).await.unwrap();

    Lesson::mark_reminder_sent(&db.pool, lesson.id).await.unwrap();

    let window_start = start - Duration::minutes(1);
    let window_end = start + Duration::minutes(1);
    let due = Lesson::due_for_reminder(&db.pool, window_start, window_end)
        .await
        .unwrap();
    assert!(due.is_empty());

    let stored = Lesson::find_by_id(&db.pool, lesson.id).await.unwrap().unwrap();
    assert!(stored.reminder_sent);
}

#[tokio::test]
async fn test_delete_started_before_counts_rows() {
    let (db, _temp) = setup_test_db().await;
    let cutoff = Utc.with_ymd_and_hms(2030, 7, 1, 12, 0, 0).unwrap();

    Lesson::create(&db.pool, cutoff - Duration::hours(2), "Old", None)
        .await
        .unwrap();
    Lesson::create(&db.pool, cutoff - Duration::hours(1), "Older", None)
        .await
        .unwrap();
    let kept = Lesson::create(&db.pool, cutoff, "AtCutoff", None).await.unwrap();
    Lesson::create(&db.pool, cutoff + Duration::hours(1), "Future", None)
        .await
        .unwrap();

    let removed = Lesson::delete_started_before(&db.pool, cutoff).await.unwrap();
    assert_eq!(removed, 2);
    assert!(Lesson::find_by_id(&db.pool, kept.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_request_create_and_find() {
    let (db, _temp) = setup_test_db().await;
    let desired = Utc.with_ymd_and_hms(2030, 9, 1, 14, 0, 0).unwrap();

    let request = Request::create(&db.pool, "Anna", "+7 900 000-00-00", desired, Some("exam prep"))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);

    let found = Request::find_by_id(&db.pool, request.id).await.unwrap().unwrap();
    assert_eq!(found.name, "Anna");
    assert_eq!(found.contact, "+7 900 000-00-00");
    assert_eq!(found.desired_time, desired);
    assert_eq!(found.comment.as_deref(), Some("exam prep"));
    assert_eq!(found.status, RequestStatus::Pending);
}

#[tokio::test]
async fn test_request_transition_applies_only_once() {
    let (db, _temp) = setup_test_db().await;
    let desired = Utc.with_ymd_and_hms(2030, 9, 1, 14, 0, 0).unwrap();
    let request = Request::create(&db.pool, "Anna", "+7 900", desired, None)
        .await
        .unwrap();

    let first = Request::try_transition(&db.pool, request.id, RequestStatus::Accepted)
        .await
        .unwrap();
    assert!(first);

    // A repeated or conflicting decision finds no pending row to update
    let second = Request::try_transition(&db.pool, request.id, RequestStatus::Rejected)
        .await
        .unwrap();
    assert!(!second);

    let stored = Request::find_by_id(&db.pool, request.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RequestStatus::Accepted);
}

#[tokio::test]
async fn test_request_transition_on_missing_id() {
    let (db, _temp) = setup_test_db().await;
    let moved = Request::try_transition(&db.pool, 999, RequestStatus::Accepted)
        .await
        .unwrap();
    assert!(!moved);
}
