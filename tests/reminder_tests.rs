#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use tempfile::TempDir;
use tutor_scheduler_bot::database::connection::DatabaseManager;
use tutor_scheduler_bot::database::models::Lesson;
use tutor_scheduler_bot::services::notifier::{MemoryNotifier, Outbound};
use tutor_scheduler_bot::services::reminder::{run_sweep, sweep_tolerance_minutes};
use tutor_scheduler_bot::utils::datetime::TimeSettings;

async fn setup_test_db() -> (DatabaseManager, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db = DatabaseManager::new(&database_url).await.unwrap();
    db.run_migrations().await.unwrap();

    (db, temp_dir)
}

fn time() -> TimeSettings {
    TimeSettings::from_hours(3).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 2, 15, 10, 0, 0).unwrap()
}

#[test]
fn test_tolerance_follows_sweep_cadence() {
    assert_eq!(sweep_tolerance_minutes(1), 1);
    assert_eq!(sweep_tolerance_minutes(2), 1);
    assert_eq!(sweep_tolerance_minutes(5), 2);
    assert_eq!(sweep_tolerance_minutes(10), 5);
}

#[tokio::test]
async fn test_sweep_sends_reminder_an_hour_before_start() {
    let (db, _temp) = setup_test_db().await;
    let notifier = MemoryNotifier::new();
    let lesson = Lesson::create(&db.pool, now() + Duration::minutes(60), "Maria", Some("algebra"))
        .await
        .unwrap();

    let report = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(report.reminders_sent, 1);
    assert_eq!(report.pruned, 0);

    let stored = Lesson::find_by_id(&db.pool, lesson.id).await.unwrap().unwrap();
    assert!(stored.reminder_sent);

    let outbound = notifier.outbound();
    assert_eq!(outbound.len(), 1);
    let Outbound::Message { text, .. } = &outbound[0] else {
        panic!("expected a message, got {:?}", outbound[0]);
    };
    assert!(text.contains("lesson in one hour"));
    assert!(text.contains("Maria"));
    // 11:00 UTC renders as 14:00 at UTC+3
    assert!(text.contains("Time: 14:00"));
    assert!(text.contains("Comment: algebra"));
}

#[tokio::test]
async fn test_sweep_window_edges() {
    let (db, _temp) = setup_test_db().await;
    let notifier = MemoryNotifier::new();

    let early = Lesson::create(&db.pool, now() + Duration::minutes(59), "Early", None)
        .await
        .unwrap();
    let late = Lesson::create(&db.pool, now() + Duration::minutes(61), "Late", None)
        .await
        .unwrap();
    let outside = Lesson::create(&db.pool, now() + Duration::minutes(65), "Outside", None)
        .await
        .unwrap();

    let report = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(report.reminders_sent, 2);

    assert!(Lesson::find_by_id(&db.pool, early.id).await.unwrap().unwrap().reminder_sent);
    assert!(Lesson::find_by_id(&db.pool, late.id).await.unwrap().unwrap().reminder_sent);
    assert!(!Lesson::find_by_id(&db.pool, outside.id).await.unwrap().unwrap().reminder_sent);
}

#[tokio::test]
async fn test_sweep_never_reminds_twice() {
    let (db, _temp) = setup_test_db().await;
    let notifier = MemoryNotifier::new();
    Lesson::create(&db.pool, now() + Duration::minutes(60), "Maria", None)
        .await
        .unwrap();

    let first = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(first.reminders_sent, 1);

    let second = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(second.reminders_sent, 0);
    assert_eq!(notifier.outbound().len(), 1);
}

#[tokio::test]
async fn test_sweep_prunes_lessons_started_over_an_hour_ago() {
    let (db, _temp) = setup_test_db().await;
    let notifier = MemoryNotifier::new();

    let stale = Lesson::create(&db.pool, now() - Duration::minutes(90), "Stale", None)
        .await
        .unwrap();
    let recent = Lesson::create(&db.pool, now() - Duration::minutes(30), "Recent", None)
        .await
        .unwrap();

    let report = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(report.pruned, 1);
    assert_eq!(report.reminders_sent, 0);

    assert!(Lesson::find_by_id(&db.pool, stale.id).await.unwrap().is_none());
    assert!(Lesson::find_by_id(&db.pool, recent.id).await.unwrap().is_some());
    assert!(notifier.outbound().is_empty());
}

#[tokio::test]
async fn test_failed_delivery_blocks_neither_others_nor_retry() {
    let (db, _temp) = setup_test_db().await;
    let notifier = MemoryNotifier::new();

    let first = Lesson::create(&db.pool, now() + Duration::minutes(59), "First", None)
        .await
        .unwrap();
    let second = Lesson::create(&db.pool, now() + Duration::minutes(61), "Second", None)
        .await
        .unwrap();

    notifier.fail_next(1);
    let report = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(report.reminders_sent, 1);

    // The failed one stays unmarked, so the next sweep retries it
    assert!(!Lesson::find_by_id(&db.pool, first.id).await.unwrap().unwrap().reminder_sent);
    assert!(Lesson::find_by_id(&db.pool, second.id).await.unwrap().unwrap().reminder_sent);

    let retry = run_sweep(&db.pool, &notifier, &time(), now(), 1).await.unwrap();
    assert_eq!(retry.reminders_sent, 1);
    assert!(Lesson::find_by_id(&db.pool, first.id).await.unwrap().unwrap().reminder_sent);
}
