use crate::database::connection::DatabaseManager;
use crate::database::models::Lesson;
use crate::error::SchedulerError;
use crate::services::notifier::{Notify, TelegramNotifier};
use crate::utils::datetime::TimeSettings;
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

/// Reminders go out this long before a lesson starts.
const REMINDER_LEAD_MINUTES: i64 = 60;

/// How far in the past a lesson may start before the sweep prunes it.
const PRUNE_AFTER_MINUTES: i64 = 60;

/// What one sweep did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepReport {
    /// Reminders delivered and recorded.
    pub reminders_sent: u64,
    /// Stale lessons removed.
    pub pruned: u64,
}

/// Window half-width for the reminder query, derived from the sweep cadence
/// so no lesson falls between two consecutive runs.
pub fn sweep_tolerance_minutes(interval_minutes: u32) -> i64 {
    (i64::from(interval_minutes) / 2).max(1)
}

fn reminder_text(time: &TimeSettings, lesson: &Lesson) -> String {
    let mut text = format!(
        "Reminder: lesson in one hour\nDate: {}\nTime: {}\nStudent: {}",
        time.format_date(lesson.start_time),
        time.format_time(lesson.start_time),
        lesson.student_name,
    );
    if let Some(comment) = &lesson.comment {
        text.push_str(&format!("\nComment: {comment}"));
    }
    text
}

/// One reminder sweep.
///
/// Sends a one-time reminder for every planned, not-yet-reminded lesson
/// starting about an hour from `now`, then prunes lessons that started more
/// than an hour ago. Delivery is best-effort per lesson: one failed send is
/// logged and the rest still go out, and `reminder_sent` is only set after
/// a successful delivery, so the next sweep retries. Overlapping runs are
/// tolerated; redelivery is acceptable, a lost reminder is not.
pub async fn run_sweep<N: Notify>(
    pool: &SqlitePool,
    notifier: &N,
    time: &TimeSettings,
    now: DateTime<Utc>,
    tolerance_minutes: i64,
) -> Result<SweepReport, SchedulerError> {
    let lead = Duration::minutes(REMINDER_LEAD_MINUTES);
    let tolerance = Duration::minutes(tolerance_minutes);
    let due = Lesson::due_for_reminder(pool, now + lead - tolerance, now + lead + tolerance).await?;

    let mut reminders_sent = 0u64;
    for lesson in &due {
        match notifier.send_message(&reminder_text(time, lesson)).await {
            Ok(_) => {
                if let Err(err) = Lesson::mark_reminder_sent(pool, lesson.id).await {
                    error!("Failed to mark reminder sent for lesson #{}: {}", lesson.id, err);
                } else {
                    reminders_sent += 1;
                }
            }
            Err(err) => {
                error!("Failed to send reminder for lesson #{}: {}", lesson.id, err);
            }
        }
    }

    let cutoff = now - Duration::minutes(PRUNE_AFTER_MINUTES);
    let pruned = Lesson::delete_started_before(pool, cutoff).await?;

    if reminders_sent > 0 || pruned > 0 {
        info!(
            "Reminder sweep: {} reminders sent, {} stale lessons pruned",
            reminders_sent, pruned
        );
    }

    Ok(SweepReport {
        reminders_sent,
        pruned,
    })
}

/// In-process sweep schedule. The `/reminder` endpoint triggers the same
/// sweep for deployments that prefer an external cron.
pub struct ReminderService {
    notifier: TelegramNotifier,
    db: Arc<DatabaseManager>,
    time: TimeSettings,
    interval_minutes: u32,
    scheduler: JobScheduler,
}

impl ReminderService {
    /// Creates the service without starting it.
    pub async fn new(
        notifier: TelegramNotifier,
        db: Arc<DatabaseManager>,
        time: TimeSettings,
        interval_minutes: u32,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            notifier,
            db,
            time,
            interval_minutes,
            scheduler,
        })
    }

    /// Starts sweeping every `interval_minutes`.
    pub async fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let notifier = self.notifier.clone();
        let db = self.db.clone();
        let time = self.time;
        let tolerance = sweep_tolerance_minutes(self.interval_minutes);

        let schedule = format!("0 */{} * * * *", self.interval_minutes);
        let sweep_job = Job::new_async(schedule.as_str(), move |_uuid, _l| {
            let notifier = notifier.clone();
            let db = db.clone();
            Box::pin(async move {
                if let Err(err) =
                    run_sweep(&db.pool, &notifier, &time, Utc::now(), tolerance).await
                {
                    error!("Reminder sweep failed: {}", err);
                }
            })
        })?;

        self.scheduler.add(sweep_job).await?;
        self.scheduler.start().await?;

        info!(
            "Reminder service started - sweeping every {} minutes",
            self.interval_minutes
        );
        Ok(())
    }

    /// Shuts the schedule down.
    pub async fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.scheduler.shutdown().await?;
        Ok(())
    }
}
