use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool};

/// Lifecycle state of a lesson.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    /// Scheduled and upcoming.
    Planned,
    /// Took place.
    Done,
    /// Called off.
    Canceled,
}

/// A scheduled lesson. Immutable after creation except for `reminder_sent`
/// and deletion; rescheduling is delete-and-recreate.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Lesson {
    /// Store-assigned id.
    pub id: i64,
    /// Start instant in UTC; a whole hour in the tutor's civil time zone.
    pub start_time: DateTime<Utc>,
    /// Who the lesson is with.
    pub student_name: String,
    /// Free-text note, e.g. the subject.
    pub comment: Option<String>,
    /// Lifecycle state.
    pub status: LessonStatus,
    /// Set once the one-hour reminder has gone out.
    pub reminder_sent: bool,
}

const COLUMNS: &str = "id, start_time, student_name, comment, status, reminder_sent";

impl Lesson {
    /// Inserts a planned lesson. Takes any executor so the accept path can
    /// run it inside the decision transaction.
    pub async fn create<'e, E>(
        executor: E,
        start_time: DateTime<Utc>,
        student_name: &str,
        comment: Option<&str>,
    ) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query(
            "INSERT INTO lessons (start_time, student_name, comment, status, reminder_sent) \
             VALUES (?, ?, ?, ?, 0)",
        )
        .bind(start_time)
        .bind(student_name)
        .bind(comment)
        .bind(LessonStatus::Planned)
        .execute(executor)
        .await?;

        Ok(Lesson {
            id: result.last_insert_rowid(),
            start_time,
            student_name: student_name.to_string(),
            comment: comment.map(str::to_string),
            status: LessonStatus::Planned,
            reminder_sent: false,
        })
    }

    /// Looks a lesson up by id.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!("SELECT {COLUMNS} FROM lessons WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a lesson, returning the deleted row when it existed.
    pub async fn delete(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        let lesson = Self::find_by_id(pool, id).await?;
        if lesson.is_some() {
            sqlx::query("DELETE FROM lessons WHERE id = ?")
                .bind(id)
                .execute(pool)
                .await?;
        }
        Ok(lesson)
    }

    /// Lessons with `from <= start_time < to`, ascending.
    pub async fn in_range(
        pool: &SqlitePool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {COLUMNS} FROM lessons \
             WHERE start_time >= ? AND start_time < ? ORDER BY start_time ASC"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Every lesson, ordered by start time ascending.
    pub async fn all_ordered(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {COLUMNS} FROM lessons ORDER BY start_time ASC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Planned, not-yet-reminded lessons with `from <= start_time <= to`
    /// (both ends inclusive, matching the sweep window).
    pub async fn due_for_reminder(
        pool: &SqlitePool,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(&format!(
            "SELECT {COLUMNS} FROM lessons \
             WHERE status = ? AND reminder_sent = 0 \
             AND start_time >= ? AND start_time <= ? \
             ORDER BY start_time ASC"
        ))
        .bind(LessonStatus::Planned)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Records that the reminder for this lesson has been sent.
    pub async fn mark_reminder_sent(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE lessons SET reminder_sent = 1 WHERE id = ?")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Garbage-collects lessons that started before `cutoff`, regardless of
    /// status. Returns the number of rows removed.
    pub async fn delete_started_before(
        pool: &SqlitePool,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM lessons WHERE start_time < ?")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
