use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::fmt;

/// Decision state of a booking request. Once non-pending it never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    /// Awaiting the operator's decision.
    Pending,
    /// Accepted; exactly one lesson was created.
    Accepted,
    /// Turned down; no lesson exists for it.
    Rejected,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// A booking request from the public form. Kept forever as an audit trail.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Request {
    /// Store-assigned id.
    pub id: i64,
    /// Submitted name.
    pub name: String,
    /// Phone or other contact detail.
    pub contact: String,
    /// Requested start instant in UTC, truncated to the whole hour.
    pub desired_time: DateTime<Utc>,
    /// Free-text note from the form.
    pub comment: Option<String>,
    /// Decision state.
    pub status: RequestStatus,
    /// Submission instant.
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, name, contact, desired_time, comment, status, created_at";

impl Request {
    /// Inserts a pending request.
    pub async fn create(
        pool: &SqlitePool,
        name: &str,
        contact: &str,
        desired_time: DateTime<Utc>,
        comment: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        let created_at = Utc::now();
        let result = sqlx::query(
            "INSERT INTO requests (name, contact, desired_time, comment, status, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(contact)
        .bind(desired_time)
        .bind(comment)
        .bind(RequestStatus::Pending)
        .bind(created_at)
        .execute(pool)
        .await?;

        Ok(Request {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            contact: contact.to_string(),
            desired_time,
            comment: comment.map(str::to_string),
            status: RequestStatus::Pending,
            created_at,
        })
    }

    /// Looks a request up by id.
    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Request>(&format!("SELECT {COLUMNS} FROM requests WHERE id = ?"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Atomically moves a pending request to `to`. Returns `false` when the
    /// request was not pending (or does not exist), in which case nothing was
    /// written. This conditional update is the sole idempotency guard for
    /// decisions, so it must never be split into a read followed by a write.
    pub async fn try_transition<'e, E>(
        executor: E,
        id: i64,
        to: RequestStatus,
    ) -> Result<bool, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Sqlite>,
    {
        let result = sqlx::query("UPDATE requests SET status = ? WHERE id = ? AND status = ?")
            .bind(to)
            .bind(id)
            .bind(RequestStatus::Pending)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
