use crate::bot::commands::{Command, HELP_TEXT, UNKNOWN_TEXT};
use crate::bot::update::IncomingMessage;
use crate::database::models::Lesson;
use crate::error::SchedulerError;
use crate::services::notifier::Notify;
use crate::utils::datetime::TimeSettings;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, error, info};

/// Handles one chat message from the webhook.
///
/// Only the operator chat gets any reaction; everything else is silently
/// acknowledged so strangers cannot probe the bot. Validation failures are
/// answered inline and never bubble up.
pub async fn handle_message<N: Notify>(
    pool: &SqlitePool,
    notifier: &N,
    time: &TimeSettings,
    operator_chat_id: i64,
    message: IncomingMessage,
) -> Result<(), SchedulerError> {
    if message.chat.id != operator_chat_id {
        debug!("Ignoring message from unauthorized chat {}", message.chat.id);
        return Ok(());
    }
    let Some(text) = message.text.as_deref() else {
        return Ok(());
    };

    let now = Utc::now();
    let command = match Command::parse(text, time, now) {
        Ok(command) => command,
        Err(err) if err.is_user_error() => {
            notifier.send_message(&err.to_string()).await?;
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    match command {
        Command::Start => {
            notifier.send_message(HELP_TEXT).await?;
        }
        Command::Add {
            start_time,
            student_name,
            comment,
        } => match Lesson::create(pool, start_time, &student_name, comment.as_deref()).await {
            Ok(lesson) => {
                info!("Lesson #{} added via /add", lesson.id);
                let reply = format!(
                    "Added: {} {} — {}",
                    time.format_date(lesson.start_time),
                    time.format_time(lesson.start_time),
                    lesson.student_name,
                );
                notifier.send_message(&reply).await?;
            }
            Err(err) => {
                error!("Failed to store lesson: {}", err);
                notifier
                    .send_message("Could not save the lesson, please try again.")
                    .await?;
            }
        },
        Command::Del { id } => match Lesson::delete(pool, id).await {
            Ok(Some(lesson)) => {
                info!("Lesson #{} removed via /del", lesson.id);
                let reply = format!(
                    "Removed: {} {} — {}",
                    time.format_date(lesson.start_time),
                    time.format_time(lesson.start_time),
                    lesson.student_name,
                );
                notifier.send_message(&reply).await?;
            }
            Ok(None) => {
                notifier
                    .send_message(&SchedulerError::LessonNotFound(id).to_string())
                    .await?;
            }
            Err(err) => {
                error!("Failed to delete lesson #{}: {}", id, err);
                notifier
                    .send_message("Could not reach the schedule, please try again.")
                    .await?;
            }
        },
        Command::Today => {
            let (from, to) = time.day_bounds(now)?;
            match Lesson::in_range(pool, from, to).await {
                Ok(lessons) => {
                    notifier.send_message(&render_today(time, &lessons)).await?;
                }
                Err(err) => {
                    error!("Failed to list today's lessons: {}", err);
                    notifier
                        .send_message("Could not reach the schedule, please try again.")
                        .await?;
                }
            }
        }
        Command::Unknown => {
            notifier.send_message(UNKNOWN_TEXT).await?;
        }
    }

    Ok(())
}

fn render_today(time: &TimeSettings, lessons: &[Lesson]) -> String {
    if lessons.is_empty() {
        return "No lessons today.".to_string();
    }

    let mut text = String::from("Today:");
    for lesson in lessons {
        let comment = lesson
            .comment
            .as_deref()
            .map(|c| format!(" ({c})"))
            .unwrap_or_default();
        text.push_str(&format!(
            "\n[#{}] {} — {}{}",
            lesson.id,
            time.format_time(lesson.start_time),
            lesson.student_name,
            comment,
        ));
    }
    text
}
