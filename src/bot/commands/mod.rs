use crate::error::SchedulerError;
use crate::utils::datetime::TimeSettings;
use chrono::{DateTime, Utc};

/// Help text sent for `/start` and `/help`.
pub const HELP_TEXT: &str = "Hi! I keep the tutoring schedule.\n\n\
Commands:\n\
/add DD.MM HH:00 Name [comment] — add a lesson\n\
/del ID — remove a lesson\n\
/today — lessons for today";

/// Reply for anything that is not a recognized command.
pub const UNKNOWN_TEXT: &str = "Command not recognized.\n\n\
Available:\n\
/add DD.MM HH:00 Name [comment]\n\
/del ID\n\
/today";

const USAGE_ADD: &str = "Usage: /add DD.MM HH:00 Name [comment]";
const USAGE_DEL: &str = "Usage: /del ID";

/// A parsed operator intent. Dispatch happens in one place on this enum
/// instead of chained prefix checks on the raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/start` or `/help` — show the help text.
    Start,
    /// `/add` — schedule a lesson at a whole hour.
    Add {
        /// Normalized start instant.
        start_time: DateTime<Utc>,
        /// First free token after date and time.
        student_name: String,
        /// Remaining tokens, joined.
        comment: Option<String>,
    },
    /// `/del` — delete a lesson by id.
    Del {
        /// Lesson id, always positive.
        id: i64,
    },
    /// `/today` — list today's lessons.
    Today,
    /// Anything else.
    Unknown,
}

impl Command {
    /// Parses a single line of operator text into an intent.
    ///
    /// Shape errors (`BadCommandSyntax`) and field errors
    /// (`InvalidDateTime`) are meant to be answered inline in chat and never
    /// propagate past the handler.
    pub fn parse(
        text: &str,
        time: &TimeSettings,
        now: DateTime<Utc>,
    ) -> Result<Self, SchedulerError> {
        let mut tokens = text.split_whitespace();
        let head = match tokens.next() {
            Some(head) => head,
            None => return Ok(Command::Unknown),
        };

        match head {
            "/start" | "/help" => Ok(Command::Start),
            "/today" => Ok(Command::Today),
            "/add" => {
                let (date_str, time_str, name) = match (tokens.next(), tokens.next(), tokens.next())
                {
                    (Some(d), Some(t), Some(n)) => (d, t, n),
                    _ => return Err(SchedulerError::BadCommandSyntax(USAGE_ADD)),
                };

                let (day, month, year) = time.parse_date(date_str, now)?;
                let (hour, minute) = time.parse_time(time_str)?;
                if minute != 0 {
                    return Err(SchedulerError::InvalidDateTime(
                        "Lessons start on the hour — use HH:00.".to_string(),
                    ));
                }
                let start_time = time.civil_to_utc(year, month, day, hour, 0)?;

                let comment = tokens.collect::<Vec<_>>().join(" ");
                let comment = if comment.is_empty() {
                    None
                } else {
                    Some(comment)
                };

                Ok(Command::Add {
                    start_time,
                    student_name: name.to_string(),
                    comment,
                })
            }
            "/del" => {
                let id = tokens
                    .next()
                    .and_then(|raw| raw.parse::<i64>().ok())
                    .filter(|id| *id > 0)
                    .ok_or(SchedulerError::BadCommandSyntax(USAGE_DEL))?;
                if tokens.next().is_some() {
                    return Err(SchedulerError::BadCommandSyntax(USAGE_DEL));
                }
                Ok(Command::Del { id })
            }
            _ => Ok(Command::Unknown),
        }
    }
}
