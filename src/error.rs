use crate::database::models::RequestStatus;
use thiserror::Error;

/// Error taxonomy for the scheduler core.
///
/// User-facing variants (`Validation`, `InvalidDateTime`, `BadCommandSyntax`,
/// the not-found and already-decided lookups) are rendered back to the
/// operator or the form submitter; `Persistence` and `Dispatch` are logged
/// and reported generically.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Malformed user input on the public form.
    #[error("{0}")]
    Validation(String),

    /// A date or time field is missing, non-numeric, or out of range.
    #[error("Invalid date or time. {0}")]
    InvalidDateTime(String),

    /// An operator command did not match its expected shape.
    #[error("{0}")]
    BadCommandSyntax(&'static str),

    /// `/del` referenced a lesson that does not exist.
    #[error("Lesson #{0} not found")]
    LessonNotFound(i64),

    /// A decision callback referenced an unknown request.
    #[error("Request #{0} not found")]
    RequestNotFound(i64),

    /// A decision arrived for a request that is no longer pending.
    #[error("Request #{id} was already decided: {status}")]
    RequestAlreadyDecided {
        /// The request in question.
        id: i64,
        /// Its current, immutable status.
        status: RequestStatus,
    },

    /// The store was unavailable or a write failed.
    #[error("storage failure: {0}")]
    Persistence(#[from] sqlx::Error),

    /// A notification could not be delivered.
    #[error("notification delivery failed: {0}")]
    Dispatch(String),
}

impl SchedulerError {
    /// Whether this error should be shown to the end user as their own
    /// mistake rather than a server fault.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            SchedulerError::Validation(_)
                | SchedulerError::InvalidDateTime(_)
                | SchedulerError::BadCommandSyntax(_)
        )
    }
}
