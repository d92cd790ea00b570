use crate::bot::update::OriginMessage;
use crate::database::models::{Lesson, Request, RequestStatus};
use crate::error::SchedulerError;
use crate::services::notifier::{InlineAction, Notify};
use crate::utils::datetime::TimeSettings;
use crate::utils::validation::{validate_contact, validate_name};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// The booking form as posted by the public site. `website` is a honeypot
/// field that real visitors never fill in.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingForm {
    /// Submitter name.
    pub name: String,
    /// Phone or other contact detail.
    pub phone: String,
    /// `YYYY-MM-DD`, when the form posts separate fields.
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`, or the combined `YYYY-MM-DDTHH:MM` when `date` is absent.
    #[serde(default)]
    pub time: Option<String>,
    /// Free-text note.
    #[serde(default)]
    pub comment: Option<String>,
    /// Honeypot; any non-empty value means a bot filled the form.
    #[serde(default)]
    pub website: Option<String>,
}

/// What `submit` did with a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A pending request was stored and the operator notified.
    Accepted {
        /// Id of the new request.
        request_id: i64,
    },
    /// The honeypot tripped; nothing was stored or sent. The caller still
    /// reports success so automation cannot tell the difference.
    Discarded,
}

/// The decision that was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecideOutcome {
    /// Request accepted; one planned lesson now exists.
    Accepted,
    /// Request rejected; no lesson was created.
    Rejected,
}

/// Inline actions attached to a request notification.
pub fn decision_actions(request_id: i64) -> Vec<InlineAction> {
    vec![
        InlineAction {
            label: "✅ Accept".to_string(),
            data: format!("req:{request_id}:accept"),
        },
        InlineAction {
            label: "❌ Reject".to_string(),
            data: format!("req:{request_id}:reject"),
        },
    ]
}

/// Parses a decision token produced by [`decision_actions`].
pub fn parse_decision(data: &str) -> Option<(i64, bool)> {
    let rest = data.strip_prefix("req:")?;
    let (id_str, verb) = rest.split_once(':')?;
    let id = id_str.parse::<i64>().ok().filter(|id| *id > 0)?;
    match verb {
        "accept" => Some((id, true)),
        "reject" => Some((id, false)),
        _ => None,
    }
}

/// Operator-facing summary of a request, also used as the fallback body
/// when editing a decision message whose original text is unavailable.
pub fn request_summary(time: &TimeSettings, request: &Request) -> String {
    let mut text = format!(
        "New booking request #{}\nName: {}\nContact: {}\nTime: {} {}",
        request.id,
        request.name,
        request.contact,
        time.format_date(request.desired_time),
        time.format_time(request.desired_time),
    );
    if let Some(comment) = &request.comment {
        text.push_str(&format!("\nComment: {comment}"));
    }
    text
}

fn desired_time(time: &TimeSettings, form: &BookingForm) -> Result<DateTime<Utc>, SchedulerError> {
    let date = form.date.as_deref().map(str::trim).filter(|d| !d.is_empty());
    let time_field = form.time.as_deref().map(str::trim).filter(|t| !t.is_empty());

    match (date, time_field) {
        (Some(date), Some(time_field)) => time.from_form_fields(date, time_field),
        (None, Some(combined)) if combined.contains('T') => time.from_combined(combined),
        _ => Err(SchedulerError::Validation(
            "Date and time are required".to_string(),
        )),
    }
}

/// Accepts a booking form: validates it, stores a pending request, and
/// notifies the operator with accept/reject actions.
///
/// A tripped honeypot is a silent no-op; the endpoint still answers with the
/// success shape.
pub async fn submit<N: Notify>(
    pool: &SqlitePool,
    notifier: &N,
    time: &TimeSettings,
    form: &BookingForm,
) -> Result<SubmitOutcome, SchedulerError> {
    if form
        .website
        .as_deref()
        .is_some_and(|value| !value.trim().is_empty())
    {
        info!("Honeypot tripped, discarding submission");
        return Ok(SubmitOutcome::Discarded);
    }

    validate_name(&form.name)?;
    validate_contact(&form.phone)?;
    let desired = desired_time(time, form)?;

    let comment = form
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let request = Request::create(pool, form.name.trim(), form.phone.trim(), desired, comment).await?;
    info!("Stored booking request #{}", request.id);

    let text = request_summary(time, &request);
    notifier
        .send_with_actions(&text, &decision_actions(request.id))
        .await?;

    Ok(SubmitOutcome::Accepted {
        request_id: request.id,
    })
}

/// Applies the operator's decision to a pending request, exactly once.
///
/// The status transition is a conditional update that only touches pending
/// rows, and it shares a transaction with the lesson insert, so a redelivered
/// or concurrent decision can never produce a second lesson. When the insert
/// fails the transaction rolls back and the request stays pending.
pub async fn decide<N: Notify>(
    pool: &SqlitePool,
    notifier: &N,
    time: &TimeSettings,
    request_id: i64,
    accept: bool,
    origin: Option<&OriginMessage>,
) -> Result<DecideOutcome, SchedulerError> {
    let request = Request::find_by_id(pool, request_id)
        .await?
        .ok_or(SchedulerError::RequestNotFound(request_id))?;

    let target = if accept {
        RequestStatus::Accepted
    } else {
        RequestStatus::Rejected
    };

    let mut tx = pool.begin().await?;
    let transitioned = Request::try_transition(&mut tx, request_id, target).await?;
    if !transitioned {
        tx.rollback().await?;
        let status = Request::find_by_id(pool, request_id)
            .await?
            .map_or(request.status, |fresh| fresh.status);
        return Err(SchedulerError::RequestAlreadyDecided {
            id: request_id,
            status,
        });
    }

    if accept {
        let comment = match &request.comment {
            Some(comment) => format!("{comment} | contact: {}", request.contact),
            None => format!("contact: {}", request.contact),
        };
        Lesson::create(&mut tx, request.desired_time, &request.name, Some(&comment)).await?;
    }
    tx.commit().await?;
    info!(
        "Request #{} {}",
        request_id,
        if accept { "accepted" } else { "rejected" }
    );

    // The decision is durable at this point; a failed edit only leaves the
    // old keyboard on screen, and a repeated press is caught by the
    // pending-status guard.
    if let Some(origin) = origin {
        let marker = if accept { "✅ Accepted" } else { "❌ Rejected" };
        let base = origin
            .text
            .clone()
            .unwrap_or_else(|| request_summary(time, &request));
        let edited = format!("{base}\n\n{marker}");
        if let Err(err) = notifier.edit_message(origin.message_id, &edited).await {
            warn!("Failed to edit decision message for request #{request_id}: {err}");
        }
    }

    Ok(if accept {
        DecideOutcome::Accepted
    } else {
        DecideOutcome::Rejected
    })
}

#[cfg(test)]
mod tests {
    use super::parse_decision;

    #[test]
    fn parses_decision_tokens() {
        assert_eq!(parse_decision("req:7:accept"), Some((7, true)));
        assert_eq!(parse_decision("req:12:reject"), Some((12, false)));
        assert_eq!(parse_decision("req:0:accept"), None);
        assert_eq!(parse_decision("req:x:accept"), None);
        assert_eq!(parse_decision("req:7:maybe"), None);
        assert_eq!(parse_decision("settings:7:accept"), None);
        assert_eq!(parse_decision(""), None);
    }
}
