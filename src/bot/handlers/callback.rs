use crate::bot::update::CallbackAction;
use crate::error::SchedulerError;
use crate::services::notifier::Notify;
use crate::services::requests::{decide, parse_decision, DecideOutcome};
use crate::utils::datetime::TimeSettings;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

/// Handles an inline-button press from the webhook.
///
/// Every press is answered so the client stops its spinner, but only the
/// operator's presses carry a decision through.
pub async fn handle_callback<N: Notify>(
    pool: &SqlitePool,
    notifier: &N,
    time: &TimeSettings,
    operator_chat_id: i64,
    action: CallbackAction,
) -> Result<(), SchedulerError> {
    if action.from.id != operator_chat_id {
        debug!("Ignoring callback from unauthorized user {}", action.from.id);
        notifier.answer_callback(&action.id, None).await?;
        return Ok(());
    }

    let Some((request_id, accept)) = action.data.as_deref().and_then(parse_decision) else {
        warn!("Unparsable callback data: {:?}", action.data);
        notifier
            .answer_callback(&action.id, Some("Unknown action"))
            .await?;
        return Ok(());
    };

    info!(
        "Decision callback for request #{}: {}",
        request_id,
        if accept { "accept" } else { "reject" }
    );

    let result = decide(
        pool,
        notifier,
        time,
        request_id,
        accept,
        action.message.as_ref(),
    )
    .await;

    let answer = match &result {
        Ok(DecideOutcome::Accepted) => "Accepted ✅".to_string(),
        Ok(DecideOutcome::Rejected) => "Rejected ❌".to_string(),
        Err(
            err @ (SchedulerError::RequestNotFound(_)
            | SchedulerError::RequestAlreadyDecided { .. }),
        ) => err.to_string(),
        Err(err) => {
            error!("Decision failed for request #{}: {}", request_id, err);
            "Storage error, please try again".to_string()
        }
    };

    if let Err(err) = notifier.answer_callback(&action.id, Some(&answer)).await {
        warn!("Failed to answer callback {}: {}", action.id, err);
    }

    Ok(())
}
