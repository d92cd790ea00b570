use crate::bot::handlers;
use crate::bot::update::{TelegramUpdate, UpdateKind};
use crate::database::connection::DatabaseManager;
use crate::database::models::Lesson;
use crate::error::SchedulerError;
use crate::services::notifier::Notify;
use crate::services::reminder::run_sweep;
use crate::services::requests::{self, BookingForm};
use crate::utils::datetime::TimeSettings;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState<N> {
    /// Database pool owner.
    pub db: DatabaseManager,
    /// Outbound notification channel.
    pub notifier: N,
    /// Fixed-offset time handling.
    pub time: TimeSettings,
    /// The single chat allowed to command the bot.
    pub operator_chat_id: i64,
    /// Reminder window half-width in minutes.
    pub sweep_tolerance_minutes: i64,
}

/// The platform-facing acknowledgment; `/bot` answers this no matter what.
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    /// Always true.
    pub ok: bool,
}

/// Error body for the public endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short human-readable message; no internals leak through here.
    pub error: String,
}

/// Result of a triggered reminder sweep.
#[derive(Debug, Serialize, Deserialize)]
pub struct SweepResponse {
    /// Always true on success.
    pub ok: bool,
    /// Reminders sent by this run.
    pub count: u64,
}

/// Health probe payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `unhealthy`.
    pub status: String,
    /// Probe time.
    pub timestamp: DateTime<Utc>,
    /// Crate version.
    pub version: String,
    /// Database connectivity check result.
    pub database: String,
}

/// Builds the full HTTP surface: the Telegram webhook, the public booking
/// endpoints, the reminder trigger and a health probe.
pub fn router<N>(state: AppState<N>) -> Router
where
    N: Notify + Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/bot", post(bot_webhook::<N>))
        .route("/request", post(submit_request::<N>))
        .route("/schedule", get(schedule_listing::<N>))
        .route("/reminder", get(trigger_sweep::<N>).post(trigger_sweep::<N>))
        .route("/health", get(health_check::<N>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Webhook entry point. The platform redelivers on any non-200, which would
/// replay non-idempotent commands, so every outcome is acknowledged with
/// `{ok:true}` and errors stay on our side of the fence: internal ones go to
/// the log, user-visible ones back to the operator as chat text.
async fn bot_webhook<N>(
    State(state): State<AppState<N>>,
    update: Option<Json<TelegramUpdate>>,
) -> Json<OkResponse>
where
    N: Notify + Clone + Send + Sync + 'static,
{
    let Some(Json(update)) = update else {
        warn!("Discarding undecodable webhook payload");
        return Json(OkResponse { ok: true });
    };

    match update.into_kind() {
        Some(UpdateKind::Message(message)) => {
            if let Err(err) = handlers::message::handle_message(
                &state.db.pool,
                &state.notifier,
                &state.time,
                state.operator_chat_id,
                message,
            )
            .await
            {
                error!("Webhook message handling failed: {}", err);
            }
        }
        Some(UpdateKind::Callback(action)) => {
            if let Err(err) = handlers::callback::handle_callback(
                &state.db.pool,
                &state.notifier,
                &state.time,
                state.operator_chat_id,
                action,
            )
            .await
            {
                error!("Webhook callback handling failed: {}", err);
            }
        }
        None => {}
    }

    Json(OkResponse { ok: true })
}

/// Public booking form endpoint.
async fn submit_request<N>(
    State(state): State<AppState<N>>,
    Json(form): Json<BookingForm>,
) -> Result<Json<OkResponse>, (StatusCode, Json<ErrorResponse>)>
where
    N: Notify + Clone + Send + Sync + 'static,
{
    match requests::submit(&state.db.pool, &state.notifier, &state.time, &form).await {
        Ok(_) => Ok(Json(OkResponse { ok: true })),
        Err(err) if err.is_user_error() => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )),
        Err(err) => {
            error!("Booking submission failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Server error".to_string(),
                }),
            ))
        }
    }
}

/// Full lesson collection, ordered by start time.
async fn schedule_listing<N>(
    State(state): State<AppState<N>>,
) -> Result<Json<Vec<Lesson>>, (StatusCode, Json<ErrorResponse>)>
where
    N: Notify + Clone + Send + Sync + 'static,
{
    match Lesson::all_ordered(&state.db.pool).await {
        Ok(lessons) => Ok(Json(lessons)),
        Err(err) => {
            error!("Schedule listing failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Server error".to_string(),
                }),
            ))
        }
    }
}

/// Runs one reminder sweep, for deployments driving the sweeper from an
/// external scheduler.
async fn trigger_sweep<N>(
    State(state): State<AppState<N>>,
) -> Result<Json<SweepResponse>, (StatusCode, Json<ErrorResponse>)>
where
    N: Notify + Clone + Send + Sync + 'static,
{
    match run_sweep(
        &state.db.pool,
        &state.notifier,
        &state.time,
        Utc::now(),
        state.sweep_tolerance_minutes,
    )
    .await
    {
        Ok(report) => Ok(Json(SweepResponse {
            ok: true,
            count: report.reminders_sent,
        })),
        Err(SchedulerError::Persistence(err)) => {
            error!("Reminder sweep failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "DB error".to_string(),
                }),
            ))
        }
        Err(err) => {
            error!("Reminder sweep failed: {}", err);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Server error".to_string(),
                }),
            ))
        }
    }
}

async fn health_check<N>(
    State(state): State<AppState<N>>,
) -> Result<Json<HealthResponse>, StatusCode>
where
    N: Notify + Clone + Send + Sync + 'static,
{
    let database = match sqlx::query("SELECT 1").fetch_one(&state.db.pool).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let response = HealthResponse {
        status: database.to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
    };

    if database == "healthy" {
        Ok(Json(response))
    } else {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    }
}
