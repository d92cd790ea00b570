//! # Tutor Scheduler Bot Main Entry Point
//!
//! Initializes logging, loads configuration, sets up the database, starts
//! the in-process reminder schedule, and serves the webhook + booking API.

use anyhow::Result;
use std::sync::Arc;
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tutor_scheduler_bot::config::Config;
use tutor_scheduler_bot::database::connection::DatabaseManager;
use tutor_scheduler_bot::services::notifier::TelegramNotifier;
use tutor_scheduler_bot::services::reminder::{sweep_tolerance_minutes, ReminderService};
use tutor_scheduler_bot::services::web::{router, AppState};
use tutor_scheduler_bot::utils::datetime::TimeSettings;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tutor_scheduler_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    info!("Starting Tutor Scheduler Bot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Configuration loaded - Database: {}, HTTP Port: {}, UTC offset: {:+}",
        config.database_url, config.http_port, config.utc_offset_hours
    );

    let time = TimeSettings::from_hours(config.utc_offset_hours)?;

    info!("Initializing database connection...");
    let db_manager = DatabaseManager::new(&config.database_url).await?;
    db_manager.run_migrations().await?;
    let db_arc = Arc::new(db_manager);
    info!("Database initialized successfully");

    let bot = Bot::new(&config.telegram_bot_token);
    let notifier = TelegramNotifier::new(bot, config.operator_chat_id);

    info!("Initializing reminder service...");
    let mut reminder_service = ReminderService::new(
        notifier.clone(),
        db_arc.clone(),
        time,
        config.sweep_interval_minutes,
    )
    .await
    .map_err(|e| anyhow::anyhow!("Failed to create reminder service: {}", e))?;

    if let Err(e) = reminder_service.start().await {
        tracing::error!("Failed to start reminder service: {}", e);
    }

    let state = AppState {
        db: db_arc.as_ref().clone(),
        notifier,
        time,
        operator_chat_id: config.operator_chat_id,
        sweep_tolerance_minutes: sweep_tolerance_minutes(config.sweep_interval_minutes),
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.http_port))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to port {}: {}", config.http_port, e))?;

    info!("Webhook server starting on port {}", config.http_port);
    axum::serve(listener, app).await?;

    if let Err(e) = reminder_service.stop().await {
        tracing::warn!("Error stopping reminder service: {}", e);
    }

    info!("Application stopped");
    Ok(())
}
