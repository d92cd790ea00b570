use anyhow::{anyhow, Result};
use std::env;

/// Runtime configuration, read once at startup and injected into every
/// component that needs it.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot API token.
    pub telegram_bot_token: String,
    /// The single chat allowed to issue commands and decisions.
    pub operator_chat_id: i64,
    /// SQLite connection string.
    pub database_url: String,
    /// Port for the webhook / API server.
    pub http_port: u16,
    /// The tutor's civil time zone as whole hours east of UTC.
    pub utc_offset_hours: i32,
    /// Cadence of the in-process reminder sweep, in minutes.
    pub sweep_interval_minutes: u32,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let operator_chat_id = env::var("OPERATOR_CHAT_ID")
            .map_err(|_| anyhow!("OPERATOR_CHAT_ID must be set"))?
            .trim()
            .parse::<i64>()
            .map_err(|_| anyhow!("OPERATOR_CHAT_ID must be a numeric chat id"))?;

        if operator_chat_id == 0 {
            return Err(anyhow!("OPERATOR_CHAT_ID cannot be zero"));
        }

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite:./data/lessons.db".to_string());
        let database_url = if database_url.trim().is_empty() {
            "sqlite:./data/lessons.db".to_string()
        } else {
            database_url
        };

        let http_port = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .trim()
            .parse()
            .map_err(|_| anyhow!("Invalid HTTP_PORT"))?;

        let utc_offset_hours = env::var("UTC_OFFSET_HOURS")
            .unwrap_or_else(|_| "3".to_string())
            .trim()
            .parse::<i32>()
            .map_err(|_| anyhow!("Invalid UTC_OFFSET_HOURS"))?;

        if !(-12..=14).contains(&utc_offset_hours) {
            return Err(anyhow!("UTC_OFFSET_HOURS must be between -12 and 14"));
        }

        let sweep_interval_minutes = env::var("SWEEP_INTERVAL_MINUTES")
            .unwrap_or_else(|_| "2".to_string())
            .trim()
            .parse::<u32>()
            .map_err(|_| anyhow!("Invalid SWEEP_INTERVAL_MINUTES"))?;

        if !(1..=59).contains(&sweep_interval_minutes) {
            return Err(anyhow!("SWEEP_INTERVAL_MINUTES must be between 1 and 59"));
        }

        Ok(Config {
            telegram_bot_token: token,
            operator_chat_id,
            database_url,
            http_port,
            utc_offset_hours,
            sweep_interval_minutes,
        })
    }
}
