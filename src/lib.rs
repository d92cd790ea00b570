//! # Tutor Scheduler Bot
//!
//! A lesson scheduler for a single private tutor: a Telegram bot webhook for
//! operating the schedule, a small HTTP API the marketing site calls for
//! booking requests, and hourly lesson reminders.
//!
//! ## Features
//! - Operator chat commands: `/add`, `/del`, `/today`
//! - Booking requests with accept/reject inline actions
//! - One-time reminders an hour before each lesson
//! - Stale lesson pruning
//! - Persistent storage with SQLite

/// Webhook envelope decoding, command parsing and update handlers
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Domain error taxonomy
pub mod error;
/// Request lifecycle, reminders, notifications and the HTTP surface
pub mod services;
/// Utility functions for datetime normalization and validation
pub mod utils;
