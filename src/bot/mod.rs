/// Operator command intents and parsing
pub mod commands;
/// Message and callback update handlers
pub mod handlers;
/// Incoming webhook envelope
pub mod update;
