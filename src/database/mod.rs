/// SQLite pool management and migrations
pub mod connection;
/// Lesson and request models
pub mod models;
