/// Operator notification capability and implementations
pub mod notifier;
/// Reminder sweeps and the in-process sweep schedule
pub mod reminder;
/// Booking request lifecycle
pub mod requests;
/// HTTP surface: webhook, booking form, schedule, reminder trigger
pub mod web;
