/// Fixed-offset date/time normalization and display
pub mod datetime;
/// Input validation for names and contacts
pub mod validation;
