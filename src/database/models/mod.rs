/// Scheduled lessons
pub mod lesson;
/// Booking requests from the public form
pub mod request;

pub use lesson::*;
pub use request::*;
