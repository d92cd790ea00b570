/// Decision callbacks from inline keyboards
pub mod callback;
/// Operator chat messages
pub mod message;
