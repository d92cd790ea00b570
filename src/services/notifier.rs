use crate::error::SchedulerError;
use std::future::Future;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use teloxide::prelude::*;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId};
use thiserror::Error;

/// Delivery failure at the messaging API.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

impl From<NotifyError> for SchedulerError {
    fn from(err: NotifyError) -> Self {
        SchedulerError::Dispatch(err.0)
    }
}

/// An inline button under an operator message: a visible label plus the
/// opaque token that comes back in the callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineAction {
    /// Button caption.
    pub label: String,
    /// Callback data token.
    pub data: String,
}

/// Capability interface for operator-facing notifications. Everything the
/// scheduler sends goes through this seam, so the lifecycle and sweeper
/// logic can be exercised without a live messaging API.
pub trait Notify: Send + Sync {
    /// Sends plain text to the operator chat; returns the message id.
    fn send_message(&self, text: &str) -> impl Future<Output = Result<i32, NotifyError>> + Send;

    /// Sends text with a single row of inline actions; returns the message id.
    fn send_with_actions(
        &self,
        text: &str,
        actions: &[InlineAction],
    ) -> impl Future<Output = Result<i32, NotifyError>> + Send;

    /// Replaces the text of an earlier message, dropping any inline keyboard
    /// it carried.
    fn edit_message(
        &self,
        message_id: i32,
        text: &str,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;

    /// Acknowledges an inline-button press, optionally with a short toast.
    fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Production notifier speaking to the Telegram Bot API, bound to the single
/// operator chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
    operator: ChatId,
}

impl TelegramNotifier {
    /// Binds a bot to the operator chat.
    pub fn new(bot: Bot, operator_chat_id: i64) -> Self {
        Self {
            bot,
            operator: ChatId(operator_chat_id),
        }
    }
}

fn api_err(err: teloxide::RequestError) -> NotifyError {
    NotifyError(err.to_string())
}

impl Notify for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<i32, NotifyError> {
        let message = self
            .bot
            .send_message(self.operator, text)
            .await
            .map_err(api_err)?;
        Ok(message.id.0)
    }

    async fn send_with_actions(
        &self,
        text: &str,
        actions: &[InlineAction],
    ) -> Result<i32, NotifyError> {
        let row: Vec<InlineKeyboardButton> = actions
            .iter()
            .map(|action| InlineKeyboardButton::callback(action.label.clone(), action.data.clone()))
            .collect();
        let keyboard = InlineKeyboardMarkup::new(vec![row]);

        let message = self
            .bot
            .send_message(self.operator, text)
            .reply_markup(keyboard)
            .await
            .map_err(api_err)?;
        Ok(message.id.0)
    }

    async fn edit_message(&self, message_id: i32, text: &str) -> Result<(), NotifyError> {
        self.bot
            .edit_message_text(self.operator, MessageId(message_id), text)
            .await
            .map_err(api_err)?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), NotifyError> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if let Some(text) = text {
            request = request.text(text.to_string());
        }
        request.await.map_err(api_err)?;
        Ok(())
    }
}

/// Everything a [`MemoryNotifier`] has sent, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// A plain or keyboard-bearing message.
    Message {
        /// Assigned message id.
        id: i32,
        /// Message text.
        text: String,
        /// Inline actions, empty for plain sends.
        actions: Vec<InlineAction>,
    },
    /// An in-place edit of an earlier message.
    Edit {
        /// Target message id.
        message_id: i32,
        /// Replacement text.
        text: String,
    },
    /// A callback acknowledgment.
    CallbackAnswer {
        /// The acknowledged callback query.
        callback_id: String,
        /// Toast text, if any.
        text: Option<String>,
    },
}

/// In-memory notifier for tests: records outbound traffic and can be told
/// to fail the next N deliveries.
#[derive(Clone, Default)]
pub struct MemoryNotifier {
    outbound: Arc<Mutex<Vec<Outbound>>>,
    next_id: Arc<AtomicI32>,
    fail_remaining: Arc<AtomicUsize>,
}

impl MemoryNotifier {
    /// An empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` sends/edits fail with a delivery error.
    pub fn fail_next(&self, count: usize) {
        self.fail_remaining.store(count, Ordering::SeqCst);
    }

    /// Snapshot of everything sent so far.
    pub fn outbound(&self) -> Vec<Outbound> {
        self.outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Only the sent messages (no edits or callback answers), in order.
    pub fn messages(&self) -> Vec<Outbound> {
        self.outbound()
            .into_iter()
            .filter(|entry| matches!(entry, Outbound::Message { .. }))
            .collect()
    }

    fn record(&self, entry: Outbound) {
        self.outbound
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
    }

    fn take_failure(&self) -> bool {
        let remaining = self.fail_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_remaining.store(remaining - 1, Ordering::SeqCst);
            return true;
        }
        false
    }
}

impl Notify for MemoryNotifier {
    async fn send_message(&self, text: &str) -> Result<i32, NotifyError> {
        if self.take_failure() {
            return Err(NotifyError("simulated delivery failure".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Outbound::Message {
            id,
            text: text.to_string(),
            actions: Vec::new(),
        });
        Ok(id)
    }

    async fn send_with_actions(
        &self,
        text: &str,
        actions: &[InlineAction],
    ) -> Result<i32, NotifyError> {
        if self.take_failure() {
            return Err(NotifyError("simulated delivery failure".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.record(Outbound::Message {
            id,
            text: text.to_string(),
            actions: actions.to_vec(),
        });
        Ok(id)
    }

    async fn edit_message(&self, message_id: i32, text: &str) -> Result<(), NotifyError> {
        if self.take_failure() {
            return Err(NotifyError("simulated delivery failure".to_string()));
        }
        self.record(Outbound::Edit {
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<(), NotifyError> {
        if self.take_failure() {
            return Err(NotifyError("simulated delivery failure".to_string()));
        }
        self.record(Outbound::CallbackAnswer {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }
}
