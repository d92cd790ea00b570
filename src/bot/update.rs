use serde::Deserialize;

/// The Telegram update envelope, decoded once at the webhook boundary.
///
/// Only the fields this bot acts on are modeled; everything else in the
/// payload is ignored by serde. Whatever the envelope contains, the webhook
/// answers 200 so the platform never retries a non-idempotent command.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUpdate {
    /// Platform-assigned update sequence number.
    pub update_id: Option<i64>,
    /// Present for plain chat messages.
    pub message: Option<IncomingMessage>,
    /// Present when an inline button was pressed.
    pub callback_query: Option<CallbackAction>,
}

/// A chat message addressed to the bot.
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// Originating chat.
    pub chat: Chat,
    /// Message text; absent for stickers, photos and the like.
    pub text: Option<String>,
}

/// The chat an update came from.
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    /// Telegram chat id.
    pub id: i64,
}

/// An inline-button press, carrying an opaque action token and a reference
/// to the message it was attached to.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackAction {
    /// Callback query id, needed to acknowledge the press.
    pub id: String,
    /// Who pressed the button.
    pub from: Sender,
    /// Opaque action token set when the keyboard was sent.
    pub data: Option<String>,
    /// The message the keyboard was attached to.
    pub message: Option<OriginMessage>,
}

/// The user behind a callback.
#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    /// Telegram user id; equals the chat id for private chats.
    pub id: i64,
}

/// Reference to the message a callback originated from, used for in-place
/// edits after a decision.
#[derive(Debug, Clone, Deserialize)]
pub struct OriginMessage {
    /// Message id within the chat.
    pub message_id: i32,
    /// Chat the message lives in.
    pub chat: Chat,
    /// Current text of the message.
    pub text: Option<String>,
}

/// The two update shapes this bot reacts to.
#[derive(Debug, Clone)]
pub enum UpdateKind {
    /// A chat message.
    Message(IncomingMessage),
    /// An inline-button press.
    Callback(CallbackAction),
}

impl TelegramUpdate {
    /// Collapses the envelope into the tagged union the handlers dispatch
    /// on. `None` for update types the bot does not handle.
    pub fn into_kind(self) -> Option<UpdateKind> {
        if let Some(callback) = self.callback_query {
            return Some(UpdateKind::Callback(callback));
        }
        self.message.map(UpdateKind::Message)
    }
}
