pub mod telegram;

use crate::dispatch::{CallbackId, Classifier, Command, ContentKind};

/// Identity of whoever triggered an update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: u64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

/// Inline query text typed after the bot's @mention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineQuery {
    pub text: String,
}

/// What the update carries, already narrowed to the kinds the bot routes on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Command(Command),
    Text(String),
    Photo { file_id: String, caption: String },
    Sticker { emoji: String, set_name: String },
    Document { file_name: String, file_size: u32 },
    /// `None` when the transport delivered an inline update without a query.
    InlineQuery(Option<InlineQuery>),
    Callback { data: String },
}

/// A platform-independent view of one inbound update. Read-only to handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub sender: Option<Sender>,
    pub content: Content,
}

impl InboundEvent {
    /// The routing key for this event. Callback data the bot never issued has
    /// no classifier.
    pub fn classifier(&self) -> Option<Classifier> {
        let classifier = match &self.content {
            Content::Command(command) => Classifier::Command(*command),
            Content::Text(_) => Classifier::Content(ContentKind::Text),
            Content::Photo { .. } => Classifier::Content(ContentKind::Photo),
            Content::Sticker { .. } => Classifier::Content(ContentKind::Sticker),
            Content::Document { .. } => Classifier::Content(ContentKind::Document),
            Content::InlineQuery(_) => Classifier::Content(ContentKind::InlineQuery),
            Content::Callback { data } => Classifier::Callback(CallbackId::from_data(data)?),
        };
        Some(classifier)
    }
}

/// Telegram text formatting applied to an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextFormat {
    Markdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub callback: CallbackId,
}

/// Inline keyboard attached under a message, one `Vec` per row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: Option<TextFormat>,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: None,
            keyboard: None,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            format: Some(TextFormat::Markdown),
            ..Self::plain(text)
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// A single article answer to an inline query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineArticle {
    pub id: String,
    pub title: String,
    pub description: String,
    pub text: String,
}

/// The one reply a handler may produce for an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundAction {
    /// Send a new message to the chat the update came from.
    Send(Reply),
    /// Replace the text of the message whose button was tapped.
    Edit { text: String },
    /// Show a small notification bubble for a button tap.
    AnswerCallback { text: String },
    AnswerInline {
        results: Vec<InlineArticle>,
        cache_time: u32,
    },
}
