use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use teloxide::types::Update;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error};

use crate::error::{ConfigError, HandlerError};
use crate::platform::{telegram, InboundEvent, OutboundAction};

/// Commands published to Telegram's command menu
#[derive(BotCommands, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Open settings")]
    Settings,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::Start, Command::Help, Command::Settings];

    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Help => "help",
            Command::Settings => "settings",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Text,
    Photo,
    Sticker,
    Document,
    InlineQuery,
}

impl ContentKind {
    fn tag(self) -> &'static str {
        match self {
            ContentKind::Text => "text",
            ContentKind::Photo => "photo",
            ContentKind::Sticker => "sticker",
            ContentKind::Document => "document",
            ContentKind::InlineQuery => "inline-query",
        }
    }
}

/// Buttons on the settings keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackId {
    About,
    NotifyToggle,
    Language,
}

impl CallbackId {
    pub const ALL: [CallbackId; 3] = [
        CallbackId::About,
        CallbackId::NotifyToggle,
        CallbackId::Language,
    ];

    /// Callback data sent back by Telegram when the button is tapped.
    pub fn data(self) -> &'static str {
        match self {
            CallbackId::About => "about",
            CallbackId::NotifyToggle => "notify_toggle",
            CallbackId::Language => "language",
        }
    }

    pub fn from_data(data: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.data() == data)
    }
}

/// Lookup key into the dispatch table. Carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classifier {
    Command(Command),
    Content(ContentKind),
    Callback(CallbackId),
}

impl fmt::Display for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classifier::Command(c) => write!(f, "/{}", c.name()),
            Classifier::Content(k) => write!(f, "<{}>", k.tag()),
            Classifier::Callback(c) => write!(f, "callback:{}", c.data()),
        }
    }
}

/// Per-event values handlers may read besides the event itself
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub now: DateTime<FixedOffset>,
    pub admin_id: Option<i64>,
}

impl HandlerContext {
    pub fn at_current_time(admin_id: Option<i64>) -> Self {
        Self {
            now: Local::now().fixed_offset(),
            admin_id,
        }
    }

    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_id
            .is_some_and(|admin| i64::try_from(user_id).is_ok_and(|id| id == admin))
    }

    /// RFC 3339 timestamp used in replies.
    pub fn timestamp(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

pub type Handler =
    fn(&InboundEvent, &HandlerContext) -> Result<Option<OutboundAction>, HandlerError>;

/// Immutable mapping from classifier to handler, built once at startup.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    routes: HashMap<Classifier, Handler>,
}

impl DispatchTable {
    pub fn builder() -> DispatchTableBuilder {
        DispatchTableBuilder::default()
    }

    pub fn get(&self, classifier: &Classifier) -> Option<Handler> {
        self.routes.get(classifier).copied()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }
}

#[derive(Debug, Default)]
pub struct DispatchTableBuilder {
    routes: HashMap<Classifier, Handler>,
    duplicate: Option<Classifier>,
}

impl DispatchTableBuilder {
    pub fn on(mut self, classifier: Classifier, handler: Handler) -> Self {
        if self.routes.insert(classifier, handler).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(classifier);
        }
        self
    }

    /// Fails if any classifier was bound more than once.
    pub fn build(self) -> Result<DispatchTable, ConfigError> {
        match self.duplicate {
            Some(classifier) => Err(ConfigError::DuplicateRoute(classifier)),
            None => Ok(DispatchTable {
                routes: self.routes,
            }),
        }
    }
}

/// Executes handler output against the platform
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn execute(&self, update: &Update, action: &OutboundAction) -> Result<(), HandlerError>;
}

/// What happened to a single update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Not a kind of update the bot classifies.
    Ignored,
    /// Classified, but no handler is bound for it.
    Unrouted(Option<Classifier>),
    NoReply(Classifier),
    Replied(Classifier),
    /// The handler or the reply failed; the error has been logged.
    Failed(Classifier),
}

impl Dispatch {
    pub fn classifier(self) -> Option<Classifier> {
        match self {
            Dispatch::Ignored => None,
            Dispatch::Unrouted(classifier) => classifier,
            Dispatch::NoReply(c) | Dispatch::Replied(c) | Dispatch::Failed(c) => Some(c),
        }
    }
}

/// Classifies updates, runs the bound handler, and delivers its reply.
/// Handler errors stop at this boundary.
pub struct UpdateRouter {
    table: DispatchTable,
    outbox: Arc<dyn Outbox>,
    bot_username: String,
    admin_id: Option<i64>,
}

impl UpdateRouter {
    pub fn new(
        table: DispatchTable,
        outbox: Arc<dyn Outbox>,
        bot_username: impl Into<String>,
        admin_id: Option<i64>,
    ) -> Self {
        Self {
            table,
            outbox,
            bot_username: bot_username.into(),
            admin_id,
        }
    }

    pub async fn dispatch(&self, update: &Update) -> Dispatch {
        let Some(event) = telegram::inbound_event(update, &self.bot_username) else {
            debug!("Ignoring update {}", update.id.0);
            return Dispatch::Ignored;
        };

        let Some(classifier) = event.classifier() else {
            debug!("Update {} has no classifier", update.id.0);
            return Dispatch::Unrouted(None);
        };

        let Some(handler) = self.table.get(&classifier) else {
            debug!("No handler for {} (update {})", classifier, update.id.0);
            return Dispatch::Unrouted(Some(classifier));
        };

        debug!("Dispatching update {} to {}", update.id.0, classifier);
        let ctx = HandlerContext::at_current_time(self.admin_id);

        let action = match handler(&event, &ctx) {
            Ok(Some(action)) => action,
            Ok(None) => return Dispatch::NoReply(classifier),
            Err(e) => {
                error!("handler error ({}): {}", classifier, e);
                return Dispatch::Failed(classifier);
            }
        };

        match self.outbox.execute(update, &action).await {
            Ok(()) => Dispatch::Replied(classifier),
            Err(e) => {
                error!("handler error ({}): {}", classifier, e);
                Dispatch::Failed(classifier)
            }
        }
    }
}
