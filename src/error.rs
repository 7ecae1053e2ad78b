use std::path::PathBuf;

use thiserror::Error;

use crate::dispatch::Classifier;

/// Invalid or missing startup configuration. Always fatal before any
/// network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing token: supply --token or TELEGRAM_TOKEN env")]
    MissingToken,

    #[error("unknown mode {0:?} (use polling|webhook)")]
    UnknownMode(String),

    #[error("webhook mode requires --webhook-url (public HTTPS URL)")]
    MissingWebhookUrl,

    #[error("invalid webhook url {url:?}: {source}")]
    InvalidWebhookUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to read config file {}: {source}", path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {source}", path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("handler for {0} registered more than once")]
    DuplicateRoute(Classifier),
}

/// The bot session could not be constructed.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("init bot: could not verify token with Telegram: {0}")]
    VerifyToken(#[source] teloxide::RequestError),
}

/// Failure while producing or delivering a reply for a single update.
/// Logged and discarded by the dispatcher.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("{0} handler received an event it does not understand")]
    UnexpectedContent(Classifier),

    #[error("update has no chat to reply to")]
    NoChat,

    #[error("callback has no message to edit")]
    NoMessage,

    #[error("update is not a callback query")]
    NotCallbackQuery,

    #[error("update is not an inline query")]
    NotInlineQuery,
}

/// Listener bind or serve failure in webhook mode.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind webhook listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("webhook server failed: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to register webhook with Telegram: {0}")]
    RegisterWebhook(#[source] teloxide::RequestError),

    #[error("polling listener failed: {0}")]
    Polling(#[source] teloxide::RequestError),
}
