use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InlineQueryResult, InlineQueryResultArticle,
    InputMessageContent, InputMessageContentText, Message, ParseMode, Update, UpdateKind, User,
};

use crate::dispatch::Command;
use crate::platform::{
    Content, InboundEvent, InlineArticle, InlineQuery, Keyboard, Sender, TextFormat,
};

/// Narrow a Telegram update to the event kinds the bot routes on.
/// Returns `None` for everything else (edited messages, polls, joins, ...).
pub fn inbound_event(update: &Update, bot_username: &str) -> Option<InboundEvent> {
    match &update.kind {
        UpdateKind::Message(msg) => message_event(msg, bot_username),
        UpdateKind::CallbackQuery(q) => Some(InboundEvent {
            sender: Some(sender(&q.from)),
            content: Content::Callback {
                data: q.data.clone().unwrap_or_default(),
            },
        }),
        UpdateKind::InlineQuery(q) => Some(InboundEvent {
            sender: Some(sender(&q.from)),
            content: Content::InlineQuery(Some(InlineQuery {
                text: q.query.clone(),
            })),
        }),
        _ => None,
    }
}

fn message_event(msg: &Message, bot_username: &str) -> Option<InboundEvent> {
    let content = if let Some(text) = msg.text() {
        match parse_command(text, bot_username) {
            Some(command) => Content::Command(command),
            None => Content::Text(text.to_string()),
        }
    } else if let Some(photos) = msg.photo() {
        // Telegram lists sizes smallest first
        let largest = photos.last()?;
        Content::Photo {
            file_id: largest.file.id.to_string(),
            caption: msg.caption().unwrap_or_default().to_string(),
        }
    } else if let Some(sticker) = msg.sticker() {
        Content::Sticker {
            emoji: sticker.emoji.clone().unwrap_or_default(),
            set_name: sticker.set_name.clone().unwrap_or_default(),
        }
    } else if let Some(doc) = msg.document() {
        Content::Document {
            file_name: doc.file_name.clone().unwrap_or_default(),
            file_size: doc.file.size,
        }
    } else {
        return None;
    };

    Some(InboundEvent {
        sender: msg.from.as_ref().map(sender),
        content,
    })
}

fn sender(user: &User) -> Sender {
    Sender {
        id: user.id.0,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// Recognise `/name` or `/name@bot_username` as one of the bot's commands.
/// Commands addressed to another bot, or unknown names, are not commands.
pub fn parse_command(text: &str, bot_username: &str) -> Option<Command> {
    let token = text.split_whitespace().next()?.strip_prefix('/')?;
    let name = match token.split_once('@') {
        Some((name, mention)) if mention.eq_ignore_ascii_case(bot_username) => name,
        Some(_) => return None,
        None => token,
    };
    Command::from_name(name)
}

pub fn parse_mode(format: TextFormat) -> ParseMode {
    match format {
        #[allow(deprecated)]
        TextFormat::Markdown => ParseMode::Markdown,
    }
}

pub fn inline_keyboard(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.callback.data()))
            .collect::<Vec<_>>()
    }))
}

pub fn inline_result(article: &InlineArticle) -> InlineQueryResult {
    InlineQueryResult::Article(
        InlineQueryResultArticle::new(
            article.id.clone(),
            article.title.clone(),
            InputMessageContent::Text(InputMessageContentText::new(article.text.clone())),
        )
        .description(article.description.clone()),
    )
}
