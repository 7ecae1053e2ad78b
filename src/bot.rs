use async_trait::async_trait;
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::types::{Update, UpdateKind};
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::dispatch::{Command, Outbox};
use crate::error::{HandlerError, InitError};
use crate::platform::{telegram, OutboundAction};

/// An authenticated client for the Telegram Bot API
pub struct Session {
    bot: Bot,
    username: String,
}

impl Session {
    /// Verify the token, then publish the command menu. Publishing is
    /// best-effort; a failure there is only logged.
    pub async fn create(config: &RunConfig) -> Result<Self, InitError> {
        let bot = Bot::new(&config.token);

        let me = bot.get_me().await.map_err(InitError::VerifyToken)?;
        let username = me.user.username.clone().unwrap_or_default();
        info!("Authorized as @{} ({})", username, me.user.id);

        if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
            warn!("SetCommands warning: {}", e);
        }

        Ok(Self { bot, username })
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Send a one-line notice to the configured admin. Failures are logged.
    pub async fn notify_admin(&self, admin_id: i64, text: &str) {
        if let Err(e) = self.bot.send_message(ChatId(admin_id), text).await {
            warn!("Failed to notify admin {}: {}", admin_id, e);
        }
    }
}

#[async_trait]
impl Outbox for Session {
    async fn execute(&self, update: &Update, action: &OutboundAction) -> Result<(), HandlerError> {
        match action {
            OutboundAction::Send(reply) => {
                let chat = update.chat().ok_or(HandlerError::NoChat)?;
                let mut request = self.bot.send_message(chat.id, reply.text.clone());
                if let Some(format) = reply.format {
                    request = request.parse_mode(telegram::parse_mode(format));
                }
                if let Some(keyboard) = &reply.keyboard {
                    request = request.reply_markup(telegram::inline_keyboard(keyboard));
                }
                request.await?;
            }
            OutboundAction::Edit { text } => {
                let UpdateKind::CallbackQuery(q) = &update.kind else {
                    return Err(HandlerError::NotCallbackQuery);
                };
                let msg = q.regular_message().ok_or(HandlerError::NoMessage)?;
                self.bot
                    .edit_message_text(msg.chat.id, msg.id, text.clone())
                    .await?;
            }
            OutboundAction::AnswerCallback { text } => {
                let UpdateKind::CallbackQuery(q) = &update.kind else {
                    return Err(HandlerError::NotCallbackQuery);
                };
                self.bot
                    .answer_callback_query(q.id.clone())
                    .text(text.clone())
                    .await?;
            }
            OutboundAction::AnswerInline {
                results,
                cache_time,
            } => {
                let UpdateKind::InlineQuery(q) = &update.kind else {
                    return Err(HandlerError::NotInlineQuery);
                };
                self.bot
                    .answer_inline_query(q.id.clone(), results.iter().map(telegram::inline_result))
                    .cache_time(*cache_time)
                    .await?;
            }
        }
        Ok(())
    }
}
