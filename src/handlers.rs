use crate::dispatch::{
    CallbackId, Classifier, Command, ContentKind, DispatchTable, Handler, HandlerContext,
};
use crate::error::{ConfigError, HandlerError};
use crate::platform::{
    Button, Content, InboundEvent, InlineArticle, Keyboard, OutboundAction, Reply, Sender,
};

type HandlerResult = Result<Option<OutboundAction>, HandlerError>;

const HELP_TEXT: &str = "*Commands*\n\
    /start - Start the bot\n\
    /help - Show this help\n\
    /settings - Open settings\n\n\
    *Tips*\n\
    - Send me text, photos, stickers, or documents.\n\
    - I'll respond based on message type and content.";

pub const INLINE_RESULT_ID: &str = "echo-1";

/// Every route the bot serves, one handler per classifier.
pub fn routes() -> [(Classifier, Handler); 11] {
    [
        (Classifier::Command(Command::Start), on_start),
        (Classifier::Command(Command::Help), on_help),
        (Classifier::Command(Command::Settings), on_settings),
        (Classifier::Content(ContentKind::Text), on_text),
        (Classifier::Content(ContentKind::Photo), on_photo),
        (Classifier::Content(ContentKind::Sticker), on_sticker),
        (Classifier::Content(ContentKind::Document), on_document),
        (Classifier::Content(ContentKind::InlineQuery), on_inline_query),
        (Classifier::Callback(CallbackId::About), on_about),
        (Classifier::Callback(CallbackId::NotifyToggle), on_notify_toggle),
        (Classifier::Callback(CallbackId::Language), on_language),
    ]
}

pub fn dispatch_table() -> Result<DispatchTable, ConfigError> {
    routes()
        .into_iter()
        .fold(DispatchTable::builder(), |builder, (classifier, handler)| {
            builder.on(classifier, handler)
        })
        .build()
}

/// First and last name, else `@username`, else a generic "there".
pub fn display_name(sender: Option<&Sender>) -> String {
    let Some(user) = sender else {
        return "there".to_string();
    };
    let last = user.last_name.as_deref().unwrap_or_default();
    if !user.first_name.is_empty() || !last.is_empty() {
        return format!("{} {}", user.first_name, last).trim().to_string();
    }
    match user.username.as_deref() {
        Some(username) if !username.is_empty() => format!("@{username}"),
        _ => "there".to_string(),
    }
}

pub fn settings_keyboard() -> Keyboard {
    let button = |label: &str, callback| {
        vec![Button {
            label: label.to_string(),
            callback,
        }]
    };
    Keyboard {
        rows: vec![
            button("ℹ️ About", CallbackId::About),
            button("🔔 Toggle notifications", CallbackId::NotifyToggle),
            button("🌐 Language", CallbackId::Language),
        ],
    }
}

fn send(reply: Reply) -> HandlerResult {
    Ok(Some(OutboundAction::Send(reply)))
}

// ── Commands ──────────────────────────────────────────────────────────────────

pub fn on_start(event: &InboundEvent, ctx: &HandlerContext) -> HandlerResult {
    let mut text = format!(
        "*Welcome, {}!* 👋\n\nUse /help to see available commands.\n_Time:_ `{}`",
        display_name(event.sender.as_ref()),
        ctx.timestamp()
    );
    if event.sender.as_ref().is_some_and(|s| ctx.is_admin(s.id)) {
        text.push_str("\n_You are the configured admin._");
    }
    send(Reply::markdown(text))
}

pub fn on_help(_event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    send(Reply::markdown(HELP_TEXT))
}

pub fn on_settings(_event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    send(Reply::markdown("⚙️ Settings").with_keyboard(settings_keyboard()))
}

// ── Content types ─────────────────────────────────────────────────────────────

/// Empty, then greeting, then "time", then echo. First match wins.
pub fn on_text(event: &InboundEvent, ctx: &HandlerContext) -> HandlerResult {
    let Content::Text(raw) = &event.content else {
        return Err(HandlerError::UnexpectedContent(Classifier::Content(ContentKind::Text)));
    };
    let text = raw.trim();

    if text.is_empty() {
        return Ok(None);
    }
    if text.eq_ignore_ascii_case("hi") || text.eq_ignore_ascii_case("hello") {
        return send(Reply::plain("👋 Hello! Type /help for options."));
    }
    if text.to_lowercase().contains("time") {
        return send(Reply::plain(format!("⏰ Current time: {}", ctx.timestamp())));
    }
    send(Reply::markdown(format!("You said:\n```\n{text}\n```")))
}

pub fn on_photo(event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    let Content::Photo { file_id, caption } = &event.content else {
        return Err(HandlerError::UnexpectedContent(Classifier::Content(ContentKind::Photo)));
    };
    send(Reply::plain(format!(
        "📷 Nice photo! (fileID: {file_id})\nCaption: {caption}"
    )))
}

pub fn on_sticker(event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    let Content::Sticker { emoji, set_name } = &event.content else {
        return Err(HandlerError::UnexpectedContent(Classifier::Content(ContentKind::Sticker)));
    };
    send(Reply::plain(format!(
        "😄 Cool sticker! (emoji: {emoji}, set: {set_name})"
    )))
}

pub fn on_document(event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    let Content::Document {
        file_name,
        file_size,
    } = &event.content
    else {
        return Err(HandlerError::UnexpectedContent(Classifier::Content(ContentKind::Document)));
    };
    send(Reply::plain(format!(
        "📄 Got a document: {file_name} ({file_size} bytes)"
    )))
}

pub fn on_inline_query(event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    let Content::InlineQuery(query) = &event.content else {
        return Err(HandlerError::UnexpectedContent(Classifier::Content(ContentKind::InlineQuery)));
    };
    let Some(query) = query else {
        return Ok(None);
    };
    Ok(Some(OutboundAction::AnswerInline {
        results: vec![InlineArticle {
            id: INLINE_RESULT_ID.to_string(),
            title: "Echo".to_string(),
            description: "Echo back your query".to_string(),
            text: format!("You typed: {}", query.text),
        }],
        cache_time: 1,
    }))
}

// ── Settings keyboard callbacks ───────────────────────────────────────────────

pub fn on_about(_event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    Ok(Some(OutboundAction::AnswerCallback {
        text: "Telegram bot starter powered by teloxide.".to_string(),
    }))
}

// Demo only: nothing is toggled or stored.
pub fn on_notify_toggle(_event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    Ok(Some(OutboundAction::Edit {
        text: "🔔 Notifications toggled (demo).".to_string(),
    }))
}

pub fn on_language(_event: &InboundEvent, _ctx: &HandlerContext) -> HandlerResult {
    Ok(Some(OutboundAction::Edit {
        text: "🌐 Language settings (demo).".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::platform::{InlineQuery, TextFormat};

    fn ctx() -> HandlerContext {
        HandlerContext {
            now: DateTime::parse_from_rfc3339("2025-01-02T03:04:05+00:00").unwrap(),
            admin_id: None,
        }
    }

    fn ann(last: Option<&str>) -> Sender {
        Sender {
            id: 1,
            first_name: "Ann".to_string(),
            last_name: last.map(str::to_string),
            username: Some("ann".to_string()),
        }
    }

    fn text_event(text: &str) -> InboundEvent {
        InboundEvent {
            sender: Some(ann(None)),
            content: Content::Text(text.to_string()),
        }
    }

    fn sent_text(result: HandlerResult) -> String {
        match result.unwrap() {
            Some(OutboundAction::Send(reply)) => reply.text,
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn test_display_name_variants() {
        assert_eq!(display_name(Some(&ann(Some("")))), "Ann");
        assert_eq!(display_name(Some(&ann(Some("Lee")))), "Ann Lee");

        let bob = Sender {
            id: 2,
            first_name: String::new(),
            last_name: None,
            username: Some("bob".to_string()),
        };
        assert_eq!(display_name(Some(&bob)), "@bob");

        let anonymous = Sender {
            username: None,
            ..bob
        };
        assert_eq!(display_name(Some(&anonymous)), "there");
        assert_eq!(display_name(None), "there");
    }

    #[test]
    fn test_start_greets_by_name_with_timestamp() {
        let event = InboundEvent {
            sender: Some(ann(Some("Lee"))),
            content: Content::Command(Command::Start),
        };
        let text = sent_text(on_start(&event, &ctx()));
        assert!(text.contains("Welcome, Ann Lee!"));
        assert!(text.contains("2025-01-02T03:04:05Z"));
    }

    #[test]
    fn test_start_marks_admin() {
        let event = InboundEvent {
            sender: Some(ann(None)),
            content: Content::Command(Command::Start),
        };
        let admin_ctx = HandlerContext {
            admin_id: Some(1),
            ..ctx()
        };
        assert!(sent_text(on_start(&event, &admin_ctx)).contains("configured admin"));
        assert!(!sent_text(on_start(&event, &ctx())).contains("configured admin"));
    }

    #[test]
    fn test_start_without_sender_uses_fallback() {
        let event = InboundEvent {
            sender: None,
            content: Content::Command(Command::Start),
        };
        assert!(sent_text(on_start(&event, &ctx())).contains("Welcome, there!"));
    }

    #[test]
    fn test_help_lists_commands_in_markdown() {
        let event = InboundEvent {
            sender: None,
            content: Content::Command(Command::Help),
        };
        match on_help(&event, &ctx()).unwrap() {
            Some(OutboundAction::Send(reply)) => {
                assert_eq!(reply.format, Some(TextFormat::Markdown));
                for command in Command::ALL {
                    assert!(reply.text.contains(&format!("/{}", command.name())));
                }
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn test_settings_attaches_three_button_keyboard() {
        let event = InboundEvent {
            sender: None,
            content: Content::Command(Command::Settings),
        };
        match on_settings(&event, &ctx()).unwrap() {
            Some(OutboundAction::Send(reply)) => {
                let keyboard = reply.keyboard.expect("keyboard attached");
                let callbacks: Vec<_> = keyboard.rows.iter().flatten().map(|b| b.callback).collect();
                assert_eq!(callbacks, CallbackId::ALL.to_vec());
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn test_text_empty_gives_no_reply() {
        assert_eq!(on_text(&text_event(""), &ctx()).unwrap(), None);
        assert_eq!(on_text(&text_event("  \n "), &ctx()).unwrap(), None);
    }

    #[test]
    fn test_text_greeting_is_case_insensitive() {
        for input in ["Hi", "HELLO", "  hello  "] {
            assert!(sent_text(on_text(&text_event(input), &ctx())).starts_with("👋 Hello!"));
        }
    }

    #[test]
    fn test_text_time_substring() {
        let reply = sent_text(on_text(&text_event("what TIME is it"), &ctx()));
        assert_eq!(reply, "⏰ Current time: 2025-01-02T03:04:05Z");
    }

    #[test]
    fn test_text_greeting_requires_whole_message() {
        // "hi, time?" is not a greeting, so the time branch answers
        let reply = sent_text(on_text(&text_event("hi, time?"), &ctx()));
        assert!(reply.starts_with("⏰"));
    }

    #[test]
    fn test_text_echo_in_code_block() {
        match on_text(&text_event("xyz"), &ctx()).unwrap() {
            Some(OutboundAction::Send(reply)) => {
                assert_eq!(reply.text, "You said:\n```\nxyz\n```");
                assert_eq!(reply.format, Some(TextFormat::Markdown));
            }
            other => panic!("expected send, got {other:?}"),
        }
    }

    #[test]
    fn test_text_handler_rejects_other_content() {
        let event = InboundEvent {
            sender: None,
            content: Content::Command(Command::Help),
        };
        assert!(matches!(
            on_text(&event, &ctx()),
            Err(HandlerError::UnexpectedContent(_))
        ));
    }

    #[test]
    fn test_media_replies() {
        let photo = InboundEvent {
            sender: None,
            content: Content::Photo {
                file_id: "AgAD".to_string(),
                caption: String::new(),
            },
        };
        assert_eq!(
            sent_text(on_photo(&photo, &ctx())),
            "📷 Nice photo! (fileID: AgAD)\nCaption: "
        );

        let sticker = InboundEvent {
            sender: None,
            content: Content::Sticker {
                emoji: "🔥".to_string(),
                set_name: "Flames".to_string(),
            },
        };
        assert_eq!(
            sent_text(on_sticker(&sticker, &ctx())),
            "😄 Cool sticker! (emoji: 🔥, set: Flames)"
        );

        let doc = InboundEvent {
            sender: None,
            content: Content::Document {
                file_name: "a.txt".to_string(),
                file_size: 12,
            },
        };
        assert_eq!(
            sent_text(on_document(&doc, &ctx())),
            "📄 Got a document: a.txt (12 bytes)"
        );
    }

    #[test]
    fn test_inline_query_without_query_is_noop() {
        let event = InboundEvent {
            sender: None,
            content: Content::InlineQuery(None),
        };
        assert_eq!(on_inline_query(&event, &ctx()).unwrap(), None);
    }

    #[test]
    fn test_inline_query_echoes_single_result() {
        let event = InboundEvent {
            sender: Some(ann(None)),
            content: Content::InlineQuery(Some(InlineQuery {
                text: "foo".to_string(),
            })),
        };
        match on_inline_query(&event, &ctx()).unwrap() {
            Some(OutboundAction::AnswerInline {
                results,
                cache_time,
            }) => {
                assert_eq!(results.len(), 1);
                assert_eq!(results[0].id, INLINE_RESULT_ID);
                assert!(results[0].text.contains("foo"));
                assert_eq!(cache_time, 1);
            }
            other => panic!("expected inline answer, got {other:?}"),
        }
    }

    #[test]
    fn test_callbacks() {
        let event = InboundEvent {
            sender: None,
            content: Content::Callback {
                data: "about".to_string(),
            },
        };
        assert!(matches!(
            on_about(&event, &ctx()).unwrap(),
            Some(OutboundAction::AnswerCallback { .. })
        ));
        assert_eq!(
            on_notify_toggle(&event, &ctx()).unwrap(),
            Some(OutboundAction::Edit {
                text: "🔔 Notifications toggled (demo).".to_string()
            })
        );
        assert_eq!(
            on_language(&event, &ctx()).unwrap(),
            Some(OutboundAction::Edit {
                text: "🌐 Language settings (demo).".to_string()
            })
        );
    }
}
