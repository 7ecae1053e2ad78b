//! Shared fixtures for unit tests: Telegram update payloads and an outbox
//! that records actions instead of calling the Bot API.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use teloxide::types::Update;
use teloxide::{ApiError, RequestError};

use crate::dispatch::Outbox;
use crate::error::HandlerError;
use crate::platform::OutboundAction;

#[derive(Default)]
pub struct RecordingOutbox {
    actions: Mutex<Vec<OutboundAction>>,
    fail: bool,
}

impl RecordingOutbox {
    /// An outbox whose every delivery is refused by the Bot API.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn actions(&self) -> Vec<OutboundAction> {
        self.actions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn execute(&self, _update: &Update, action: &OutboundAction) -> Result<(), HandlerError> {
        if self.fail {
            return Err(HandlerError::Request(RequestError::Api(ApiError::BotBlocked)));
        }
        self.actions.lock().unwrap().push(action.clone());
        Ok(())
    }
}

fn user(first_name: &str, last_name: Option<&str>) -> Value {
    let mut user = json!({
        "id": 42,
        "is_bot": false,
        "first_name": first_name,
        "username": first_name.to_lowercase(),
    });
    if let Some(last) = last_name {
        user["last_name"] = json!(last);
    }
    user
}

fn message(extra: Value) -> Value {
    let mut msg = json!({
        "message_id": 100,
        "date": 1_700_000_000,
        "chat": { "id": 42, "type": "private", "first_name": "Ann" },
        "from": user("Ann", None),
    });
    if let (Some(msg), Some(extra)) = (msg.as_object_mut(), extra.as_object()) {
        for (k, v) in extra {
            msg.insert(k.clone(), v.clone());
        }
    }
    msg
}

fn update(id: u32, kind: &str, payload: Value) -> Update {
    let mut raw = json!({ "update_id": id });
    raw[kind] = payload;
    // from_value leaves teloxide's Update as UpdateKind::Error; parse from text
    serde_json::from_str(&raw.to_string()).expect("fixture is a valid update")
}

pub fn message_update(id: u32, first_name: &str, last_name: Option<&str>, text: &str) -> Update {
    update(
        id,
        "message",
        message(json!({ "from": user(first_name, last_name), "text": text })),
    )
}

pub fn photo_update(id: u32, caption: &str) -> Update {
    update(
        id,
        "message",
        message(json!({
            "caption": caption,
            "photo": [
                { "file_id": "photo-small", "file_unique_id": "u1", "width": 90, "height": 90, "file_size": 1000 },
                { "file_id": "photo-large", "file_unique_id": "u2", "width": 800, "height": 800, "file_size": 90000 }
            ]
        })),
    )
}

pub fn sticker_update(id: u32) -> Update {
    update(
        id,
        "message",
        message(json!({
            "sticker": {
                "file_id": "sticker-1",
                "file_unique_id": "s1",
                "type": "regular",
                "width": 512,
                "height": 512,
                "is_animated": false,
                "is_video": false,
                "emoji": "😀",
                "set_name": "HappyPack",
                "file_size": 4000
            }
        })),
    )
}

pub fn document_update(id: u32) -> Update {
    update(
        id,
        "message",
        message(json!({
            "document": {
                "file_id": "doc-1",
                "file_unique_id": "d1",
                "file_name": "report.pdf",
                "mime_type": "application/pdf",
                "file_size": 2048
            }
        })),
    )
}

pub fn callback_update(id: u32, data: &str) -> Update {
    update(
        id,
        "callback_query",
        json!({
            "id": "cb-1",
            "from": user("Ann", None),
            "chat_instance": "ci-1",
            "data": data,
            "message": message(json!({ "text": "⚙️ Settings" })),
        }),
    )
}

pub fn inline_update(id: u32, query: &str) -> Update {
    update(
        id,
        "inline_query",
        json!({
            "id": "iq-1",
            "from": user("Ann", None),
            "query": query,
            "offset": "",
        }),
    )
}

/// Raw JSON body for a `/start` message, as Telegram would POST it.
pub fn start_body(first_name: &str, last_name: &str) -> String {
    json!({
        "update_id": 900,
        "message": message(json!({ "from": user(first_name, Some(last_name)), "text": "/start" })),
    })
    .to_string()
}
