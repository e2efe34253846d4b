//! Telegram JSON export parser (`result.json`).
//!
//! Telegram Desktop exports a chat as a single JSON object:
//!
//! ```json
//! {
//!   "name": "Chat Name",
//!   "type": "personal_chat",
//!   "id": 123456789,
//!   "messages": [
//!     {
//!       "id": 1,
//!       "type": "message",
//!       "date": "2023-01-01T00:00:00",
//!       "date_unixtime": "1672531200",
//!       "from": "Alice",
//!       "from_id": "user1",
//!       "text": "hi" | ["hi ", {"type": "link", "text": "url"}],
//!       "text_entities": [{"type": "plain", "text": "hi"}]
//!     }
//!   ]
//! }
//! ```
//!
//! Deserialization happens in two steps: serde fills loosely-typed raw
//! structs where every key is optional, then the mapping functions below
//! enforce the per-kind required sets and fail with a malformed-record
//! error when a genuine message node is missing one. One malformed record
//! fails the whole chat; there is no partial-result recovery.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::entity::{Chat, Event, Media, Message, ServiceEvent, TextEntity};
use crate::error::{Result, TgvaultError};

// Internal structures for deserializing the raw export

#[derive(Debug, Deserialize)]
struct RawChat {
    name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    id: Option<Value>,
    messages: Option<Vec<RawMessage>>,
}

/// One raw message record. Every key is optional here; required-ness is
/// decided per record kind during mapping.
#[derive(Debug, Deserialize)]
struct RawMessage {
    id: Option<i64>,
    #[serde(rename = "type")]
    kind: Option<String>,
    date: Option<String>,
    /// Unix timestamp, encoded as a string by the export
    date_unixtime: Option<String>,
    from: Option<String>,
    from_id: Option<String>,
    /// Service-record fields
    actor: Option<String>,
    actor_id: Option<String>,
    action: Option<String>,
    /// String or array of strings/spans
    text: Option<Value>,
    text_entities: Option<Vec<RawTextEntity>>,
    reply_to_message_id: Option<i64>,
    edited: Option<String>,
    edited_unixtime: Option<String>,
    /// Photo attachment fields
    photo: Option<String>,
    width: Option<i64>,
    height: Option<i64>,
    /// File attachment fields
    file: Option<String>,
    mime_type: Option<String>,
    media_type: Option<String>,
    thumbnail: Option<String>,
    duration_seconds: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawTextEntity {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

/// Reads and parses a `result.json` chat-data file.
pub fn parse_chat_file(path: &Path) -> Result<Chat> {
    let content = fs::read_to_string(path)?;
    parse_chat(&content)
}

/// Parses a whole JSON export document into a [`Chat`].
///
/// Requires the top-level `name`, `type`, `id` and `messages` keys and
/// maps every message record in declared order.
pub fn parse_chat(content: &str) -> Result<Chat> {
    let raw: RawChat = serde_json::from_str(content)?;

    let name = raw
        .name
        .ok_or_else(|| TgvaultError::missing_field("name", "chat document"))?;
    let kind = raw
        .kind
        .ok_or_else(|| TgvaultError::missing_field("type", "chat document"))?;
    let id = raw
        .id
        .ok_or_else(|| TgvaultError::missing_field("id", "chat document"))?;
    let raw_messages = raw
        .messages
        .ok_or_else(|| TgvaultError::missing_field("messages", "chat document"))?;

    // The export writes the chat id as a bare number.
    let id = match id {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        other => {
            return Err(TgvaultError::malformed(format!(
                "chat id is neither string nor number: {other}"
            )));
        }
    };

    let messages = raw_messages
        .into_iter()
        .map(map_event)
        .collect::<Result<Vec<Event>>>()?;

    Ok(Chat {
        name,
        kind,
        id,
        messages,
    })
}

/// Maps one raw record, dispatching on its declared `type`.
fn map_event(raw: RawMessage) -> Result<Event> {
    let kind = raw
        .kind
        .as_deref()
        .ok_or_else(|| TgvaultError::missing_field("type", "message record"))?;

    if kind == "service" {
        map_service(raw).map(Event::Service)
    } else {
        map_message(raw).map(Event::Message)
    }
}

/// Maps a regular message record.
fn map_message(raw: RawMessage) -> Result<Message> {
    let id = raw
        .id
        .ok_or_else(|| TgvaultError::missing_field("id", "message record"))?;
    let record = format!("message {id}");

    // Borrow-only extractions first; required fields are moved out below.
    let media = resolve_media(&raw);

    // Optional body text; the export writes "" when there is none.
    let text = raw.text.as_ref().map(flatten_text).filter(|t| !t.is_empty());

    let date_unixtime = parse_unixtime(
        raw.date_unixtime
            .as_deref()
            .ok_or_else(|| TgvaultError::missing_field("date_unixtime", &record))?,
        &record,
    )?;

    let edited_unixtime = raw
        .edited_unixtime
        .as_deref()
        .map(|ts| parse_unixtime(ts, &record))
        .transpose()?;

    let kind = raw
        .kind
        .ok_or_else(|| TgvaultError::missing_field("type", &record))?;
    let date = raw
        .date
        .ok_or_else(|| TgvaultError::missing_field("date", &record))?;
    let from = raw
        .from
        .ok_or_else(|| TgvaultError::missing_field("from", &record))?;
    let from_id = raw
        .from_id
        .ok_or_else(|| TgvaultError::missing_field("from_id", &record))?;

    let text_entities = raw
        .text_entities
        .unwrap_or_default()
        .into_iter()
        .map(|entity| map_text_entity(entity, &record))
        .collect::<Result<Vec<TextEntity>>>()?;

    Ok(Message {
        id,
        kind,
        date,
        date_unixtime,
        time: None,
        from,
        from_id: Some(from_id),
        initials: None,
        reply_to: raw.reply_to_message_id,
        text,
        media,
        edited: raw.edited,
        edited_unixtime,
        text_entities,
    })
}

/// Maps a service record. Reduced extraction: only `id` and `action` are
/// required, the rest is captured when present.
fn map_service(raw: RawMessage) -> Result<ServiceEvent> {
    let id = raw
        .id
        .ok_or_else(|| TgvaultError::missing_field("id", "service record"))?;
    let record = format!("service record {id}");

    let details = raw
        .action
        .ok_or_else(|| TgvaultError::missing_field("action", &record))?;

    let date_unixtime = raw
        .date_unixtime
        .as_deref()
        .map(|ts| parse_unixtime(ts, &record))
        .transpose()?;

    Ok(ServiceEvent {
        id,
        details,
        actor: raw.actor,
        actor_id: raw.actor_id,
        date: raw.date,
        date_unixtime,
    })
}

/// Maps one styled-text run; both keys are required.
fn map_text_entity(raw: RawTextEntity, record: &str) -> Result<TextEntity> {
    let kind = raw
        .kind
        .ok_or_else(|| TgvaultError::missing_field("type", &format!("text entity of {record}")))?;
    let text = raw
        .text
        .ok_or_else(|| TgvaultError::missing_field("text", &format!("text entity of {record}")))?;
    Ok(TextEntity { kind, text })
}

/// Resolves the attachment payload by probing keys in a fixed order.
///
/// Probe order is a documented contract: `photo` first, then `file`
/// (refined by `media_type`). Genuine exports never carry both, but if a
/// record did, the first matching probe wins.
fn resolve_media(raw: &RawMessage) -> Option<Media> {
    if let Some(photo) = &raw.photo {
        return Some(Media::Photo {
            path: photo.clone(),
            thumbnail: raw.thumbnail.clone(),
            width: raw.width,
            height: raw.height,
        });
    }

    let file = raw.file.as_ref()?;
    let media = match raw.media_type.as_deref() {
        Some("video_message") => Media::RoundVideo {
            path: file.clone(),
            thumbnail: raw.thumbnail.clone(),
            title: None,
            status: None,
        },
        Some("video_file") => Media::VideoFile {
            path: file.clone(),
            thumbnail: raw.thumbnail.clone(),
            duration: None,
            duration_secs: raw.duration_seconds,
        },
        Some("voice_message") => Media::Voice {
            path: file.clone(),
            title: None,
            status: None,
            duration_secs: raw.duration_seconds,
        },
        _ => Media::File {
            path: file.clone(),
            mime_type: raw.mime_type.clone(),
            thumbnail: raw.thumbnail.clone(),
            duration_secs: raw.duration_seconds,
        },
    };
    Some(media)
}

/// Flattens Telegram's `text` value into plain text.
///
/// The field can be a simple string, or an array mixing bare strings with
/// `{"type": ..., "text": ...}` spans.
fn flatten_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(arr) => arr
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(obj) => obj
                    .get("text")
                    .and_then(|v| v.as_str())
                    .map(ToString::to_string),
                _ => None,
            })
            .collect::<String>(),
        _ => String::new(),
    }
}

fn parse_unixtime(value: &str, record: &str) -> Result<i64> {
    value.parse::<i64>().map_err(|_| {
        TgvaultError::malformed(format!("non-numeric unix timestamp '{value}' in {record}"))
    })
}
