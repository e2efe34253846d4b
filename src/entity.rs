//! Entity types for parsed chat exports.
//!
//! This module provides the strongly-shaped records every parser maps into:
//! [`TextEntity`], [`Media`], [`Message`], [`ServiceEvent`], [`Event`] and
//! [`Chat`]. Both export variants (JSON `result.json` and `messages*.html`)
//! produce the same types, so downstream code never cares where a record
//! came from.
//!
//! # Overview
//!
//! A chat is an ordered sequence of events. An event is either a regular
//! [`Message`] or a reduced [`ServiceEvent`] ("group created", "call
//! started", ...). A message carries at most one [`Media`] attachment;
//! the sum type makes that invariant hold by construction instead of
//! spreading twenty nullable fields across one struct.
//!
//! # Examples
//!
//! ```
//! use tgvault::{Media, Message};
//!
//! let msg = Message::new(1, "message", "2023-01-01T00:00:00", 1672531200, "Alice")
//!     .with_text("hi")
//!     .with_media(Media::Photo {
//!         path: "photos/photo_1@01-01-2023_00-00-00.jpg".into(),
//!         thumbnail: None,
//!         width: Some(640),
//!         height: Some(480),
//!     });
//!
//! assert_eq!(msg.media.as_ref().map(Media::kind), Some("photo"));
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One styled run of text inside a message.
///
/// Both fields are required at construction time; an export record missing
/// either fails the whole message with a malformed-record error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEntity {
    /// Style kind, e.g. `"plain"`, `"bold"`, `"link"`, `"mention"`.
    #[serde(rename = "type")]
    pub kind: String,

    /// The run's text content.
    pub text: String,
}

impl TextEntity {
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
        }
    }
}

impl std::fmt::Display for TextEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Type: {}, Text: {}", self.kind, self.text)
    }
}

/// A message's attachment payload, one variant per attachment kind.
///
/// A message carries at most one payload, which `Option<Media>` on
/// [`Message`] guarantees by construction. Six of the kinds come from the
/// HTML export's media containers; [`Media::File`] covers the JSON
/// export's generic file attachment.
///
/// Sub-fields are captured verbatim from the export. Paths are relative to
/// the backup root and can be resolved against the
/// [`Backup`](crate::Backup) inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Media {
    /// A voice/video call record.
    Call {
        #[serde(skip_serializing_if = "Option::is_none", default)]
        title: Option<String>,
        /// Call outcome text, e.g. duration or "Cancelled".
        #[serde(skip_serializing_if = "Option::is_none", default)]
        status: Option<String>,
    },

    /// A shared live location.
    LiveLocation {
        map_url: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        status: Option<String>,
    },

    /// A photo.
    Photo {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        thumbnail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        width: Option<i64>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        height: Option<i64>,
    },

    /// A round video message.
    RoundVideo {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        thumbnail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        status: Option<String>,
    },

    /// A video file.
    VideoFile {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        thumbnail: Option<String>,
        /// Display duration from the HTML export, e.g. `"0:12"`.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        duration: Option<String>,
        /// Duration in seconds from the JSON export.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        duration_secs: Option<i64>,
    },

    /// A voice message.
    Voice {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        title: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        status: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        duration_secs: Option<i64>,
    },

    /// A generic file attachment (JSON export only).
    File {
        path: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        mime_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        thumbnail: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        duration_secs: Option<i64>,
    },
}

impl Media {
    /// Returns the attachment kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Media::Call { .. } => "call",
            Media::LiveLocation { .. } => "live_location",
            Media::Photo { .. } => "photo",
            Media::RoundVideo { .. } => "round_video",
            Media::VideoFile { .. } => "video_file",
            Media::Voice { .. } => "voice",
            Media::File { .. } => "file",
        }
    }

    /// Returns the on-disk media path, if this kind has one.
    ///
    /// Calls have no file behind them; live locations point at a map URL
    /// rather than a local file.
    pub fn path(&self) -> Option<&str> {
        match self {
            Media::Call { .. } | Media::LiveLocation { .. } => None,
            Media::Photo { path, .. }
            | Media::RoundVideo { path, .. }
            | Media::VideoFile { path, .. }
            | Media::Voice { path, .. }
            | Media::File { path, .. } => Some(path),
        }
    }
}

/// One regular message in a conversation.
///
/// Required header fields are always present; everything else is absent
/// unless the source record carried it. `from_id` is required by the JSON
/// export and absent from the HTML one; `initials` is the other way
/// around. Each parser enforces its own variant's required set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Message ID within the chat.
    pub id: i64,

    /// Record kind as declared by the export, normally `"message"`.
    pub kind: String,

    /// Export-native timestamp string.
    pub date: String,

    /// Unix timestamp in seconds.
    pub date_unixtime: i64,

    /// Formatted display time, e.g. `"21:50"` (HTML export).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub time: Option<String>,

    /// Sender display name.
    pub from: String,

    /// Sender identifier (JSON export).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from_id: Option<String>,

    /// Sender avatar initials (HTML export).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub initials: Option<String>,

    /// ID of the message this one replies to.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reply_to: Option<i64>,

    /// Free-text body, unset when the message has no text.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub text: Option<String>,

    /// The attachment payload, at most one per message.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub media: Option<Media>,

    /// Edit timestamp string (JSON export).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub edited: Option<String>,

    /// Edit unix timestamp (JSON export).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub edited_unixtime: Option<i64>,

    /// Styled text runs, in declared order. Possibly empty.
    #[serde(default)]
    pub text_entities: Vec<TextEntity>,
}

impl Message {
    /// Creates a message with only the required header fields set.
    pub fn new(
        id: i64,
        kind: impl Into<String>,
        date: impl Into<String>,
        date_unixtime: i64,
        from: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            date: date.into(),
            date_unixtime,
            time: None,
            from: from.into(),
            from_id: None,
            initials: None,
            reply_to: None,
            text: None,
            media: None,
            edited: None,
            edited_unixtime: None,
            text_entities: Vec::new(),
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    #[must_use]
    pub fn with_from_id(mut self, from_id: impl Into<String>) -> Self {
        self.from_id = Some(from_id.into());
        self
    }

    #[must_use]
    pub fn with_initials(mut self, initials: impl Into<String>) -> Self {
        self.initials = Some(initials.into());
        self
    }

    #[must_use]
    pub fn with_reply_to(mut self, reply_id: i64) -> Self {
        self.reply_to = Some(reply_id);
        self
    }

    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_media(mut self, media: Media) -> Self {
        self.media = Some(media);
        self
    }

    #[must_use]
    pub fn with_text_entities(mut self, entities: Vec<TextEntity>) -> Self {
        self.text_entities = entities;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the message time as a [`DateTime<Utc>`], if the unix
    /// timestamp is representable.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date_unixtime, 0)
    }

    /// Returns `true` if this message carries an attachment payload.
    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }
}

impl std::fmt::Display for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ID: {}, Type: {}, Date: {}, From: {}, Text: {}",
            self.id,
            self.kind,
            self.date,
            self.from,
            self.text.as_deref().unwrap_or("")
        )?;
        if let Some(media) = &self.media {
            write!(f, ", Media: {}", media.kind())?;
        }
        Ok(())
    }
}

/// A service/system event recorded alongside regular messages.
///
/// Reduced extraction: only `id` and `details` are required, the rest is
/// captured when the source record has it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEvent {
    pub id: i64,

    /// Human-readable event description: the JSON `action` or the HTML
    /// `body details` text.
    pub details: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actor: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actor_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub date_unixtime: Option<i64>,
}

impl ServiceEvent {
    pub fn new(id: i64, details: impl Into<String>) -> Self {
        Self {
            id,
            details: details.into(),
            actor: None,
            actor_id: None,
            date: None,
            date_unixtime: None,
        }
    }
}

impl std::fmt::Display for ServiceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Service message {}: {}", self.id, self.details)
    }
}

/// One mapped conversation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Event {
    Message(Message),
    Service(ServiceEvent),
}

impl Event {
    /// Returns the event's id regardless of kind.
    pub fn id(&self) -> i64 {
        match self {
            Event::Message(msg) => msg.id,
            Event::Service(svc) => svc.id,
        }
    }

    /// Returns the inner message, if this is a regular message.
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Event::Message(msg) => Some(msg),
            Event::Service(_) => None,
        }
    }

    /// Returns the inner service event, if this is one.
    pub fn as_service(&self) -> Option<&ServiceEvent> {
        match self {
            Event::Service(svc) => Some(svc),
            Event::Message(_) => None,
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Event::Message(msg) => msg.fmt(f),
            Event::Service(svc) => svc.fmt(f),
        }
    }
}

/// One whole conversation.
///
/// `messages` keeps the export's declared order verbatim; the mapper never
/// reorders or deduplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub name: String,

    /// Chat kind, e.g. `"personal_chat"`.
    pub kind: String,

    pub id: String,

    pub messages: Vec<Event>,
}

impl std::fmt::Display for Chat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Name: {}, Type: {}, ID: {}, Number of Messages: {}",
            self.name,
            self.kind,
            self.id,
            self.messages.len()
        )
    }
}
