//! # tgvault
//!
//! A Rust library for turning personal Telegram chat-export backups into
//! structured, queryable in-memory records.
//!
//! ## Overview
//!
//! A Telegram export folder bundles a chat-data document with the media
//! it references. tgvault maps the loosely-typed export records — JSON
//! objects with optional keys, or HTML nodes with optional children —
//! into strongly-shaped entities, and inventories the on-disk media
//! files with their name-derived thumbnails.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use tgvault::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let backup = Backup::load(Path::new("ChatExport_2023-06-28"))?;
//!
//!     println!("{}", backup.chat);
//!     for event in &backup.chat.messages {
//!         println!("{event}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - [`entity`] — entity types ([`Chat`], [`Message`], [`Media`],
//!   [`TextEntity`], ...)
//! - [`parsers`] — the JSON and HTML export-variant parsers
//! - [`backup`] — on-disk inventory ([`Backup`], [`MediaFile`])
//! - [`error`] — unified error types ([`TgvaultError`], [`Result`])
//! - [`cli`] — CLI argument types (feature `cli`)
//! - [`prelude`] — convenient re-exports
//!
//! ## Guarantees
//!
//! - Message order is preserved verbatim, never reordered or deduplicated
//! - A message carries at most one attachment payload, by construction
//! - Records map completely or the whole document fails; required fields
//!   are never silently defaulted

pub mod backup;
#[cfg(feature = "cli")]
pub mod cli;
pub mod entity;
pub mod error;
pub mod parsers;

// Re-export the main types at the crate root for convenience
pub use backup::{Backup, MediaFile};
pub use entity::{Chat, Event, Media, Message, ServiceEvent, TextEntity};
pub use error::{Result, TgvaultError};

/// Convenient re-exports for common usage.
///
/// ```rust
/// use tgvault::prelude::*;
/// ```
pub mod prelude {
    pub use crate::backup::{Backup, MediaFile, scan_media_dir};
    pub use crate::entity::{Chat, Event, Media, Message, ServiceEvent, TextEntity};
    pub use crate::error::{Result, TgvaultError};
    #[cfg(feature = "html")]
    pub use crate::parsers::html;
    pub use crate::parsers::json;
}
