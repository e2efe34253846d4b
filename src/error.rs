//! Unified error types for tgvault.
//!
//! This module provides a single [`TgvaultError`] enum that covers all error
//! cases in the library, plus a crate-wide [`Result`] alias.
//!
//! # Error Handling Philosophy
//!
//! - **Library users** get typed errors they can match on
//! - **Application users** get clear, actionable error messages
//! - There are no retries and no partial records: a record either maps
//!   completely or the whole document fails

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A specialized [`Result`] type for tgvault operations.
///
/// # Example
///
/// ```rust
/// use tgvault::error::Result;
/// use tgvault::Chat;
///
/// fn my_function() -> Result<Vec<Chat>> {
///     // ... operations that may fail
///     Ok(vec![])
/// }
/// ```
pub type Result<T> = std::result::Result<T, TgvaultError>;

/// The error type for all tgvault operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TgvaultError {
    /// An I/O error occurred.
    ///
    /// This typically happens when:
    /// - A backup file doesn't exist
    /// - Permission denied while scanning a media directory
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON deserialization error.
    ///
    /// The chat-data file is not valid JSON at all. Structural problems
    /// in otherwise-valid JSON surface as [`MalformedRecord`](Self::MalformedRecord).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A required field is absent or the document shape is unrecognized.
    ///
    /// Always fatal to the record or document being built; missing
    /// required fields are never silently defaulted.
    #[error("Malformed export record: {context}")]
    MalformedRecord {
        /// What was expected and where it was missing
        context: String,
    },

    /// The backup root or one of its required subdirectories is missing.
    #[error("Directory not found: {}", path.display())]
    DirectoryNotFound {
        /// The path that was expected to be a directory
        path: PathBuf,
    },

    /// A media container was present but matched none of the known
    /// attachment kinds.
    ///
    /// Surfaced rather than dropped, so unrecognized export content is
    /// never silently turned into a bare message.
    #[error("Unsupported media attachment: {found}")]
    UnsupportedMedia {
        /// Description of the container content that failed every probe
        found: String,
    },
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl TgvaultError {
    /// Creates a malformed-record error.
    pub fn malformed(context: impl Into<String>) -> Self {
        TgvaultError::MalformedRecord {
            context: context.into(),
        }
    }

    /// Creates a malformed-record error for a missing required field.
    pub fn missing_field(field: &str, record: &str) -> Self {
        TgvaultError::MalformedRecord {
            context: format!("missing required field '{field}' in {record}"),
        }
    }

    /// Creates a directory-not-found error.
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        TgvaultError::DirectoryNotFound { path: path.into() }
    }

    /// Creates an unsupported-media error.
    pub fn unsupported_media(found: impl Into<String>) -> Self {
        TgvaultError::UnsupportedMedia {
            found: found.into(),
        }
    }

    /// Returns `true` if this is an IO error.
    pub fn is_io(&self) -> bool {
        matches!(self, TgvaultError::Io(_))
    }

    /// Returns `true` if this is a malformed-record error.
    pub fn is_malformed(&self) -> bool {
        matches!(self, TgvaultError::MalformedRecord { .. })
    }

    /// Returns `true` if this is a directory-not-found error.
    pub fn is_directory_not_found(&self) -> bool {
        matches!(self, TgvaultError::DirectoryNotFound { .. })
    }

    /// Returns `true` if this is an unsupported-media error.
    pub fn is_unsupported_media(&self) -> bool {
        matches!(self, TgvaultError::UnsupportedMedia { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
