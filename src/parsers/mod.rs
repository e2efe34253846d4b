//! Export-variant parsers.
//!
//! Telegram Desktop writes two export flavors and both map into the same
//! entity types:
//!
//! - [`json`] — the machine-readable `result.json` document
//! - [`html`] — the browsable `messages*.html` documents (feature `html`)

#[cfg(feature = "html")]
pub mod html;
pub mod json;
