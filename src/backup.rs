//! On-disk backup inventory.
//!
//! A Telegram export folder has a fixed layout:
//!
//! ```text
//! ChatExport_2023-06-28/
//! ├── result.json
//! ├── files/
//! ├── photos/
//! ├── video_files/
//! └── voice_messages/
//! ```
//!
//! [`Backup::load`] scans the four media subdirectories and parses the
//! chat-data file into one bundle. Thumbnail pairing is name-derived
//! only: a media file's thumbnail is the sibling whose name is the file
//! name plus the fixed `_thumb.jpg` suffix. File contents are never
//! inspected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::entity::Chat;
use crate::error::{Result, TgvaultError};
use crate::parsers::json;

/// Name suffix that pairs a media file with its thumbnail.
pub const THUMBNAIL_SUFFIX: &str = "_thumb.jpg";

/// Fixed name of the chat-data file inside a backup root.
pub const CHAT_DATA_FILE: &str = "result.json";

/// The four media subdirectories every backup root carries.
pub const MEDIA_DIRS: [&str; 4] = ["files", "photos", "video_files", "voice_messages"];

/// One discovered media file, possibly paired with a thumbnail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFile {
    pub file_name: String,

    /// Name of the sibling thumbnail, when one exists.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub thumbnail_name: Option<String>,
}

/// The full parsed bundle for one export folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub files: Vec<MediaFile>,
    pub photos: Vec<MediaFile>,
    pub video_files: Vec<MediaFile>,
    pub voice_messages: Vec<MediaFile>,
    pub chat: Chat,
}

impl Backup {
    /// Loads one backup folder: scans every media subdirectory and
    /// parses the chat-data file.
    ///
    /// Fails with a directory-not-found error when the root or any of
    /// the four subdirectories is missing; no partial bundle is ever
    /// returned.
    pub fn load(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(TgvaultError::directory_not_found(root));
        }

        let files = scan_media_dir(&root.join("files"))?;
        let photos = scan_media_dir(&root.join("photos"))?;
        let video_files = scan_media_dir(&root.join("video_files"))?;
        let voice_messages = scan_media_dir(&root.join("voice_messages"))?;

        let chat = json::parse_chat_file(&root.join(CHAT_DATA_FILE))?;

        Ok(Backup {
            files,
            photos,
            video_files,
            voice_messages,
            chat,
        })
    }

    /// Total count of discovered media files across all four groups.
    pub fn media_count(&self) -> usize {
        self.files.len() + self.photos.len() + self.video_files.len() + self.voice_messages.len()
    }
}

/// Scans the immediate files of one media directory, pairing thumbnails.
///
/// Single-level scan: directories are excluded and never recursed into.
/// Names ending in the thumbnail suffix are thumbnails themselves and are
/// not listed as primaries. The result is sorted by name so repeated
/// scans of the same directory are deterministic.
pub fn scan_media_dir(dir: &Path) -> Result<Vec<MediaFile>> {
    if !dir.is_dir() {
        return Err(TgvaultError::directory_not_found(dir));
    }

    let mut media = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.ends_with(THUMBNAIL_SUFFIX) {
            continue;
        }

        let candidate = format!("{name}{THUMBNAIL_SUFFIX}");
        let thumbnail_name = dir.join(&candidate).is_file().then_some(candidate);

        media.push(MediaFile {
            file_name: name.to_string(),
            thumbnail_name,
        });
    }

    media.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(media)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn test_scan_pairs_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("photo1.jpg"));
        touch(&dir.path().join("photo1.jpg_thumb.jpg"));

        let media = scan_media_dir(dir.path()).unwrap();
        assert_eq!(
            media,
            vec![MediaFile {
                file_name: "photo1.jpg".into(),
                thumbnail_name: Some("photo1.jpg_thumb.jpg".into()),
            }]
        );
    }

    #[test]
    fn test_scan_without_thumbnail() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("photo2.jpg"));

        let media = scan_media_dir(dir.path()).unwrap();
        assert_eq!(
            media,
            vec![MediaFile {
                file_name: "photo2.jpg".into(),
                thumbnail_name: None,
            }]
        );
    }

    #[test]
    fn test_scan_skips_directories() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("voice.ogg"));
        fs::create_dir(dir.path().join("nested")).unwrap();

        let media = scan_media_dir(dir.path()).unwrap();
        assert_eq!(media.len(), 1);
        assert_eq!(media[0].file_name, "voice.ogg");
    }

    #[test]
    fn test_scan_sorted_by_name() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["c.jpg", "a.jpg", "b.jpg"] {
            touch(&dir.path().join(name));
        }
        let names: Vec<_> = scan_media_dir(dir.path())
            .unwrap()
            .into_iter()
            .map(|m| m.file_name)
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.jpg", "c.jpg"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let err = scan_media_dir(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.is_directory_not_found());
    }

    #[test]
    fn test_load_missing_subdirectory_fails() {
        let root = tempfile::tempdir().unwrap();
        // Everything except photos/.
        for dir in ["files", "video_files", "voice_messages"] {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        fs::write(
            root.path().join(CHAT_DATA_FILE),
            r#"{"name": "t", "type": "personal_chat", "id": 1, "messages": []}"#,
        )
        .unwrap();

        let err = Backup::load(root.path()).unwrap_err();
        assert!(err.is_directory_not_found());
        assert!(err.to_string().contains("photos"));
    }

    #[test]
    fn test_load_full_backup() {
        let root = tempfile::tempdir().unwrap();
        for dir in MEDIA_DIRS {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        touch(&root.path().join("photos/photo_1.jpg"));
        touch(&root.path().join("photos/photo_1.jpg_thumb.jpg"));
        touch(&root.path().join("voice_messages/audio_1.ogg"));
        fs::write(
            root.path().join(CHAT_DATA_FILE),
            r#"{"name": "t", "type": "personal_chat", "id": 1, "messages": []}"#,
        )
        .unwrap();

        let backup = Backup::load(root.path()).unwrap();
        assert_eq!(backup.chat.name, "t");
        assert_eq!(backup.media_count(), 2);
        assert_eq!(backup.photos[0].thumbnail_name.as_deref(), Some("photo_1.jpg_thumb.jpg"));
        assert!(backup.files.is_empty());
        assert_eq!(backup.voice_messages[0].thumbnail_name, None);
    }

    #[test]
    fn test_load_malformed_chat_file_fails() {
        let root = tempfile::tempdir().unwrap();
        for dir in MEDIA_DIRS {
            fs::create_dir(root.path().join(dir)).unwrap();
        }
        fs::write(root.path().join(CHAT_DATA_FILE), r#"{"type": "x"}"#).unwrap();

        let err = Backup::load(root.path()).unwrap_err();
        assert!(err.is_malformed());
    }
}
