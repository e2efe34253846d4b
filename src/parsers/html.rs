//! Telegram HTML export parser (`messages*.html`).
//!
//! The HTML export marks every conversation event with a `message` class
//! and sub-classifies it through space-separated class tokens: `service`
//! for system events, `joined` for join notices, plain otherwise.
//! Attachment data lives under a nested `media_wrap` element with one
//! kind-specific child per attachment.
//!
//! Media resolution probes the container in a fixed order — call, live
//! location, photo, round video, video file, voice message — and the
//! first matching probe wins. The order is a documented contract: the
//! probes themselves do not guarantee exclusivity, only well-formed
//! exports do. A `media_wrap` that matches no probe is surfaced as an
//! unsupported-media error rather than dropped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::DateTime;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

use crate::entity::{Event, Media, Message, ServiceEvent, TextEntity};
use crate::error::{Result, TgvaultError};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector")
}

static MESSAGE: LazyLock<Selector> = LazyLock::new(|| selector("div.message"));
static BODY: LazyLock<Selector> = LazyLock::new(|| selector("div.body"));
static BODY_DETAILS: LazyLock<Selector> = LazyLock::new(|| selector("div.body.details"));
static INITIALS: LazyLock<Selector> = LazyLock::new(|| selector("div.initials"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("div.date.details"));
static FROM_NAME: LazyLock<Selector> = LazyLock::new(|| selector("div.from_name"));
static REPLY_TO_LINK: LazyLock<Selector> = LazyLock::new(|| selector("div.reply_to a"));
static TEXT: LazyLock<Selector> = LazyLock::new(|| selector("div.text"));
static MEDIA_WRAP: LazyLock<Selector> = LazyLock::new(|| selector("div.media_wrap"));

static MEDIA_CALL: LazyLock<Selector> = LazyLock::new(|| selector("div.media_call"));
static MEDIA_LIVE_LOCATION: LazyLock<Selector> =
    LazyLock::new(|| selector("a.media_live_location"));
static PHOTO_WRAP: LazyLock<Selector> = LazyLock::new(|| selector("a.photo_wrap"));
static MEDIA_VIDEO: LazyLock<Selector> = LazyLock::new(|| selector("a.media_video"));
static VIDEO_FILE_WRAP: LazyLock<Selector> = LazyLock::new(|| selector("a.video_file_wrap"));
static MEDIA_VOICE: LazyLock<Selector> = LazyLock::new(|| selector("a.media_voice_message"));

static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("div.title"));
static STATUS: LazyLock<Selector> = LazyLock::new(|| selector("div.status"));
static IMG_PHOTO: LazyLock<Selector> = LazyLock::new(|| selector("img.photo"));
static IMG_THUMB: LazyLock<Selector> = LazyLock::new(|| selector("img.thumb"));
static IMG_VIDEO_FILE: LazyLock<Selector> = LazyLock::new(|| selector("img.video_file"));
static VIDEO_DURATION: LazyLock<Selector> = LazyLock::new(|| selector("div.video_duration"));

/// Reads and parses one `messages*.html` file.
pub fn parse_events_file(path: &Path) -> Result<Vec<Event>> {
    let content = fs::read_to_string(path)?;
    parse_events(&content)
}

/// Parses one HTML export document into its ordered event sequence.
///
/// Join notices are recognized and skipped without producing a record;
/// everything else maps completely or fails the whole document.
pub fn parse_events(html: &str) -> Result<Vec<Event>> {
    let document = Html::parse_document(html);
    let mut events = Vec::new();

    for element in document.select(&MESSAGE) {
        if has_class(element, "service") {
            events.push(Event::Service(map_service(element)?));
        } else if has_class(element, "joined") {
            // Join notices carry nothing the record model needs.
            continue;
        } else {
            events.push(Event::Message(map_message(element)?));
        }
    }

    Ok(events)
}

/// Lists the `messages*.html` files directly inside `dir`, sorted by name.
pub fn find_message_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(TgvaultError::directory_not_found(dir));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with("messages") && name.ends_with(".html") {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Maps one plain message element.
fn map_message(element: ElementRef<'_>) -> Result<Message> {
    let id = parse_message_id(element)?;
    let record = format!("message {id}");

    let body = element
        .select(&BODY)
        .next()
        .ok_or_else(|| TgvaultError::missing_field("body", &record))?;

    // Required header fields; the export guarantees these for genuine
    // message nodes.
    let initials = element
        .select(&INITIALS)
        .next()
        .map(|el| collapse_text(&el))
        .ok_or_else(|| TgvaultError::missing_field("initials", &record))?;

    let date_el = body
        .select(&DATE)
        .next()
        .ok_or_else(|| TgvaultError::missing_field("date details", &record))?;
    let date = date_el
        .value()
        .attr("title")
        .map(str::to_string)
        .ok_or_else(|| TgvaultError::missing_field("date title", &record))?;
    let date_unixtime = parse_export_date(&date, &record)?;
    // Formatted display time shown next to the message, e.g. "21:50".
    let time = collapse_text(&date_el);

    let from = body
        .select(&FROM_NAME)
        .next()
        .map(|el| collapse_text(&el))
        .ok_or_else(|| TgvaultError::missing_field("from_name", &record))?;

    // Optional fields.
    let reply_to = body
        .select(&REPLY_TO_LINK)
        .next()
        .and_then(|link| link.value().attr("href"))
        .and_then(|href| href.strip_prefix("#go_to_message"))
        .and_then(|id| id.parse::<i64>().ok());

    let text_el = body.select(&TEXT).next();
    let text = text_el
        .map(|el| collapse_text(&el))
        .filter(|t| !t.is_empty());

    let media = body
        .select(&MEDIA_WRAP)
        .next()
        .map(|wrap| resolve_media(wrap, &record))
        .transpose()?;

    let text_entities = text_el.map(extract_entities).unwrap_or_default();

    Ok(Message {
        id,
        kind: "message".to_string(),
        date,
        date_unixtime,
        time: Some(time),
        from,
        from_id: None,
        initials: Some(initials),
        reply_to,
        text,
        media,
        edited: None,
        edited_unixtime: None,
        text_entities,
    })
}

/// Maps one service element. Reduced extraction: id plus the
/// `body details` text, both required.
fn map_service(element: ElementRef<'_>) -> Result<ServiceEvent> {
    let id = parse_message_id(element)?;
    let record = format!("service message {id}");

    let details = element
        .select(&BODY_DETAILS)
        .next()
        .map(|el| collapse_text(&el))
        .ok_or_else(|| TgvaultError::missing_field("body details", &record))?;

    Ok(ServiceEvent::new(id, details))
}

/// Resolves the attachment payload by probing the container in a fixed
/// order. The first matching kind wins; a container matching none is an
/// unsupported-media error.
fn resolve_media(wrap: ElementRef<'_>, record: &str) -> Result<Media> {
    if let Some(call) = wrap.select(&MEDIA_CALL).next() {
        return Ok(Media::Call {
            title: child_text(call, &TITLE),
            status: child_text(call, &STATUS),
        });
    }

    if let Some(location) = wrap.select(&MEDIA_LIVE_LOCATION).next() {
        return Ok(Media::LiveLocation {
            map_url: required_attr(location, "href", record)?,
            title: child_text(location, &TITLE),
            status: child_text(location, &STATUS),
        });
    }

    if let Some(photo) = wrap.select(&PHOTO_WRAP).next() {
        let thumb = photo
            .select(&IMG_PHOTO)
            .next()
            .ok_or_else(|| TgvaultError::missing_field("photo img", record))?;
        return Ok(Media::Photo {
            path: required_attr(photo, "href", record)?,
            thumbnail: Some(required_attr(thumb, "src", record)?),
            width: None,
            height: None,
        });
    }

    if let Some(video) = wrap.select(&MEDIA_VIDEO).next() {
        let thumb = video
            .select(&IMG_THUMB)
            .next()
            .ok_or_else(|| TgvaultError::missing_field("thumb img", record))?;
        return Ok(Media::RoundVideo {
            path: required_attr(video, "href", record)?,
            thumbnail: Some(required_attr(thumb, "src", record)?),
            title: child_text(video, &TITLE),
            status: child_text(video, &STATUS),
        });
    }

    if let Some(video_file) = wrap.select(&VIDEO_FILE_WRAP).next() {
        let thumb = video_file
            .select(&IMG_VIDEO_FILE)
            .next()
            .ok_or_else(|| TgvaultError::missing_field("video_file img", record))?;
        return Ok(Media::VideoFile {
            path: required_attr(video_file, "href", record)?,
            thumbnail: Some(required_attr(thumb, "src", record)?),
            duration: child_text(video_file, &VIDEO_DURATION),
            duration_secs: None,
        });
    }

    if let Some(voice) = wrap.select(&MEDIA_VOICE).next() {
        return Ok(Media::Voice {
            path: required_attr(voice, "href", record)?,
            title: child_text(voice, &TITLE),
            status: child_text(voice, &STATUS),
            duration_secs: None,
        });
    }

    Err(TgvaultError::unsupported_media(format!(
        "{record}: media_wrap with classes [{}]",
        child_classes(wrap).join(", ")
    )))
}

/// Maps the children of the text container into styled runs: bare text
/// nodes become `plain`, known inline tags keep their style name.
fn extract_entities(text_el: ElementRef<'_>) -> Vec<TextEntity> {
    let mut entities = Vec::new();
    for child in text_el.children() {
        match child.value() {
            Node::Text(text) => {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    entities.push(TextEntity::new("plain", trimmed));
                }
            }
            Node::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    let kind = match el.value().name() {
                        "a" => "link",
                        "strong" | "b" => "bold",
                        "em" | "i" => "italic",
                        "code" => "code",
                        other => other,
                    };
                    entities.push(TextEntity::new(kind, collapse_text(&el)));
                }
            }
            _ => {}
        }
    }
    entities
}

/// Parses the numeric id out of the element's `message<N>` id attribute.
fn parse_message_id(element: ElementRef<'_>) -> Result<i64> {
    let raw = element
        .value()
        .attr("id")
        .ok_or_else(|| TgvaultError::missing_field("id", "message element"))?;
    raw.strip_prefix("message")
        .unwrap_or(raw)
        .parse::<i64>()
        .map_err(|_| TgvaultError::malformed(format!("non-numeric message id '{raw}'")))
}

/// Parses the date `title` attribute, `27.02.2023 21:50:53 UTC+06:00`,
/// into a unix timestamp.
fn parse_export_date(value: &str, record: &str) -> Result<i64> {
    DateTime::parse_from_str(value, "%d.%m.%Y %H:%M:%S UTC%:z")
        .or_else(|_| DateTime::parse_from_str(value, "%d.%m.%Y %H:%M:%S UTC%z"))
        .map(|dt| dt.timestamp())
        .map_err(|_| TgvaultError::malformed(format!("unparseable date '{value}' in {record}")))
}

fn collapse_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn child_text(element: ElementRef<'_>, sel: &Selector) -> Option<String> {
    element.select(sel).next().map(|el| collapse_text(&el))
}

fn required_attr(element: ElementRef<'_>, name: &str, record: &str) -> Result<String> {
    element
        .value()
        .attr(name)
        .map(str::to_string)
        .ok_or_else(|| TgvaultError::missing_field(name, record))
}

fn child_classes(element: ElementRef<'_>) -> Vec<String> {
    element
        .children()
        .filter_map(ElementRef::wrap)
        .flat_map(|el| el.value().classes().map(str::to_string).collect::<Vec<_>>())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DATE_ATTR: &str = "27.02.2023 21:50:53 UTC+06:00";

    fn message_html(body: &str) -> String {
        format!(
            r#"<html><body>
            <div class="message default clearfix" id="message12">
              <div class="pull_left userpic_wrap"><div class="initials">A</div></div>
              <div class="body">
                <div class="pull_right date details" title="{DATE_ATTR}">21:50</div>
                <div class="from_name">Alice</div>
                {body}
              </div>
            </div>
            </body></html>"#
        )
    }

    fn only_message(events: Vec<Event>) -> Message {
        assert_eq!(events.len(), 1);
        match events.into_iter().next().unwrap() {
            Event::Message(msg) => msg,
            Event::Service(svc) => panic!("expected message, got service {svc}"),
        }
    }

    #[test]
    fn test_plain_message() {
        let html = message_html(r#"<div class="text">hi there</div>"#);
        let msg = only_message(parse_events(&html).unwrap());

        assert_eq!(msg.id, 12);
        assert_eq!(msg.kind, "message");
        assert_eq!(msg.from, "Alice");
        assert_eq!(msg.initials.as_deref(), Some("A"));
        assert_eq!(msg.date, DATE_ATTR);
        // 21:50:53 at UTC+06:00 on 2023-02-27
        assert_eq!(msg.date_unixtime, 1677513053);
        assert_eq!(msg.time.as_deref(), Some("21:50"));
        assert_eq!(msg.text.as_deref(), Some("hi there"));
        assert!(msg.media.is_none());
        assert!(msg.from_id.is_none());
        assert_eq!(msg.text_entities, vec![TextEntity::new("plain", "hi there")]);
    }

    #[test]
    fn test_styled_text_entities_in_order() {
        let html = message_html(
            r#"<div class="text">see <a href="https://example.com">this</a> and <strong>that</strong></div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.text_entities,
            vec![
                TextEntity::new("plain", "see"),
                TextEntity::new("link", "this"),
                TextEntity::new("plain", "and"),
                TextEntity::new("bold", "that"),
            ]
        );
    }

    #[test]
    fn test_reply_reference() {
        let html = message_html(
            r##"<div class="reply_to details">In reply to <a href="#go_to_message8">this message</a></div>
               <div class="text">yes</div>"##,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(msg.reply_to, Some(8));
    }

    #[test]
    fn test_service_message() {
        let html = r#"<html><body>
            <div class="message service" id="message5">
              <div class="body details">27 February 2023</div>
            </div>
        </body></html>"#;
        let events = parse_events(html).unwrap();
        assert_eq!(events.len(), 1);
        let svc = events[0].as_service().unwrap();
        assert_eq!(svc.id, 5);
        assert_eq!(svc.details, "27 February 2023");
    }

    #[test]
    fn test_joined_notice_produces_no_record() {
        let html = r#"<html><body>
            <div class="message joined" id="message6"></div>
        </body></html>"#;
        let events = parse_events(html).unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn test_missing_from_name_is_malformed() {
        let html = r#"<html><body>
            <div class="message default" id="message12">
              <div class="pull_left userpic_wrap"><div class="initials">A</div></div>
              <div class="body">
                <div class="pull_right date details" title="27.02.2023 21:50:53 UTC+06:00">21:50</div>
                <div class="text">hi</div>
              </div>
            </div>
        </body></html>"#;
        let err = parse_events(html).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("from_name"));
    }

    #[test]
    fn test_call_media() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <div class="media_call">
                   <div class="body">
                     <div class="title bold">Outgoing call</div>
                     <div class="status details">Cancelled</div>
                   </div>
                 </div>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.media,
            Some(Media::Call {
                title: Some("Outgoing call".into()),
                status: Some("Cancelled".into()),
            })
        );
    }

    #[test]
    fn test_live_location_media() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="media_live_location" href="https://maps.example/?q=1,2">
                   <div class="title bold">Live location</div>
                   <div class="status details">expired</div>
                 </a>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.media,
            Some(Media::LiveLocation {
                map_url: "https://maps.example/?q=1,2".into(),
                title: Some("Live location".into()),
                status: Some("expired".into()),
            })
        );
    }

    #[test]
    fn test_photo_media() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="photo_wrap clearfix pull_left" href="photos/photo_1.jpg">
                   <img class="photo" src="photos/photo_1.jpg_thumb.jpg">
                 </a>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.media,
            Some(Media::Photo {
                path: "photos/photo_1.jpg".into(),
                thumbnail: Some("photos/photo_1.jpg_thumb.jpg".into()),
                width: None,
                height: None,
            })
        );
    }

    #[test]
    fn test_round_video_media() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="media_video" href="video_files/round.mp4">
                   <img class="thumb" src="video_files/round.mp4_thumb.jpg">
                   <div class="title bold">Video message</div>
                   <div class="status details">0:07</div>
                 </a>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.media,
            Some(Media::RoundVideo {
                path: "video_files/round.mp4".into(),
                thumbnail: Some("video_files/round.mp4_thumb.jpg".into()),
                title: Some("Video message".into()),
                status: Some("0:07".into()),
            })
        );
    }

    #[test]
    fn test_video_file_media() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="video_file_wrap clearfix pull_left" href="video_files/clip.mp4">
                   <div class="video_duration">0:12</div>
                   <img class="video_file" src="video_files/clip.mp4_thumb.jpg">
                 </a>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.media,
            Some(Media::VideoFile {
                path: "video_files/clip.mp4".into(),
                thumbnail: Some("video_files/clip.mp4_thumb.jpg".into()),
                duration: Some("0:12".into()),
                duration_secs: None,
            })
        );
    }

    #[test]
    fn test_voice_media() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="media_voice_message" href="voice_messages/audio.ogg">
                   <div class="title bold">Voice message</div>
                   <div class="status details">0:04</div>
                 </a>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(
            msg.media,
            Some(Media::Voice {
                path: "voice_messages/audio.ogg".into(),
                title: Some("Voice message".into()),
                status: Some("0:04".into()),
                duration_secs: None,
            })
        );
    }

    #[test]
    fn test_unsupported_media_is_surfaced() {
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="media_sticker" href="stickers/s.webp"></a>
               </div>"#,
        );
        let err = parse_events(&html).unwrap_err();
        assert!(err.is_unsupported_media());
        assert!(err.to_string().contains("media_sticker"));
    }

    #[test]
    fn test_probe_order_call_wins() {
        // Two kinds at once never happens in genuine exports; the fixed
        // probe order decides the tie.
        let html = message_html(
            r#"<div class="media_wrap clearfix">
                 <a class="photo_wrap" href="photos/p.jpg"><img class="photo" src="photos/t.jpg"></a>
                 <div class="media_call"><div class="title">Call</div></div>
               </div>"#,
        );
        let msg = only_message(parse_events(&html).unwrap());
        assert_eq!(msg.media.unwrap().kind(), "call");
    }

    #[test]
    fn test_negative_message_id_keeps_sign() {
        let html = r#"<html><body>
            <div class="message service" id="message-5">
              <div class="body details">27 February 2023</div>
            </div>
        </body></html>"#;
        let events = parse_events(html).unwrap();
        assert_eq!(events[0].as_service().unwrap().id, -5);
    }

    #[test]
    fn test_garbage_message_id_is_malformed() {
        let html = r#"<html><body>
            <div class="message service" id="messageXYZ">
              <div class="body details">27 February 2023</div>
            </div>
        </body></html>"#;
        let err = parse_events(html).unwrap_err();
        assert!(err.is_malformed());
        assert!(err.to_string().contains("messageXYZ"));
    }

    #[test]
    fn test_idempotent_mapping() {
        let html = message_html(r#"<div class="text">hi</div>"#);
        assert_eq!(parse_events(&html).unwrap(), parse_events(&html).unwrap());
    }

    #[test]
    fn test_parse_export_date_formats() {
        assert_eq!(
            parse_export_date("27.02.2023 21:50:53 UTC+06:00", "t").unwrap(),
            1677513053
        );
        assert_eq!(
            parse_export_date("27.02.2023 15:50:53 UTC+00:00", "t").unwrap(),
            1677513053
        );
        assert!(parse_export_date("tomorrow", "t").is_err());
    }

    #[test]
    fn test_find_message_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["messages2.html", "messages.html", "result.json", "notes.txt"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        let files = find_message_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["messages.html", "messages2.html"]);
    }

    #[test]
    fn test_find_message_files_missing_dir() {
        let err = find_message_files(Path::new("/definitely/not/here")).unwrap_err();
        assert!(err.is_directory_not_found());
    }
}
