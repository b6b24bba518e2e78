//! Data models for WhatsApp chat export data.
//!
//! These structures represent the typed form of a chat transcript after the
//! raw lines have been reassembled, classified, and resolved against the
//! archive's media entries.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A non-transcript entry found in the export archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub name: String,
    pub size_bytes: u64,
}

impl MediaEntry {
    pub fn new(name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            name: name.into(),
            size_bytes,
        }
    }
}

/// One reassembled transcript message, possibly spanning several lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    pub raw_timestamp: String,
    pub sender: String,
    /// Message text; continuation lines are joined with `\n`.
    pub content: String,
}

/// Content category of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageCategory {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Sticker,
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "m4a", "aac", "opus"];
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "zip", "rar", "txt",
];
const STICKER_EXTENSIONS: &[&str] = &["webp"];

impl MessageCategory {
    /// All categories, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Text,
        Self::Image,
        Self::Video,
        Self::Audio,
        Self::Document,
        Self::Sticker,
    ];

    /// Lowercase file extensions (without the dot) accepted for attachments
    /// of this category. Text has none.
    #[must_use]
    pub const fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Text => &[],
            Self::Image => IMAGE_EXTENSIONS,
            Self::Video => VIDEO_EXTENSIONS,
            Self::Audio => AUDIO_EXTENSIONS,
            Self::Document => DOCUMENT_EXTENSIONS,
            Self::Sticker => STICKER_EXTENSIONS,
        }
    }

    /// Filename used when no archive entry can be matched to a message.
    #[must_use]
    pub const fn placeholder_filename(self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Image => Some("image.jpg"),
            Self::Video => Some("video.mp4"),
            Self::Audio => Some("audio.opus"),
            Self::Document => Some("document.pdf"),
            Self::Sticker => Some("sticker.webp"),
        }
    }

    #[must_use]
    pub const fn is_media(self) -> bool {
        !matches!(self, Self::Text)
    }
}

impl std::fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
            Self::Video => write!(f, "video"),
            Self::Audio => write!(f, "audio"),
            Self::Document => write!(f, "document"),
            Self::Sticker => write!(f, "sticker"),
        }
    }
}

/// Playback length of an audio or video attachment.
///
/// Displays as `m:ss`, the format WhatsApp itself uses for voice notes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MediaDuration {
    pub minutes: u64,
    pub seconds: u8,
}

impl MediaDuration {
    pub const ZERO: Self = Self {
        minutes: 0,
        seconds: 0,
    };

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_seconds(total: u64) -> Self {
        Self {
            minutes: total / 60,
            seconds: (total % 60) as u8,
        }
    }

    #[must_use]
    pub const fn total_seconds(self) -> u64 {
        self.minutes * 60 + self.seconds as u64
    }

    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.minutes == 0 && self.seconds == 0
    }
}

impl std::fmt::Display for MediaDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:02}", self.minutes, self.seconds)
    }
}

/// File-level details shared by every attachment-bearing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub filename: String,
    pub extension: String,
    pub size_bytes: u64,
}

/// Category-specific payload of a message.
///
/// The variant is the category; there is no way to build, say, an image
/// message that carries a duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum MessageBody {
    Text {
        body: String,
    },
    Image {
        #[serde(flatten)]
        attachment: Attachment,
        width: u32,
        height: u32,
    },
    Video {
        #[serde(flatten)]
        attachment: Attachment,
        duration: MediaDuration,
        width: u32,
        height: u32,
    },
    Audio {
        #[serde(flatten)]
        attachment: Attachment,
        duration: MediaDuration,
    },
    Document {
        #[serde(flatten)]
        attachment: Attachment,
    },
    Sticker {
        #[serde(flatten)]
        attachment: Attachment,
    },
}

impl MessageBody {
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        match self {
            Self::Text { .. } => MessageCategory::Text,
            Self::Image { .. } => MessageCategory::Image,
            Self::Video { .. } => MessageCategory::Video,
            Self::Audio { .. } => MessageCategory::Audio,
            Self::Document { .. } => MessageCategory::Document,
            Self::Sticker { .. } => MessageCategory::Sticker,
        }
    }
}

/// A single typed chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    /// Wall-clock time as written in the transcript (no zone information).
    pub timestamp: NaiveDateTime,
    #[serde(flatten)]
    pub body: MessageBody,
}

impl Message {
    #[must_use]
    pub const fn category(&self) -> MessageCategory {
        self.body.category()
    }

    /// The attachment, for every category except text.
    #[must_use]
    pub const fn attachment(&self) -> Option<&Attachment> {
        match &self.body {
            MessageBody::Text { .. } => None,
            MessageBody::Image { attachment, .. }
            | MessageBody::Video { attachment, .. }
            | MessageBody::Audio { attachment, .. }
            | MessageBody::Document { attachment }
            | MessageBody::Sticker { attachment } => Some(attachment),
        }
    }

    #[must_use]
    pub const fn duration(&self) -> Option<MediaDuration> {
        match &self.body {
            MessageBody::Video { duration, .. } | MessageBody::Audio { duration, .. } => {
                Some(*duration)
            }
            _ => None,
        }
    }

    /// Pixel dimensions for images and videos.
    #[must_use]
    pub const fn dimensions(&self) -> Option<(u32, u32)> {
        match &self.body {
            MessageBody::Image { width, height, .. } | MessageBody::Video { width, height, .. } => {
                Some((*width, *height))
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { body } => Some(body),
            _ => None,
        }
    }
}

/// A parsed chat export: the chat's display name plus its messages in
/// transcript order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatExport {
    pub chat_name: String,
    pub messages: Vec<Message>,
}

impl ChatExport {
    pub fn new(chat_name: impl Into<String>) -> Self {
        Self {
            chat_name: chat_name.into(),
            messages: Vec::new(),
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages of one category, in transcript order.
    pub fn messages_of(&self, category: MessageCategory) -> impl Iterator<Item = &Message> {
        self.messages
            .iter()
            .filter(move |m| m.category() == category)
    }

    #[must_use]
    pub fn stats(&self) -> ExportStats {
        let mut stats = ExportStats::default();
        let mut senders = HashSet::new();

        for message in &self.messages {
            senders.insert(message.sender.as_str());
            match message.category() {
                MessageCategory::Text => stats.text_count += 1,
                MessageCategory::Image => stats.image_count += 1,
                MessageCategory::Video => stats.video_count += 1,
                MessageCategory::Audio => stats.audio_count += 1,
                MessageCategory::Document => stats.document_count += 1,
                MessageCategory::Sticker => stats.sticker_count += 1,
            }
            if let Some(attachment) = message.attachment() {
                stats.media_bytes += attachment.size_bytes;
            }
            if let Some(duration) = message.duration() {
                stats.media_seconds += duration.total_seconds();
            }
        }

        stats.total_messages = self.messages.len();
        stats.sender_count = senders.len();
        stats.first_timestamp = self.messages.first().map(|m| m.timestamp);
        stats.last_timestamp = self.messages.last().map(|m| m.timestamp);
        stats
    }
}

/// Summary numbers for an export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportStats {
    pub total_messages: usize,
    pub text_count: usize,
    pub image_count: usize,
    pub video_count: usize,
    pub audio_count: usize,
    pub document_count: usize,
    pub sticker_count: usize,
    pub sender_count: usize,
    pub media_bytes: u64,
    /// Combined audio and video playback time.
    pub media_seconds: u64,
    /// Timestamp of the first message in transcript order.
    pub first_timestamp: Option<NaiveDateTime>,
    /// Timestamp of the last message in transcript order.
    pub last_timestamp: Option<NaiveDateTime>,
}

impl ExportStats {
    #[must_use]
    pub const fn count(&self, category: MessageCategory) -> usize {
        match category {
            MessageCategory::Text => self.text_count,
            MessageCategory::Image => self.image_count,
            MessageCategory::Video => self.video_count,
            MessageCategory::Audio => self.audio_count,
            MessageCategory::Document => self.document_count,
            MessageCategory::Sticker => self.sticker_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn audio(sender: &str, size: u64, seconds: u64) -> Message {
        Message {
            sender: sender.to_string(),
            timestamp: at(10, 0),
            body: MessageBody::Audio {
                attachment: Attachment {
                    filename: "PTT-1.opus".to_string(),
                    extension: "opus".to_string(),
                    size_bytes: size,
                },
                duration: MediaDuration::from_seconds(seconds),
            },
        }
    }

    #[test]
    fn duration_formats_as_minutes_and_padded_seconds() {
        assert_eq!(MediaDuration::from_seconds(125).to_string(), "2:05");
        assert_eq!(MediaDuration::from_seconds(0).to_string(), "0:00");
        assert_eq!(MediaDuration::from_seconds(3600).to_string(), "60:00");
        assert_eq!(MediaDuration::from_seconds(59).total_seconds(), 59);
    }

    #[test]
    fn category_follows_body_variant() {
        let msg = audio("Ana", 10, 3);
        assert_eq!(msg.category(), MessageCategory::Audio);
        assert!(msg.attachment().is_some());
        assert!(msg.dimensions().is_none());
        assert_eq!(msg.duration().map(|d| d.to_string()).as_deref(), Some("0:03"));
    }

    #[test]
    fn placeholders_exist_for_every_media_category() {
        for category in MessageCategory::ALL {
            assert_eq!(category.placeholder_filename().is_some(), category.is_media());
        }
        assert_eq!(MessageCategory::Sticker.extensions(), &["webp"]);
    }

    #[test]
    fn stats_aggregate_counts_and_media() {
        let mut export = ChatExport::new("Family");
        export.push(Message {
            sender: "Ana".to_string(),
            timestamp: at(9, 0),
            body: MessageBody::Text {
                body: "hi".to_string(),
            },
        });
        export.push(audio("Ben", 2048, 65));
        export.push(audio("Ana", 1024, 5));

        let stats = export.stats();
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.count(MessageCategory::Text), 1);
        assert_eq!(stats.count(MessageCategory::Audio), 2);
        assert_eq!(stats.sender_count, 2);
        assert_eq!(stats.media_bytes, 3072);
        assert_eq!(stats.media_seconds, 70);
        assert_eq!(stats.first_timestamp, Some(at(9, 0)));
        assert_eq!(export.messages_of(MessageCategory::Audio).count(), 2);
    }

    #[test]
    fn message_serializes_with_flat_category_tag() {
        let json = serde_json::to_value(audio("Ana", 1, 1)).unwrap();
        assert_eq!(json["category"], "audio");
        assert_eq!(json["filename"], "PTT-1.opus");
        assert_eq!(json["sender"], "Ana");
    }
}
