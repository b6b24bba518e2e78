//! Turns logical records into typed messages.
//!
//! Each record is classified, its attachment (if any) is resolved against
//! the [`MediaIndex`], and the attachment bytes are decoded for metadata.
//! Failures at any of those steps only degrade the affected fields.

use crate::classifier::classify;
use crate::index::{MediaIndex, extension};
use crate::media::{
    FrameMp3Probe, HeaderImageProbe, ImageProbe, Mp3Probe, decode_mp4_dimensions,
    decode_mp4_duration, decode_ogg_duration,
};
use crate::model::{
    Attachment, LogicalRecord, MediaDuration, MediaEntry, Message, MessageBody, MessageCategory,
};
use crate::transcript::parse_timestamp;
use std::io::{self, Read, Seek};
use tracing::debug;

/// Largest read buffer reserved up front from a size declared in the
/// archive.
const MAX_PREALLOC: u64 = 64 << 20;

/// Buffer capacity for an entry whose header claims `declared` bytes.
pub(crate) fn capacity_hint(declared: u64) -> usize {
    usize::try_from(declared.min(MAX_PREALLOC)).unwrap_or(0)
}

/// Reads the full contents of a named archive entry.
pub trait EntryReader {
    /// # Errors
    ///
    /// Returns an error if the entry does not exist or cannot be read.
    fn read_entry(&mut self, name: &str) -> io::Result<Vec<u8>>;
}

impl<R: Read + Seek> EntryReader for zip::ZipArchive<R> {
    fn read_entry(&mut self, name: &str) -> io::Result<Vec<u8>> {
        let mut file = self.by_name(name).map_err(io::Error::other)?;
        let mut buf = Vec::with_capacity(capacity_hint(file.size()));
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

/// Builds [`Message`]s for one parse.
pub struct MessageBuilder<'a> {
    index: &'a MediaIndex,
    reader: &'a mut dyn EntryReader,
    image_probe: &'a dyn ImageProbe,
    mp3_probe: &'a dyn Mp3Probe,
    decode_media: bool,
}

impl<'a> MessageBuilder<'a> {
    pub fn new(index: &'a MediaIndex, reader: &'a mut dyn EntryReader) -> Self {
        Self {
            index,
            reader,
            image_probe: &HeaderImageProbe,
            mp3_probe: &FrameMp3Probe,
            decode_media: true,
        }
    }

    #[must_use]
    pub fn with_image_probe(mut self, probe: &'a dyn ImageProbe) -> Self {
        self.image_probe = probe;
        self
    }

    #[must_use]
    pub fn with_mp3_probe(mut self, probe: &'a dyn Mp3Probe) -> Self {
        self.mp3_probe = probe;
        self
    }

    /// When disabled, attachments are still resolved but their bytes are
    /// never read, so durations and dimensions stay at their defaults.
    #[must_use]
    pub const fn decode_media(mut self, enabled: bool) -> Self {
        self.decode_media = enabled;
        self
    }

    pub fn build(&mut self, record: LogicalRecord) -> Message {
        let timestamp = parse_timestamp(&record.raw_timestamp);
        let category = classify(&record.content);

        let body = match category {
            MessageCategory::Text => MessageBody::Text {
                body: record.content,
            },
            MessageCategory::Image => self.build_image(&record.content),
            MessageCategory::Video => self.build_video(&record.content),
            MessageCategory::Audio => self.build_audio(&record.content),
            MessageCategory::Document => MessageBody::Document {
                attachment: self.resolve(&record.content, category).0,
            },
            MessageCategory::Sticker => MessageBody::Sticker {
                attachment: self.resolve(&record.content, category).0,
            },
        };

        Message {
            sender: record.sender,
            timestamp,
            body,
        }
    }

    /// The attachment for `content`, falling back to the category's
    /// placeholder name with zero size when nothing in the index matches.
    fn resolve(&self, content: &str, category: MessageCategory) -> (Attachment, Option<MediaEntry>) {
        let entry = self.index.find_media(content, category).cloned();
        let (filename, size_bytes) = entry.as_ref().map_or_else(
            || {
                debug!(%category, "No archive entry matched, using placeholder");
                (
                    category.placeholder_filename().unwrap_or_default().to_string(),
                    0,
                )
            },
            |e| (e.name.clone(), e.size_bytes),
        );
        let attachment = Attachment {
            extension: extension(&filename),
            filename,
            size_bytes,
        };
        (attachment, entry)
    }

    /// Entry bytes in a buffer owned by the caller's scope; dropped as soon
    /// as the metadata has been read.
    fn scratch(&mut self, entry: &MediaEntry) -> Option<Vec<u8>> {
        if !self.decode_media {
            return None;
        }
        match self.reader.read_entry(&entry.name) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!(entry = %entry.name, error = %e, "Could not read media entry");
                None
            }
        }
    }

    fn build_image(&mut self, content: &str) -> MessageBody {
        let (attachment, entry) = self.resolve(content, MessageCategory::Image);
        let (width, height) = entry
            .and_then(|e| self.scratch(&e))
            .and_then(|bytes| self.image_probe.dimensions(&bytes))
            .unwrap_or((0, 0));
        MessageBody::Image {
            attachment,
            width,
            height,
        }
    }

    fn build_video(&mut self, content: &str) -> MessageBody {
        let (attachment, entry) = self.resolve(content, MessageCategory::Video);
        let (duration, (width, height)) = entry.and_then(|e| self.scratch(&e)).map_or(
            (MediaDuration::ZERO, (0, 0)),
            |bytes| (decode_mp4_duration(&bytes), decode_mp4_dimensions(&bytes)),
        );
        MessageBody::Video {
            attachment,
            duration,
            width,
            height,
        }
    }

    fn build_audio(&mut self, content: &str) -> MessageBody {
        let (attachment, entry) = self.resolve(content, MessageCategory::Audio);
        let duration = entry
            .and_then(|e| self.scratch(&e))
            .map_or(MediaDuration::ZERO, |bytes| {
                self.audio_duration(&attachment.extension, &bytes)
            });
        MessageBody::Audio {
            attachment,
            duration,
        }
    }

    fn audio_duration(&self, extension: &str, bytes: &[u8]) -> MediaDuration {
        match extension {
            "opus" | "ogg" => decode_ogg_duration(bytes),
            "mp3" => self
                .mp3_probe
                .duration_seconds(bytes)
                .map_or(MediaDuration::ZERO, MediaDuration::from_seconds),
            "m4a" | "aac" => decode_mp4_duration(bytes),
            _ => MediaDuration::ZERO,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::media::mp4::fixtures::movie;
    use crate::media::ogg::fixtures::stream;
    use std::collections::HashMap;

    /// In-memory archive used by the builder and parser tests.
    #[derive(Default)]
    pub struct MemoryEntries {
        pub files: HashMap<String, Vec<u8>>,
    }

    impl MemoryEntries {
        pub fn with(mut self, name: &str, bytes: Vec<u8>) -> Self {
            self.files.insert(name.to_string(), bytes);
            self
        }

        pub fn index(&self) -> MediaIndex {
            let mut names: Vec<&String> = self.files.keys().collect();
            names.sort();
            names
                .into_iter()
                .map(|name| MediaEntry::new(name.clone(), self.files[name].len() as u64))
                .collect()
        }
    }

    impl EntryReader for MemoryEntries {
        fn read_entry(&mut self, name: &str) -> io::Result<Vec<u8>> {
            self.files
                .get(name)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, name.to_string()))
        }
    }

    struct FixedImage(u32, u32);

    impl ImageProbe for FixedImage {
        fn dimensions(&self, _bytes: &[u8]) -> Option<(u32, u32)> {
            Some((self.0, self.1))
        }
    }

    struct FailingMp3;

    impl Mp3Probe for FailingMp3 {
        fn duration_seconds(&self, _bytes: &[u8]) -> Option<u64> {
            None
        }
    }

    struct FixedMp3(u64);

    impl Mp3Probe for FixedMp3 {
        fn duration_seconds(&self, _bytes: &[u8]) -> Option<u64> {
            Some(self.0)
        }
    }

    fn record(content: &str) -> LogicalRecord {
        LogicalRecord {
            raw_timestamp: "12/03/2024, 9:41 pm".to_string(),
            sender: "Ana".to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn text_is_wrapped_verbatim() {
        let mut entries = MemoryEntries::default();
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("hello\nsecond line"));
        assert_eq!(msg.text(), Some("hello\nsecond line"));
        assert_eq!(msg.sender, "Ana");
        assert_eq!(msg.timestamp.to_string(), "2024-03-12 21:41:00");
    }

    #[test]
    fn video_gets_duration_and_dimensions() {
        let mut entries =
            MemoryEntries::default().with("VID-1.mp4", movie(1000, 125_000, 848, 480));
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("VID-1.mp4 (file attached)"));

        let MessageBody::Video {
            attachment,
            duration,
            width,
            height,
        } = msg.body
        else {
            panic!("expected video, got {:?}", msg.body);
        };
        assert_eq!(attachment.filename, "VID-1.mp4");
        assert_eq!(attachment.extension, "mp4");
        assert!(attachment.size_bytes > 4096);
        assert_eq!(duration.to_string(), "2:05");
        assert_eq!((width, height), (848, 480));
    }

    #[test]
    fn opus_voice_note_duration() {
        let mut entries =
            MemoryEntries::default().with("PTT-1.opus", stream(&[0, 48_000 * 7], 32));
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("PTT-1.opus (file attached)"));
        assert_eq!(msg.category(), MessageCategory::Audio);
        assert_eq!(msg.duration().unwrap().to_string(), "0:07");
    }

    #[test]
    fn m4a_uses_movie_header() {
        let mut entries =
            MemoryEntries::default().with("AUD-1.m4a", movie(44_100, 44_100 * 90, 0, 0));
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("AUD-1.m4a (file attached)"));
        assert_eq!(msg.duration().unwrap().to_string(), "1:30");
    }

    #[test]
    fn mp3_goes_through_probe() {
        let mut entries = MemoryEntries::default().with("song.mp3", vec![0xFF; 64]);
        let index = entries.index();
        let probe = FixedMp3(185);
        let mut builder = MessageBuilder::new(&index, &mut entries).with_mp3_probe(&probe);
        let msg = builder.build(record("song.mp3 (file attached)"));
        assert_eq!(msg.duration().unwrap().to_string(), "3:05");
    }

    #[test]
    fn mp3_probe_failure_keeps_zero() {
        let mut entries = MemoryEntries::default().with("song.mp3", vec![0xFF; 64]);
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries).with_mp3_probe(&FailingMp3);
        let msg = builder.build(record("song.mp3 (file attached)"));
        assert_eq!(msg.duration(), Some(MediaDuration::ZERO));
        assert_eq!(msg.attachment().unwrap().size_bytes, 64);
    }

    #[test]
    fn wav_has_no_duration_decoder() {
        let mut entries = MemoryEntries::default().with("memo.wav", b"RIFF".to_vec());
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("memo.wav (file attached)"));
        assert_eq!(msg.duration(), Some(MediaDuration::ZERO));
    }

    #[test]
    fn image_dimensions_from_probe() {
        let mut entries = MemoryEntries::default().with("IMG-1.jpg", vec![0u8; 10]);
        let index = entries.index();
        let probe = FixedImage(4032, 3024);
        let mut builder = MessageBuilder::new(&index, &mut entries).with_image_probe(&probe);
        let msg = builder.build(record("IMG-1.jpg (file attached)"));
        assert_eq!(msg.dimensions(), Some((4032, 3024)));
    }

    #[test]
    fn declared_entry_size_is_capped() {
        assert_eq!(capacity_hint(0), 0);
        assert_eq!(capacity_hint(4096), 4096);
        assert_eq!(capacity_hint(u64::MAX), 64 << 20);
        assert_eq!(capacity_hint(5 << 30), 64 << 20);
    }

    #[test]
    fn corrupt_image_degrades_to_zero() {
        let mut entries = MemoryEntries::default().with("IMG-1.jpg", b"not a jpeg".to_vec());
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("IMG-1.jpg (file attached)"));
        assert_eq!(msg.dimensions(), Some((0, 0)));
        assert_eq!(msg.attachment().unwrap().filename, "IMG-1.jpg");
    }

    #[test]
    fn unmatched_media_uses_placeholders() {
        let mut entries = MemoryEntries::default();
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);

        let cases = [
            ("IMG-9.jpg (file attached)", "image.jpg", "jpg"),
            ("VID-9.mp4 (file attached)", "video.mp4", "mp4"),
            ("<Media omitted>", "audio.opus", "opus"),
            ("notes.pdf (file attached)", "document.pdf", "pdf"),
            ("STK-9.webp (file attached)", "sticker.webp", "webp"),
        ];
        for (content, filename, ext) in cases {
            let msg = builder.build(record(content));
            let attachment = msg.attachment().unwrap();
            assert_eq!(attachment.filename, filename);
            assert_eq!(attachment.extension, ext);
            assert_eq!(attachment.size_bytes, 0);
            if let Some(duration) = msg.duration() {
                assert_eq!(duration.to_string(), "0:00");
            }
            if let Some(dims) = msg.dimensions() {
                assert_eq!(dims, (0, 0));
            }
        }
    }

    #[test]
    fn unreadable_entry_degrades_metadata_only() {
        let index: MediaIndex = [MediaEntry::new("VID-2.mp4", 999)].into_iter().collect();
        let mut entries = MemoryEntries::default();
        let mut builder = MessageBuilder::new(&index, &mut entries);
        let msg = builder.build(record("VID-2.mp4 (file attached)"));
        assert_eq!(msg.attachment().unwrap().size_bytes, 999);
        assert_eq!(msg.duration(), Some(MediaDuration::ZERO));
        assert_eq!(msg.dimensions(), Some((0, 0)));
    }

    #[test]
    fn decoding_can_be_disabled() {
        let mut entries =
            MemoryEntries::default().with("VID-1.mp4", movie(1000, 125_000, 848, 480));
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries).decode_media(false);
        let msg = builder.build(record("VID-1.mp4 (file attached)"));
        assert_eq!(msg.attachment().unwrap().filename, "VID-1.mp4");
        assert_eq!(msg.duration(), Some(MediaDuration::ZERO));
    }

    #[test]
    fn document_and_sticker_resolve_without_reading() {
        let mut entries = MemoryEntries::default()
            .with("STK-1.webp", vec![1; 12])
            .with("plan.docx", vec![2; 34]);
        let index = entries.index();
        let mut builder = MessageBuilder::new(&index, &mut entries);

        let sticker = builder.build(record("STK-1.webp (file attached)"));
        assert_eq!(sticker.category(), MessageCategory::Sticker);
        assert_eq!(sticker.attachment().unwrap().size_bytes, 12);

        let doc = builder.build(record("plan.docx (file attached)"));
        assert_eq!(doc.category(), MessageCategory::Document);
        assert_eq!(doc.attachment().unwrap().extension, "docx");
    }
}
