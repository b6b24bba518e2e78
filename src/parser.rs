//! WhatsApp export archive parser.
//!
//! An export is a ZIP holding one `.txt` transcript plus the attachments it
//! mentions, all at the top level:
//!
//! ```text
//! WhatsApp Chat with Ana.zip
//! ├── WhatsApp Chat with Ana.txt
//! ├── IMG-20240312-WA0004.jpg
//! └── PTT-20240312-WA0001.opus
//! ```
//!
//! [`ExportParser`] indexes the entries, reassembles the transcript into
//! records and hands each one to the [`MessageBuilder`].

use crate::builder::{MessageBuilder, capacity_hint};
use crate::config::ParseConfig;
use crate::error::{ChatError, Result};
use crate::index::MediaIndex;
use crate::logging::OperationGuard;
use crate::media::{FrameMp3Probe, HeaderImageProbe, ImageProbe, Mp3Probe};
use crate::model::{ChatExport, MediaEntry, MessageCategory};
use crate::transcript::TranscriptReassembler;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;
use zip::result::ZipError;

/// Knobs for a single parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub decode_media: bool,
    pub transcript_suffix: String,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            decode_media: true,
            transcript_suffix: ".txt".to_string(),
        }
    }
}

impl From<&ParseConfig> for ParseOptions {
    fn from(config: &ParseConfig) -> Self {
        Self {
            decode_media: config.decode_media,
            transcript_suffix: config.transcript_suffix.clone(),
        }
    }
}

/// Where things are in an opened archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveLayout {
    /// Name of the transcript entry, if the archive has one.
    pub transcript: Option<String>,
    pub media: MediaIndex,
    /// Transcript-like entries after the first; neither parsed nor indexed.
    pub ignored_transcripts: Vec<String>,
}

/// Walk the archive's entries once, picking the first transcript and
/// indexing every other file as media.
///
/// # Errors
///
/// Returns the underlying [`ZipError`] if an entry header cannot be read.
pub fn index_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    transcript_suffix: &str,
) -> std::result::Result<ArchiveLayout, ZipError> {
    let mut layout = ArchiveLayout::default();

    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();

        if name.ends_with(transcript_suffix) {
            if layout.transcript.is_none() {
                info!(entry = %name, "Found chat file");
                layout.transcript = Some(name);
            } else {
                layout.ignored_transcripts.push(name);
            }
        } else {
            layout.media.insert(MediaEntry::new(name, entry.size()));
        }
    }

    info!(media_entries = layout.media.len(), "Indexed archive");
    Ok(layout)
}

/// Read a transcript entry as text. Invalid UTF-8 becomes U+FFFD and a
/// leading byte-order mark is dropped.
fn read_transcript<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| ChatError::transcript_unreadable(name, std::io::Error::other(e)))?;
    let mut bytes = Vec::with_capacity(capacity_hint(entry.size()));
    entry
        .read_to_end(&mut bytes)
        .map_err(|e| ChatError::transcript_unreadable(name, e))?;

    let text = String::from_utf8_lossy(&bytes);
    Ok(text
        .strip_prefix('\u{feff}')
        .unwrap_or(&text)
        .to_string())
}

/// Derive a chat's display name from its archive path:
/// `WhatsApp Chat with Ana.zip` becomes `Ana`.
#[must_use]
pub fn chat_name_from_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = file_name.strip_suffix(".zip").unwrap_or(&file_name);
    stem.strip_prefix("WhatsApp Chat with ")
        .unwrap_or(stem)
        .to_string()
}

/// Parser for one WhatsApp export archive.
pub struct ExportParser {
    archive_path: PathBuf,
    options: ParseOptions,
    image_probe: Box<dyn ImageProbe>,
    mp3_probe: Box<dyn Mp3Probe>,
}

impl ExportParser {
    pub fn new(archive_path: impl AsRef<Path>) -> Self {
        Self {
            archive_path: archive_path.as_ref().to_path_buf(),
            options: ParseOptions::default(),
            image_probe: Box::new(HeaderImageProbe),
            mp3_probe: Box::new(FrameMp3Probe),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_image_probe(mut self, probe: impl ImageProbe + 'static) -> Self {
        self.image_probe = Box::new(probe);
        self
    }

    #[must_use]
    pub fn with_mp3_probe(mut self, probe: impl Mp3Probe + 'static) -> Self {
        self.mp3_probe = Box::new(probe);
        self
    }

    #[must_use]
    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    #[must_use]
    pub const fn options(&self) -> &ParseOptions {
        &self.options
    }

    #[must_use]
    pub fn chat_name(&self) -> String {
        chat_name_from_path(&self.archive_path)
    }

    /// Parse the archive at the configured path.
    ///
    /// # Errors
    ///
    /// Fails only if the archive is missing, is not a ZIP, or its
    /// transcript cannot be read. Problems inside individual messages
    /// degrade those messages instead.
    pub fn parse(&self) -> Result<ChatExport> {
        let guard = OperationGuard::new(format!("parse {}", self.archive_path.display()));
        match self.open_and_parse() {
            Ok(export) => {
                guard.complete();
                Ok(export)
            }
            Err(e) => {
                guard.fail(&e);
                Err(e)
            }
        }
    }

    fn open_and_parse(&self) -> Result<ChatExport> {
        if !self.archive_path.exists() {
            return Err(ChatError::archive_not_found(&self.archive_path));
        }
        let file = File::open(&self.archive_path)
            .map_err(|e| ChatError::path_error("open", &self.archive_path, e))?;
        self.parse_reader(self.chat_name(), BufReader::new(file))
    }

    /// Parse an archive from any seekable reader.
    ///
    /// # Errors
    ///
    /// Same conditions as [`ExportParser::parse`], minus the path checks.
    pub fn parse_reader<R: Read + Seek>(
        &self,
        chat_name: impl Into<String>,
        reader: R,
    ) -> Result<ChatExport> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| ChatError::archive_unreadable(&self.archive_path, e))?;
        let layout = index_archive(&mut archive, &self.options.transcript_suffix)
            .map_err(|e| ChatError::archive_unreadable(&self.archive_path, e))?;

        if !layout.ignored_transcripts.is_empty() {
            info!(
                entries = ?layout.ignored_transcripts,
                "Ignoring additional transcripts"
            );
        }

        let mut export = ChatExport::new(chat_name);
        let Some(transcript_name) = layout.transcript.as_deref() else {
            info!("No chat transcript in archive");
            return Ok(export);
        };
        let text = read_transcript(&mut archive, transcript_name)?;

        let mut records = TranscriptReassembler::new(text.lines());
        let mut builder = MessageBuilder::new(&layout.media, &mut archive)
            .with_image_probe(self.image_probe.as_ref())
            .with_mp3_probe(self.mp3_probe.as_ref())
            .decode_media(self.options.decode_media);

        for record in records.by_ref() {
            export.push(builder.build(record));
        }

        if records.discarded_lines() > 0 {
            debug!(
                lines = records.discarded_lines(),
                "Dropped lines before first message"
            );
        }
        let stats = export.stats();
        info!(
            chat = %export.chat_name,
            messages = export.len(),
            text = stats.count(MessageCategory::Text),
            media = export.len() - stats.count(MessageCategory::Text),
            "Parsed chat"
        );
        Ok(export)
    }
}
