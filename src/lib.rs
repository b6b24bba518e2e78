//! wachat - WhatsApp chat export parser
//!
//! Turns a WhatsApp "Export chat" ZIP into a typed message list, reading
//! durations and pixel sizes straight out of the attached media.
//!
//! # Modules
//!
//! - [`transcript`] - Reassembles multi-line transcript entries
//! - [`classifier`] - Infers each message's category from its text
//! - [`index`] - Media index and attachment resolution
//! - [`media`] - MP4 and Ogg metadata decoders, image/MP3 probes
//! - [`builder`] - Turns records into typed messages
//! - [`parser`] - Archive-level orchestration
//! - [`cli`] - Command-line interface definitions
//!
//! ```no_run
//! use wachat::ExportParser;
//!
//! let export = ExportParser::new("WhatsApp Chat with Ana.zip").parse()?;
//! for message in &export.messages {
//!     println!("{} [{}] {}", message.timestamp, message.category(), message.sender);
//! }
//! # Ok::<(), wachat::ChatError>(())
//! ```

pub mod builder;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod media;
pub mod model;
pub mod parser;
pub mod transcript;

pub use builder::{EntryReader, MessageBuilder};
pub use classifier::classify;
pub use cli::*;
pub use config::Config;
pub use error::{ChatError, Result, format_chat_error, format_error};
pub use index::{MediaIndex, extension};
pub use model::*;
pub use parser::{ExportParser, ParseOptions, chat_name_from_path};
pub use transcript::TranscriptReassembler;

/// Standard width for content dividers in CLI output
pub const CONTENT_DIVIDER_WIDTH: usize = 60;

/// Standard width for major header dividers in CLI output
pub const HEADER_DIVIDER_WIDTH: usize = 70;

const BYTES_PER_KB: u64 = 1024;
const BYTES_PER_MB: u64 = 1024 * 1024;
const BYTES_PER_GB: u64 = 1024 * 1024 * 1024;

/// Format an unsigned integer with thousands separators.
#[must_use]
pub fn format_number_u64(value: u64) -> String {
    let mut out = String::with_capacity(24);

    for (idx, ch) in value.to_string().chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    out.chars().rev().collect()
}

/// Format a usize with thousands separators.
#[must_use]
pub fn format_number_usize(value: usize) -> String {
    format_number_u64(u64::try_from(value).unwrap_or(u64::MAX))
}

/// Escape text for CSV by sanitizing newlines and quotes.
#[must_use]
pub fn csv_escape_text(text: &str) -> String {
    text.replace('"', "\"\"").replace(['\n', '\r'], " ")
}

/// Format bytes into a human-friendly string.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes < BYTES_PER_KB {
        format!("{bytes} B")
    } else if bytes < BYTES_PER_MB {
        format_bytes_with_unit(bytes, BYTES_PER_KB, "KB")
    } else if bytes < BYTES_PER_GB {
        format_bytes_with_unit(bytes, BYTES_PER_MB, "MB")
    } else {
        format_bytes_with_unit(bytes, BYTES_PER_GB, "GB")
    }
}

fn format_bytes_with_unit(bytes: u64, unit: u64, suffix: &str) -> String {
    let whole = bytes / unit;
    let tenths = (bytes % unit) * 10 / unit;
    format!("{whole}.{tenths} {suffix}")
}

/// Play time as `h:mm:ss`, or `m:ss` under an hour.
#[must_use]
pub fn format_play_time(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Shorten `s` to at most `max_len` bytes, ending in `...`, without
/// splitting a character.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len.saturating_sub(3);
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
