//! Chat transcript reassembly.
//!
//! A WhatsApp transcript has one header line per message:
//!
//! ```text
//! 12/03/2024, 9:41 pm - Ana: first line of the message
//! a continuation line
//! ```
//!
//! Lines that do not start with a timestamp and sender belong to the
//! message above them. [`TranscriptReassembler`] folds them back together
//! lazily, one [`LogicalRecord`] per message.

use crate::model::LogicalRecord;
use chrono::{Local, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{trace, warn};

/// `date, time [am|pm] - sender: content`. Exports from different phones
/// put a regular, no-break (U+00A0) or narrow no-break (U+202F) space
/// before the meridiem, and some omit it.
static MESSAGE_START: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(\d{1,2}/\d{1,2}/\d{4},[\s\x{202F}\x{A0}]+\d{1,2}:\d{2}(?::\d{2})?[\s\x{202F}\x{A0}]*[ap]m)\s*-\s*([^:]+):\s(.*)$",
    )
    .expect("message start pattern is valid")
});

static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\x{202F}\x{A0}]+").expect("whitespace pattern is valid"));

/// Timestamp layouts tried in order, after whitespace normalisation.
const TIMESTAMP_FORMATS: &[&str] = &["%d/%m/%Y, %I:%M %p", "%d/%m/%Y, %I:%M:%S %p"];

/// Split a message header line into a record, or `None` for continuation
/// lines.
#[must_use]
pub fn parse_start_line(line: &str) -> Option<LogicalRecord> {
    let caps = MESSAGE_START.captures(line)?;
    Some(LogicalRecord {
        raw_timestamp: caps[1].to_string(),
        sender: caps[2].trim().to_string(),
        content: caps[3].to_string(),
    })
}

#[must_use]
pub fn is_start_line(line: &str) -> bool {
    MESSAGE_START.is_match(line)
}

/// Lazily turns physical transcript lines into logical records.
pub struct TranscriptReassembler<I> {
    lines: I,
    pending: Option<LogicalRecord>,
    discarded: usize,
}

impl<I, S> TranscriptReassembler<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    pub fn new(lines: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            lines: lines.into_iter(),
            pending: None,
            discarded: 0,
        }
    }

    /// Lines dropped so far because they appeared before any message header.
    #[must_use]
    pub const fn discarded_lines(&self) -> usize {
        self.discarded
    }
}

impl<I, S> Iterator for TranscriptReassembler<I>
where
    I: Iterator<Item = S>,
    S: AsRef<str>,
{
    type Item = LogicalRecord;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            let line = line.as_ref();
            if let Some(record) = parse_start_line(line) {
                if let Some(finished) = self.pending.replace(record) {
                    return Some(finished);
                }
            } else if let Some(open) = self.pending.as_mut() {
                open.content.push('\n');
                open.content.push_str(line);
            } else {
                self.discarded += 1;
                trace!(line, "Discarding line before first message");
            }
        }
        self.pending.take()
    }
}

/// Collapse every whitespace run (including no-break variants) to a single
/// ASCII space and make sure the meridiem is space-separated.
fn normalize_timestamp(raw: &str) -> String {
    let clean = WHITESPACE_RUN.replace_all(raw.trim(), " ");
    let split = clean.len().saturating_sub(2);
    if split > 0 && clean.is_char_boundary(split) {
        let (head, meridiem) = clean.split_at(split);
        let is_meridiem =
            meridiem.eq_ignore_ascii_case("am") || meridiem.eq_ignore_ascii_case("pm");
        if is_meridiem && !head.ends_with(' ') {
            return format!("{head} {meridiem}");
        }
    }
    clean.into_owned()
}

/// Parse a transcript timestamp such as `12/03/2024, 9:41 pm`.
#[must_use]
pub fn try_parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let clean = normalize_timestamp(raw);
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&clean, format).ok())
}

/// Parse a transcript timestamp, substituting the current local time when
/// it cannot be read.
///
/// The substitute breaks chronological order for that message; it is
/// logged at `warn` so the degradation is visible.
#[must_use]
pub fn parse_timestamp(raw: &str) -> NaiveDateTime {
    try_parse_timestamp(raw).unwrap_or_else(|| {
        warn!(raw, "Unparseable timestamp, using current time");
        Local::now().naive_local()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    fn records(text: &str) -> Vec<LogicalRecord> {
        TranscriptReassembler::new(text.lines()).collect()
    }

    #[test]
    fn splits_sender_at_first_colon_and_trims() {
        let record =
            parse_start_line("12/03/2024, 9:41 pm - Ana Silva  : note: bring snacks").unwrap();
        assert_eq!(record.raw_timestamp, "12/03/2024, 9:41 pm");
        assert_eq!(record.sender, "Ana Silva");
        assert_eq!(record.content, "note: bring snacks");
    }

    #[test]
    fn accepts_no_break_spaces_seconds_and_case() {
        assert!(is_start_line("1/2/2024, 10:05\u{202f}PM - Ben: hi"));
        assert!(is_start_line("1/2/2024,\u{a0}10:05:33 am - Ben: hi"));
        assert!(is_start_line("01/02/2024, 10:05pm - Ben: hi"));
        assert!(!is_start_line("just some text"));
        assert!(!is_start_line("1/2/2024, 10:05 - Ben: 24-hour clocks are not matched"));
        assert!(!is_start_line("1/2/2024, 10:05 pm - Messages are end-to-end encrypted"));
    }

    #[test]
    fn folds_continuation_lines_into_one_record() {
        let text = "12/03/2024, 9:41 pm - Ana: first line\nsecond line\n\nfourth line\n\
                    12/03/2024, 9:42 pm - Ben: reply";
        let out = records(text);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].content, "first line\nsecond line\n\nfourth line");
        assert_eq!(out[1].sender, "Ben");
        assert_eq!(out[1].content, "reply");
    }

    #[test]
    fn lines_before_first_header_are_discarded() {
        let text = "preamble\nmore preamble\n12/03/2024, 9:41 pm - Ana: hello";
        let mut reassembler = TranscriptReassembler::new(text.lines());
        let first = reassembler.next().unwrap();
        assert_eq!(first.content, "hello");
        assert!(reassembler.next().is_none());
        assert_eq!(reassembler.discarded_lines(), 2);
    }

    #[test]
    fn empty_transcript_yields_nothing() {
        assert!(records("").is_empty());
        assert!(records("no headers\nat all").is_empty());
    }

    #[test]
    fn parses_day_first_twelve_hour_timestamps() {
        let ts = try_parse_timestamp("12/03/2024, 9:41 pm").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 12).unwrap());
        assert_eq!((ts.hour(), ts.minute()), (21, 41));

        let ts = try_parse_timestamp("1/2/2024,\u{a0}12:05\u{202f}AM").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(ts.hour(), 0);

        let ts = try_parse_timestamp("01/02/2024, 10:05:33pm").unwrap();
        assert_eq!((ts.hour(), ts.minute(), ts.second()), (22, 5, 33));
    }

    #[test]
    fn invalid_timestamp_falls_back_to_now() {
        assert!(try_parse_timestamp("31/02/2024, 9:41 pm").is_none());
        let before = Local::now().naive_local();
        let ts = parse_timestamp("31/02/2024, 9:41 pm");
        assert!(ts >= before - chrono::Duration::seconds(1));
    }
}
