//! Ogg (Opus voice note) duration decoding.
//!
//! The stream length is the granule position of the last page, so only the
//! tail of the file is searched for a page header.

use super::bytes::{read_i64_le, rfind_signatures};
use crate::model::MediaDuration;
use tracing::trace;

pub const OGG_CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Bytes from the end of the stream searched for the last page header.
pub const OGG_TAIL_WINDOW: usize = 64 * 1024;

/// Opus granule positions always count 48 kHz samples, whatever the input
/// sample rate was.
pub const OPUS_GRANULE_RATE: u64 = 48_000;

/// Offset of the granule position from the start of the page header:
/// capture pattern (4), stream structure version (1), header type (1).
const GRANULE_OFFSET: usize = 6;

/// Granule position of the rightmost complete page header in the tail window.
#[must_use]
pub fn last_granule_position(buf: &[u8]) -> Option<i64> {
    let tail = &buf[buf.len().saturating_sub(OGG_TAIL_WINDOW)..];
    let (at, granule) = rfind_signatures(tail, OGG_CAPTURE_PATTERN)
        .find_map(|at| read_i64_le(tail, at + GRANULE_OFFSET).map(|g| (at, g)))?;
    trace!(offset = at, granule, "Found last Ogg page");
    Some(granule)
}

/// Playback duration of an Ogg/Opus stream, `0:00` when no page header is
/// found or the last granule position is not positive.
#[must_use]
pub fn decode_ogg_duration(buf: &[u8]) -> MediaDuration {
    match last_granule_position(buf) {
        Some(granule) if granule > 0 => {
            MediaDuration::from_seconds(granule.unsigned_abs() / OPUS_GRANULE_RATE)
        }
        _ => MediaDuration::ZERO,
    }
}
