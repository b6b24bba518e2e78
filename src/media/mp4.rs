//! ISO-BMFF (MP4, M4A, MOV) header decoding.
//!
//! Rather than walking the box tree, the buffer is scanned for the `mvhd`
//! and `tkhd` fourccs and the header fields are read at fixed offsets from
//! the signature. WhatsApp writes the `moov` box after `mdat`, so callers
//! must hand over the whole file (or at least its tail).
//!
//! Offsets below are relative to the signature, which sits 4 bytes into
//! its box (after the 32-bit size). Version 1 headers widen the creation,
//! modification and duration fields to 64 bits.

use super::bytes::{find_signatures, read_u8, read_u32_be, read_u64_be};
use crate::model::MediaDuration;
use tracing::trace;

pub const MVHD: &[u8; 4] = b"mvhd";
pub const TKHD: &[u8; 4] = b"tkhd";

/// Fields read from a movie header (`mvhd`) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovieHeader {
    pub offset: usize,
    pub version: u8,
    pub timescale: u32,
    pub duration: u64,
}

impl MovieHeader {
    /// Whole seconds of playback, or `None` for a zero timescale.
    #[must_use]
    pub fn seconds(&self) -> Option<u64> {
        (self.timescale > 0).then(|| self.duration / u64::from(self.timescale))
    }
}

/// Pixel dimensions read from a track header (`tkhd`) box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackHeader {
    pub offset: usize,
    pub version: u8,
    pub width: u32,
    pub height: u32,
}

impl TrackHeader {
    #[must_use]
    pub const fn is_visual(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

fn read_movie_header(buf: &[u8], at: usize) -> Option<MovieHeader> {
    let version = read_u8(buf, at + 4)?;
    let (timescale, duration) = if version == 1 {
        (read_u32_be(buf, at + 24)?, read_u64_be(buf, at + 28)?)
    } else {
        (read_u32_be(buf, at + 16)?, u64::from(read_u32_be(buf, at + 20)?))
    };
    Some(MovieHeader {
        offset: at,
        version,
        timescale,
        duration,
    })
}

fn read_track_header(buf: &[u8], at: usize) -> Option<TrackHeader> {
    let version = read_u8(buf, at + 4)?;
    let (width_at, height_at) = if version == 1 {
        (at + 92, at + 96)
    } else {
        (at + 80, at + 84)
    };
    // 16.16 fixed point; the integer part is the pixel count
    Some(TrackHeader {
        offset: at,
        version,
        width: read_u32_be(buf, width_at)? >> 16,
        height: read_u32_be(buf, height_at)? >> 16,
    })
}

/// The first `mvhd` occurrence whose fields fit inside the buffer.
#[must_use]
pub fn find_movie_header(buf: &[u8]) -> Option<MovieHeader> {
    let header = find_signatures(buf, MVHD).find_map(|at| read_movie_header(buf, at))?;
    trace!(
        offset = header.offset,
        version = header.version,
        timescale = header.timescale,
        duration = header.duration,
        "Found mvhd"
    );
    Some(header)
}

/// The first `tkhd` occurrence that fits inside the buffer and describes a
/// visual track. Audio tracks carry zero dimensions and are skipped.
#[must_use]
pub fn find_visual_track_header(buf: &[u8]) -> Option<TrackHeader> {
    let header = find_signatures(buf, TKHD)
        .filter_map(|at| read_track_header(buf, at))
        .find(TrackHeader::is_visual)?;
    trace!(
        offset = header.offset,
        width = header.width,
        height = header.height,
        "Found tkhd"
    );
    Some(header)
}

/// Playback duration from the movie header, `0:00` when it cannot be read.
///
/// The first readable `mvhd` decides the result; a zero timescale there
/// yields `0:00` even if a later copy would be valid.
#[must_use]
pub fn decode_mp4_duration(buf: &[u8]) -> MediaDuration {
    find_movie_header(buf)
        .and_then(|header| header.seconds())
        .map_or(MediaDuration::ZERO, MediaDuration::from_seconds)
}

/// `(width, height)` of the first visual track, `(0, 0)` when unknown.
#[must_use]
pub fn decode_mp4_dimensions(buf: &[u8]) -> (u32, u32) {
    find_visual_track_header(buf).map_or((0, 0), |header| (header.width, header.height))
}
