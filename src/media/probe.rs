//! Pluggable decoders for formats that are not hand-parsed here.
//!
//! Image dimensions and MP3 durations come from third-party crates behind
//! these traits so tests (and embedders) can substitute their own.

use std::io::Cursor;
use tracing::debug;

/// Reads pixel dimensions from encoded image bytes.
pub trait ImageProbe {
    /// `(width, height)`, or `None` if the bytes are not a decodable image.
    fn dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)>;
}

/// Reads the playback length of an MP3 stream.
pub trait Mp3Probe {
    /// Whole seconds, or `None` if the stream cannot be decoded.
    fn duration_seconds(&self, bytes: &[u8]) -> Option<u64>;
}

/// Header-only image probe backed by `imagesize`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderImageProbe;

impl ImageProbe for HeaderImageProbe {
    fn dimensions(&self, bytes: &[u8]) -> Option<(u32, u32)> {
        match imagesize::blob_size(bytes) {
            Ok(size) => Some((
                u32::try_from(size.width).ok()?,
                u32::try_from(size.height).ok()?,
            )),
            Err(e) => {
                debug!("Image header not recognised: {:?}", e);
                None
            }
        }
    }
}

/// Frame-walking MP3 probe backed by `mp3-duration`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameMp3Probe;

impl Mp3Probe for FrameMp3Probe {
    fn duration_seconds(&self, bytes: &[u8]) -> Option<u64> {
        match mp3_duration::from_read(&mut Cursor::new(bytes)) {
            Ok(duration) => Some(duration.as_secs()),
            Err(e) => {
                debug!("MP3 duration unavailable: {:?}", e);
                None
            }
        }
    }
}
