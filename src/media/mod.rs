//! Media metadata extraction from raw attachment bytes.
//!
//! - [`bytes`] - bounds-checked integer reads and signature scans
//! - [`mp4`] - `mvhd`/`tkhd` decoding for MP4, M4A and AAC containers
//! - [`ogg`] - last-page granule decoding for Ogg/Opus voice notes
//! - [`probe`] - trait seams for image and MP3 decoders

pub mod bytes;
pub mod mp4;
pub mod ogg;
pub mod probe;

pub use mp4::{decode_mp4_dimensions, decode_mp4_duration};
pub use ogg::decode_ogg_duration;
pub use probe::{FrameMp3Probe, HeaderImageProbe, ImageProbe, Mp3Probe};
