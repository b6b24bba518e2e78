//! Bounds-checked integer reads and signature scans over raw byte buffers.
//!
//! Every read returns `None` instead of panicking when the requested range
//! runs past the end of the buffer; decoders treat that as "no valid box
//! here" and move on.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use memchr::memmem;

fn window(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    buf.get(offset..offset.checked_add(len)?)
}

#[must_use]
pub fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

#[must_use]
pub fn read_u16_be(buf: &[u8], offset: usize) -> Option<u16> {
    window(buf, offset, 2).map(BigEndian::read_u16)
}

#[must_use]
pub fn read_u32_be(buf: &[u8], offset: usize) -> Option<u32> {
    window(buf, offset, 4).map(BigEndian::read_u32)
}

#[must_use]
pub fn read_u64_be(buf: &[u8], offset: usize) -> Option<u64> {
    window(buf, offset, 8).map(BigEndian::read_u64)
}

/// Little-endian signed 64-bit read (Ogg granule positions).
#[must_use]
pub fn read_i64_le(buf: &[u8], offset: usize) -> Option<i64> {
    window(buf, offset, 8).map(LittleEndian::read_i64)
}

/// Offsets of every occurrence of `signature`, left to right.
pub fn find_signatures<'a>(buf: &'a [u8], signature: &'a [u8]) -> impl Iterator<Item = usize> + 'a {
    memmem::find_iter(buf, signature)
}

/// Offsets of every occurrence of `signature`, right to left.
pub fn rfind_signatures<'a>(
    buf: &'a [u8],
    signature: &'a [u8],
) -> impl Iterator<Item = usize> + 'a {
    memmem::rfind_iter(buf, signature)
}
