//! Zero-copy reader over an immutable byte range

use smart_leds::RGB8;

use crate::{RGB_LEN, WireError};

/// Bounds-checked reader over `[start, end)` of a borrowed slice
///
/// Every read advances the cursor on success and leaves it untouched on
/// failure. Multi-byte integers are big-endian.
#[derive(Debug, Clone)]
pub struct WireCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the range
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the range
    pub const fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub const fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Unread tail of the range, without advancing
    pub fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos..]
    }

    /// Take `len` bytes as a sub-slice of the original range
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if len > self.remaining() {
            return Err(WireError::OutOfBounds {
                offset: self.pos,
                wanted: len,
                len: self.bytes.len(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..self.pos])
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        self.read_array().map(u32::from_be_bytes)
    }

    /// Any non-zero byte is `true`
    pub fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_u8()? != 0)
    }

    /// Read an `R, G, B` triplet
    pub fn read_rgb(&mut self) -> Result<RGB8, WireError> {
        let [r, g, b] = self.read_array::<RGB_LEN>()?;
        Ok(RGB8 { r, g, b })
    }

    /// Read a string prefixed by its byte length as `u8`
    pub fn read_str(&mut self) -> Result<&'a str, WireError> {
        let checkpoint = self.pos;
        let len = usize::from(self.read_u8()?);
        let bytes = self.read_bytes(len).inspect_err(|_| self.pos = checkpoint)?;
        core::str::from_utf8(bytes).map_err(|_| {
            self.pos = checkpoint;
            WireError::InvalidUtf8
        })
    }
}
