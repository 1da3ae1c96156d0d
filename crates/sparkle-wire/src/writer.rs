use heapless::Vec;
use smart_leds::RGB8;

use crate::WireError;

/// Fixed-capacity frame builder, the write-side mirror of [`WireCursor`](crate::WireCursor)
#[derive(Debug, Clone, Default)]
pub struct WireWriter<const N: usize> {
    buf: Vec<u8, N>,
}

impl<const N: usize> WireWriter<N> {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_inner(self) -> Vec<u8, N> {
        self.buf
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        self.buf
            .extend_from_slice(bytes)
            .map_err(|()| WireError::Overflow { capacity: N })
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), WireError> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), WireError> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_bool(&mut self, value: bool) -> Result<(), WireError> {
        self.write_u8(u8::from(value))
    }

    pub fn write_rgb(&mut self, color: RGB8) -> Result<(), WireError> {
        self.write_bytes(&[color.r, color.g, color.b])
    }

    /// Write a `u8` length prefix followed by the UTF-8 bytes
    ///
    /// Strings longer than 255 bytes are rejected as an overflow.
    pub fn write_str(&mut self, value: &str) -> Result<(), WireError> {
        let len = u8::try_from(value.len()).map_err(|_| WireError::Overflow { capacity: 255 })?;
        if self.buf.len() + 1 + value.len() > N {
            return Err(WireError::Overflow { capacity: N });
        }
        self.write_u8(len)?;
        self.write_bytes(value.as_bytes())
    }
}
