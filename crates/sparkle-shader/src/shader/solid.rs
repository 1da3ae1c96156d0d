//! Solid color fill shader
//!
//! Overrides every pixel with one configured color. The incoming color is
//! ignored, so this is a full replacement rather than a blend.

use sparkle_wire::{WireCursor, WireError, WireWriter};

use super::Shader;
use crate::{ConfigError, Rgb};

/// Solid shader - fills all pixels with one color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolidShader {
    color: Rgb,
}

impl SolidShader {
    pub const fn new(color: Rgb) -> Self {
        Self { color }
    }

    /// Create from RGB values
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(Rgb { r, g, b })
    }

    /// Parse the 3-byte `R, G, B` payload
    ///
    /// Trailing bytes are left unread.
    pub fn parse(cursor: &mut WireCursor<'_>) -> Result<Self, ConfigError> {
        Ok(Self::new(cursor.read_rgb()?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        Self::parse(&mut WireCursor::new(bytes))
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        writer.write_rgb(self.color)
    }

    pub fn color(&self) -> Rgb {
        self.color
    }
}

impl Shader for SolidShader {
    fn apply(&self, _pixel_index: u16, color_out: &mut Rgb, _color_in: &Rgb) {
        *color_out = self.color;
    }
}
