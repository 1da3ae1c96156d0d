//! Explicit per-pixel color shader

use alloc::vec::Vec;

use sparkle_wire::{RGB_LEN, WireCursor, WireError, WireWriter};

use super::Shader;
use crate::{ConfigError, Rgb};

/// Pixel shader - one color per pixel, as sent by the controller
///
/// Pixels beyond the received color list keep their incoming color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelShader {
    colors: Vec<Rgb>,
}

impl PixelShader {
    pub fn new(colors: Vec<Rgb>) -> Self {
        Self { colors }
    }

    /// Parse `count: u16` followed by `count` RGB triplets
    pub fn parse(cursor: &mut WireCursor<'_>) -> Result<Self, ConfigError> {
        let count = usize::from(cursor.read_u16()?);
        // Bounds-checked before anything is allocated
        let bytes = cursor.read_bytes(count * RGB_LEN)?;
        let colors = bytes
            .chunks_exact(RGB_LEN)
            .map(|c| Rgb {
                r: c[0],
                g: c[1],
                b: c[2],
            })
            .collect();
        Ok(Self { colors })
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        let count =
            u16::try_from(self.colors.len()).map_err(|_| WireError::Overflow { capacity: N })?;
        writer.write_u16(count)?;
        for color in &self.colors {
            writer.write_rgb(*color)?;
        }
        Ok(())
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }
}

impl Shader for PixelShader {
    fn apply(&self, pixel_index: u16, color_out: &mut Rgb, color_in: &Rgb) {
        *color_out = self
            .colors
            .get(usize::from(pixel_index))
            .copied()
            .unwrap_or(*color_in);
    }
}
