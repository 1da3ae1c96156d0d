//! Sine brightness wave along the strip
//!
//! Brightness of a single color follows a sine curve over the pixel index.
//! The wave can drift along the strip with a fixed cycle time; the drift is
//! computed once per frame in `begin`.

use sparkle_wire::{WireCursor, WireError, WireWriter};

use super::{FrameContext, Shader};
use crate::{ConfigError, Rgb, color::scale_color, math8::sin8};

/// Sine wave shader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SineWaveShader {
    color: Rgb,
    /// Starting phase, 65536 = one full turn
    phase: u16,
    /// Pixels per wave period, 0 = the whole strip
    wavelength: u16,
    /// Time for the wave to drift one period, 0 = static
    cycle_ms: u16,
    frame_phase: u16,
    frame_wavelength: u16,
}

impl SineWaveShader {
    pub const fn new(color: Rgb, phase: u16, wavelength: u16, cycle_ms: u16) -> Self {
        Self {
            color,
            phase,
            wavelength,
            cycle_ms,
            frame_phase: phase,
            frame_wavelength: 1,
        }
    }

    /// Parse `RGB, phase: u16, wavelength: u16, cycle_ms: u16`
    pub fn parse(cursor: &mut WireCursor<'_>) -> Result<Self, ConfigError> {
        let color = cursor.read_rgb()?;
        let phase = cursor.read_u16()?;
        let wavelength = cursor.read_u16()?;
        let cycle_ms = cursor.read_u16()?;
        Ok(Self::new(color, phase, wavelength, cycle_ms))
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        writer.write_rgb(self.color)?;
        writer.write_u16(self.phase)?;
        writer.write_u16(self.wavelength)?;
        writer.write_u16(self.cycle_ms)
    }
}

impl Shader for SineWaveShader {
    #[allow(clippy::cast_possible_truncation)]
    fn begin(&mut self, ctx: &FrameContext) {
        let mut phase = self.phase;
        if self.cycle_ms > 0 {
            let cycle = u64::from(self.cycle_ms);
            let into_cycle = ctx.elapsed.as_millis() % cycle;
            phase = phase.wrapping_add(((into_cycle << 16) / cycle) as u16);
        }
        self.frame_phase = phase;
        self.frame_wavelength = if self.wavelength == 0 {
            ctx.pixel_count.max(1)
        } else {
            self.wavelength
        };
    }

    #[allow(clippy::cast_possible_truncation)]
    fn apply(&self, pixel_index: u16, color_out: &mut Rgb, _color_in: &Rgb) {
        let wavelength = u32::from(self.frame_wavelength);
        let step = ((u32::from(pixel_index) % wavelength) << 16) / wavelength;
        let theta = self.frame_phase.wrapping_add(step as u16);
        *color_out = scale_color(self.color, sin8((theta >> 8) as u8));
    }
}
