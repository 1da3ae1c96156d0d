//! Two-shader compositor
//!
//! Runs two nested shaders against the same incoming color and mixes their
//! outputs: `out = blend(a, op(a, b), fade)`.

use alloc::boxed::Box;

use sparkle_wire::{WireCursor, WireError, WireWriter};

use super::{FrameContext, Shader, ShaderSlot};
use crate::{
    ConfigError, Rgb,
    color::{add_colors, blend_colors},
    registry::BuildContext,
};

/// How the second shader is combined with the first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CompositingMode {
    /// B replaces A
    Overlay = 0,
    /// A and B are summed, saturating
    Add = 1,
}

impl CompositingMode {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Overlay,
            1 => Self::Add,
            _ => return None,
        })
    }

    #[inline]
    fn combine(self, a: Rgb, b: Rgb) -> Rgb {
        match self {
            Self::Overlay => b,
            Self::Add => add_colors(a, b),
        }
    }
}

/// Compositor shader
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorShader {
    a: Box<ShaderSlot>,
    b: Box<ShaderSlot>,
    mode: CompositingMode,
    /// Share of the combined color in the output (0 = all A, 255 = all combined)
    fade: u8,
}

impl CompositorShader {
    pub fn new(a: ShaderSlot, b: ShaderSlot, mode: CompositingMode, fade: u8) -> Self {
        Self {
            a: Box::new(a),
            b: Box::new(b),
            mode,
            fade,
        }
    }

    /// Parse `shader A, shader B, mode: u8, fade: u8`
    ///
    /// Nested shaders are built through `ctx`, which bounds the nesting depth.
    pub fn parse(cursor: &mut WireCursor<'_>, ctx: &BuildContext<'_>) -> Result<Self, ConfigError> {
        let a = ctx.build_nested(cursor)?;
        let b = ctx.build_nested(cursor)?;
        let mode = CompositingMode::from_raw(cursor.read_u8()?)
            .ok_or(ConfigError::InvalidParameter("unknown compositing mode"))?;
        let fade = cursor.read_u8()?;
        Ok(Self::new(a, b, mode, fade))
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        self.a.write_to(writer)?;
        self.b.write_to(writer)?;
        writer.write_u8(self.mode as u8)?;
        writer.write_u8(self.fade)
    }
}

impl Shader for CompositorShader {
    fn begin(&mut self, ctx: &FrameContext) {
        self.a.begin(ctx);
        self.b.begin(ctx);
    }

    fn apply(&self, pixel_index: u16, color_out: &mut Rgb, color_in: &Rgb) {
        let mut a = Rgb::default();
        let mut b = Rgb::default();
        self.a.apply(pixel_index, &mut a, color_in);
        self.b.apply(pixel_index, &mut b, color_in);
        *color_out = blend_colors(a, self.mode.combine(a, b), self.fade);
    }

    fn end(&mut self) {
        self.a.end();
        self.b.end();
    }
}
