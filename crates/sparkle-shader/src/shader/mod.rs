//! Shader system with compile-time known variants
//!
//! Every shader is stored in the [`ShaderSlot`] enum so the renderer owns a
//! single sized value it can swap between frames. Each variant implements
//! the [`Shader`] lifecycle trait.

mod compositor;
mod pixel;
mod sine_wave;
mod solid;

pub use compositor::{CompositingMode, CompositorShader};
pub use pixel::PixelShader;
pub use sine_wave::SineWaveShader;
pub use solid::SolidShader;

use embassy_time::Duration;
use sparkle_wire::{WireError, WireWriter};

use crate::{Rgb, color::BLACK, registry::ShaderType};

/// Per-frame information handed to [`Shader::begin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameContext {
    /// Sequence number of the frame, wrapping
    pub frame: u32,
    /// Time since the renderer produced its first frame
    pub elapsed: Duration,
    /// Number of pixels `apply` will be called for
    pub pixel_count: u16,
}

/// Per-pixel color transform with a three-phase lifecycle
///
/// For every rendered frame the pipeline calls [`begin`](Shader::begin) once,
/// [`apply`](Shader::apply) once per pixel index in increasing order, and
/// [`end`](Shader::end) once. All three run on the render activity only.
pub trait Shader {
    /// Prepare per-frame state
    ///
    /// Anything time-based or fallible belongs here, never in `apply`.
    fn begin(&mut self, ctx: &FrameContext) {
        let _ = ctx;
    }

    /// Compute one pixel
    ///
    /// Must be O(1) in the pixel count and must not block.
    fn apply(&self, pixel_index: u16, color_out: &mut Rgb, color_in: &Rgb);

    /// Release per-frame state
    fn end(&mut self) {}
}

/// Run one full `begin` / `apply` x N / `end` pass over `pixels`
///
/// `apply` is called for `0..min(ctx.pixel_count, pixels.len())`, each index
/// exactly once. `color_in` is the pixel value before this pass.
pub fn run_pass<S: Shader + ?Sized>(shader: &mut S, ctx: &FrameContext, pixels: &mut [Rgb]) {
    shader.begin(ctx);
    for (index, pixel) in (0..ctx.pixel_count).zip(pixels.iter_mut()) {
        let color_in = *pixel;
        shader.apply(index, pixel, &color_in);
    }
    shader.end();
}

/// Shader slot - enum containing all possible shaders
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ShaderSlot {
    /// No shader - all pixels black
    #[default]
    Off,
    /// Single fixed color
    Solid(SolidShader),
    /// Explicit per-pixel colors
    Pixel(PixelShader),
    /// Sine brightness wave of one color
    SineWave(SineWaveShader),
    /// Combination of two nested shaders
    Compositor(CompositorShader),
}

impl ShaderSlot {
    /// Check if the slot is Off
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }

    /// Wire type of the shader, `None` for Off
    pub fn shader_type(&self) -> Option<ShaderType> {
        Some(match self {
            Self::Off => return None,
            Self::Solid(_) => ShaderType::Solid,
            Self::Pixel(_) => ShaderType::Pixel,
            Self::SineWave(_) => ShaderType::SineWave,
            Self::Compositor(_) => ShaderType::Compositor,
        })
    }

    /// Encode as a configuration payload: type tag followed by the shader parameters
    ///
    /// `Off` has no wire form and writes nothing.
    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        let Some(shader_type) = self.shader_type() else {
            return Ok(());
        };
        writer.write_u8(shader_type as u8)?;
        match self {
            Self::Off => Ok(()),
            Self::Solid(shader) => shader.write_to(writer),
            Self::Pixel(shader) => shader.write_to(writer),
            Self::SineWave(shader) => shader.write_to(writer),
            Self::Compositor(shader) => shader.write_to(writer),
        }
    }
}

impl Shader for ShaderSlot {
    fn begin(&mut self, ctx: &FrameContext) {
        match self {
            Self::Off => {}
            Self::Solid(shader) => shader.begin(ctx),
            Self::Pixel(shader) => shader.begin(ctx),
            Self::SineWave(shader) => shader.begin(ctx),
            Self::Compositor(shader) => shader.begin(ctx),
        }
    }

    fn apply(&self, pixel_index: u16, color_out: &mut Rgb, color_in: &Rgb) {
        match self {
            Self::Off => *color_out = BLACK,
            Self::Solid(shader) => shader.apply(pixel_index, color_out, color_in),
            Self::Pixel(shader) => shader.apply(pixel_index, color_out, color_in),
            Self::SineWave(shader) => shader.apply(pixel_index, color_out, color_in),
            Self::Compositor(shader) => shader.apply(pixel_index, color_out, color_in),
        }
    }

    fn end(&mut self) {
        match self {
            Self::Off => {}
            Self::Solid(shader) => shader.end(),
            Self::Pixel(shader) => shader.end(),
            Self::SineWave(shader) => shader.end(),
            Self::Compositor(shader) => shader.end(),
        }
    }
}
