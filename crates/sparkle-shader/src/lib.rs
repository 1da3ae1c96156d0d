#![cfg_attr(not(test), no_std)]

//! Shader pipeline for a single lighting node
//!
//! Architecture layers:
//! - `color` / `math8` - 8-bit color arithmetic
//! - `shader` - [`Shader`] lifecycle trait, concrete shaders and the [`ShaderSlot`] enum
//! - `registry` - wire type tag to shader factory mapping
//! - `renderer` - frame buffer owner that swaps shaders between frames and drives the pass
//! - `driver` - hardware abstraction ([`LedDriver`] trait + `smart-leds` adapter)
//!
//! Shaders are configured from untrusted bytes, so every constructor goes through a
//! [`WireCursor`](sparkle_wire::WireCursor) and reports [`ConfigError`] instead of panicking.

extern crate alloc;

pub mod color;
pub mod driver;
pub mod error;
pub mod math8;
pub mod registry;
pub mod renderer;
pub mod shader;

pub use color::Rgb;
pub use driver::{LedDriver, SmartLedsDriver};
pub use error::ConfigError;
pub use registry::{BuildContext, ShaderFactory, ShaderRegistry, ShaderType};
pub use renderer::{Renderer, ShaderSignal};
pub use shader::{
    CompositingMode, CompositorShader, FrameContext, PixelShader, Shader, ShaderSlot,
    SineWaveShader, SolidShader, run_pass,
};
