//! Wire type tag to shader factory mapping
//!
//! A configuration payload starts with one type tag byte; the registry looks
//! up the factory for that tag and hands it a cursor positioned just after it.

use heapless::Vec;
use sparkle_wire::WireCursor;

use crate::{
    ConfigError,
    shader::{CompositorShader, PixelShader, ShaderSlot, SineWaveShader, SolidShader},
};

/// Maximum number of distinct shader types a registry can hold
pub const MAX_SHADER_TYPES: usize = 8;

/// Maximum compositor nesting accepted from the wire
pub const MAX_NESTING: u8 = 4;

/// Builds a shader from the bytes following its type tag
pub type ShaderFactory =
    fn(&mut WireCursor<'_>, &BuildContext<'_>) -> Result<ShaderSlot, ConfigError>;

/// Wire identifiers of the built-in shaders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShaderType {
    Solid = 0,
    Pixel = 1,
    SineWave = 2,
    Compositor = 3,
}

impl ShaderType {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::Solid,
            1 => Self::Pixel,
            2 => Self::SineWave,
            3 => Self::Compositor,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solid => "solid",
            Self::Pixel => "pixel",
            Self::SineWave => "sine_wave",
            Self::Compositor => "compositor",
        }
    }
}

/// State threaded through a (possibly nested) shader build
pub struct BuildContext<'r> {
    registry: &'r ShaderRegistry,
    depth: u8,
}

impl BuildContext<'_> {
    /// Read a type tag and build the shader it names
    pub fn build(&self, cursor: &mut WireCursor<'_>) -> Result<ShaderSlot, ConfigError> {
        let tag = cursor.read_u8()?;
        let factory = self
            .registry
            .factory(tag)
            .ok_or(ConfigError::UnknownType(tag))?;
        factory(cursor, self)
    }

    /// Build a shader one level deeper than the current one
    pub fn build_nested(&self, cursor: &mut WireCursor<'_>) -> Result<ShaderSlot, ConfigError> {
        if self.depth >= MAX_NESTING {
            return Err(ConfigError::NestingTooDeep { max: MAX_NESTING });
        }
        BuildContext {
            registry: self.registry,
            depth: self.depth + 1,
        }
        .build(cursor)
    }
}

/// Shader registry
pub struct ShaderRegistry {
    factories: Vec<(u8, ShaderFactory), MAX_SHADER_TYPES>,
}

impl Default for ShaderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ShaderRegistry {
    /// Registry with no factories
    pub const fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Registry with every built-in shader under its wire tag
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        let builtins: [(ShaderType, ShaderFactory); 4] = [
            (ShaderType::Solid, build_solid),
            (ShaderType::Pixel, build_pixel),
            (ShaderType::SineWave, build_sine_wave),
            (ShaderType::Compositor, build_compositor),
        ];
        for (shader_type, factory) in builtins {
            // Capacity is above the built-in count
            let _ = registry.register(shader_type as u8, factory);
        }
        registry
    }

    /// Register a factory, replacing any previous one for `tag`
    pub fn register(&mut self, tag: u8, factory: ShaderFactory) -> Result<(), ConfigError> {
        if let Some(entry) = self.factories.iter_mut().find(|(t, _)| *t == tag) {
            entry.1 = factory;
            return Ok(());
        }
        self.factories
            .push((tag, factory))
            .map_err(|_| ConfigError::RegistryFull)
    }

    pub fn factory(&self, tag: u8) -> Option<ShaderFactory> {
        self.factories
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, factory)| *factory)
    }

    /// Build a shader from a full configuration payload (type tag + parameters)
    pub fn build(&self, payload: &[u8]) -> Result<ShaderSlot, ConfigError> {
        self.build_from(&mut WireCursor::new(payload))
    }

    pub fn build_from(&self, cursor: &mut WireCursor<'_>) -> Result<ShaderSlot, ConfigError> {
        BuildContext {
            registry: self,
            depth: 0,
        }
        .build(cursor)
    }
}

fn build_solid(cursor: &mut WireCursor<'_>, _: &BuildContext<'_>) -> Result<ShaderSlot, ConfigError> {
    SolidShader::parse(cursor).map(ShaderSlot::Solid)
}

fn build_pixel(cursor: &mut WireCursor<'_>, _: &BuildContext<'_>) -> Result<ShaderSlot, ConfigError> {
    PixelShader::parse(cursor).map(ShaderSlot::Pixel)
}

fn build_sine_wave(
    cursor: &mut WireCursor<'_>,
    _: &BuildContext<'_>,
) -> Result<ShaderSlot, ConfigError> {
    SineWaveShader::parse(cursor).map(ShaderSlot::SineWave)
}

fn build_compositor(
    cursor: &mut WireCursor<'_>,
    ctx: &BuildContext<'_>,
) -> Result<ShaderSlot, ConfigError> {
    CompositorShader::parse(cursor, ctx).map(ShaderSlot::Compositor)
}
