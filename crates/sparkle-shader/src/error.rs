use sparkle_wire::WireError;
use thiserror::Error;

/// Reasons a shader configuration payload is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The payload ended before the shader had all of its parameters
    #[error("shader payload is truncated")]
    Truncated,
    /// No factory is registered for the type tag
    #[error("unknown shader type {0}")]
    UnknownType(u8),
    /// Compositor payload nests deeper than the pipeline allows
    #[error("shader nesting exceeds {max} levels")]
    NestingTooDeep { max: u8 },
    /// A parameter was read but its value is not acceptable
    #[error("invalid shader parameter: {0}")]
    InvalidParameter(&'static str),
    /// The registry has no room for another factory
    #[error("shader registry is full")]
    RegistryFull,
}

impl From<WireError> for ConfigError {
    fn from(err: WireError) -> Self {
        match err {
            WireError::OutOfBounds { .. } => Self::Truncated,
            WireError::InvalidUtf8 => Self::InvalidParameter("string is not UTF-8"),
            WireError::Overflow { .. } => Self::InvalidParameter("value does not fit"),
        }
    }
}
