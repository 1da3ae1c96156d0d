use thiserror::Error;

/// Errors produced while reading or writing wire data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireError {
    /// A read would cross the end of the range
    #[error("read of {wanted} bytes at offset {offset} crosses the end of a {len}-byte range")]
    OutOfBounds {
        offset: usize,
        wanted: usize,
        len: usize,
    },
    /// A write would exceed the writer capacity
    #[error("frame capacity of {capacity} bytes exceeded")]
    Overflow { capacity: usize },
    /// A length-prefixed string did not hold valid UTF-8
    #[error("string field is not valid UTF-8")]
    InvalidUtf8,
}
