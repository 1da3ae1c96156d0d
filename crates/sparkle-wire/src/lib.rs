#![cfg_attr(not(test), no_std)]

//! Bounds-checked binary codec shared by the shader pipeline and the network layer.
//!
//! - [`WireCursor`] reads big-endian values out of a borrowed byte slice
//! - [`WireWriter`] builds frames into a fixed-capacity `heapless` buffer
//!
//! Neither type ever panics on short or oversized input: every operation
//! returns a [`WireError`] instead.

mod cursor;
mod error;
mod writer;

pub use cursor::WireCursor;
pub use error::WireError;
pub use writer::WireWriter;

/// Number of bytes occupied by one RGB triplet on the wire
pub const RGB_LEN: usize = 3;
