use sparkle_wire::WireError;
use thiserror::Error;

/// Reasons an inbound frame is not turned into a [`Msg`](crate::Msg)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame of {len} bytes is shorter than the header")]
    TooShort { len: usize },
    #[error("unknown message type {0}")]
    UnknownType(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SlingerError {
    #[error("transport did not open after {attempts} attempts")]
    TransportOpenFailed { attempts: u32 },
    #[error("transport error")]
    Transport,
    #[error("cannot encode frame: {0}")]
    Encode(#[from] WireError),
}
