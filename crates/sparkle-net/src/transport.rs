//! Transport abstraction
//!
//! A transport moves whole frames. Datagram sockets map onto it directly;
//! stream links need their own framing underneath.

use core::fmt::Debug;

/// Datagram transport used by the [`MsgSlinger`](crate::MsgSlinger)
#[allow(async_fn_in_trait)]
pub trait Transport {
    type Error: Debug;

    /// Bring the link up. May be called again after a failure.
    async fn open(&mut self) -> Result<(), Self::Error>;

    /// Send one complete frame
    ///
    /// The future may be dropped before it completes when the transport is
    /// busy; the same frame is then sent again in full later.
    async fn send(&mut self, frame: &[u8]) -> Result<(), Self::Error>;

    /// Receive one frame into `buf`, returning its length
    ///
    /// Must be cancel-safe: dropping the future before it completes must not
    /// lose a frame.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}
