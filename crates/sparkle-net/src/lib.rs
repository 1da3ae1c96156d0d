#![cfg_attr(not(test), no_std)]

//! Node messaging over an abstract transport
//!
//! - `msg` - frame layout, message types and node addressing
//! - `protocol` - payload layouts of the individual message types
//! - `transport` - the [`Transport`] trait implemented by sockets and serial links
//! - `slinger` - [`MsgSlinger`], which owns the transport, filters inbound frames
//!   and drains the outbound [`Outbox`]
//!
//! Everything is `no_std` and allocation free; buffers are sized by the
//! constants in [`msg`] and [`slinger`].

pub mod error;
pub mod handler;
pub mod msg;
pub mod protocol;
pub mod slinger;
pub mod transport;

pub use error::{FrameError, SlingerError};
pub use handler::MsgHandler;
pub use msg::{BROADCAST, HEADER_LEN, MAX_FRAME_LEN, Msg, MsgHeader, MsgType, NodeId};
pub use slinger::{
    MAX_INBOUND_PER_POLL, MAX_OUTBOUND_PAYLOAD, MsgSlinger, OUTBOX_DEPTH, OutboundMsg, Outbox,
    RetryPolicy, SlingerStats, StatsSnapshot,
};
pub use transport::Transport;
