//! Message frames
//!
//! ```text
//! [type: u8][source: u16 BE][dest: u16 BE][payload ...]
//! ```

use core::fmt;

use sparkle_wire::{WireCursor, WireError, WireWriter};

use crate::FrameError;

/// Header length in bytes
pub const HEADER_LEN: usize = 5;

/// Largest frame sent or accepted (one unfragmented UDP datagram)
pub const MAX_FRAME_LEN: usize = 1472;

/// Destination that every node accepts
pub const BROADCAST: NodeId = NodeId(0xFFFF);

/// Message types, numbered as on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgType {
    /// Node presence announcement
    BrainHello = 0,
    /// Shader configuration for a panel
    BrainPanelShade = 1,
    MapperHello = 2,
    /// Request for a node's name
    BrainIdRequest = 3,
    BrainIdResponse = 4,
    /// Acknowledgement of hellos from the show controller
    PinkyPong = 5,
}

impl MsgType {
    pub const fn from_raw(raw: u8) -> Option<Self> {
        Some(match raw {
            0 => Self::BrainHello,
            1 => Self::BrainPanelShade,
            2 => Self::MapperHello,
            3 => Self::BrainIdRequest,
            4 => Self::BrainIdResponse,
            5 => Self::PinkyPong,
            _ => return None,
        })
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BrainHello => "brain_hello",
            Self::BrainPanelShade => "brain_panel_shade",
            Self::MapperHello => "mapper_hello",
            Self::BrainIdRequest => "brain_id_request",
            Self::BrainIdResponse => "brain_id_response",
            Self::PinkyPong => "pinky_pong",
        }
    }
}

/// Address of a node on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u16);

impl NodeId {
    pub const fn is_broadcast(self) -> bool {
        self.0 == BROADCAST.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_broadcast() {
            f.write_str("*")
        } else {
            write!(f, "{:04x}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgHeader {
    pub kind: MsgType,
    pub source: NodeId,
    pub dest: NodeId,
}

impl MsgHeader {
    /// Whether `node` should process a message with this header
    pub const fn is_for(&self, node: NodeId) -> bool {
        self.dest.is_broadcast() || self.dest.0 == node.0
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        writer.write_u8(self.kind as u8)?;
        writer.write_u16(self.source.0)?;
        writer.write_u16(self.dest.0)
    }
}

/// Decoded message, borrowing its payload from the receive buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Msg<'a> {
    header: MsgHeader,
    payload: &'a [u8],
}

impl<'a> Msg<'a> {
    pub const fn new(header: MsgHeader, payload: &'a [u8]) -> Self {
        Self { header, payload }
    }

    /// Validate and split a raw frame
    pub fn decode(frame: &'a [u8]) -> Result<Self, FrameError> {
        let too_short = |_: WireError| FrameError::TooShort { len: frame.len() };
        let mut cursor = WireCursor::new(frame);
        let raw_kind = cursor.read_u8().map_err(too_short)?;
        let source = cursor.read_u16().map_err(too_short)?;
        let dest = cursor.read_u16().map_err(too_short)?;
        let kind = MsgType::from_raw(raw_kind).ok_or(FrameError::UnknownType(raw_kind))?;

        Ok(Self {
            header: MsgHeader {
                kind,
                source: NodeId(source),
                dest: NodeId(dest),
            },
            payload: cursor.rest(),
        })
    }

    /// Serialise header and payload as one frame
    pub fn encode<const N: usize>(&self) -> Result<WireWriter<N>, WireError> {
        let mut writer = WireWriter::new();
        self.header.write_to(&mut writer)?;
        writer.write_bytes(self.payload)?;
        Ok(writer)
    }

    pub const fn header(&self) -> &MsgHeader {
        &self.header
    }

    pub const fn kind(&self) -> MsgType {
        self.header.kind
    }

    pub const fn source(&self) -> NodeId {
        self.header.source
    }

    pub const fn dest(&self) -> NodeId {
        self.header.dest
    }

    pub const fn payload(&self) -> &'a [u8] {
        self.payload
    }

    pub fn payload_cursor(&self) -> WireCursor<'a> {
        WireCursor::new(self.payload)
    }
}
