//! Payload layouts for the individual message types
//!
//! `BrainPanelShade` carries a shader configuration (type tag + parameters),
//! which is parsed by the shader registry rather than here. `BrainIdRequest`
//! has no payload.

use sparkle_wire::{WireCursor, WireError, WireWriter};

use crate::NodeId;

/// `BrainHello`: `name: str8, pixel_count: u16`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrainHello<'a> {
    pub name: &'a str,
    pub pixel_count: u16,
}

impl<'a> BrainHello<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self, WireError> {
        let mut cursor = WireCursor::new(payload);
        Ok(Self {
            name: cursor.read_str()?,
            pixel_count: cursor.read_u16()?,
        })
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        writer.write_str(self.name)?;
        writer.write_u16(self.pixel_count)
    }
}

/// `BrainIdResponse`: `name: str8`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrainIdResponse<'a> {
    pub name: &'a str,
}

impl<'a> BrainIdResponse<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self, WireError> {
        Ok(Self {
            name: WireCursor::new(payload).read_str()?,
        })
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        writer.write_str(self.name)
    }
}

/// `MapperHello`: `is_running: bool`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapperHello {
    pub is_running: bool,
}

impl MapperHello {
    pub fn parse(payload: &[u8]) -> Result<Self, WireError> {
        Ok(Self {
            is_running: WireCursor::new(payload).read_bool()?,
        })
    }

    pub fn write_to<const N: usize>(&self, writer: &mut WireWriter<N>) -> Result<(), WireError> {
        writer.write_bool(self.is_running)
    }
}

/// `PinkyPong`: `count: u16` followed by `count` node ids
///
/// Ids are read lazily from the borrowed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinkyPong<'a> {
    ids: &'a [u8],
}

impl<'a> PinkyPong<'a> {
    pub fn parse(payload: &'a [u8]) -> Result<Self, WireError> {
        let mut cursor = WireCursor::new(payload);
        let count = usize::from(cursor.read_u16()?);
        Ok(Self {
            ids: cursor.read_bytes(count * 2)?,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + 'a {
        self.ids
            .chunks_exact(2)
            .map(|pair| NodeId(u16::from_be_bytes([pair[0], pair[1]])))
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.ids().any(|id| id == node)
    }

    pub fn write_ids<const N: usize>(
        ids: &[NodeId],
        writer: &mut WireWriter<N>,
    ) -> Result<(), WireError> {
        let count = u16::try_from(ids.len()).map_err(|_| WireError::Overflow { capacity: N })?;
        writer.write_u16(count)?;
        for id in ids {
            writer.write_u16(id.0)?;
        }
        Ok(())
    }
}
