//! Frames exchanged between the application and transport boundaries.
//!
//! A [`Frame`] is the application-side unit: one whole encoded message or one
//! part of a split message, plus the metadata needed to route and reassemble
//! it. A [`TransportFrame`] is the same information in the shape the
//! transport queues carry.

pub mod target;
pub mod transport;

use bytes::Bytes;
pub use target::{BROADCAST_FLAG, RANDOM_PEER_FLAG, TargetHint};
pub use transport::{FrameKind, NetworkId, TransportFrame, TransportHeader};

use crate::hash::Hash;

/// Routing and reassembly metadata attached to every [`Frame`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameHeader {
    /// Where the transport should send the frame.
    pub target: TargetHint,
    /// Hex hash of the whole application message.
    pub app_hash: String,
    /// Application type discriminator, for tracing only.
    pub app_type: String,
    /// Zero-based position of this part.
    pub part_num: u32,
    /// Total number of parts in the message.
    pub num_parts: u32,
    /// Hash identifying the assembly this part belongs to.
    pub data_hash: Hash,
}

impl FrameHeader {
    /// Header for a message that travels in one piece.
    #[must_use]
    pub fn whole(
        target: TargetHint,
        app_hash: String,
        app_type: String,
        data_hash: Hash,
    ) -> Self {
        Self {
            target,
            app_hash,
            app_type,
            part_num: 0,
            num_parts: 1,
            data_hash,
        }
    }

    /// Copy of this header describing part `part_num` of `num_parts`.
    #[must_use]
    pub fn for_part(&self, part_num: u32, num_parts: u32) -> Self {
        Self {
            part_num,
            num_parts,
            ..self.clone()
        }
    }
}

/// One addressed unit of payload, whole or partial.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    header: FrameHeader,
    payload: Bytes,
}

impl Frame {
    /// Construct a frame.
    #[must_use]
    pub fn new(header: FrameHeader, payload: impl Into<Bytes>) -> Self {
        Self {
            header,
            payload: payload.into(),
        }
    }

    /// Return the frame header.
    #[must_use]
    pub const fn header(&self) -> &FrameHeader { &self.header }

    /// Return the payload bytes.
    #[must_use]
    pub fn payload(&self) -> &Bytes { &self.payload }

    /// Routing hint for the frame.
    #[must_use]
    pub const fn target(&self) -> &TargetHint { &self.header.target }

    /// Position of this part within the message.
    #[must_use]
    pub const fn part_num(&self) -> u32 { self.header.part_num }

    /// Number of parts in the message.
    #[must_use]
    pub const fn num_parts(&self) -> u32 { self.header.num_parts }

    /// Assembly key shared by every part of the message.
    #[must_use]
    pub const fn data_hash(&self) -> Hash { self.header.data_hash }

    /// Consume the frame, returning its components.
    #[must_use]
    pub fn into_parts(self) -> (FrameHeader, Bytes) { (self.header, self.payload) }
}

#[cfg(test)]
mod tests;
