//! Frame shape exchanged with the external transport.
//!
//! The transport moves [`TransportFrame`]s through two queues. It never looks
//! inside the payload; it routes on `target_peer` and may use `kind` to tell
//! whole messages from parts.

use bincode::{
    Decode,
    Encode,
    config,
    decode_from_slice,
    encode_to_vec,
    error::{DecodeError, EncodeError},
};
use bytes::Bytes;
use derive_more::{Display, From, Into};

use super::{Frame, FrameHeader, TargetHint};
use crate::hash::Hash;

/// Identifier of the network a frame belongs to.
///
/// # Examples
///
/// ```
/// use wirebridge::frame::NetworkId;
/// assert_eq!(NetworkId::MAIN.get(), 0xfeed_beef);
/// assert_eq!(NetworkId::from(7).to_string(), "0x00000007");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode, Display, From, Into)]
#[display("{_0:#010x}")]
pub struct NetworkId(u32);

impl NetworkId {
    /// Production network.
    pub const MAIN: Self = Self(0xfeed_beef);
    /// Public test network.
    pub const TEST: Self = Self(0xdead_beef);
    /// Local development network.
    pub const LOCAL: Self = Self(0x00be_aded);

    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self { Self(value) }

    /// Return the raw identifier.
    #[must_use]
    pub const fn get(self) -> u32 { self.0 }
}

/// Transport-level frame kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub enum FrameKind {
    /// A whole application message.
    Message,
    /// One part of a split application message.
    MessagePart,
}

impl FrameKind {
    /// Kind for a message of `num_parts` parts.
    #[must_use]
    pub const fn for_parts(num_parts: u32) -> Self {
        if num_parts > 1 {
            Self::MessagePart
        } else {
            Self::Message
        }
    }
}

/// Addressing and part metadata read and written by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct TransportHeader {
    /// Routing sentinel or peer identifier.
    pub target_peer: String,
    /// Hex hash of the whole application message.
    pub app_hash: String,
    /// Application type discriminator.
    pub app_type: String,
    /// Zero-based position of this part.
    pub part_num: u32,
    /// Total number of parts.
    pub num_parts: u32,
    /// Assembly key.
    pub data_hash: Hash,
}

/// Frame as carried by the transport queues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportFrame {
    /// Network the frame belongs to.
    pub network: NetworkId,
    /// Whole message or message part.
    pub kind: FrameKind,
    /// Routing and part metadata.
    pub header: TransportHeader,
    /// Payload bytes.
    pub payload: Bytes,
}

impl TransportFrame {
    /// Wrap an application frame for the transport.
    #[must_use]
    pub fn from_frame(frame: Frame, network: NetworkId) -> Self {
        let (header, payload) = frame.into_parts();
        Self {
            network,
            kind: FrameKind::for_parts(header.num_parts),
            header: TransportHeader {
                target_peer: header.target.to_string(),
                app_hash: header.app_hash,
                app_type: header.app_type,
                part_num: header.part_num,
                num_parts: header.num_parts,
                data_hash: header.data_hash,
            },
            payload,
        }
    }

    /// Repackage the transport frame as an application frame.
    #[must_use]
    pub fn into_frame(self) -> Frame {
        let TransportHeader {
            target_peer,
            app_hash,
            app_type,
            part_num,
            num_parts,
            data_hash,
        } = self.header;
        Frame::new(
            FrameHeader {
                target: TargetHint::from(target_peer.as_str()),
                app_hash,
                app_type,
                part_num,
                num_parts,
                data_hash,
            },
            self.payload,
        )
    }

    /// Encode the frame for a byte-oriented transport.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if serialization fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        encode_to_vec(
            (self.network, self.kind, &self.header, self.payload.as_ref()),
            config::standard(),
        )
    }

    /// Decode a frame produced by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if `bytes` are not a complete frame.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        type Wire = (NetworkId, FrameKind, TransportHeader, Vec<u8>);
        let ((network, kind, header, payload), consumed): (Wire, usize) =
            decode_from_slice(bytes, config::standard())?;
        if consumed != bytes.len() {
            return Err(DecodeError::Other("trailing bytes after transport frame"));
        }
        Ok(Self {
            network,
            kind,
            header,
            payload: Bytes::from(payload),
        })
    }
}
