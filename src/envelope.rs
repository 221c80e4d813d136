//! Reference [`AppMessage`] implementation backed by bincode.
//!
//! `Envelope` carries an opaque payload together with the routing metadata
//! the proxy needs. The payload is the final encoded field, so the encoding
//! splits cleanly into a header (everything up to and including the payload
//! length prefix) and a body (the raw payload bytes).

use bincode::{
    Decode,
    Encode,
    config,
    decode_from_slice,
    encode_to_vec,
    error::{DecodeError, EncodeError},
};

use crate::{
    hash::Hash,
    message::{AppMessage, Splittable},
};

/// Opaque application message with routing metadata.
///
/// # Examples
///
/// ```
/// use wirebridge::{envelope::Envelope, message::AppMessage};
///
/// let envelope = Envelope::broadcast(7, vec![1, 2, 3]);
/// let bytes = envelope.to_bytes().expect("encode");
/// assert_eq!(Envelope::from_bytes(&bytes).expect("decode"), envelope);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Encode, Decode)]
pub struct Envelope {
    message_type: u8,
    peer_to_peer: bool,
    origin: Option<String>,
    payload: Vec<u8>,
}

impl Envelope {
    /// Create a message destined for every peer.
    #[must_use]
    pub fn broadcast(message_type: u8, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            peer_to_peer: false,
            origin: None,
            payload,
        }
    }

    /// Create a peer-to-peer message, optionally addressed to `target`.
    ///
    /// Without a target the transport picks a random peer.
    #[must_use]
    pub fn directed(message_type: u8, target: Option<String>, payload: Vec<u8>) -> Self {
        Self {
            message_type,
            peer_to_peer: true,
            origin: target,
            payload,
        }
    }

    /// Borrow the payload.
    #[must_use]
    pub fn payload(&self) -> &[u8] { &self.payload }

    /// Consume the envelope, returning the payload.
    #[must_use]
    pub fn into_payload(self) -> Vec<u8> { self.payload }

    /// Return a copy with the origin cleared, for comparisons that ignore routing.
    #[must_use]
    pub fn without_origin(mut self) -> Self {
        self.origin = None;
        self
    }
}

impl AppMessage for Envelope {
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError> { encode_to_vec(self, config::standard()) }

    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        let (envelope, consumed): (Self, usize) = decode_from_slice(bytes, config::standard())?;
        if consumed != bytes.len() {
            return Err(DecodeError::Other("trailing bytes after envelope"));
        }
        Ok(envelope)
    }

    fn message_hash(&self) -> Hash {
        Hash::digest_parts([
            [self.message_type, u8::from(self.peer_to_peer)].as_slice(),
            self.payload.as_slice(),
        ])
    }

    fn message_type(&self) -> u8 { self.message_type }

    fn is_peer_to_peer(&self) -> bool { self.peer_to_peer }

    fn network_origin(&self) -> Option<&str> { self.origin.as_deref() }

    fn set_network_origin(&mut self, origin: String) { self.origin = Some(origin); }

    fn as_splittable(&self) -> Option<&dyn Splittable> { Some(self) }
}

impl Splittable for Envelope {
    fn header_bytes(&self) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = self.to_bytes()?;
        let header_len = bytes.len().saturating_sub(self.payload.len());
        bytes.truncate(header_len);
        Ok(bytes)
    }

    fn body_bytes(&self) -> Result<Vec<u8>, EncodeError> { Ok(self.payload.clone()) }

    fn body_hash(&self) -> Hash { Hash::digest(&self.payload) }
}
