//! Capability traits the application message bus provides to the proxy.
//!
//! The proxy never inspects message contents. It only needs to encode a
//! message, hash it, learn how it should be routed and, for large messages,
//! encode its header and body separately so they can be shipped in parts.

use bincode::error::{DecodeError, EncodeError};

use crate::hash::Hash;

/// An application message that can travel through the proxy.
///
/// Implementations must guarantee that [`from_bytes`](Self::from_bytes)
/// accepts the output of [`to_bytes`](Self::to_bytes), and, when the message
/// is [`Splittable`], the concatenation of its header and body bytes.
pub trait AppMessage: Send + Sync + Sized + 'static {
    /// Encode the whole message.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the message cannot be serialized.
    fn to_bytes(&self) -> Result<Vec<u8>, EncodeError>;

    /// Decode a message from its complete encoding.
    ///
    /// # Errors
    ///
    /// Returns a [`DecodeError`] if `bytes` do not describe a message.
    fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError>;

    /// Stable content hash of the message.
    fn message_hash(&self) -> Hash;

    /// Application-level type discriminator.
    fn message_type(&self) -> u8;

    /// Whether the message is directed at a single peer rather than broadcast.
    fn is_peer_to_peer(&self) -> bool;

    /// Peer the message came from or should be sent to, if known.
    fn network_origin(&self) -> Option<&str>;

    /// Record the peer (or routing sentinel) a delivered message came from.
    fn set_network_origin(&mut self, origin: String);

    /// Header/body view used to ship large messages in parts.
    ///
    /// Messages that cannot be split return `None` and always travel as a
    /// single frame.
    fn as_splittable(&self) -> Option<&dyn Splittable> { None }
}

/// Separate header and body encodings of a large message.
pub trait Splittable {
    /// Encode everything that precedes the body.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the header cannot be serialized.
    fn header_bytes(&self) -> Result<Vec<u8>, EncodeError>;

    /// Encode the body.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the body cannot be serialized.
    fn body_bytes(&self) -> Result<Vec<u8>, EncodeError>;

    /// Content hash of the body; it addresses the parts on the wire.
    fn body_hash(&self) -> Hash;
}
