//! Routing hints telling the transport where a frame should go.

use std::{convert::Infallible, fmt, str::FromStr};

use crate::message::AppMessage;

/// Sentinel the transport interprets as "send to every peer".
pub const BROADCAST_FLAG: &str = "<BROADCAST>";
/// Sentinel the transport interprets as "send to any one peer".
pub const RANDOM_PEER_FLAG: &str = "<RANDOM>";

/// How the transport should target a frame.
///
/// On the wire the hint is a string: one of the sentinels above or a peer
/// identifier.
///
/// # Examples
///
/// ```
/// use wirebridge::frame::TargetHint;
/// let hint: TargetHint = "<BROADCAST>".parse().expect("infallible");
/// assert_eq!(hint, TargetHint::Broadcast);
/// assert_eq!(TargetHint::peer("abc").to_string(), "abc");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetHint {
    /// Deliver to every connected peer.
    Broadcast,
    /// Deliver to one peer chosen by the transport.
    RandomPeer,
    /// Deliver to the named peer.
    Peer(String),
}

impl TargetHint {
    /// Hint addressing a specific peer.
    #[must_use]
    pub fn peer(id: impl Into<String>) -> Self { Self::Peer(id.into()) }

    /// Resolve the hint for an outbound message.
    ///
    /// Non peer-to-peer messages are broadcast. Peer-to-peer messages without
    /// a known origin go to a random peer; otherwise they go to their origin.
    #[must_use]
    pub fn for_message<M: AppMessage>(message: &M) -> Self {
        if !message.is_peer_to_peer() {
            return Self::Broadcast;
        }
        match message.network_origin() {
            Some(origin) if !origin.is_empty() => Self::peer(origin),
            _ => Self::RandomPeer,
        }
    }

    /// Render the hint in its wire form.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Broadcast => BROADCAST_FLAG,
            Self::RandomPeer => RANDOM_PEER_FLAG,
            Self::Peer(id) => id,
        }
    }
}

impl fmt::Display for TargetHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for TargetHint {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            BROADCAST_FLAG => Self::Broadcast,
            RANDOM_PEER_FLAG => Self::RandomPeer,
            other => Self::peer(other),
        })
    }
}

impl From<&str> for TargetHint {
    fn from(value: &str) -> Self {
        match value.parse() {
            Ok(hint) => hint,
            Err(never) => match never {},
        }
    }
}
