//! The contract the rest of a node uses to talk to one logical peer.

use std::fmt;

use async_trait::async_trait;

use super::SendError;
use crate::message::AppMessage;

/// Names of the two ends of a peer connection.
///
/// Two links are equal when they join the same pair of names in either
/// orientation.
#[derive(Clone, Debug)]
pub struct PeerLink {
    from: String,
    to: String,
}

impl PeerLink {
    /// Create a link from `from` to `to`.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Local end.
    #[must_use]
    pub fn local(&self) -> &str { &self.from }

    /// Remote end.
    #[must_use]
    pub fn remote(&self) -> &str { &self.to }

    /// The same link seen from the other end.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl PartialEq for PeerLink {
    fn eq(&self, other: &Self) -> bool {
        (self.from == other.from && self.to == other.to)
            || (self.from == other.to && self.to == other.from)
    }
}

impl Eq for PeerLink {}

impl fmt::Display for PeerLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A peer the node can exchange application messages with.
#[async_trait]
pub trait Peer<M: AppMessage>: Send + Sync {
    /// Queue `message` for the peer.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] if the message cannot be encoded or the outbound
    /// path has closed.
    async fn send(&self, message: M) -> Result<(), SendError>;

    /// Take the next delivered message without waiting.
    fn receive(&self) -> Option<M>;

    /// Advisory connection count.
    fn weight(&self) -> usize;

    fn set_weight(&self, weight: usize);

    /// Names of both ends.
    fn link(&self) -> &PeerLink;

    /// Items waiting to be received.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool { self.len() == 0 }

    fn bytes_in(&self) -> u64;

    fn bytes_out(&self) -> u64;

    /// Whether `other` joins the same pair of names.
    fn equals(&self, other: &dyn Peer<M>) -> bool { self.link() == other.link() }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::PeerLink;

    #[rstest]
    #[case(PeerLink::new("a", "b"), true)]
    #[case(PeerLink::new("b", "a"), true)]
    #[case(PeerLink::new("a", "c"), false)]
    #[case(PeerLink::new("c", "b"), false)]
    fn links_match_in_either_orientation(#[case] other: PeerLink, #[case] expected: bool) {
        let link = PeerLink::new("a", "b");
        assert_eq!(link == other, expected);
        assert_eq!(other == link, expected);
    }

    #[test]
    fn reversed_link_swaps_ends() {
        let link = PeerLink::new("node", "network").reversed();
        assert_eq!(link.local(), "network");
        assert_eq!(link.remote(), "node");
    }
}
