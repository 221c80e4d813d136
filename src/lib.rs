#![doc(html_root_url = "https://docs.rs/wirebridge/latest")]
//! Public API for the `wirebridge` library.
//!
//! This crate bridges a node's typed application messages onto a
//! frame-oriented peer-to-peer transport. Oversized messages are split into
//! bounded frames on the way out and reassembled within a sliding time window
//! on the way in, while two pump tasks move frames between the application
//! and transport queues.

pub mod config;
pub mod diagnostics;
pub mod envelope;
pub mod fragment;
pub mod frame;
pub mod hash;
pub mod loopback;
pub mod message;
pub mod metrics;
pub mod proxy;
pub mod pump;

pub use config::{ConfigError, ProxyConfig};
pub use envelope::Envelope;
pub use fragment::{FrameBatch, ReassemblyTable, Splitter};
pub use frame::{Frame, FrameHeader, NetworkId, TargetHint, TransportFrame};
pub use hash::Hash;
pub use message::{AppMessage, Splittable};
pub use metrics::{Direction, FRAMES_DROPPED, FRAMES_PROCESSED, StatsSnapshot};
pub use proxy::{Peer, PeerLink, Proxy, ProxyBuilder, ProxyError, SendError, TransportEndpoint};
