//! Utilities for exercising [`Proxy`](wirebridge::Proxy) pairs in tests.
//!
//! [`wired_pair`] builds two proxies joined by the in-memory loopback and
//! starts everything, so a test only has to send and poll.
//!
//! ```rust
//! use wirebridge::Envelope;
//! use wirebridge_testing::{payload, poll_receive, wired_pair};
//!
//! # async fn example() {
//! let pair = wired_pair::<Envelope>(|builder| builder);
//! pair.a.send(Envelope::broadcast(1, payload(16))).await.unwrap();
//! let message = poll_receive(&pair.b).await;
//! assert!(message.is_some());
//! # }
//! ```

pub mod logging;
pub mod proxies;

pub use logging::{LoggerHandle, logger};
pub use proxies::{ProxyPair, payload, poll_receive, poll_receive_for, wired_pair};
