//! Metric helpers for `wirebridge`.
//!
//! This module defines metric names and helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate, plus [`ProxyStats`], the
//! in-process counters every proxy keeps whether or not a recorder is
//! installed. Receive-side losses never surface as errors, so these counters
//! are how operators and tests observe them.

use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(feature = "metrics")]
use metrics::counter;

/// Name of the counter tracking frames moved by the pumps.
pub const FRAMES_PROCESSED: &str = "wirebridge_frames_processed_total";
/// Name of the counter tracking frames dropped on the receive path.
pub const FRAMES_DROPPED: &str = "wirebridge_frames_dropped_total";
/// Name of the counter tracking assemblies lost to the sliding window.
pub const ASSEMBLIES_EVICTED: &str = "wirebridge_assemblies_evicted_total";
/// Name of the counter tracking messages handed to the application.
pub const MESSAGES_DELIVERED: &str = "wirebridge_messages_delivered_total";

/// Direction of frame processing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Frames arriving from the transport.
    Inbound,
    /// Frames leaving for the transport.
    Outbound,
}

impl Direction {
    /// Label value used for this direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Direction::Inbound => "inbound",
            Direction::Outbound => "outbound",
        }
    }
}

/// Why a frame or assembly was dropped on the receive path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The frame failed validation.
    Malformed,
    /// The message bytes did not decode.
    Decode,
}

impl DropReason {
    const fn as_str(self) -> &'static str {
        match self {
            DropReason::Malformed => "malformed",
            DropReason::Decode => "decode",
        }
    }
}

/// Record a frame moved by a pump in the given direction.
pub fn inc_frames(direction: Direction) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_PROCESSED, "direction" => direction.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = direction;
}

/// Record a dropped frame or assembly.
pub fn inc_dropped(reason: DropReason) {
    #[cfg(feature = "metrics")]
    counter!(FRAMES_DROPPED, "reason" => reason.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = reason.as_str();
}

/// Record assemblies evicted by the sliding window.
pub fn inc_evicted(count: u64) {
    #[cfg(feature = "metrics")]
    counter!(ASSEMBLIES_EVICTED).increment(count);
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a message delivered to the application.
pub fn inc_delivered() {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_DELIVERED).increment(1);
}

/// Live counters kept by a proxy.
#[derive(Debug, Default)]
pub struct ProxyStats {
    frames_out: AtomicU64,
    frames_in: AtomicU64,
    bytes_out: AtomicU64,
    bytes_in: AtomicU64,
    delivered: AtomicU64,
    dropped_malformed: AtomicU64,
    dropped_decode: AtomicU64,
}

impl ProxyStats {
    pub(crate) fn record_frame(&self, direction: Direction) {
        let counter = match direction {
            Direction::Inbound => &self.frames_in,
            Direction::Outbound => &self.frames_out,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        inc_frames(direction);
    }

    pub(crate) fn add_bytes(&self, direction: Direction, bytes: usize) {
        let counter = match direction {
            Direction::Inbound => &self.bytes_in,
            Direction::Outbound => &self.bytes_out,
        };
        counter.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
        inc_delivered();
    }

    pub(crate) fn record_dropped(&self, reason: DropReason) {
        let counter = match reason {
            DropReason::Malformed => &self.dropped_malformed,
            DropReason::Decode => &self.dropped_decode,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        inc_dropped(reason);
    }

    /// Payload bytes handed to the outbound queue.
    #[must_use]
    pub fn bytes_out(&self) -> u64 { self.bytes_out.load(Ordering::Relaxed) }

    /// Payload bytes taken from the inbound queue.
    #[must_use]
    pub fn bytes_in(&self) -> u64 { self.bytes_in.load(Ordering::Relaxed) }

    /// Take a point-in-time copy of every counter.
    ///
    /// `evicted` is supplied by the owner of the reassembly table.
    #[must_use]
    pub fn snapshot(&self, evicted: u64) -> StatsSnapshot {
        StatsSnapshot {
            frames_out: self.frames_out.load(Ordering::Relaxed),
            frames_in: self.frames_in.load(Ordering::Relaxed),
            bytes_out: self.bytes_out(),
            bytes_in: self.bytes_in(),
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped_malformed: self.dropped_malformed.load(Ordering::Relaxed),
            dropped_decode: self.dropped_decode.load(Ordering::Relaxed),
            evicted,
        }
    }
}

/// Point-in-time copy of [`ProxyStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Frames forwarded to the transport.
    pub frames_out: u64,
    /// Frames received from the transport.
    pub frames_in: u64,
    /// Payload bytes sent.
    pub bytes_out: u64,
    /// Payload bytes received.
    pub bytes_in: u64,
    /// Messages delivered to the application.
    pub delivered: u64,
    /// Frames refused by validation.
    pub dropped_malformed: u64,
    /// Messages whose bytes failed to decode.
    pub dropped_decode: u64,
    /// Assemblies lost to the sliding window.
    pub evicted: u64,
}
