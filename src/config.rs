//! Proxy configuration.
//!
//! [`ProxyConfig`] bundles the split threshold, the reassembly window, queue
//! sizing and diagnostics settings. Defaults match the values the network
//! runs with in production.

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    time::Duration,
};

use static_assertions::const_assert;
use thiserror::Error;

use crate::frame::NetworkId;

/// Messages whose encoding exceeds this many bytes are split.
pub const DEFAULT_SPLIT_THRESHOLD: usize = 1024 * 1024;
/// Upper bound on the parts a single message may claim.
pub const DEFAULT_PARTS_LIMIT: u32 = 1000;
/// Width of one reassembly time slot.
pub const DEFAULT_SLOT_DURATION: Duration = Duration::from_secs(10);
/// Number of time slots an idle assembly survives.
pub const DEFAULT_MAX_SLOTS: usize = 20;
/// Capacity of each bounded queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5000;
/// Interval between periodic status reports.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(10);
/// File the audit log appends to.
pub const DEFAULT_AUDIT_LOG: &str = "message_log.csv";

/// Debug level above which the audit writer runs.
pub const AUDIT_WRITER_LEVEL: u8 = 1;
/// Debug level above which each sent or delivered message is audited.
pub const AUDIT_RECORD_LEVEL: u8 = 2;
/// Debug level above which every frame is traced.
pub const FRAME_TRACE_LEVEL: u8 = 10;

const_assert!(DEFAULT_SPLIT_THRESHOLD > 0);
const_assert!(DEFAULT_PARTS_LIMIT > 2);
const_assert!(DEFAULT_MAX_SLOTS > 0);
const_assert!(DEFAULT_QUEUE_CAPACITY > 0);
const_assert!(AUDIT_WRITER_LEVEL < AUDIT_RECORD_LEVEL);

/// Errors returned when validating a [`ProxyConfig`].
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The reassembly slot duration was zero.
    #[error("slot duration must be greater than zero")]
    ZeroSlotDuration,
    /// The status report interval was zero.
    #[error("status interval must be greater than zero")]
    ZeroStatusInterval,
    /// A split message needs at least three parts, so a lower limit would
    /// refuse every split.
    #[error("parts limit {0} is below the minimum of 3")]
    PartsLimitTooSmall(u32),
}

/// Settings for a [`Proxy`](crate::proxy::Proxy).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Largest encoding sent as a single frame.
    pub split_threshold: NonZeroUsize,
    /// Most parts a frame may claim.
    pub parts_limit: NonZeroU32,
    /// Width of one reassembly time slot.
    pub slot_duration: Duration,
    /// Number of time slots kept.
    pub max_slots: NonZeroUsize,
    /// Capacity of each bounded queue.
    pub queue_capacity: NonZeroUsize,
    /// Network stamped on outbound transport frames.
    pub network: NetworkId,
    /// Diagnostics verbosity.
    pub debug_level: u8,
    /// Where the audit writer appends.
    pub audit_log_path: PathBuf,
    /// Interval between status reports.
    pub status_interval: Duration,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            split_threshold: nonzero_usize(DEFAULT_SPLIT_THRESHOLD),
            parts_limit: NonZeroU32::new(DEFAULT_PARTS_LIMIT).unwrap_or(NonZeroU32::MIN),
            slot_duration: DEFAULT_SLOT_DURATION,
            max_slots: nonzero_usize(DEFAULT_MAX_SLOTS),
            queue_capacity: nonzero_usize(DEFAULT_QUEUE_CAPACITY),
            network: NetworkId::MAIN,
            debug_level: 0,
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG),
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

impl ProxyConfig {
    /// Check settings the type system cannot enforce.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_duration.is_zero() {
            return Err(ConfigError::ZeroSlotDuration);
        }
        if self.status_interval.is_zero() {
            return Err(ConfigError::ZeroStatusInterval);
        }
        if self.parts_limit.get() < 3 {
            return Err(ConfigError::PartsLimitTooSmall(self.parts_limit.get()));
        }
        Ok(())
    }

    /// Longest time an assembly survives without receiving a part.
    #[must_use]
    pub fn reassembly_window(&self) -> Duration {
        self.slot_duration
            .saturating_mul(u32::try_from(self.max_slots.get()).unwrap_or(u32::MAX))
    }

    /// Whether the audit writer task should run.
    #[must_use]
    pub const fn audit_writer_enabled(&self) -> bool { self.debug_level > AUDIT_WRITER_LEVEL }

    /// Whether sent and delivered messages are audited.
    #[must_use]
    pub const fn audit_records_enabled(&self) -> bool { self.debug_level > AUDIT_RECORD_LEVEL }

    /// Whether every frame is traced.
    #[must_use]
    pub const fn frame_trace_enabled(&self) -> bool { self.debug_level > FRAME_TRACE_LEVEL }
}

fn nonzero_usize(value: usize) -> NonZeroUsize { NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN) }
