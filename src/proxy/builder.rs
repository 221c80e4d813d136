//! Builder wiring a [`Proxy`] to its queues.

use std::{
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    sync::Arc,
    time::Duration,
};

use tokio::sync::mpsc::{self, Receiver, Sender};

use super::{Proxy, peer::PeerLink};
use crate::{
    config::{ConfigError, ProxyConfig},
    diagnostics::AuditLog,
    frame::{NetworkId, TransportFrame},
    message::AppMessage,
    metrics::ProxyStats,
    pump::{InPump, OutPump},
};

/// The transport's side of a proxy.
///
/// Frames the proxy emits arrive on `to_network`; frames pushed into
/// `from_network` are delivered to the proxy.
#[derive(Debug)]
pub struct TransportEndpoint {
    /// Frames bound for the network.
    pub to_network: Receiver<TransportFrame>,
    /// Frames arriving from the network.
    pub from_network: Sender<TransportFrame>,
}

/// Builder for [`Proxy`].
///
/// # Examples
///
/// ```
/// use wirebridge::{envelope::Envelope, frame::NetworkId, proxy::ProxyBuilder};
///
/// let (proxy, _endpoint) = ProxyBuilder::new("node-1", "network")
///     .network(NetworkId::TEST)
///     .build::<Envelope>()
///     .expect("valid configuration");
/// assert_eq!(proxy.name_from(), "node-1");
/// ```
#[derive(Clone, Debug)]
pub struct ProxyBuilder {
    link: PeerLink,
    config: ProxyConfig,
}

impl ProxyBuilder {
    /// Start a builder for the link `from -> to` with default settings.
    #[must_use]
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            link: PeerLink::new(from, to),
            config: ProxyConfig::default(),
        }
    }

    /// Replace every setting at once.
    #[must_use]
    pub fn config(mut self, config: ProxyConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn split_threshold(mut self, threshold: NonZeroUsize) -> Self {
        self.config.split_threshold = threshold;
        self
    }

    #[must_use]
    pub fn parts_limit(mut self, limit: NonZeroU32) -> Self {
        self.config.parts_limit = limit;
        self
    }

    /// Set the reassembly window as `max_slots` slots of `slot_duration`.
    #[must_use]
    pub fn reassembly_window(mut self, slot_duration: Duration, max_slots: NonZeroUsize) -> Self {
        self.config.slot_duration = slot_duration;
        self.config.max_slots = max_slots;
        self
    }

    #[must_use]
    pub fn queue_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    #[must_use]
    pub fn network(mut self, network: NetworkId) -> Self {
        self.config.network = network;
        self
    }

    /// Set the diagnostics verbosity.
    #[must_use]
    pub fn debug_level(mut self, level: u8) -> Self {
        self.config.debug_level = level;
        self
    }

    #[must_use]
    pub fn audit_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.audit_log_path = path.into();
        self
    }

    #[must_use]
    pub fn status_interval(mut self, interval: Duration) -> Self {
        self.config.status_interval = interval;
        self
    }

    /// Create the proxy and the transport endpoint feeding it.
    ///
    /// No task is spawned until [`Proxy::start`] is called.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the configuration is invalid.
    pub fn build<M: AppMessage>(self) -> Result<(Proxy<M>, TransportEndpoint), ConfigError> {
        self.config.validate()?;
        let capacity = self.config.queue_capacity.get();
        let (app_out_tx, app_out_rx) = mpsc::channel(capacity);
        let (app_in_tx, app_in_rx) = mpsc::channel(capacity);
        let (net_out_tx, net_out_rx) = mpsc::channel(capacity);
        let (net_in_tx, net_in_rx) = mpsc::channel(capacity);

        let stats = Arc::new(ProxyStats::default());
        let trace_frames = self.config.frame_trace_enabled();
        let probes = super::QueueProbes {
            transport_out: net_out_tx.downgrade(),
            transport_in: net_in_tx.downgrade(),
        };
        let out_pump = OutPump::new(
            app_out_rx,
            net_out_tx,
            self.config.network,
            Arc::clone(&stats),
        )
        .trace_frames(trace_frames);
        let in_pump = InPump::new(net_in_rx, app_in_tx, Arc::clone(&stats)).trace_frames(trace_frames);

        let (audit_log, audit) = if self.config.audit_writer_enabled() {
            let (log, handle) = AuditLog::channel(self.config.audit_log_path.clone(), capacity);
            (Some(log), Some(handle))
        } else {
            (None, None)
        };

        let proxy = Proxy::assemble(super::Parts {
            link: self.link,
            config: self.config,
            outbound: app_out_tx,
            inbound: app_in_rx,
            stats,
            audit,
            pending: super::PendingTasks {
                out_pump,
                in_pump,
                audit_log,
            },
            probes,
        });
        let endpoint = TransportEndpoint {
            to_network: net_out_rx,
            from_network: net_in_tx,
        };
        Ok((proxy, endpoint))
    }
}
