//! The network proxy: one logical peer standing for the whole network.
//!
//! A [`Proxy`] splits outbound messages into frames, hands them to the
//! out-pump, and on the way back in reassembles frames the in-pump delivers.
//! Build one with [`ProxyBuilder`], attach a transport to the returned
//! [`TransportEndpoint`], then call [`Proxy::start`].
//!
//! `receive` never waits. Each call moves at most one frame from the inbound
//! queue through reassembly and then hands out at most one message, so a
//! split message needs one call per part before it surfaces.

mod builder;
mod error;
mod peer;

use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
        MutexGuard,
        PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use async_trait::async_trait;
pub use builder::{ProxyBuilder, TransportEndpoint};
pub use error::{ProxyError, SendError};
pub use peer::{Peer, PeerLink};
use tokio::{
    sync::mpsc::{Receiver, Sender, WeakSender},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::{
    config::ProxyConfig,
    diagnostics::{AuditHandle, AuditLog, AuditRecord, DiagnosticsError, StatusReport},
    fragment::{ReassemblyError, ReassemblyTable, Splitter},
    frame::{Frame, TargetHint, TransportFrame},
    message::AppMessage,
    metrics::{Direction, DropReason, ProxyStats, StatsSnapshot},
    pump::{InPump, OutPump, PumpExit},
};

/// Receive-side state guarded by a single lock.
struct InboundState<M> {
    rx: Receiver<Frame>,
    table: ReassemblyTable,
    delivered: VecDeque<M>,
}

/// Tasks created by the builder and spawned by [`Proxy::start`].
struct PendingTasks {
    out_pump: OutPump,
    in_pump: InPump,
    audit_log: Option<AuditLog>,
}

/// Weak handles used to measure the transport queues.
struct QueueProbes {
    transport_out: WeakSender<TransportFrame>,
    transport_in: WeakSender<TransportFrame>,
}

struct Parts {
    link: PeerLink,
    config: ProxyConfig,
    outbound: Sender<Frame>,
    inbound: Receiver<Frame>,
    stats: Arc<ProxyStats>,
    audit: Option<AuditHandle>,
    pending: PendingTasks,
    probes: QueueProbes,
}

/// Handles for the tasks spawned by [`Proxy::start`].
#[derive(Debug)]
pub struct ProxyTasks {
    /// Out-pump task.
    pub out_pump: JoinHandle<PumpExit>,
    /// In-pump task.
    pub in_pump: JoinHandle<PumpExit>,
    /// Audit writer, when the debug level enables it.
    pub audit_log: Option<JoinHandle<Result<u64, DiagnosticsError>>>,
}

impl ProxyTasks {
    /// Abort every task.
    pub fn abort(&self) {
        self.out_pump.abort();
        self.in_pump.abort();
        if let Some(audit_log) = &self.audit_log {
            audit_log.abort();
        }
    }
}

/// Bridge between an application message bus and a frame transport.
pub struct Proxy<M: AppMessage> {
    link: PeerLink,
    config: ProxyConfig,
    splitter: Splitter,
    outbound: Sender<Frame>,
    inbound: Mutex<InboundState<M>>,
    weight: AtomicUsize,
    stats: Arc<ProxyStats>,
    audit: Option<AuditHandle>,
    pending: Mutex<Option<PendingTasks>>,
    probes: QueueProbes,
}

impl<M: AppMessage> Proxy<M> {
    fn assemble(parts: Parts) -> Self {
        let Parts {
            link,
            config,
            outbound,
            inbound,
            stats,
            audit,
            pending,
            probes,
        } = parts;
        let table = ReassemblyTable::new(
            config.slot_duration,
            config.max_slots,
            config.parts_limit.get(),
        );
        Self {
            link,
            splitter: Splitter::new(config.split_threshold),
            config,
            outbound,
            inbound: Mutex::new(InboundState {
                rx: inbound,
                table,
                delivered: VecDeque::new(),
            }),
            weight: AtomicUsize::new(0),
            stats,
            audit,
            pending: Mutex::new(Some(pending)),
            probes,
        }
    }

    /// Spawn the pumps and, when enabled, the audit writer.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::AlreadyStarted`] on every call after the first.
    pub fn start(&self) -> Result<ProxyTasks, ProxyError> {
        let pending = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(ProxyError::AlreadyStarted)?;

        let audit_log = pending.audit_log.map(|log| {
            tokio::spawn(async move {
                let outcome = log.run().await;
                if let Err(e) = &outcome {
                    error!(error = %e, "audit log stopped");
                }
                outcome
            })
        });
        info!(link = %self.link, network = %self.config.network, "proxy started");
        Ok(ProxyTasks {
            out_pump: tokio::spawn(pending.out_pump.run()),
            in_pump: tokio::spawn(pending.in_pump.run()),
            audit_log,
        })
    }

    /// Split `message` and queue its frames in part order.
    ///
    /// Waits while the outbound queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`SendError::Split`] if the message cannot be encoded and
    /// [`SendError::Closed`] if the out-pump has stopped. Frames queued
    /// before a closure are not recalled.
    pub async fn send(&self, message: M) -> Result<(), SendError> {
        self.audit(&message, false);
        let target = TargetHint::for_message(&message);
        let batch = self.splitter.split(&message, &target)?;
        let bytes = batch.payload_len();
        let parts = batch.len();
        for frame in batch {
            self.outbound
                .send(frame)
                .await
                .map_err(|_| SendError::Closed)?;
        }
        self.stats.add_bytes(Direction::Outbound, bytes);
        debug!(%target, parts, bytes, "message queued");
        Ok(())
    }

    /// Take the next delivered message without waiting.
    ///
    /// Processes at most one inbound frame first.
    pub fn receive(&self) -> Option<M> { self.receive_at(Instant::now()) }

    /// [`receive`](Self::receive) with an explicit clock for the
    /// reassembly window.
    pub fn receive_at(&self, now: Instant) -> Option<M> {
        let mut inbound = self.lock_inbound();
        self.update(&mut inbound, now);
        inbound.delivered.pop_front()
    }

    fn update(&self, inbound: &mut InboundState<M>, now: Instant) {
        let Ok(frame) = inbound.rx.try_recv() else {
            return;
        };
        self.stats.add_bytes(Direction::Inbound, frame.payload().len());
        let origin = frame.target().as_str().to_owned();
        let data_hash = frame.data_hash();

        let outcome = if (frame.part_num(), frame.num_parts()) == (0, 1) {
            M::from_bytes(frame.payload())
                .map(Some)
                .map_err(|source| ReassemblyError::Decode { data_hash, source })
        } else {
            inbound.table.insert_at::<M>(frame, now)
        };

        match outcome {
            Ok(Some(mut message)) => {
                message.set_network_origin(origin);
                self.stats.record_delivered();
                self.audit(&message, true);
                inbound.delivered.push_back(message);
            }
            Ok(None) => {}
            Err(ReassemblyError::Malformed(reason)) => {
                debug!(reason = reason.reason(), error = %reason, %origin, "dropped malformed frame");
                self.stats.record_dropped(DropReason::Malformed);
            }
            Err(e @ ReassemblyError::Decode { .. }) => {
                debug!(error = %e, %origin, "dropped undecodable message");
                self.stats.record_dropped(DropReason::Decode);
            }
        }
    }

    fn audit(&self, message: &M, received: bool) {
        if !self.config.audit_records_enabled() {
            return;
        }
        if let Some(audit) = &self.audit {
            audit.record(AuditRecord::for_message(message, received));
        }
    }

    fn lock_inbound(&self) -> MutexGuard<'_, InboundState<M>> {
        self.inbound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Advisory connection count.
    #[must_use]
    pub fn weight(&self) -> usize { self.weight.load(Ordering::Relaxed) }

    pub fn set_weight(&self, weight: usize) { self.weight.store(weight, Ordering::Relaxed); }

    /// Frames waiting on the application-inbound queue.
    #[must_use]
    pub fn len(&self) -> usize { self.lock_inbound().rx.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Local end of the link.
    #[must_use]
    pub fn name_from(&self) -> &str { self.link.local() }

    /// Remote end of the link.
    #[must_use]
    pub fn name_to(&self) -> &str { self.link.remote() }

    #[must_use]
    pub fn link(&self) -> &PeerLink { &self.link }

    #[must_use]
    pub fn config(&self) -> &ProxyConfig { &self.config }

    /// Payload bytes received.
    #[must_use]
    pub fn bytes_in(&self) -> u64 { self.stats.bytes_in() }

    /// Payload bytes sent.
    #[must_use]
    pub fn bytes_out(&self) -> u64 { self.stats.bytes_out() }

    /// Copy of every counter, including reassembly evictions.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        let evicted = self.lock_inbound().table.evicted_total();
        self.stats.snapshot(evicted)
    }

    /// Current queue depths and weight.
    #[must_use]
    pub fn status(&self) -> StatusReport {
        let (app_in, delivered) = {
            let inbound = self.lock_inbound();
            (inbound.rx.len(), inbound.delivered.len())
        };
        StatusReport {
            from: self.link.local().to_owned(),
            to: self.link.remote().to_owned(),
            transport_out: queue_depth(self.probes.transport_out.upgrade().as_ref()),
            transport_in: queue_depth(self.probes.transport_in.upgrade().as_ref()),
            app_out: queue_depth(Some(&self.outbound)),
            app_in,
            delivered,
            weight: self.weight(),
        }
    }

    /// Ask the audit writer to flush and stop.
    pub fn stop_diagnostics(&self) {
        if let Some(audit) = &self.audit {
            audit.stop();
        }
    }

    /// Log a [`StatusReport`] every status interval until `shutdown` fires.
    pub fn spawn_status_reporter(self: &Arc<Self>, shutdown: CancellationToken) -> JoinHandle<()> {
        let proxy = Arc::clone(self);
        let period = self.config.status_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            loop {
                tokio::select! {
                    biased;

                    () = shutdown.cancelled() => break,

                    _ = ticker.tick() => info!("{}", proxy.status()),
                }
            }
        })
    }
}

fn queue_depth<T>(sender: Option<&Sender<T>>) -> usize {
    sender.map_or(0, |tx| tx.max_capacity() - tx.capacity())
}

impl<M: AppMessage> PartialEq for Proxy<M> {
    fn eq(&self, other: &Self) -> bool { self.link == other.link }
}

impl<M: AppMessage> std::fmt::Debug for Proxy<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proxy")
            .field("link", &self.link)
            .field("network", &self.config.network)
            .field("weight", &self.weight())
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<M: AppMessage> Peer<M> for Proxy<M> {
    async fn send(&self, message: M) -> Result<(), SendError> { Proxy::send(self, message).await }

    fn receive(&self) -> Option<M> { Proxy::receive(self) }

    fn weight(&self) -> usize { Proxy::weight(self) }

    fn set_weight(&self, weight: usize) { Proxy::set_weight(self, weight); }

    fn link(&self) -> &PeerLink { &self.link }

    fn len(&self) -> usize { Proxy::len(self) }

    fn bytes_in(&self) -> u64 { Proxy::bytes_in(self) }

    fn bytes_out(&self) -> u64 { Proxy::bytes_out(self) }
}
