//! Tasks that move frames between the application and transport queues.
//!
//! The [`OutPump`] wraps application frames for the transport and the
//! [`InPump`] unwraps transport frames for the application. Both await
//! capacity on their destination rather than dropping, and both stop once
//! either side of their bridge closes.

use std::sync::Arc;

use tokio::sync::mpsc::{Receiver, Sender};
use tracing::{debug, trace};

use crate::{
    frame::{Frame, NetworkId, TransportFrame},
    metrics::{Direction, ProxyStats},
};

/// Why a pump stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpExit {
    /// Every sender of the source queue was dropped.
    SourceClosed,
    /// The receiver of the destination queue was dropped.
    SinkClosed,
}

impl PumpExit {
    const fn as_str(self) -> &'static str {
        match self {
            PumpExit::SourceClosed => "source closed",
            PumpExit::SinkClosed => "destination closed",
        }
    }
}

/// Forwards application frames onto the transport-outbound queue.
#[derive(Debug)]
pub struct OutPump {
    source: Receiver<Frame>,
    sink: Sender<TransportFrame>,
    network: NetworkId,
    stats: Arc<ProxyStats>,
    trace_frames: bool,
}

impl OutPump {
    /// Create a pump stamping `network` on every transport frame.
    #[must_use]
    pub fn new(
        source: Receiver<Frame>,
        sink: Sender<TransportFrame>,
        network: NetworkId,
        stats: Arc<ProxyStats>,
    ) -> Self {
        Self {
            source,
            sink,
            network,
            stats,
            trace_frames: false,
        }
    }

    /// Emit a trace event for every forwarded frame.
    #[must_use]
    pub fn trace_frames(mut self, enabled: bool) -> Self {
        self.trace_frames = enabled;
        self
    }

    /// Run until the source or destination closes.
    pub async fn run(mut self) -> PumpExit {
        let mut sequence: u64 = 0;
        let exit = loop {
            let Some(frame) = self.source.recv().await else {
                break PumpExit::SourceClosed;
            };
            let parcel = TransportFrame::from_frame(frame, self.network);
            if self.trace_frames {
                trace!(
                    app_hash = %parcel.header.app_hash,
                    app_type = %parcel.header.app_type,
                    part = parcel.header.part_num,
                    parts = parcel.header.num_parts,
                    sequence,
                    location = "out_pump",
                    "frame forwarded"
                );
            }
            if self.sink.send(parcel).await.is_err() {
                break PumpExit::SinkClosed;
            }
            self.stats.record_frame(Direction::Outbound);
            sequence += 1;
        };
        debug!(reason = exit.as_str(), forwarded = sequence, "outbound pump stopped");
        exit
    }
}

/// Forwards transport frames onto the application-inbound queue.
#[derive(Debug)]
pub struct InPump {
    source: Receiver<TransportFrame>,
    sink: Sender<Frame>,
    stats: Arc<ProxyStats>,
    trace_frames: bool,
}

impl InPump {
    #[must_use]
    pub fn new(
        source: Receiver<TransportFrame>,
        sink: Sender<Frame>,
        stats: Arc<ProxyStats>,
    ) -> Self {
        Self {
            source,
            sink,
            stats,
            trace_frames: false,
        }
    }

    /// Emit a trace event for every forwarded frame.
    #[must_use]
    pub fn trace_frames(mut self, enabled: bool) -> Self {
        self.trace_frames = enabled;
        self
    }

    /// Run until the source or destination closes.
    pub async fn run(mut self) -> PumpExit {
        let mut sequence: u64 = 0;
        let exit = loop {
            let Some(parcel) = self.source.recv().await else {
                break PumpExit::SourceClosed;
            };
            if self.trace_frames {
                trace!(
                    app_hash = %parcel.header.app_hash,
                    app_type = %parcel.header.app_type,
                    part = parcel.header.part_num,
                    parts = parcel.header.num_parts,
                    sequence,
                    location = "in_pump",
                    "frame forwarded"
                );
            }
            if self.sink.send(parcel.into_frame()).await.is_err() {
                break PumpExit::SinkClosed;
            }
            self.stats.record_frame(Direction::Inbound);
            sequence += 1;
        };
        debug!(reason = exit.as_str(), forwarded = sequence, "inbound pump stopped");
        exit
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::mpsc;

    use super::{InPump, OutPump, PumpExit};
    use crate::{
        frame::{Frame, FrameHeader, FrameKind, NetworkId, TargetHint},
        hash::Hash,
        metrics::ProxyStats,
    };

    fn part(part_num: u32, num_parts: u32) -> Frame {
        Frame::new(
            FrameHeader {
                target: TargetHint::peer("10.0.0.7:4000"),
                app_hash: "ab".into(),
                app_type: "4".into(),
                part_num,
                num_parts,
                data_hash: Hash::digest(b"pump"),
            },
            vec![part_num as u8; 8],
        )
    }

    #[tokio::test]
    async fn out_pump_wraps_frames_in_order() {
        let (app_tx, app_rx) = mpsc::channel(4);
        let (net_tx, mut net_rx) = mpsc::channel(4);
        let stats = Arc::new(ProxyStats::default());
        let pump = tokio::spawn(
            OutPump::new(app_rx, net_tx, NetworkId::TEST, Arc::clone(&stats)).run(),
        );

        for index in 0..3 {
            app_tx.send(part(index, 3)).await.expect("queue open");
        }
        drop(app_tx);

        for index in 0..3 {
            let parcel = net_rx.recv().await.expect("forwarded frame");
            assert_eq!(parcel.network, NetworkId::TEST);
            assert_eq!(parcel.kind, FrameKind::MessagePart);
            assert_eq!(parcel.header.part_num, index);
            assert_eq!(parcel.header.target_peer, "10.0.0.7:4000");
        }
        assert_eq!(pump.await.expect("pump task"), PumpExit::SourceClosed);
        assert_eq!(stats.snapshot(0).frames_out, 3);
    }

    #[tokio::test]
    async fn in_pump_restores_frames() {
        let (net_tx, net_rx) = mpsc::channel(4);
        let (app_tx, mut app_rx) = mpsc::channel(4);
        let stats = Arc::new(ProxyStats::default());
        let pump = tokio::spawn(InPump::new(net_rx, app_tx, Arc::clone(&stats)).run());

        let original = part(0, 1);
        net_tx
            .send(crate::frame::TransportFrame::from_frame(
                original.clone(),
                NetworkId::MAIN,
            ))
            .await
            .expect("queue open");
        drop(net_tx);

        assert_eq!(app_rx.recv().await, Some(original));
        assert_eq!(pump.await.expect("pump task"), PumpExit::SourceClosed);
        assert_eq!(stats.snapshot(0).frames_in, 1);
    }

    #[tokio::test]
    async fn pump_stops_when_destination_closes() {
        let (app_tx, app_rx) = mpsc::channel(1);
        let (net_tx, net_rx) = mpsc::channel(1);
        drop(net_rx);
        let pump = tokio::spawn(
            OutPump::new(app_rx, net_tx, NetworkId::MAIN, Arc::new(ProxyStats::default())).run(),
        );
        app_tx.send(part(0, 1)).await.expect("queue open");
        assert_eq!(pump.await.expect("pump task"), PumpExit::SinkClosed);
    }
}
