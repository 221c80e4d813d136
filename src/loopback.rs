//! In-memory transport joining two proxies.
//!
//! Every frame is encoded to bytes and decoded again on the way across, so
//! the loopback exercises the same wire form a socket transport would carry.

use tokio::{
    sync::mpsc::{Receiver, Sender},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{frame::TransportFrame, proxy::TransportEndpoint};

/// Forwarding tasks created by [`connect`].
#[derive(Debug)]
pub struct LoopbackTasks {
    /// Carries frames from the first endpoint to the second.
    pub forward: JoinHandle<u64>,
    /// Carries frames from the second endpoint to the first.
    pub backward: JoinHandle<u64>,
}

impl LoopbackTasks {
    pub fn abort(&self) {
        self.forward.abort();
        self.backward.abort();
    }
}

/// Cross-connect two endpoints.
///
/// Must be called from within a Tokio runtime. Each task returns the number
/// of frames it carried once its source closes.
#[must_use]
pub fn connect(a: TransportEndpoint, b: TransportEndpoint) -> LoopbackTasks {
    LoopbackTasks {
        forward: tokio::spawn(carry(a.to_network, b.from_network)),
        backward: tokio::spawn(carry(b.to_network, a.from_network)),
    }
}

async fn carry(mut source: Receiver<TransportFrame>, sink: Sender<TransportFrame>) -> u64 {
    let mut carried = 0;
    while let Some(parcel) = source.recv().await {
        let decoded = match parcel.to_bytes() {
            Ok(bytes) => TransportFrame::from_bytes(&bytes),
            Err(e) => {
                warn!(error = %e, "loopback failed to encode frame");
                continue;
            }
        };
        let parcel = match decoded {
            Ok(parcel) => parcel,
            Err(e) => {
                warn!(error = %e, "loopback failed to decode frame");
                continue;
            }
        };
        if sink.send(parcel).await.is_err() {
            break;
        }
        carried += 1;
    }
    debug!(carried, "loopback stopped");
    carried
}
