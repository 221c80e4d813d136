//! Proxy pairs over the loopback transport.

use std::{sync::Arc, time::Duration};

use wirebridge::{
    AppMessage,
    Proxy,
    ProxyBuilder,
    loopback::{self, LoopbackTasks},
    proxy::ProxyTasks,
};

/// Default time [`poll_receive`] waits for a message.
const RECEIVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Two started proxies joined by the loopback.
///
/// Dropping the pair aborts every task it spawned.
pub struct ProxyPair<M: AppMessage> {
    /// Proxy named `a -> b`.
    pub a: Arc<Proxy<M>>,
    /// Proxy named `b -> a`.
    pub b: Arc<Proxy<M>>,
    tasks: Vec<ProxyTasks>,
    link: LoopbackTasks,
}

impl<M: AppMessage> Drop for ProxyPair<M> {
    fn drop(&mut self) {
        self.link.abort();
        for tasks in &self.tasks {
            tasks.abort();
        }
    }
}

/// Build, join and start two proxies.
///
/// `configure` is applied to both builders. Must be called from within a
/// Tokio runtime.
///
/// # Panics
///
/// Panics if the configuration is invalid.
pub fn wired_pair<M: AppMessage>(configure: impl Fn(ProxyBuilder) -> ProxyBuilder) -> ProxyPair<M> {
    let (a, a_end) = configure(ProxyBuilder::new("a", "b"))
        .build::<M>()
        .expect("valid configuration");
    let (b, b_end) = configure(ProxyBuilder::new("b", "a"))
        .build::<M>()
        .expect("valid configuration");
    let link = loopback::connect(a_end, b_end);
    let tasks = vec![
        a.start().expect("fresh proxy"),
        b.start().expect("fresh proxy"),
    ];
    ProxyPair {
        a: Arc::new(a),
        b: Arc::new(b),
        tasks,
        link,
    }
}

/// Deterministic payload of `len` bytes.
#[must_use]
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| u8::try_from(i % 251).unwrap_or_default()).collect()
}

/// Poll `proxy` until a message arrives or five seconds pass.
pub async fn poll_receive<M: AppMessage>(proxy: &Proxy<M>) -> Option<M> {
    poll_receive_for(proxy, RECEIVE_TIMEOUT).await
}

/// Poll `proxy` until a message arrives or `timeout` passes.
pub async fn poll_receive_for<M: AppMessage>(proxy: &Proxy<M>, timeout: Duration) -> Option<M> {
    tokio::time::timeout(timeout, async {
        loop {
            if let Some(message) = proxy.receive() {
                return message;
            }
            tokio::task::yield_now().await;
        }
    })
    .await
    .ok()
}
