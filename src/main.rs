//! Demonstration node for `wirebridge`.
//!
//! Joins two proxies over the in-memory loopback, sends messages from one to
//! the other and polls until they arrive.

mod cli;

use std::{
    num::NonZeroUsize,
    sync::Arc,
    time::Duration,
};

use clap::Parser;
use tokio_util::sync::CancellationToken;
use wirebridge::{AppMessage, Envelope, NetworkId, ProxyBuilder, SendError, loopback};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

fn parse_network(name: &str) -> Result<NetworkId, BoxError> {
    match name {
        "main" => Ok(NetworkId::MAIN),
        "test" => Ok(NetworkId::TEST),
        "local" => Ok(NetworkId::LOCAL),
        other => Err(format!("unknown network {other:?}; expected main, test or local").into()),
    }
}

#[cfg(feature = "metrics")]
fn install_metrics(addr: Option<std::net::SocketAddr>) -> Result<(), BoxError> {
    if let Some(addr) = addr {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()?;
        tracing::info!(%addr, "serving metrics");
    }
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn install_metrics(addr: Option<std::net::SocketAddr>) -> Result<(), BoxError> {
    if addr.is_some() {
        tracing::warn!("built without the metrics feature; --metrics-addr ignored");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt::init();

    let cli = cli::Cli::parse();
    install_metrics(cli.metrics_addr)?;
    let network = parse_network(&cli.network)?;
    let threshold =
        NonZeroUsize::new(cli.split_threshold).ok_or("split threshold must be non-zero")?;

    let builder = |from: &str, to: &str| {
        ProxyBuilder::new(from, to)
            .network(network)
            .split_threshold(threshold)
            .debug_level(cli.debug_level)
            .audit_log_path(&cli.audit_log)
    };
    let (sender, sender_end) = builder("node-a", "node-b").build::<Envelope>()?;
    let (receiver, receiver_end) = builder("node-b", "node-a").build::<Envelope>()?;
    let sender = Arc::new(sender);
    let receiver = Arc::new(receiver);
    let link = loopback::connect(sender_end, receiver_end);
    let mut sender_tasks = sender.start()?;
    let mut receiver_tasks = receiver.start()?;

    let shutdown = CancellationToken::new();
    let reporter = receiver.spawn_status_reporter(shutdown.clone());

    let payload: Vec<u8> = (0..cli.payload_size)
        .map(|i| u8::try_from(i % 251).unwrap_or_default())
        .collect();
    let producer = {
        let sender = Arc::clone(&sender);
        let payload = payload.clone();
        let count = cli.count;
        tokio::spawn(async move {
            for index in 0..count {
                let message_type = u8::try_from(index % 256).unwrap_or_default();
                sender
                    .send(Envelope::broadcast(message_type, payload.clone()))
                    .await?;
            }
            Ok::<_, SendError>(())
        })
    };

    let mut delivered = 0;
    while delivered < cli.count {
        match receiver.receive() {
            Some(message) => {
                delivered += 1;
                tracing::info!(
                    message_type = message.message_type(),
                    bytes = message.payload().len(),
                    intact = message.payload() == payload.as_slice(),
                    "message delivered"
                );
            }
            None => tokio::time::sleep(Duration::from_millis(1)).await,
        }
    }

    producer.await??;
    tracing::info!(stats = ?receiver.stats(), "receiver counters");
    println!("{}", receiver.status());

    shutdown.cancel();
    sender.stop_diagnostics();
    receiver.stop_diagnostics();
    reporter.await?;
    for tasks in [&mut sender_tasks, &mut receiver_tasks] {
        if let Some(audit) = tasks.audit_log.take() {
            audit.await??;
        }
    }
    link.abort();
    sender_tasks.abort();
    receiver_tasks.abort();
    Ok(())
}
