//! Audit log, status report and drop logging.

use std::{num::NonZeroUsize, path::Path, time::Duration};

use rstest::rstest;
use tokio_util::sync::CancellationToken;
use wirebridge::{
    AppMessage,
    Envelope,
    Frame,
    FrameHeader,
    Hash,
    NetworkId,
    ProxyBuilder,
    SendError,
    TargetHint,
    TransportEndpoint,
    TransportFrame,
    loopback,
};
use wirebridge_testing::{LoggerHandle, logger, payload, poll_receive};

fn audited(from: &str, to: &str, path: &Path) -> ProxyBuilder {
    ProxyBuilder::new(from, to)
        .split_threshold(NonZeroUsize::new(1024).expect("non-zero"))
        .debug_level(3)
        .audit_log_path(path)
}

#[tokio::test]
async fn audit_log_records_sent_and_delivered_messages() {
    let dir = tempfile::tempdir().expect("temp dir");
    let sent_log = dir.path().join("sent.csv");
    let received_log = dir.path().join("received.csv");
    let (a, a_end) = audited("a", "b", &sent_log)
        .build::<Envelope>()
        .expect("build");
    let (b, b_end) = audited("b", "a", &received_log)
        .build::<Envelope>()
        .expect("build");
    let link = loopback::connect(a_end, b_end);
    let mut a_tasks = a.start().expect("start a");
    let mut b_tasks = b.start().expect("start b");

    let message = Envelope::broadcast(7, payload(2500));
    a.send(message.clone()).await.expect("send");
    poll_receive(&b).await.expect("delivered");

    a.stop_diagnostics();
    b.stop_diagnostics();
    for tasks in [&mut a_tasks, &mut b_tasks] {
        let audit = tasks.audit_log.take().expect("audit writer running");
        assert_eq!(audit.await.expect("audit task").expect("audit I/O"), 1);
    }

    let hash = message.message_hash().to_hex();
    let sent = std::fs::read_to_string(&sent_log).expect("sent log");
    assert_eq!(sent.lines().count(), 1);
    assert!(sent.starts_with(&format!("7, {hash}, false, ")), "{sent}");
    let received = std::fs::read_to_string(&received_log).expect("received log");
    assert!(received.starts_with(&format!("7, {hash}, true, ")), "{received}");
    assert!(received.trim_end().ends_with(", <BROADCAST>, 0"), "{received}");

    link.abort();
    a_tasks.abort();
    b_tasks.abort();
}

#[tokio::test]
async fn failed_send_is_still_audited() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("audit.csv");
    let (proxy, endpoint) = audited("a", "b", &path)
        .build::<Envelope>()
        .expect("build");
    let TransportEndpoint {
        to_network,
        from_network: _from_network,
    } = endpoint;
    drop(to_network);
    let mut tasks = proxy.start().expect("start");
    proxy
        .send(Envelope::broadcast(1, payload(10)))
        .await
        .expect("queued before the pump notices");
    tasks.out_pump.await.expect("pump task");

    let message = Envelope::broadcast(9, payload(10));
    let hash = message.message_hash().to_hex();
    let err = proxy.send(message).await.expect_err("outbound queue closed");
    assert!(matches!(err, SendError::Closed));

    proxy.stop_diagnostics();
    let audit = tasks.audit_log.take().expect("audit writer running");
    assert_eq!(audit.await.expect("audit task").expect("audit I/O"), 2);
    let lines = std::fs::read_to_string(&path).expect("audit log");
    assert!(
        lines
            .lines()
            .any(|line| line.starts_with(&format!("9, {hash}, false, "))),
        "{lines}"
    );
    tasks.in_pump.abort();
}

#[rstest]
#[case::writer_only(2)]
#[case::disabled(0)]
#[tokio::test]
async fn low_debug_levels_record_nothing(#[case] level: u8) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("audit.csv");
    let (proxy, mut endpoint) = ProxyBuilder::new("a", "b")
        .debug_level(level)
        .audit_log_path(&path)
        .build::<Envelope>()
        .expect("build");
    let mut tasks = proxy.start().expect("start");
    proxy
        .send(Envelope::broadcast(1, payload(10)))
        .await
        .expect("send");
    endpoint.to_network.recv().await.expect("frame forwarded");
    proxy.stop_diagnostics();

    match tasks.audit_log.take() {
        Some(audit) => {
            assert_eq!(audit.await.expect("audit task").expect("audit I/O"), 0);
        }
        None => {
            assert_eq!(level, 0);
            assert!(!path.exists(), "no writer, no file");
        }
    }
    tasks.abort();
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn status_reporter_logs_queue_depths(mut logger: LoggerHandle) {
    let (proxy, _endpoint) = ProxyBuilder::new("node", "network")
        .status_interval(Duration::from_secs(1))
        .build::<Envelope>()
        .expect("build");
    let proxy = std::sync::Arc::new(proxy);
    proxy.set_weight(4);
    let shutdown = CancellationToken::new();
    let reporter = proxy.spawn_status_reporter(shutdown.clone());

    tokio::time::sleep(Duration::from_millis(1500)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    shutdown.cancel();
    reporter.await.expect("reporter task");

    assert!(logger.contains(log::Level::Info, "Periodic Status Report (node -> network)"));
}

#[rstest]
#[tokio::test]
async fn dropped_frames_are_logged_at_debug(mut logger: LoggerHandle) {
    let (proxy, endpoint) = ProxyBuilder::new("node", "network")
        .build::<Envelope>()
        .expect("build");
    let tasks = proxy.start().expect("start");
    let bogus = Frame::new(
        FrameHeader {
            target: TargetHint::peer("peer-1"),
            app_hash: String::new(),
            app_type: "0".into(),
            part_num: 9,
            num_parts: 3,
            data_hash: Hash::digest(b"bogus"),
        },
        vec![0_u8; 4],
    );
    endpoint
        .from_network
        .send(TransportFrame::from_frame(bogus, NetworkId::MAIN))
        .await
        .expect("inbound queue open");
    tokio::time::timeout(Duration::from_secs(5), async {
        while proxy.is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("frame reaches the proxy");

    assert!(proxy.receive().is_none());
    assert_eq!(proxy.stats().dropped_malformed, 1);
    assert!(logger.contains(log::Level::Debug, "dropped malformed frame"));
    tasks.abort();
}
