//! End-to-end delivery between two proxies over the loopback transport.

use std::{num::NonZeroUsize, time::Duration};

use rstest::rstest;
use wirebridge::{AppMessage, Envelope, NetworkId, ProxyBuilder};
use wirebridge_testing::{payload, poll_receive, poll_receive_for, wired_pair};

fn small_threshold(builder: ProxyBuilder) -> ProxyBuilder {
    builder
        .split_threshold(NonZeroUsize::new(1024).expect("non-zero"))
        .network(NetworkId::LOCAL)
}

#[rstest]
#[case::whole(100)]
#[case::at_scenario_size(2500)]
#[case::many_parts(40_000)]
#[tokio::test]
async fn broadcast_arrives_byte_exact(#[case] len: usize) {
    let pair = wired_pair::<Envelope>(small_threshold);
    let sent = Envelope::broadcast(6, payload(len));
    pair.a.send(sent.clone()).await.expect("send");

    let received = poll_receive(&pair.b).await.expect("message delivered");
    assert_eq!(received.payload(), sent.payload());
    assert_eq!(received.message_type(), 6);
    assert_eq!(received.message_hash(), sent.message_hash());
    assert_eq!(received.network_origin(), Some("<BROADCAST>"));
    assert_eq!(pair.b.stats().delivered, 1);
    assert_eq!(received.without_origin(), sent);
}

#[tokio::test]
async fn default_threshold_splits_multi_megabyte_message() {
    let pair = wired_pair::<Envelope>(|builder| builder);
    let sent = Envelope::broadcast(1, payload(3 * 1024 * 1024));
    pair.a.send(sent.clone()).await.expect("send");

    let received = poll_receive_for(&pair.b, Duration::from_secs(30))
        .await
        .expect("message delivered");
    assert_eq!(received.payload(), sent.payload());
    assert!(pair.b.stats().frames_in >= 4);
}

#[rstest]
#[case::random_peer(None, "<RANDOM>")]
#[case::named_peer(Some("peer-12"), "peer-12")]
#[tokio::test]
async fn directed_message_carries_routing_hint(
    #[case] origin: Option<&str>,
    #[case] expected: &str,
) {
    let pair = wired_pair::<Envelope>(small_threshold);
    let sent = Envelope::directed(3, origin.map(str::to_owned), payload(5000));
    pair.a.send(sent).await.expect("send");

    let received = poll_receive(&pair.b).await.expect("message delivered");
    assert_eq!(received.network_origin(), Some(expected));
}

#[tokio::test]
async fn messages_flow_both_ways() {
    let pair = wired_pair::<Envelope>(small_threshold);
    pair.a
        .send(Envelope::broadcast(1, payload(3000)))
        .await
        .expect("send a -> b");
    pair.b
        .send(Envelope::broadcast(2, payload(10)))
        .await
        .expect("send b -> a");

    let at_b = poll_receive(&pair.b).await.expect("delivered to b");
    let at_a = poll_receive(&pair.a).await.expect("delivered to a");
    assert_eq!(at_b.message_type(), 1);
    assert_eq!(at_a.message_type(), 2);
    assert!(pair.a.bytes_out() > pair.b.bytes_out());
    assert_eq!(pair.a.bytes_out(), pair.b.bytes_in());
}

#[tokio::test]
async fn many_messages_arrive_in_send_order() {
    let pair = wired_pair::<Envelope>(small_threshold);
    for message_type in 0..20_u8 {
        let len = 500 + usize::from(message_type) * 300;
        pair.a
            .send(Envelope::broadcast(message_type, payload(len)))
            .await
            .expect("send");
    }
    for expected in 0..20_u8 {
        let received = poll_receive(&pair.b).await.expect("message delivered");
        assert_eq!(received.message_type(), expected);
    }
}

#[tokio::test]
async fn idle_proxy_receives_nothing() {
    let pair = wired_pair::<Envelope>(small_threshold);
    assert!(pair.b.receive().is_none());
    assert!(
        poll_receive_for(&pair.b, Duration::from_millis(50))
            .await
            .is_none()
    );
    assert!(*pair.a == *pair.b, "a->b and b->a name the same link");
}
