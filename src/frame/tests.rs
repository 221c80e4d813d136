//! Tests for routing hints and transport frame conversion.

use rstest::rstest;

use super::{
    BROADCAST_FLAG,
    Frame,
    FrameHeader,
    FrameKind,
    NetworkId,
    RANDOM_PEER_FLAG,
    TargetHint,
    TransportFrame,
};
use crate::{envelope::Envelope, hash::Hash};

fn header(target: TargetHint, part_num: u32, num_parts: u32) -> FrameHeader {
    FrameHeader {
        target,
        app_hash: "aa".into(),
        app_type: "3".into(),
        part_num,
        num_parts,
        data_hash: Hash::digest(b"body"),
    }
}

#[rstest]
#[case::broadcast(TargetHint::Broadcast, BROADCAST_FLAG)]
#[case::random(TargetHint::RandomPeer, RANDOM_PEER_FLAG)]
#[case::peer(TargetHint::peer("node-7"), "node-7")]
fn target_hint_wire_form_is_reversible(#[case] hint: TargetHint, #[case] wire: &str) {
    assert_eq!(hint.to_string(), wire);
    assert_eq!(TargetHint::from(wire), hint);
}

#[test]
fn broadcast_messages_resolve_to_broadcast() {
    let message = Envelope::broadcast(1, vec![1]);
    assert_eq!(TargetHint::for_message(&message), TargetHint::Broadcast);
}

#[test]
fn directed_message_without_target_resolves_to_random_peer() {
    let message = Envelope::directed(1, None, vec![1]);
    assert_eq!(TargetHint::for_message(&message), TargetHint::RandomPeer);
    let empty = Envelope::directed(1, Some(String::new()), vec![1]);
    assert_eq!(TargetHint::for_message(&empty), TargetHint::RandomPeer);
}

#[test]
fn directed_message_with_target_resolves_to_peer() {
    let message = Envelope::directed(1, Some("peer-3".into()), vec![1]);
    assert_eq!(TargetHint::for_message(&message), TargetHint::peer("peer-3"));
}

#[rstest]
#[case::whole(1, FrameKind::Message)]
#[case::part(4, FrameKind::MessagePart)]
fn kind_follows_part_count(#[case] num_parts: u32, #[case] expected: FrameKind) {
    let frame = Frame::new(header(TargetHint::RandomPeer, 0, num_parts), vec![1, 2]);
    let wrapped = TransportFrame::from_frame(frame, NetworkId::LOCAL);
    assert_eq!(wrapped.kind, expected);
    assert_eq!(wrapped.network, NetworkId::LOCAL);
    assert_eq!(wrapped.header.target_peer, RANDOM_PEER_FLAG);
}

#[test]
fn transport_conversion_preserves_frame() {
    let frame = Frame::new(header(TargetHint::peer("peer-1"), 2, 5), vec![7_u8; 40]);
    let back = TransportFrame::from_frame(frame.clone(), NetworkId::TEST).into_frame();
    assert_eq!(back, frame);
}

#[test]
fn transport_frame_survives_byte_encoding() {
    let frame = Frame::new(header(TargetHint::Broadcast, 1, 3), vec![1_u8, 2, 3, 4]);
    let wrapped = TransportFrame::from_frame(frame, NetworkId::MAIN);
    let bytes = wrapped.to_bytes().expect("encode transport frame");
    let decoded = TransportFrame::from_bytes(&bytes).expect("decode transport frame");
    assert_eq!(decoded, wrapped);
}

#[test]
fn truncated_transport_frame_is_rejected() {
    let frame = Frame::new(header(TargetHint::Broadcast, 0, 1), vec![9_u8; 16]);
    let bytes = TransportFrame::from_frame(frame, NetworkId::MAIN)
        .to_bytes()
        .expect("encode transport frame");
    let truncated = bytes.get(..bytes.len() - 4).expect("frame longer than 4 bytes");
    assert!(TransportFrame::from_bytes(truncated).is_err());
}
