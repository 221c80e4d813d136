//! Generated checks for splitting and reassembly.

use std::{
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use proptest::{
    collection::vec,
    prelude::{Strategy, any},
    prop_assert,
    prop_assert_eq,
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestCaseError, TestRng, TestRunner},
};
use rstest::rstest;
use wirebridge::{
    AppMessage,
    Envelope,
    ReassemblyTable,
    Splittable,
    Splitter,
    TargetHint,
};

fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

fn table() -> ReassemblyTable {
    ReassemblyTable::new(
        Duration::from_secs(10),
        NonZeroUsize::new(20).expect("non-zero"),
        1000,
    )
}

/// Payload together with a sort key per potential frame.
fn payload_and_order(max_len: usize) -> impl Strategy<Value = (Vec<u8>, Vec<u32>)> {
    (vec(any::<u8>(), 0..max_len), vec(any::<u32>(), 64))
}

#[rstest]
#[case(64, 96)]
#[case(1024, 64)]
fn split_parts_rebuild_the_body(#[case] threshold: usize, #[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let splitter = Splitter::new(NonZeroUsize::new(threshold).expect("non-zero"));

    runner
        .run(&vec(any::<u8>(), 0..threshold * 20), |body| {
            let message = Envelope::broadcast(2, body.clone());
            let encoded = message
                .to_bytes()
                .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
            let batch = splitter
                .split(&message, &TargetHint::Broadcast)
                .map_err(|err| TestCaseError::fail(format!("split failed: {err}")))?;

            if encoded.len() <= threshold {
                prop_assert_eq!(batch.len(), 1);
                return Ok(());
            }
            prop_assert_eq!(batch.len(), encoded.len() / threshold + 2);
            let frames = batch.frames();
            let header = message
                .header_bytes()
                .map_err(|err| TestCaseError::fail(format!("header failed: {err}")))?;
            prop_assert_eq!(frames.first().map(|f| f.payload().to_vec()), Some(header));
            let rebuilt: Vec<u8> = frames
                .iter()
                .skip(1)
                .flat_map(|f| f.payload().iter().copied())
                .collect();
            prop_assert_eq!(rebuilt, body);
            Ok(())
        })
        .expect("split parts should rebuild the body");
}

#[rstest]
#[case(128, 96)]
#[case(1024, 48)]
fn any_arrival_order_reassembles(#[case] threshold: usize, #[case] cases: u32) {
    let mut runner = deterministic_runner(cases);
    let splitter = Splitter::new(NonZeroUsize::new(threshold).expect("non-zero"));

    runner
        .run(&payload_and_order(threshold * 30), |(body, keys)| {
            let message = Envelope::broadcast(4, body);
            let mut frames: Vec<_> = splitter
                .split(&message, &TargetHint::Broadcast)
                .map_err(|err| TestCaseError::fail(format!("split failed: {err}")))?
                .into_frames()
                .into_iter()
                .enumerate()
                .collect();
            frames.sort_by_key(|(index, _)| (keys.get(*index % keys.len()).copied(), *index));

            let mut table = table();
            let now = Instant::now();
            let count = frames.len();
            let mut delivered = None;
            for (position, (_, frame)) in frames.into_iter().enumerate() {
                let outcome = table
                    .insert_at::<Envelope>(frame, now)
                    .map_err(|err| TestCaseError::fail(format!("insert failed: {err}")))?;
                if position + 1 < count {
                    prop_assert!(outcome.is_none(), "completed before the last part");
                } else {
                    delivered = outcome;
                }
            }
            prop_assert_eq!(delivered, Some(message));
            prop_assert_eq!(table.buffered_len(), 0);
            Ok(())
        })
        .expect("any arrival order should reassemble");
}
