//! Inbound table that stitches message parts back together.
//!
//! [`ReassemblyTable`] keeps in-progress [`Assembly`] values in time-slot
//! buckets, newest first. Whenever the clock passes the next tick a fresh
//! bucket is pushed to the front and the oldest buckets beyond the configured
//! depth are dropped, evicting whatever they still hold. Touching an assembly
//! moves it to the front bucket, so its lifetime restarts with every part.

use std::{
    collections::{HashMap, VecDeque},
    num::NonZeroUsize,
    time::{Duration, Instant},
};

use bytes::{Bytes, BytesMut};
use tracing::debug;

use super::{MalformedFrame, ReassemblyError};
use crate::{frame::Frame, hash::Hash, message::AppMessage};

type Slot = HashMap<Hash, Assembly>;

/// Reconstruction state for one multi-part message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Assembly {
    parts: Vec<Option<Bytes>>,
}

impl Assembly {
    fn new(num_parts: u32) -> Self {
        Self {
            parts: vec![None; num_parts as usize],
        }
    }

    /// Number of parts the message was split into.
    #[must_use]
    pub fn num_parts(&self) -> usize { self.parts.len() }

    /// Number of distinct parts received so far.
    #[must_use]
    pub fn received(&self) -> usize { self.parts.iter().filter(|p| p.is_some()).count() }

    /// Whether every part has arrived.
    #[must_use]
    pub fn is_complete(&self) -> bool { self.parts.iter().all(Option::is_some) }

    /// Borrow the payload stored for `part_num`, if it has arrived.
    #[must_use]
    pub fn part(&self, part_num: usize) -> Option<&Bytes> { self.parts.get(part_num)?.as_ref() }

    fn set(&mut self, part_num: u32, payload: Bytes) {
        if let Some(slot) = self.parts.get_mut(part_num as usize) {
            *slot = Some(payload);
        }
    }

    fn concat(&self) -> Bytes {
        let total = self.parts.iter().flatten().map(Bytes::len).sum();
        let mut buffer = BytesMut::with_capacity(total);
        for part in self.parts.iter().flatten() {
            buffer.extend_from_slice(part);
        }
        buffer.freeze()
    }
}

/// Time-sliced set of in-progress assemblies.
#[derive(Debug)]
pub struct ReassemblyTable {
    slot_duration: Duration,
    max_slots: NonZeroUsize,
    parts_limit: u32,
    next_tick: Option<Instant>,
    slots: VecDeque<Slot>,
    evicted_total: u64,
}

impl ReassemblyTable {
    /// Create an empty table.
    ///
    /// Assemblies live for at most `slot_duration × max_slots` without a new
    /// part, and frames claiming more than `parts_limit` parts are refused.
    #[must_use]
    pub fn new(slot_duration: Duration, max_slots: NonZeroUsize, parts_limit: u32) -> Self {
        Self {
            slot_duration,
            max_slots,
            parts_limit,
            next_tick: None,
            slots: VecDeque::with_capacity(max_slots.get() + 1),
            evicted_total: 0,
        }
    }

    /// Advance the sliding window if the tick boundary has passed.
    ///
    /// At most one bucket is pushed per call. Returns the number of
    /// assemblies evicted from buckets that fell off the back.
    pub fn tick_at(&mut self, now: Instant) -> usize {
        if self.next_tick.is_some_and(|deadline| now <= deadline) {
            return 0;
        }
        self.next_tick = Some(now + self.slot_duration);
        self.slots.push_front(Slot::new());

        let mut evicted = 0;
        while self.slots.len() > self.max_slots.get() {
            if let Some(expired) = self.slots.pop_back() {
                evicted += expired.len();
            }
        }
        if evicted > 0 {
            self.evicted_total += evicted as u64;
            crate::metrics::inc_evicted(evicted as u64);
            debug!(evicted, "evicted stale assemblies");
        }
        evicted
    }

    /// Find the assembly for `hash` using the current time.
    pub fn lookup(&mut self, hash: Hash) -> Option<(usize, &Assembly)> {
        self.lookup_at(hash, Instant::now())
    }

    /// Find the assembly for `hash`, returning its bucket index.
    ///
    /// Runs tick maintenance first, then scans buckets newest first.
    pub fn lookup_at(&mut self, hash: Hash, now: Instant) -> Option<(usize, &Assembly)> {
        self.tick_at(now);
        self.slots
            .iter()
            .enumerate()
            .find_map(|(index, slot)| slot.get(&hash).map(|assembly| (index, assembly)))
    }

    /// Process a frame using the current time.
    ///
    /// # Errors
    ///
    /// See [`insert_at`](Self::insert_at).
    pub fn insert<M: AppMessage>(&mut self, frame: Frame) -> Result<Option<M>, ReassemblyError> {
        self.insert_at(frame, Instant::now())
    }

    /// Store a frame and decode the message if it completes an assembly.
    ///
    /// Returns `Ok(None)` while parts are missing. A completed assembly is
    /// removed from the table whether or not it decodes.
    ///
    /// # Errors
    ///
    /// Returns [`ReassemblyError::Malformed`] when the frame is refused (the
    /// table is left untouched) and [`ReassemblyError::Decode`] when the
    /// completed bytes are not a valid message.
    pub fn insert_at<M: AppMessage>(
        &mut self,
        frame: Frame,
        now: Instant,
    ) -> Result<Option<M>, ReassemblyError> {
        self.validate(&frame)?;
        let data_hash = frame.data_hash();
        let num_parts = frame.num_parts();

        let found = match self.lookup_at(data_hash, now) {
            Some((_, assembly)) if assembly.num_parts() != num_parts as usize => {
                return Err(MalformedFrame::PartCountMismatch {
                    data_hash,
                    expected: u32::try_from(assembly.num_parts()).unwrap_or(u32::MAX),
                    found: num_parts,
                }
                .into());
            }
            Some((index, _)) => Some(index),
            None => None,
        };

        let mut assembly = found
            .and_then(|index| self.slots.get_mut(index))
            .and_then(|slot| slot.remove(&data_hash))
            .unwrap_or_else(|| Assembly::new(num_parts));
        let part_num = frame.part_num();
        let (_, payload) = frame.into_parts();
        assembly.set(part_num, payload);

        if !assembly.is_complete() {
            self.front_slot().insert(data_hash, assembly);
            return Ok(None);
        }

        let bytes = assembly.concat();
        M::from_bytes(&bytes)
            .map(Some)
            .map_err(|source| ReassemblyError::Decode { data_hash, source })
    }

    /// Number of assemblies currently buffered.
    #[must_use]
    pub fn buffered_len(&self) -> usize { self.slots.iter().map(HashMap::len).sum() }

    /// Number of time-slot buckets currently held.
    #[must_use]
    pub fn slot_count(&self) -> usize { self.slots.len() }

    /// Total assemblies evicted since creation.
    #[must_use]
    pub const fn evicted_total(&self) -> u64 { self.evicted_total }

    fn validate(&self, frame: &Frame) -> Result<(), MalformedFrame> {
        let (part_num, num_parts) = (frame.part_num(), frame.num_parts());
        if num_parts > self.parts_limit {
            return Err(MalformedFrame::TooManyParts {
                num_parts,
                limit: self.parts_limit,
            });
        }
        if part_num >= num_parts {
            return Err(MalformedFrame::PartOutOfRange {
                part_num,
                num_parts,
            });
        }
        Ok(())
    }

    fn front_slot(&mut self) -> &mut Slot {
        if self.slots.is_empty() {
            self.slots.push_front(Slot::new());
        }
        &mut self.slots[0]
    }
}
