//! Outbound helper that turns one application message into frames.
//!
//! Messages at or below the threshold, and messages that cannot be split,
//! travel as one frame. Larger [`Splittable`](crate::message::Splittable)
//! messages become a header part followed by body parts of equal size, with
//! the final part absorbing the rounding remainder.

use std::num::NonZeroUsize;

use bytes::Bytes;

use super::SplitError;
use crate::{
    frame::{Frame, FrameHeader, TargetHint},
    message::AppMessage,
};

/// Splits application messages into [`Frame`]s.
#[derive(Clone, Copy, Debug)]
pub struct Splitter {
    threshold: NonZeroUsize,
}

impl Splitter {
    /// Create a splitter that keeps messages up to `threshold` bytes whole.
    #[must_use]
    pub const fn new(threshold: NonZeroUsize) -> Self { Self { threshold } }

    /// Return the split threshold in bytes.
    #[must_use]
    pub const fn threshold(&self) -> NonZeroUsize { self.threshold }

    /// Number of parts used for a message whose full encoding is `size` bytes.
    ///
    /// One part holds the header and one extra part spreads the remainder.
    #[must_use]
    pub const fn part_count(&self, size: usize) -> usize { size / self.threshold.get() + 2 }

    /// Encode `message` and split it into frames addressed to `target`.
    ///
    /// Either every frame is produced or none is.
    ///
    /// # Errors
    ///
    /// Returns [`SplitError::Encode`] if the message, header or body cannot
    /// be encoded, and [`SplitError::TooManyParts`] if the part count does
    /// not fit in a `u32`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::num::NonZeroUsize;
    ///
    /// use wirebridge::{envelope::Envelope, fragment::Splitter, frame::TargetHint};
    ///
    /// let splitter = Splitter::new(NonZeroUsize::new(1024).expect("non-zero"));
    /// let batch = splitter
    ///     .split(&Envelope::broadcast(1, vec![0; 2500]), &TargetHint::Broadcast)
    ///     .expect("split");
    /// assert_eq!(batch.len(), 4);
    /// ```
    pub fn split<M: AppMessage>(
        &self,
        message: &M,
        target: &TargetHint,
    ) -> Result<FrameBatch, SplitError> {
        let data = message.to_bytes()?;
        let message_hash = message.message_hash();
        let whole = FrameHeader::whole(
            target.clone(),
            message_hash.to_hex(),
            message.message_type().to_string(),
            message_hash,
        );

        let splittable = match message.as_splittable() {
            Some(splittable) if data.len() > self.threshold.get() => splittable,
            _ => return Ok(FrameBatch::new(vec![Frame::new(whole, data)])),
        };

        let parts = self.part_count(data.len());
        let num_parts =
            u32::try_from(parts).map_err(|_| SplitError::TooManyParts { size: data.len() })?;
        let header_bytes = splittable.header_bytes()?;
        let body = Bytes::from(splittable.body_bytes()?);
        let template = FrameHeader {
            data_hash: splittable.body_hash(),
            ..whole
        };

        let lump = body.len() / (parts - 1);
        let mut frames = Vec::with_capacity(parts);
        frames.push(Frame::new(template.for_part(0, num_parts), header_bytes));
        for part_num in 1..num_parts - 1 {
            let index = part_num as usize;
            let slice = body.slice((index - 1) * lump..index * lump);
            frames.push(Frame::new(template.for_part(part_num, num_parts), slice));
        }
        let tail = body.slice((parts - 2) * lump..);
        frames.push(Frame::new(
            template.for_part(num_parts - 1, num_parts),
            tail,
        ));

        Ok(FrameBatch::new(frames))
    }
}

/// Frames produced for a single application message, in part order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBatch {
    frames: Vec<Frame>,
}

impl FrameBatch {
    fn new(frames: Vec<Frame>) -> Self {
        debug_assert!(!frames.is_empty(), "frame batches must not be empty");
        Self { frames }
    }

    /// Return the frames as a slice.
    #[must_use]
    pub fn frames(&self) -> &[Frame] { self.frames.as_slice() }

    /// Number of frames in the batch.
    #[expect(
        clippy::len_without_is_empty,
        reason = "batches are guaranteed non-empty"
    )]
    #[must_use]
    pub fn len(&self) -> usize { self.frames.len() }

    /// Whether the message was split into parts.
    #[must_use]
    pub fn is_split(&self) -> bool { self.len() > 1 }

    /// Total payload bytes across all frames.
    #[must_use]
    pub fn payload_len(&self) -> usize { self.frames.iter().map(|f| f.payload().len()).sum() }

    /// Consume the batch, returning the frames.
    #[must_use]
    pub fn into_frames(self) -> Vec<Frame> { self.frames }
}

impl IntoIterator for FrameBatch {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter { self.frames.into_iter() }
}
