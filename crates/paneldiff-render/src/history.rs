#![forbid(unsafe_code)]

//! Bounded frame history and the collapse operation.
//!
//! Elements whose snapshot arrived with missing attribute groups and
//! whose immediate predecessor could not complete them are resolved by
//! replaying retained frames, newest first, so closer data wins over
//! older data for the same attribute group. The history is a bounded
//! ring: once capacity is reached the oldest frame is evicted. It is
//! only consulted in incremental mode.

use std::collections::{HashMap, VecDeque};

use crate::frame::FrameContext;

/// A bounded, time-ordered buffer of completed frame contexts.
#[derive(Debug)]
pub struct FrameHistory {
    frames: VecDeque<FrameContext>,
    capacity: usize,
}

impl FrameHistory {
    /// Create a history retaining at most `capacity` frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of retained frames.
    #[inline]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Check if no frames are retained.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Retain a completed frame, evicting the oldest at capacity.
    pub fn push(&mut self, frame: FrameContext) {
        if self.capacity == 0 {
            return;
        }
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
        }
        self.frames.push_back(frame);
    }

    /// Drop all retained frames.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Iterate retained frames from most recent to oldest.
    pub fn iter_newest_first(&self) -> impl Iterator<Item = &FrameContext> {
        self.frames.iter().rev()
    }

    /// Resolve the missing attribute groups of `current` by replaying
    /// retained frames.
    ///
    /// Returns true iff every element of `current` ends complete. A
    /// false result means some elements remain structurally incomplete
    /// after history exhaustion; the caller must skip painting them
    /// this tick or request a full resend from the producer.
    ///
    /// No-op (true) when `current` was built non-incremental. Missing
    /// masks only lose bits during the walk, never gain them.
    pub fn collapse(&self, current: &mut FrameContext) -> bool {
        if !current.options().incremental {
            return true;
        }

        // Outstanding incomplete elements, keyed by serial.
        let mut outstanding: HashMap<u64, usize> = current
            .snapshot()
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, el)| !el.is_complete())
            .map(|(i, el)| (el.serial(), i))
            .collect();
        if outstanding.is_empty() {
            return true;
        }

        #[cfg(feature = "tracing")]
        let _span = paneldiff_core::logging::debug_span!(
            "history_collapse",
            outstanding = outstanding.len(),
            frames = self.frames.len()
        )
        .entered();

        for frame in self.iter_newest_first() {
            for pred in frame.snapshot().elements() {
                let Some(&i) = outstanding.get(&pred.serial()) else {
                    continue;
                };
                let el = &mut current.elements_mut()[i];
                match el.merge_from(pred, false) {
                    Ok(_) => {
                        if el.is_complete() {
                            outstanding.remove(&pred.serial());
                            if outstanding.is_empty() {
                                return true;
                            }
                        }
                    }
                    Err(err) => {
                        #[cfg(feature = "tracing")]
                        paneldiff_core::logging::warn!(
                            serial = pred.serial(),
                            error = %err,
                            "collapse merge failed; continuing"
                        );
                        #[cfg(not(feature = "tracing"))]
                        let _ = err;
                    }
                }
            }
        }

        #[cfg(feature = "tracing")]
        paneldiff_core::logging::debug!(
            unresolved = outstanding.len(),
            "history exhausted with incomplete elements"
        );

        outstanding.is_empty()
    }
}
