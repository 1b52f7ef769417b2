//! Per-frame input coalescing
//!
//! High-frequency samples land in a single "latest" slot. The first sample
//! after a drain asks the host for one frame; further samples before that
//! frame only overwrite the slot. The frame drains the slot once.

/// Single-slot holder for the most recent sample awaiting the next frame
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    frame_requested: bool,
    /// Samples overwritten before they were committed
    coalesced: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            frame_requested: false,
            coalesced: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Park `sample` as the latest input
    ///
    /// Returns true if the host must schedule a frame (no frame is
    /// outstanding yet); false if one is already scheduled.
    pub fn offer(&mut self, sample: T) -> bool {
        if self.pending.replace(sample).is_some() {
            self.coalesced += 1;
        }
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Drain the slot on a frame tick
    pub fn take(&mut self) -> Option<T> {
        self.frame_requested = false;
        self.pending.take()
    }

    /// Drop any parked sample without committing it
    pub fn discard(&mut self) {
        self.pending = None;
        self.frame_requested = false;
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    #[inline]
    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    #[inline]
    pub fn coalesced_count(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_offer_requests_frame() {
        let mut slot = FrameCoalescer::new();
        assert!(slot.offer(1));
        assert!(!slot.offer(2));
        assert!(!slot.offer(3));
        assert!(slot.frame_requested());
    }

    #[test]
    fn test_take_returns_latest_only() {
        let mut slot = FrameCoalescer::new();
        for i in 1..=5 {
            slot.offer(i);
        }
        assert_eq!(slot.take(), Some(5));
        assert_eq!(slot.take(), None);
        assert_eq!(slot.coalesced_count(), 4);
    }

    #[test]
    fn test_take_rearms_frame_request() {
        let mut slot = FrameCoalescer::new();
        slot.offer('a');
        slot.take();
        assert!(!slot.frame_requested());
        assert!(slot.offer('b'));
    }

    #[test]
    fn test_discard() {
        let mut slot = FrameCoalescer::new();
        slot.offer(7);
        slot.discard();
        assert!(!slot.is_pending());
        assert!(!slot.frame_requested());
        assert_eq!(slot.take(), None);
    }
}
