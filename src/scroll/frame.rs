/// Latest-value-wins buffer drained once per frame.
///
/// Offering a value while one is already pending replaces it; nothing is
/// queued, so a burst of events costs a single drain.
#[derive(Debug, Clone)]
pub struct FrameSlot<T> {
    pending: Option<T>,
    coalesced: u64,
}

impl<T> Default for FrameSlot<T> {
    fn default() -> Self {
        Self {
            pending: None,
            coalesced: 0,
        }
    }
}

impl<T> FrameSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value`. Returns `true` when the slot was empty, i.e. the caller
    /// must schedule a frame to drain it.
    pub fn offer(&mut self, value: T) -> bool {
        let was_empty = self.pending.is_none();
        if !was_empty {
            self.coalesced += 1;
        }
        self.pending = Some(value);
        was_empty
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Number of values overwritten before they were drained.
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}
