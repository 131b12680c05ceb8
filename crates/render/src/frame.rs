/// Ticket for one frame requested from a [`crate::Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// The self-rescheduling frame loop.
///
/// Holds at most one outstanding request. Each frame replaces it with the
/// next one; cancelling takes it.
#[derive(Debug, Default)]
pub struct FrameLoop {
    pending: Option<FrameHandle>,
}

impl FrameLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Record the request for the next frame.
    pub fn schedule(&mut self, handle: FrameHandle) {
        self.pending = Some(handle);
    }

    /// Take the outstanding request, if any, for cancellation.
    pub fn cancel(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }
}
