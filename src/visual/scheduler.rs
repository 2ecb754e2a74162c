//! Frame scheduling
//!
//! The render loop never sleeps or spins on its own. Each iteration asks a
//! `FrameScheduler` for the next display refresh and is resumed by the host
//! through `VisualStimulusEngine::on_animation_frame` with the token it was
//! given. Cancelling a token guarantees its callback is ignored.

use std::sync::{Arc, Mutex, MutexGuard};

/// Handle for one requested frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameToken(u64);

impl FrameToken {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Host per-frame callback mechanism
pub trait FrameScheduler {
    /// Ask for one callback at the next display refresh
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraw a pending request; unknown tokens are ignored
    fn cancel_frame(&mut self, token: FrameToken);
}

#[derive(Debug, Default)]
struct QueueState {
    next_id: u64,
    pending: Vec<FrameToken>,
}

/// Scheduler whose pending requests the host drains by hand.
///
/// Clones share one queue, so the host keeps a clone and feeds drained
/// tokens back into the engine on each tick.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameScheduler {
    state: Arc<Mutex<QueueState>>,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        // The queue holds plain data; a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Take every pending request, oldest first
    pub fn take_pending(&self) -> Vec<FrameToken> {
        std::mem::take(&mut self.lock().pending)
    }

    /// Number of requests waiting for a callback
    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameToken {
        let mut state = self.lock();
        state.next_id += 1;
        let token = FrameToken(state.next_id);
        state.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.lock().pending.retain(|&pending| pending != token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique() {
        let mut scheduler = ManualFrameScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        assert_ne!(a, b);
        assert_eq!(scheduler.take_pending(), vec![a, b]);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_cancel_removes_request() {
        let mut scheduler = ManualFrameScheduler::new();
        let host_view = scheduler.clone();
        let a = scheduler.request_frame();
        scheduler.cancel_frame(a);
        scheduler.cancel_frame(a);
        assert_eq!(host_view.pending_count(), 0);
    }
}
