//! In-flight request counter.
//!
//! Shells drive a global loading indicator from this: it is "loading" while at
//! least one request is outstanding. One tracker is owned by the client that
//! issues the requests and cloned wherever the count needs to be read.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    count: Arc<AtomicUsize>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Decrement, never going below zero.
    pub fn stop(&self) {
        let _ = self
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| Some(n.saturating_sub(1)));
    }

    pub fn in_flight(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    /// Start tracking; the returned guard stops on drop.
    pub fn track(&self) -> RequestGuard {
        self.start();
        RequestGuard {
            tracker: self.clone(),
        }
    }
}

/// Stops its request on drop, including on early return and cancellation.
#[derive(Debug)]
pub struct RequestGuard {
    tracker: RequestTracker,
}

impl Drop for RequestGuard {
    fn drop(&mut self) {
        self.tracker.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_stop() {
        let tracker = RequestTracker::new();
        assert!(!tracker.is_loading());

        tracker.start();
        tracker.start();
        assert_eq!(tracker.in_flight(), 2);

        tracker.stop();
        assert!(tracker.is_loading());
        tracker.stop();
        assert!(!tracker.is_loading());
    }

    #[test]
    fn test_stop_saturates_at_zero() {
        let tracker = RequestTracker::new();
        tracker.stop();
        tracker.stop();
        assert_eq!(tracker.in_flight(), 0);

        tracker.start();
        assert_eq!(tracker.in_flight(), 1);
    }

    #[test]
    fn test_guard_and_clones_share_count() {
        let tracker = RequestTracker::new();
        let observer = tracker.clone();
        {
            let _guard = tracker.track();
            assert_eq!(observer.in_flight(), 1);
        }
        assert_eq!(observer.in_flight(), 0);
    }
}
