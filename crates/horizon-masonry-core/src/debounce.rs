//! Debounced triggers.
//!
//! A [`Debouncer`] coalesces a burst of triggers into a single action that
//! runs once the triggers stop for a quiet period. Every trigger re-arms the
//! underlying one-shot timer, so only the last trigger of a burst counts.
//!
//! # Example
//!
//! ```
//! use horizon_masonry_core::Debouncer;
//! use std::time::{Duration, Instant};
//!
//! let start = Instant::now();
//! let mut resize = Debouncer::new(Duration::from_millis(50));
//!
//! resize.trigger(start);
//! resize.trigger(start + Duration::from_millis(30));
//!
//! // Quiet period is measured from the last trigger.
//! assert!(!resize.poll(start + Duration::from_millis(60)));
//! assert!(resize.poll(start + Duration::from_millis(80)));
//! assert!(!resize.is_pending());
//! ```

use std::time::{Duration, Instant};

use crate::logging::targets;
use crate::timer::{TimerId, TimerManager};

/// A re-armable one-shot timer with cancel-on-shutdown semantics.
#[derive(Debug)]
pub struct Debouncer {
    timers: TimerManager,
    pending: Option<TimerId>,
    quiet_period: Duration,
    shut_down: bool,
}

impl Debouncer {
    /// Create a debouncer with the given quiet period.
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            timers: TimerManager::new(),
            pending: None,
            quiet_period,
            shut_down: false,
        }
    }

    /// The quiet period that must elapse after the last trigger.
    #[inline]
    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Change the quiet period. Applies from the next trigger on.
    pub fn set_quiet_period(&mut self, quiet_period: Duration) {
        self.quiet_period = quiet_period;
    }

    /// Record a trigger at `now`, superseding any pending one.
    pub fn trigger(&mut self, now: Instant) {
        if self.shut_down {
            tracing::trace!(target: targets::DEBOUNCE, "trigger after shutdown ignored");
            return;
        }
        if let Some(previous) = self.pending.take() {
            let _ = self.timers.stop(previous);
        }
        let id = self.timers.start_one_shot(now, self.quiet_period);
        self.pending = Some(id);
        tracing::trace!(target: targets::DEBOUNCE, ?id, "debounce re-armed");
    }

    /// Returns `true` exactly once when the quiet period after the last
    /// trigger has elapsed at `now`.
    pub fn poll(&mut self, now: Instant) -> bool {
        let Some(id) = self.pending else {
            return false;
        };
        let fired = self.timers.process_expired(now);
        if fired.contains(&id) {
            self.pending = None;
            tracing::trace!(target: targets::DEBOUNCE, ?id, "debounce fired");
            true
        } else {
            false
        }
    }

    /// Whether a trigger is waiting for its quiet period.
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending trigger will fire, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.and_then(|id| self.timers.deadline(id))
    }

    /// Drop the pending trigger without firing it.
    pub fn cancel(&mut self) {
        if let Some(id) = self.pending.take() {
            let _ = self.timers.stop(id);
        }
    }

    /// Cancel any pending trigger and refuse all future ones.
    pub fn shutdown(&mut self) {
        self.cancel();
        self.timers.stop_all();
        self.shut_down = true;
        crate::masonry_debug!("debouncer shut down");
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    #[inline]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_burst_fires_once_after_last_trigger() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(50));

        for i in 0..5 {
            debouncer.trigger(start + ms(i * 10));
        }
        assert_eq!(debouncer.deadline(), Some(start + ms(90)));
        assert!(!debouncer.poll(start + ms(89)));
        assert!(debouncer.poll(start + ms(90)));
        assert!(!debouncer.poll(start + ms(200)));
    }

    #[test]
    fn test_cancel_drops_pending() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(20));
        debouncer.trigger(start);
        debouncer.cancel();

        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(start + ms(100)));
    }

    #[test]
    fn test_shutdown_refuses_triggers() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(ms(20));
        debouncer.trigger(start);
        debouncer.shutdown();

        debouncer.trigger(start + ms(1));
        assert!(!debouncer.is_pending());
        assert!(!debouncer.poll(start + ms(100)));
        assert!(debouncer.is_shut_down());
        assert_eq!(debouncer.deadline(), None);
    }
}
