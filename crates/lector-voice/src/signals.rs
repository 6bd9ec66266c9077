//! Control signals shared between the foreground and the playback worker.
//!
//! [`SessionSignals`] belongs to exactly one playback session, so a stop
//! requested for one session can never leak into the next. The stop flag is
//! level-triggered: once set it stays set for the rest of the session.
//!
//! [`SpeedFactor`] is controller-wide. The worker reads it once per sentence
//! right before synthesis.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Pause/stop flags for one playback session.
#[derive(Debug, Default)]
pub struct SessionSignals {
    stopped: AtomicBool,
    paused: Mutex<bool>,
    wake: Condvar,
}

impl SessionSignals {
    /// Fresh signals: not paused, not stopped.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request the session to stop. Wakes a worker blocked in
    /// [`wait_while_paused`](Self::wait_while_paused).
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        let _paused = self.lock_paused();
        self.wake.notify_all();
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Set the pause flag. Returns `true` if it was not already set.
    pub fn pause(&self) -> bool {
        let mut paused = self.lock_paused();
        !std::mem::replace(&mut *paused, true)
    }

    /// Clear the pause flag and wake the worker. Returns `true` if it was set.
    pub fn resume(&self) -> bool {
        let mut paused = self.lock_paused();
        let was_paused = std::mem::replace(&mut *paused, false);
        self.wake.notify_all();
        was_paused
    }

    /// Whether the pause flag is set.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.lock_paused()
    }

    /// Block while paused, re-checking at least every `poll_interval`.
    ///
    /// Returns `false` if a stop was observed (before or during the wait),
    /// `true` when the worker may proceed.
    pub fn wait_while_paused(&self, poll_interval: Duration) -> bool {
        let mut paused = self.lock_paused();
        while *paused && !self.is_stopped() {
            paused = self
                .wake
                .wait_timeout(paused, poll_interval)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        !self.is_stopped()
    }

    fn lock_paused(&self) -> MutexGuard<'_, bool> {
        self.paused.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Speech speed multiplier shared across sessions (1.0 = normal).
///
/// Stored as `f32` bits in an atomic; reads may be stale by at most the
/// sentence currently being synthesized.
#[derive(Debug)]
pub struct SpeedFactor(AtomicU32);

impl SpeedFactor {
    /// Create with an initial speed.
    #[must_use]
    pub fn new(speed: f32) -> Self {
        Self(AtomicU32::new(speed.to_bits()))
    }

    /// Current speed.
    #[must_use]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::SeqCst))
    }

    /// Replace the speed.
    pub fn set(&self, speed: f32) {
        self.0.store(speed.to_bits(), Ordering::SeqCst);
    }
}

impl Default for SpeedFactor {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;

    #[test]
    fn new_signals_are_clear() {
        let signals = SessionSignals::new();
        assert!(!signals.is_paused());
        assert!(!signals.is_stopped());
        assert!(signals.wait_while_paused(Duration::from_millis(10)));
    }

    #[test]
    fn pause_and_resume_report_changes() {
        let signals = SessionSignals::new();
        assert!(signals.pause());
        assert!(!signals.pause());
        assert!(signals.is_paused());
        assert!(signals.resume());
        assert!(!signals.resume());
    }

    #[test]
    fn stop_is_level_triggered() {
        let signals = SessionSignals::new();
        signals.request_stop();
        signals.request_stop();
        assert!(signals.is_stopped());
        assert!(!signals.wait_while_paused(Duration::from_millis(10)));
    }

    #[test]
    fn resume_wakes_paused_waiter() {
        let signals = Arc::new(SessionSignals::new());
        signals.pause();

        let waiter = {
            let signals = Arc::clone(&signals);
            std::thread::spawn(move || signals.wait_while_paused(Duration::from_secs(5)))
        };

        std::thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        signals.resume();

        assert!(waiter.join().unwrap());
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn stop_wakes_paused_waiter() {
        let signals = Arc::new(SessionSignals::new());
        signals.pause();

        let waiter = {
            let signals = Arc::clone(&signals);
            std::thread::spawn(move || signals.wait_while_paused(Duration::from_millis(100)))
        };

        std::thread::sleep(Duration::from_millis(50));
        signals.request_stop();

        assert!(!waiter.join().unwrap());
    }

    #[test]
    fn speed_factor_round_trips() {
        let speed = SpeedFactor::default();
        assert!((speed.get() - 1.0).abs() < f32::EPSILON);
        speed.set(1.7);
        assert!((speed.get() - 1.7).abs() < f32::EPSILON);
    }
}
