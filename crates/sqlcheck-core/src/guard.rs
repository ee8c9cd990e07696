//! Loop guard: a non-blocking exclusion gate with drop-on-contention semantics.
//!
//! The guard is a re-entrancy barrier. While a token is alive, every other attempt to acquire
//! fails immediately; callers drop the trigger instead of waiting or queueing. The flag is an
//! [`AtomicBool`] so the same gate keeps its semantics if a host ever delivers events from more
//! than one thread.

use std::sync::atomic::{AtomicBool, Ordering};

/// Exclusion gate shared by every analysis trigger.
#[derive(Debug, Default)]
pub struct LoopGuard {
    busy: AtomicBool,
}

impl LoopGuard {
    /// Create a free guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to acquire the guard.
    ///
    /// Returns `None` when the guard is already held. The returned token releases the guard
    /// when dropped, including during unwinding.
    pub fn try_acquire(&self) -> Option<GuardToken<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| GuardToken { guard: self })
    }

    /// Returns `true` while a token is alive.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding a [`LoopGuard`].
#[derive(Debug)]
#[must_use = "the guard is released as soon as the token is dropped"]
pub struct GuardToken<'a> {
    guard: &'a LoopGuard,
}

impl Drop for GuardToken<'_> {
    fn drop(&mut self) {
        self.guard.busy.store(false, Ordering::Release);
    }
}
