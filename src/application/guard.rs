//! In-flight guard
//!
//! Non-blocking single-entry lock for a polling loop. A tick that finds the
//! previous cycle still running gets no permit and does nothing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    busy: Arc<AtomicBool>,
}

/// Held for the duration of one cycle; released on drop, including early returns and panics
#[derive(Debug)]
pub struct InFlightPermit {
    busy: Arc<AtomicBool>,
}

/// Result of asking a guarded loop to run
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome<R> {
    Completed(R),
    /// Previous cycle still running
    Skipped,
}

impl<R> CycleOutcome<R> {
    pub fn is_skipped(&self) -> bool {
        matches!(self, CycleOutcome::Skipped)
    }

    pub fn completed(self) -> Option<R> {
        match self {
            CycleOutcome::Completed(r) => Some(r),
            CycleOutcome::Skipped => None,
        }
    }
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Option<InFlightPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for InFlightPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_fails_while_held() {
        let guard = InFlightGuard::new();
        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(guard.is_busy());
        assert!(guard.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_busy());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_early_return() {
        fn failing_cycle(guard: &InFlightGuard) -> Result<(), String> {
            let _permit = guard.try_acquire().ok_or("busy")?;
            Err("fetch failed".to_string())
        }

        let guard = InFlightGuard::new();
        assert!(failing_cycle(&guard).is_err());
        assert!(!guard.is_busy());
    }

    #[test]
    fn test_clones_share_flag() {
        let guard = InFlightGuard::new();
        let other = guard.clone();
        let _permit = guard.try_acquire().unwrap();
        assert!(other.try_acquire().is_none());
    }

    #[test]
    fn test_cycle_outcome_helpers() {
        assert!(CycleOutcome::<u32>::Skipped.is_skipped());
        assert_eq!(CycleOutcome::Completed(3).completed(), Some(3));
        assert_eq!(CycleOutcome::<u32>::Skipped.completed(), None);
    }
}
