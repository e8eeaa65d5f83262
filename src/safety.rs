//! Fault counter (lockout supervisor).
//!
//! Each controller owns one.  The service layer consults it **after every
//! FSM step** and forces the escalation state (front: error screen, back:
//! alarm) once the threshold is reached, regardless of which state
//! recorded the fault.
//!
//! ## Fault lifecycle
//!
//! 1. A `Mismatch` verdict calls [`FaultCounter::record_mismatch`].
//! 2. Any `Match` calls [`FaultCounter::clear`].
//! 3. At the threshold the counter is *tripped*; the service forces the
//!    escalation state.
//! 4. The escalation state runs its timed sequence, then clears the
//!    counter and hands control back.
//!
//! The count saturates at the threshold, so it always stays in
//! `0..=threshold`.  Counters are volatile; nothing here is persisted.

use log::{info, warn};

/// Bounded count of consecutive mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultCounter {
    count: u8,
    threshold: u8,
}

impl FaultCounter {
    pub fn new(threshold: u8) -> Self {
        Self {
            count: 0,
            threshold: threshold.max(1),
        }
    }

    /// Count one mismatch.  Returns `true` when this reaches the threshold.
    pub fn record_mismatch(&mut self) -> bool {
        if self.count < self.threshold {
            self.count += 1;
        }
        warn!("faults: {}/{} consecutive mismatches", self.count, self.threshold);
        self.is_tripped()
    }

    /// Reset after a `Match` or after escalation completes.
    pub fn clear(&mut self) {
        if self.count != 0 {
            info!("faults: cleared (was {})", self.count);
        }
        self.count = 0;
    }

    pub fn count(&self) -> u8 {
        self.count
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// True once the threshold has been reached and not yet cleared.
    pub fn is_tripped(&self) -> bool {
        self.count >= self.threshold
    }
}
