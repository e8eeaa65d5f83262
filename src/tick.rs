//! Shared tick counter.
//!
//! The only state touched from timer-callback context.  The callback
//! advances it; the control loop reads and resets it.  A single atomic is
//! enough because there is exactly one writer per sequence and the reader
//! only needs a monotonic view.
//!
//! ```text
//! ┌──────────────┐ advance() ┌─────────────┐ get()/reset() ┌──────────────┐
//! │ timer thread │──────────▶│ TickCounter │◀──────────────│ control loop │
//! └──────────────┘           └─────────────┘               └──────────────┘
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Cloneable handle to one shared counter.
#[derive(Debug, Clone, Default)]
pub struct TickCounter(Arc<AtomicU32>);

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one tick.  Called from the timer callback only.
    pub fn advance(&self) {
        self.0.fetch_add(1, Ordering::Release);
    }

    /// Ticks since the last reset.
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(0, Ordering::Release);
    }
}
