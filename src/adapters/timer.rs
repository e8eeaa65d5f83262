//! Actuation timer adapters.
//!
//! [`ThreadTimer`] is the host stand-in for the periodic hardware timer:
//! a background thread parks until the next period boundary, then advances
//! the subscribed [`TickCounter`], and touches nothing else.  Unsubscribing
//! unparks it, so the join returns without waiting out the period.
//!
//! [`StepTimer`] delivers one tick per [`idle`](ActuationTimer::idle) call
//! so timed sequences run synchronously under test.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::app::ports::ActuationTimer;
use crate::tick::TickCounter;

/// Poll period of the control loop while it waits for a tick.
const IDLE_POLL: Duration = Duration::from_millis(1);

// ───────────────────────────────────────────────────────────────
// Thread-backed periodic timer
// ───────────────────────────────────────────────────────────────

/// Handle for one [`ThreadTimer`] subscription.
#[derive(Debug)]
pub struct ThreadTick {
    stop: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

/// Periodic timer on a background thread.
#[derive(Debug, Default)]
pub struct ThreadTimer;

impl ThreadTimer {
    pub fn new() -> Self {
        Self
    }
}

impl ActuationTimer for ThreadTimer {
    type Handle = ThreadTick;

    fn subscribe(&mut self, interval_ms: u32, ticks: TickCounter) -> ThreadTick {
        let period = Duration::from_millis(u64::from(interval_ms));
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        debug!("timer: subscribed, period {period:?}");
        let worker = thread::spawn(move || {
            let mut next = Instant::now() + period;
            while !flag.load(Ordering::Acquire) {
                let now = Instant::now();
                if now >= next {
                    ticks.advance();
                    next += period;
                } else {
                    // Wakes early on unpark or spuriously; the loop rechecks.
                    thread::park_timeout(next - now);
                }
            }
        });
        ThreadTick { stop, worker }
    }

    fn unsubscribe(&mut self, handle: ThreadTick) {
        handle.stop.store(true, Ordering::Release);
        handle.worker.thread().unpark();
        if handle.worker.join().is_err() {
            warn!("timer: tick thread panicked");
        }
        debug!("timer: unsubscribed");
    }

    fn idle(&mut self) {
        thread::sleep(IDLE_POLL);
    }
}

// ───────────────────────────────────────────────────────────────
// Synchronous test timer
// ───────────────────────────────────────────────────────────────

/// Delivers exactly one tick per `idle()` while subscribed.
#[derive(Debug, Default)]
pub struct StepTimer {
    active: Option<TickCounter>,
    delivered: u32,
    subscriptions: u32,
}

impl StepTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some()
    }

    /// Ticks delivered since construction, across all subscriptions.
    pub fn delivered(&self) -> u32 {
        self.delivered
    }

    /// Number of `subscribe` calls so far.
    pub fn subscriptions(&self) -> u32 {
        self.subscriptions
    }
}

impl ActuationTimer for StepTimer {
    type Handle = ();

    fn subscribe(&mut self, _interval_ms: u32, ticks: TickCounter) {
        self.subscriptions += 1;
        self.active = Some(ticks);
    }

    fn unsubscribe(&mut self, (): ()) {
        self.active = None;
    }

    fn idle(&mut self) {
        if let Some(ticks) = &self.active {
            ticks.advance();
            self.delivered += 1;
        }
    }
}
