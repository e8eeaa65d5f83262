//! Tick-scheduled phase sequences.
//!
//! Actuation, alarm, and both front-panel timed screens are the same
//! thing: a list of `(start_tick, phase)` steps and an end tick, driven by
//! the shared [`TickCounter`] that the timer callback advances.
//!
//! ```text
//!  tick  0            15        18            33
//!        ├─ Unlocking ─┼─ Hold ──┼─ Locking ───┤ Idle
//!        fwd           stop      rev           stop
//! ```
//!
//! [`run`] is a blocking busy-wait: nothing else executes on the
//! controller until the end tick is reached.  It subscribes the timer on
//! entry, unsubscribes explicitly on exit, and leaves the counter at 0.

use heapless::Vec;
use log::debug;

use crate::app::ports::ActuationTimer;
use crate::config::LockConfig;
use crate::tick::TickCounter;

/// Maximum steps in one schedule.
const MAX_STEPS: usize = 4;

/// Bolt phase on the back controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuationPhase {
    Idle,
    Unlocking,
    HoldOpen,
    Locking,
}

/// Ordered steps plus the tick at which the sequence ends.
#[derive(Debug, Clone)]
pub struct Schedule<P> {
    steps: Vec<(u32, P), MAX_STEPS>,
    end: u32,
}

impl<P: Copy> Schedule<P> {
    /// Build from consecutive `(phase, length)` pairs.  Zero-length phases
    /// are dropped.
    pub fn from_lengths(phases: &[(P, u32)]) -> Self {
        let mut steps = Vec::new();
        let mut start = 0u32;
        for &(phase, len) in phases {
            if len == 0 {
                continue;
            }
            if steps.push((start, phase)).is_err() {
                break;
            }
            start += len;
        }
        Self { steps, end: start }
    }

    /// Tick at which the sequence finishes.
    pub fn end(&self) -> u32 {
        self.end
    }

    /// Phase active at `tick`, or `None` at/after the end.
    pub fn phase_at(&self, tick: u32) -> Option<P> {
        if tick >= self.end {
            return None;
        }
        self.steps
            .iter()
            .rev()
            .find(|(start, _)| *start <= tick)
            .map(|&(_, p)| p)
    }

    fn index_at(&self, tick: u32) -> Option<usize> {
        if tick >= self.end {
            return None;
        }
        self.steps.iter().rposition(|(start, _)| *start <= tick)
    }
}

impl Schedule<ActuationPhase> {
    /// Unlock → hold → lock, lengths from config.
    pub fn actuation(config: &LockConfig) -> Self {
        Self::from_lengths(&[
            (ActuationPhase::Unlocking, config.unlock_ticks),
            (ActuationPhase::HoldOpen, config.hold_ticks),
            (ActuationPhase::Locking, config.lock_ticks),
        ])
    }
}

/// Run `schedule` to completion.
///
/// `on_phase` fires once each time a new step becomes active.  Returns the
/// number of ticks observed at exit (equal to `schedule.end()` unless the
/// timer overshoots between polls).
pub fn run<P, T>(
    timer: &mut T,
    ticks: &TickCounter,
    interval_ms: u32,
    schedule: &Schedule<P>,
    mut on_phase: impl FnMut(P),
) -> u32
where
    P: Copy + core::fmt::Debug,
    T: ActuationTimer,
{
    ticks.reset();
    let handle = timer.subscribe(interval_ms, ticks.clone());
    let mut current = None;

    loop {
        let now = ticks.get();
        let Some(idx) = schedule.index_at(now) else {
            break;
        };
        if current != Some(idx) {
            let phase = schedule.steps[idx].1;
            debug!("sequencer: tick {now} -> {phase:?}");
            on_phase(phase);
            current = Some(idx);
        }
        timer.idle();
    }

    timer.unsubscribe(handle);
    let elapsed = ticks.get();
    ticks.reset();
    elapsed
}
