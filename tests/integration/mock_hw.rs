//! Mock adapters for integration tests.
//!
//! Every mock records what the services asked of it.  Recorders are
//! shared handles, so a test keeps a clone and inspects the history even
//! after the service has moved to another thread.

use std::sync::{Arc, Mutex};

use doorlock::app::events::LockEvent;
use doorlock::app::ports::{Actuator, Display, EventSink, Prompt};

/// Cloneable append-only log.
#[derive(Debug)]
pub struct Recorder<T>(Arc<Mutex<Vec<T>>>);

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Recorder<T> {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(Vec::new())))
    }
}

#[allow(dead_code)]
impl<T: Clone> Recorder<T> {
    pub fn push(&self, item: T) {
        self.0.lock().unwrap().push(item);
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.0.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

// ── Actuator ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCall {
    Forward,
    Reverse,
    Stop,
    AlarmOn,
    AlarmOff,
}

#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    pub calls: Recorder<ActuatorCall>,
}

impl Actuator for MockActuator {
    fn drive_forward(&mut self) {
        self.calls.push(ActuatorCall::Forward);
    }

    fn drive_reverse(&mut self) {
        self.calls.push(ActuatorCall::Reverse);
    }

    fn stop(&mut self) {
        self.calls.push(ActuatorCall::Stop);
    }

    fn alarm_on(&mut self) {
        self.calls.push(ActuatorCall::AlarmOn);
    }

    fn alarm_off(&mut self) {
        self.calls.push(ActuatorCall::AlarmOff);
    }
}

// ── Display ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayCall {
    Show(Prompt),
    Mask,
}

#[derive(Debug, Clone, Default)]
pub struct MockDisplay {
    pub calls: Recorder<DisplayCall>,
}

#[allow(dead_code)]
impl MockDisplay {
    /// Prompts only, masks filtered out.
    pub fn prompts(&self) -> Vec<Prompt> {
        self.calls
            .snapshot()
            .into_iter()
            .filter_map(|c| match c {
                DisplayCall::Show(p) => Some(p),
                DisplayCall::Mask => None,
            })
            .collect()
    }

    pub fn masks(&self) -> usize {
        self.calls
            .snapshot()
            .iter()
            .filter(|c| **c == DisplayCall::Mask)
            .count()
    }
}

impl Display for MockDisplay {
    fn show(&mut self, prompt: Prompt) {
        self.calls.push(DisplayCall::Show(prompt));
    }

    fn mask_symbol(&mut self) {
        self.calls.push(DisplayCall::Mask);
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub events: Recorder<LockEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &LockEvent) -> bool {
        self.events.snapshot().contains(event)
    }

    pub fn count(&self, pred: impl Fn(&LockEvent) -> bool) -> usize {
        self.events.snapshot().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &LockEvent) {
        self.events.push(event.clone());
    }
}
