//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing each [`LockEvent`] as one line
//! through `log`.  The simulator routes those lines to the terminal.

use log::{info, warn};

use crate::app::events::{LockEvent, Role};
use crate::app::ports::EventSink;

/// Adapter that logs every [`LockEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn side(role: Role) -> &'static str {
    match role {
        Role::Front => "front",
        Role::Back => "back",
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &LockEvent) {
        match event {
            LockEvent::Started { role, state } => {
                info!("START | {} initial_state={}", side(*role), state);
            }
            LockEvent::StateChanged { role, from, to } => {
                info!("STATE | {} {} -> {}", side(*role), from, to);
            }
            LockEvent::VerdictSent { command, verdict } => {
                info!("VERDICT | sent {:?} for {:?}", verdict, command);
            }
            LockEvent::VerdictReceived { command, verdict } => {
                info!("VERDICT | got {:?} for {:?}", verdict, command);
            }
            LockEvent::UnknownCommand(byte) => {
                warn!("PROTO | unknown command 0x{:02X}", byte);
            }
            LockEvent::CredentialStored => info!("STORE | credential written"),
            LockEvent::StoreFailed(e) => warn!("STORE | {}", e),
            LockEvent::FaultRecorded { role, count } => {
                warn!("FAULT | {} count={}", side(*role), count);
            }
            LockEvent::Actuation(phase) => info!("BOLT | {:?}", phase),
            LockEvent::AlarmRaised => warn!("ALARM | raised"),
            LockEvent::AlarmCleared => info!("ALARM | cleared"),
            LockEvent::LockoutStarted => warn!("LOCKOUT | started"),
            LockEvent::LockoutEnded => info!("LOCKOUT | ended"),
        }
    }
}
