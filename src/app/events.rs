//! Outbound application events.
//!
//! Both services emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.  Events never carry credential
//! symbols.

use crate::credential::Verdict;
use crate::error::StoreError;
use crate::protocol::Command;
use crate::sequencer::ActuationPhase;

/// Which controller emitted an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Front,
    Back,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockEvent {
    /// A service started (carries its initial state name).
    Started { role: Role, state: &'static str },

    /// An FSM moved between states.
    StateChanged {
        role: Role,
        from: &'static str,
        to: &'static str,
    },

    /// Back: a verdict was sent for a command.
    VerdictSent { command: Command, verdict: Verdict },

    /// Front: a verdict arrived for a command.
    VerdictReceived { command: Command, verdict: Verdict },

    /// Back: a byte that is not a command arrived.
    UnknownCommand(u8),

    /// Back: the credential region was rewritten.
    CredentialStored,

    /// Back: the credential store failed.
    StoreFailed(StoreError),

    /// A mismatch was counted.
    FaultRecorded { role: Role, count: u8 },

    /// Back: the bolt entered a new phase.
    Actuation(ActuationPhase),

    AlarmRaised,
    AlarmCleared,

    /// Front: error screen shown / dismissed.
    LockoutStarted,
    LockoutEnded,
}
