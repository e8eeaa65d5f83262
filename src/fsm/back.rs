//! Back controller states and table builder.
//!
//! ```text
//!                 ┌──[CreatePassword]──▶ CREATING ──────────────┐
//!                 │                                             │
//!  AWAITING_COMMAND ─[OpenDoor]────────▶ OPENING ─[Match: bolt]─┤
//!        ▲  │     │                        │                    │
//!        │  │     └──[ChangePassword]──▶ CHANGING               │
//!        │  │                              │                    │
//!        │  └─[unknown byte]─┐   [3rd mismatch]                 │
//!        │                   ▼             ▼                    │
//!        ├──[60 ticks]───── ALARM ◀────────┘                    │
//!        └──────────────────────────────────────────────────────┘
//! ```
//!
//! The back controller is the only side that decides a verdict, touches
//! the credential store, or drives the bolt.  The bolt moves only from
//! `Opening`, and only after the verdict byte for a `Match` has gone out.

use log::{error, info, warn};

use super::{StateDescriptor, StateId};
use crate::app::events::{LockEvent, Role};
use crate::app::ports::{ActuationTimer, Actuator, CredentialStore, EventSink};
use crate::config::LockConfig;
use crate::credential::{Credential, CredentialManager, Verdict};
use crate::error::Error;
use crate::link::Link;
use crate::protocol::{self, Command, Incoming, Request};
use crate::safety::FaultCounter;
use crate::sequencer::{self, ActuationPhase, Schedule};
use crate::tick::TickCounter;

/// Back controller states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum BackState {
    AwaitingCommand = 0,
    Creating = 1,
    Opening = 2,
    Changing = 3,
    Alarm = 4,
}

impl BackState {
    pub const COUNT: usize = 5;
}

impl StateId for BackState {
    fn index(self) -> usize {
        self as usize
    }
}

/// Shared data for the back handlers.
pub struct BackContext<L, M, T, A, S> {
    pub link: L,
    pub credentials: CredentialManager<M>,
    pub timer: T,
    pub actuator: A,
    pub sink: S,
    pub ticks: TickCounter,
    pub faults: FaultCounter,
    pub config: LockConfig,
    /// Request read in `AwaitingCommand`, consumed by the handling state.
    pub pending: Option<Request>,
    /// Current bolt phase; `Idle` outside the actuation sequence.
    pub phase: ActuationPhase,
}

impl<L, M: CredentialStore, T, A, S> BackContext<L, M, T, A, S> {
    /// Rejects a config that fails [`LockConfig::validate`].
    pub fn new(
        link: L,
        store: M,
        timer: T,
        actuator: A,
        sink: S,
        config: LockConfig,
    ) -> Result<Self, Error> {
        config.validate().inspect_err(|e| error!("back: {e}"))?;
        Ok(Self {
            link,
            credentials: CredentialManager::new(store, config.credential_base_addr)?,
            timer,
            actuator,
            sink,
            ticks: TickCounter::new(),
            faults: FaultCounter::new(config.max_consecutive_faults),
            config,
            pending: None,
            phase: ActuationPhase::Idle,
        })
    }
}

pub type BackDescriptor<L, M, T, A, S> = StateDescriptor<BackContext<L, M, T, A, S>, BackState, Error>;

/// Build the back state table.  Row order must match [`BackState`].
pub fn build_back_table<L, M, T, A, S>() -> [BackDescriptor<L, M, T, A, S>; BackState::COUNT]
where
    L: Link,
    M: CredentialStore,
    T: ActuationTimer,
    A: Actuator,
    S: EventSink,
{
    [
        StateDescriptor {
            id: BackState::AwaitingCommand,
            name: "AwaitingCommand",
            on_enter: None,
            on_exit: None,
            on_update: awaiting_update::<L, M, T, A, S>,
        },
        StateDescriptor {
            id: BackState::Creating,
            name: "Creating",
            on_enter: None,
            on_exit: None,
            on_update: creating_update::<L, M, T, A, S>,
        },
        StateDescriptor {
            id: BackState::Opening,
            name: "Opening",
            on_enter: None,
            on_exit: Some(opening_exit::<L, M, T, A, S>),
            on_update: opening_update::<L, M, T, A, S>,
        },
        StateDescriptor {
            id: BackState::Changing,
            name: "Changing",
            on_enter: None,
            on_exit: None,
            on_update: changing_update::<L, M, T, A, S>,
        },
        StateDescriptor {
            id: BackState::Alarm,
            name: "Alarm",
            on_enter: Some(alarm_enter::<L, M, T, A, S>),
            on_exit: Some(alarm_exit::<L, M, T, A, S>),
            on_update: alarm_update::<L, M, T, A, S>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_COMMAND
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_update<L, M, T, A, S>(
    ctx: &mut BackContext<L, M, T, A, S>,
) -> Result<Option<BackState>, Error>
where
    L: Link,
    M: CredentialStore,
    S: EventSink,
{
    match protocol::receive_request(&mut ctx.link)? {
        Incoming::Request(request) => {
            let next = match request.command() {
                Command::CreatePassword => BackState::Creating,
                Command::OpenDoor => BackState::Opening,
                Command::ChangePassword => BackState::Changing,
            };
            ctx.pending = Some(request);
            Ok(Some(next))
        }
        Incoming::Unknown(byte) => {
            // No verdict: the peer is not speaking the protocol.
            warn!("back: unknown command byte 0x{byte:02X}");
            ctx.sink.emit(&LockEvent::UnknownCommand(byte));
            Ok(record_fault(ctx).then_some(BackState::Alarm))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CREATING
// ═══════════════════════════════════════════════════════════════════════════

fn creating_update<L, M, T, A, S>(
    ctx: &mut BackContext<L, M, T, A, S>,
) -> Result<Option<BackState>, Error>
where
    L: Link,
    M: CredentialStore,
    S: EventSink,
{
    let Some(Request::CreatePassword {
        candidate,
        confirmation,
    }) = ctx.pending.take()
    else {
        error!("back: Creating entered without a create request");
        return Ok(Some(BackState::AwaitingCommand));
    };

    let mut verdict = CredentialManager::<M>::create_credential(&candidate, &confirmation);
    if verdict.is_match() {
        verdict = store_credential(ctx, &candidate);
    }
    reply(ctx, Command::CreatePassword, verdict)?;
    Ok(Some(BackState::AwaitingCommand))
}

// ═══════════════════════════════════════════════════════════════════════════
//  OPENING
// ═══════════════════════════════════════════════════════════════════════════

fn opening_update<L, M, T, A, S>(
    ctx: &mut BackContext<L, M, T, A, S>,
) -> Result<Option<BackState>, Error>
where
    L: Link,
    M: CredentialStore,
    T: ActuationTimer,
    A: Actuator,
    S: EventSink,
{
    let Some(Request::OpenDoor(attempt)) = ctx.pending.take() else {
        error!("back: Opening entered without an open request");
        return Ok(Some(BackState::AwaitingCommand));
    };

    let verdict = ctx.credentials.verify_against_store(&attempt);
    reply(ctx, Command::OpenDoor, verdict)?;

    match verdict {
        Verdict::Match => {
            ctx.faults.clear();
            actuate(ctx);
            Ok(Some(BackState::AwaitingCommand))
        }
        Verdict::Mismatch => Ok(Some(escalate_or_return(ctx))),
    }
}

fn opening_exit<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>)
where
    A: Actuator,
{
    // Never leave the motor energised, whatever path exits this state.
    if ctx.phase != ActuationPhase::Idle {
        ctx.actuator.stop();
        ctx.phase = ActuationPhase::Idle;
    }
}

/// Unlock, hold, lock.  Blocks for the whole sequence.
fn actuate<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>)
where
    T: ActuationTimer,
    A: Actuator,
    S: EventSink,
{
    let BackContext {
        timer,
        actuator,
        sink,
        ticks,
        config,
        phase,
        ..
    } = ctx;

    let schedule = Schedule::actuation(config);
    let elapsed = sequencer::run(timer, ticks, config.tick_interval_ms, &schedule, |next| {
        match next {
            ActuationPhase::Unlocking => actuator.drive_forward(),
            ActuationPhase::HoldOpen | ActuationPhase::Idle => actuator.stop(),
            ActuationPhase::Locking => actuator.drive_reverse(),
        }
        *phase = next;
        sink.emit(&LockEvent::Actuation(next));
    });

    actuator.stop();
    *phase = ActuationPhase::Idle;
    sink.emit(&LockEvent::Actuation(ActuationPhase::Idle));
    info!("back: actuation complete after {elapsed} ticks");
}

// ═══════════════════════════════════════════════════════════════════════════
//  CHANGING
// ═══════════════════════════════════════════════════════════════════════════

fn changing_update<L, M, T, A, S>(
    ctx: &mut BackContext<L, M, T, A, S>,
) -> Result<Option<BackState>, Error>
where
    L: Link,
    M: CredentialStore,
    S: EventSink,
{
    let Some(Request::ChangePassword(attempt)) = ctx.pending.take() else {
        error!("back: Changing entered without a change request");
        return Ok(Some(BackState::AwaitingCommand));
    };

    let mut verdict = ctx.credentials.verify_against_store(&attempt);
    if verdict.is_match() {
        // The verified attempt is re-persisted; the new credential arrives
        // with the CreatePassword that follows.
        verdict = store_credential(ctx, &attempt);
    }
    reply(ctx, Command::ChangePassword, verdict)?;

    match verdict {
        Verdict::Match => {
            ctx.faults.clear();
            Ok(Some(BackState::AwaitingCommand))
        }
        Verdict::Mismatch => Ok(Some(escalate_or_return(ctx))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ALARM
// ═══════════════════════════════════════════════════════════════════════════

fn alarm_enter<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>)
where
    S: EventSink,
{
    warn!(
        "ALARM: {} consecutive failures, alarm for {} ticks",
        ctx.faults.count(),
        ctx.config.alarm_ticks
    );
    ctx.sink.emit(&LockEvent::AlarmRaised);
}

fn alarm_update<L, M, T, A, S>(
    ctx: &mut BackContext<L, M, T, A, S>,
) -> Result<Option<BackState>, Error>
where
    T: ActuationTimer,
    A: Actuator,
{
    let BackContext {
        timer,
        actuator,
        ticks,
        config,
        ..
    } = ctx;

    let schedule = Schedule::from_lengths(&[((), config.alarm_ticks)]);
    sequencer::run(timer, ticks, config.tick_interval_ms, &schedule, |()| {
        actuator.alarm_on();
    });
    actuator.alarm_off();

    ctx.faults.clear();
    Ok(Some(BackState::AwaitingCommand))
}

fn alarm_exit<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>)
where
    S: EventSink,
{
    info!("ALARM: cleared");
    ctx.sink.emit(&LockEvent::AlarmCleared);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Persist `credential`.  A store failure turns the verdict into
/// `Mismatch` so the front never believes a write that did not happen.
fn store_credential<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>, credential: &Credential) -> Verdict
where
    M: CredentialStore,
    S: EventSink,
{
    match ctx.credentials.persist(credential) {
        Ok(()) => {
            ctx.sink.emit(&LockEvent::CredentialStored);
            Verdict::Match
        }
        Err(e) => {
            error!("back: credential not stored: {e}");
            ctx.sink.emit(&LockEvent::StoreFailed(e));
            Verdict::Mismatch
        }
    }
}

fn reply<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>, command: Command, verdict: Verdict) -> Result<(), Error>
where
    L: Link,
    S: EventSink,
{
    protocol::send_verdict(&mut ctx.link, verdict)?;
    info!("back: {command:?} -> {verdict:?}");
    ctx.sink.emit(&LockEvent::VerdictSent { command, verdict });
    Ok(())
}

/// Count one failure.  Returns `true` once the threshold is reached.
fn record_fault<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>) -> bool
where
    S: EventSink,
{
    let tripped = ctx.faults.record_mismatch();
    ctx.sink.emit(&LockEvent::FaultRecorded {
        role: Role::Back,
        count: ctx.faults.count(),
    });
    tripped
}

fn escalate_or_return<L, M, T, A, S>(ctx: &mut BackContext<L, M, T, A, S>) -> BackState
where
    S: EventSink,
{
    if record_fault(ctx) {
        BackState::Alarm
    } else {
        BackState::AwaitingCommand
    }
}
