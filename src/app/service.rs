//! Controller services: the hexagonal core of each side.
//!
//! A service owns its FSM, its context (ports, fault counter, config), and
//! the supervisor check that runs after every step.
//!
//! ```text
//!  Keypad ──▶ ┌──────────────────┐ ──▶ Display          ┌──────────────────┐ ──▶ Actuator
//!             │   FrontService   │ ◀──── Link ────────▶ │   BackService    │
//!  Timer  ──▶ │  FSM · Faults    │                      │  FSM · Faults    │ ◀─▶ CredentialStore
//!             └──────────────────┘ ──▶ EventSink        └──────────────────┘ ──▶ EventSink
//! ```
//!
//! [`step`](FrontService::step) blocks until the current state's work is
//! done (a key sequence and verdict, a command, or a timed sequence).

use log::{info, warn};

use crate::config::LockConfig;
use crate::error::Error;
use crate::fsm::Fsm;
use crate::fsm::back::{BackContext, BackState, build_back_table};
use crate::fsm::front::{FrontContext, Screen, build_screen_table};
use crate::link::Link;
use crate::safety::FaultCounter;

use super::events::{LockEvent, Role};
use super::ports::{ActuationTimer, Actuator, CredentialStore, Display, EventSink, Keypad};

// ───────────────────────────────────────────────────────────────
// FrontService
// ───────────────────────────────────────────────────────────────

/// The HMI controller: keypad and display on one side, link on the other.
pub struct FrontService<L, K, D, T, S> {
    fsm: Fsm<FrontContext<L, K, D, T, S>, Screen, Error, { Screen::COUNT }>,
    ctx: FrontContext<L, K, D, T, S>,
}

impl<L, K, D, T, S> FrontService<L, K, D, T, S>
where
    L: Link,
    K: Keypad,
    D: Display,
    T: ActuationTimer,
    S: EventSink,
{
    /// Wire up the ports.  Does **not** start the FSM; call
    /// [`start`](Self::start) next.
    pub fn new(link: L, keypad: K, display: D, timer: T, sink: S, config: LockConfig) -> Self {
        Self::from_context(FrontContext::new(link, keypad, display, timer, sink, config))
    }

    pub fn from_context(ctx: FrontContext<L, K, D, T, S>) -> Self {
        Self {
            fsm: Fsm::new(build_screen_table(), Screen::CreatePassword),
            ctx,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start on the create-password screen.
    pub fn start(&mut self) {
        self.fsm.start(&mut self.ctx);
        self.ctx.sink.emit(&LockEvent::Started {
            role: Role::Front,
            state: self.fsm.current_name(),
        });
        info!("FrontService started in {}", self.fsm.current_name());
    }

    /// Start and jump straight to `screen` (a controller that already has
    /// a credential provisioned skips the create screen).
    pub fn start_from(&mut self, screen: Screen) {
        self.fsm.start(&mut self.ctx);
        self.fsm.force_transition(screen, &mut self.ctx);
        self.ctx.sink.emit(&LockEvent::Started {
            role: Role::Front,
            state: self.fsm.current_name(),
        });
        info!("FrontService started from {screen:?}");
    }

    // ── Orchestration ─────────────────────────────────────────

    /// Run one screen to completion, then apply the lockout check.
    pub fn step(&mut self) -> Result<(), Error> {
        let prev = self.fsm.current_state();
        self.fsm.step(&mut self.ctx)?;

        if self.ctx.faults.is_tripped() && self.fsm.current_state() != Screen::Error {
            warn!("front: fault threshold reached, forcing lockout");
            self.fsm.force_transition(Screen::Error, &mut self.ctx);
        }

        let now = self.fsm.current_state();
        if now != prev {
            self.ctx.sink.emit(&LockEvent::StateChanged {
                role: Role::Front,
                from: self.fsm.name_of(prev),
                to: self.fsm.name_of(now),
            });
        }
        Ok(())
    }

    /// Step until an error ends the loop (input or link gone).
    pub fn run(&mut self) -> Error {
        loop {
            if let Err(e) = self.step() {
                info!("FrontService stopped: {e}");
                return e;
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn screen(&self) -> Screen {
        self.fsm.current_state()
    }

    pub fn faults(&self) -> &FaultCounter {
        &self.ctx.faults
    }

    pub fn context(&self) -> &FrontContext<L, K, D, T, S> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut FrontContext<L, K, D, T, S> {
        &mut self.ctx
    }
}

// ───────────────────────────────────────────────────────────────
// BackService
// ───────────────────────────────────────────────────────────────

/// The authority controller: credential store and bolt.
pub struct BackService<L, M, T, A, S> {
    fsm: Fsm<BackContext<L, M, T, A, S>, BackState, Error, { BackState::COUNT }>,
    ctx: BackContext<L, M, T, A, S>,
}

impl<L, M, T, A, S> BackService<L, M, T, A, S>
where
    L: Link,
    M: CredentialStore,
    T: ActuationTimer,
    A: Actuator,
    S: EventSink,
{
    /// Wire up the ports.  Fails when `config` does not validate.
    pub fn new(
        link: L,
        store: M,
        timer: T,
        actuator: A,
        sink: S,
        config: LockConfig,
    ) -> Result<Self, Error> {
        BackContext::new(link, store, timer, actuator, sink, config).map(Self::from_context)
    }

    pub fn from_context(ctx: BackContext<L, M, T, A, S>) -> Self {
        Self {
            fsm: Fsm::new(build_back_table(), BackState::AwaitingCommand),
            ctx,
        }
    }

    /// Start waiting for commands.  The bolt is stopped and the alarm
    /// silenced first, whatever state the outputs powered up in.
    pub fn start(&mut self) {
        self.ctx.actuator.stop();
        self.ctx.actuator.alarm_off();
        self.fsm.start(&mut self.ctx);
        self.ctx.sink.emit(&LockEvent::Started {
            role: Role::Back,
            state: self.fsm.current_name(),
        });
        info!("BackService started in {}", self.fsm.current_name());
    }

    /// Handle one step, then apply the alarm check.
    pub fn step(&mut self) -> Result<(), Error> {
        let prev = self.fsm.current_state();
        self.fsm.step(&mut self.ctx)?;

        if self.ctx.faults.is_tripped() && self.fsm.current_state() != BackState::Alarm {
            warn!("back: fault threshold reached, forcing alarm");
            self.fsm.force_transition(BackState::Alarm, &mut self.ctx);
        }

        let now = self.fsm.current_state();
        if now != prev {
            self.ctx.sink.emit(&LockEvent::StateChanged {
                role: Role::Back,
                from: self.fsm.name_of(prev),
                to: self.fsm.name_of(now),
            });
        }
        Ok(())
    }

    /// Step until the link goes away.
    pub fn run(&mut self) -> Error {
        loop {
            if let Err(e) = self.step() {
                info!("BackService stopped: {e}");
                return e;
            }
        }
    }

    pub fn state(&self) -> BackState {
        self.fsm.current_state()
    }

    pub fn faults(&self) -> &FaultCounter {
        &self.ctx.faults
    }

    pub fn context(&self) -> &BackContext<L, M, T, A, S> {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut BackContext<L, M, T, A, S> {
        &mut self.ctx
    }
}
