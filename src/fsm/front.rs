//! Front controller screens and table builder.
//!
//! ```text
//!  CREATE_PASSWORD ──[Match]──▶ MAIN_OPTIONS ──[open: Match]──▶ CONTROL
//!        ▲  │                     │  ▲  ▲                          │
//!        └──┘ [Mismatch]          │  │  └──────[sequence done]─────┘
//!        ▲                        │  │
//!        └──[change: Match]───────┘  └──[lockout done]── ERROR
//!
//!  Any screen ──[fault counter tripped]──▶ ERROR
//! ```
//!
//! Every screen's update blocks: on the keypad, on the verdict byte, or on
//! a timed sequence.  Screen changes follow verdicts and the fault
//! counter, never raw key presses alone.

use log::{info, warn};

use super::{StateDescriptor, StateId};
use crate::app::events::{LockEvent, Role};
use crate::app::ports::{ActuationTimer, Display, EventSink, Key, Keypad, Prompt};
use crate::config::LockConfig;
use crate::credential::{CREDENTIAL_LEN, Credential, Verdict};
use crate::error::Error;
use crate::link::Link;
use crate::protocol::{self, Command, Request};
use crate::safety::FaultCounter;
use crate::sequencer::{self, ActuationPhase, Schedule};
use crate::tick::TickCounter;

// ---------------------------------------------------------------------------
// Screen identity
// ---------------------------------------------------------------------------

/// Mutually exclusive front-panel modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Screen {
    CreatePassword = 0,
    MainOptions = 1,
    Control = 2,
    Error = 3,
}

impl Screen {
    /// Total number of screens, used to size the table array.
    pub const COUNT: usize = 4;
}

impl StateId for Screen {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Everything the screen handlers touch.
pub struct FrontContext<L, K, D, T, S> {
    pub link: L,
    pub keypad: K,
    pub display: D,
    pub timer: T,
    pub sink: S,
    /// Advanced by the timer during timed screens.
    pub ticks: TickCounter,
    /// Mismatches seen by this controller.
    pub faults: FaultCounter,
    pub config: LockConfig,
}

impl<L, K, D, T, S> FrontContext<L, K, D, T, S> {
    pub fn new(link: L, keypad: K, display: D, timer: T, sink: S, config: LockConfig) -> Self {
        Self {
            link,
            keypad,
            display,
            timer,
            sink,
            ticks: TickCounter::new(),
            faults: FaultCounter::new(config.max_consecutive_faults),
            config,
        }
    }
}

/// Table row type for the front controller.
pub type FrontDescriptor<L, K, D, T, S> = StateDescriptor<FrontContext<L, K, D, T, S>, Screen, Error>;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the screen table.  Called once at startup.
pub fn build_screen_table<L, K, D, T, S>() -> [FrontDescriptor<L, K, D, T, S>; Screen::COUNT]
where
    L: Link,
    K: Keypad,
    D: Display,
    T: ActuationTimer,
    S: EventSink,
{
    [
        // Index 0: CreatePassword
        StateDescriptor {
            id: Screen::CreatePassword,
            name: "CreatePassword",
            on_enter: None,
            on_exit: None,
            on_update: create_password_update::<L, K, D, T, S>,
        },
        // Index 1: MainOptions
        StateDescriptor {
            id: Screen::MainOptions,
            name: "MainOptions",
            on_enter: None,
            on_exit: None,
            on_update: main_options_update::<L, K, D, T, S>,
        },
        // Index 2: Control
        StateDescriptor {
            id: Screen::Control,
            name: "Control",
            on_enter: None,
            on_exit: None,
            on_update: control_update::<L, K, D, T, S>,
        },
        // Index 3: Error
        StateDescriptor {
            id: Screen::Error,
            name: "Error",
            on_enter: Some(error_enter::<L, K, D, T, S>),
            on_exit: Some(error_exit::<L, K, D, T, S>),
            on_update: error_update::<L, K, D, T, S>,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  CREATE_PASSWORD: provisioning, also re-entered after a change
// ═══════════════════════════════════════════════════════════════════════════

fn create_password_update<L, K, D, T, S>(
    ctx: &mut FrontContext<L, K, D, T, S>,
) -> Result<Option<Screen>, Error>
where
    L: Link,
    K: Keypad,
    D: Display,
    T: ActuationTimer,
    S: EventSink,
{
    ctx.display.show(Prompt::EnterPassword);
    let candidate = read_credential(ctx)?;
    ctx.display.show(Prompt::ConfirmPassword);
    let confirmation = read_credential(ctx)?;

    let verdict = exchange(
        ctx,
        &Request::CreatePassword {
            candidate,
            confirmation,
        },
    )?;

    if verdict.is_match() {
        info!("CREATE: password accepted");
        Ok(Some(Screen::MainOptions))
    } else {
        // Not a security failure: the two entries simply differed.
        info!("CREATE: entries differ, prompting again");
        Ok(None)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  MAIN_OPTIONS: open or change, one credential each
// ═══════════════════════════════════════════════════════════════════════════

fn main_options_update<L, K, D, T, S>(
    ctx: &mut FrontContext<L, K, D, T, S>,
) -> Result<Option<Screen>, Error>
where
    L: Link,
    K: Keypad,
    D: Display,
    T: ActuationTimer,
    S: EventSink,
{
    ctx.display.show(Prompt::MainOptions);
    let command = loop {
        match ctx.keypad.read_key()? {
            Key::Open => break Command::OpenDoor,
            Key::Change => break Command::ChangePassword,
            _ => {}
        }
    };

    ctx.display.show(Prompt::EnterPassword);
    let attempt = read_credential(ctx)?;
    let request = match command {
        Command::ChangePassword => Request::ChangePassword(attempt),
        _ => Request::OpenDoor(attempt),
    };

    match exchange(ctx, &request)? {
        Verdict::Match => {
            ctx.faults.clear();
            Ok(Some(if command == Command::OpenDoor {
                Screen::Control
            } else {
                Screen::CreatePassword
            }))
        }
        Verdict::Mismatch => {
            let tripped = ctx.faults.record_mismatch();
            ctx.sink.emit(&LockEvent::FaultRecorded {
                role: Role::Front,
                count: ctx.faults.count(),
            });
            Ok(tripped.then_some(Screen::Error))
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CONTROL: mirrors the back controller's bolt sequence
// ═══════════════════════════════════════════════════════════════════════════

fn control_update<L, K, D, T, S>(
    ctx: &mut FrontContext<L, K, D, T, S>,
) -> Result<Option<Screen>, Error>
where
    L: Link,
    K: Keypad,
    D: Display,
    T: ActuationTimer,
    S: EventSink,
{
    let FrontContext {
        timer,
        display,
        ticks,
        config,
        ..
    } = ctx;

    let schedule = Schedule::actuation(config);
    sequencer::run(timer, ticks, config.tick_interval_ms, &schedule, |phase| {
        display.show(match phase {
            ActuationPhase::Unlocking => Prompt::DoorUnlocking,
            ActuationPhase::HoldOpen => Prompt::DoorUnlocked,
            ActuationPhase::Locking | ActuationPhase::Idle => Prompt::DoorLocking,
        });
    });

    Ok(Some(Screen::MainOptions))
}

// ═══════════════════════════════════════════════════════════════════════════
//  ERROR: timed lockout after too many mismatches
// ═══════════════════════════════════════════════════════════════════════════

fn error_enter<L, K, D, T, S>(ctx: &mut FrontContext<L, K, D, T, S>)
where
    S: EventSink,
{
    warn!(
        "ERROR: {} consecutive mismatches, locking out for {} ticks",
        ctx.faults.count(),
        ctx.config.lockout_ticks
    );
    ctx.sink.emit(&LockEvent::LockoutStarted);
}

fn error_update<L, K, D, T, S>(
    ctx: &mut FrontContext<L, K, D, T, S>,
) -> Result<Option<Screen>, Error>
where
    L: Link,
    K: Keypad,
    D: Display,
    T: ActuationTimer,
    S: EventSink,
{
    let FrontContext {
        timer,
        display,
        ticks,
        config,
        ..
    } = ctx;

    let schedule = Schedule::from_lengths(&[(Prompt::Lockout, config.lockout_ticks)]);
    sequencer::run(timer, ticks, config.tick_interval_ms, &schedule, |prompt| {
        display.show(prompt);
    });

    ctx.faults.clear();
    Ok(Some(Screen::MainOptions))
}

fn error_exit<L, K, D, T, S>(ctx: &mut FrontContext<L, K, D, T, S>)
where
    S: EventSink,
{
    info!("ERROR: lockout over");
    ctx.sink.emit(&LockEvent::LockoutEnded);
}

// ═══════════════════════════════════════════════════════════════════════════
//  Helpers
// ═══════════════════════════════════════════════════════════════════════════

/// Five digit keys, then Enter.  Other keys are ignored; each accepted
/// digit is echoed masked.
fn read_credential<L, K, D, T, S>(ctx: &mut FrontContext<L, K, D, T, S>) -> Result<Credential, Error>
where
    K: Keypad,
    D: Display,
{
    let mut symbols = [0u8; CREDENTIAL_LEN];
    let mut filled = 0;
    while filled < CREDENTIAL_LEN {
        if let Key::Digit(d) = ctx.keypad.read_key()? {
            symbols[filled] = d;
            filled += 1;
            ctx.display.mask_symbol();
        }
    }
    while ctx.keypad.read_key()? != Key::Enter {}
    Ok(Credential::new(symbols))
}

/// Send one request and block for its verdict.
fn exchange<L, K, D, T, S>(
    ctx: &mut FrontContext<L, K, D, T, S>,
    request: &Request,
) -> Result<Verdict, Error>
where
    L: Link,
    S: EventSink,
{
    protocol::send_request(&mut ctx.link, request)?;
    let verdict = protocol::receive_verdict(&mut ctx.link)?;
    let command = request.command();
    info!("front: {command:?} -> {verdict:?}");
    ctx.sink.emit(&LockEvent::VerdictReceived { command, verdict });
    Ok(verdict)
}
