//! Port traits: the hexagonal boundary between the lock logic and the
//! peripherals around it.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FrontService / BackService (domain)
//! ```
//!
//! Driven adapters (store, timer, actuator, keypad, display, event sinks)
//! implement these traits.  The services consume them via generics, so the
//! domain core never touches registers, pins, or buses directly.  The byte
//! link is the [`Link`](crate::link::Link) trait.
//!
//! ## Security notes
//!
//! - **CredentialStore** is owned by the back controller only.  Nothing
//!   else may read or write the credential region.
//! - **Actuator** calls are issued only from the actuation and alarm
//!   sequences, which run only after the back controller's own verdict.

use crate::error::{Error, StoreError};
use crate::tick::TickCounter;

// ───────────────────────────────────────────────────────────────
// Credential store (back: domain ↔ EEPROM)
// ───────────────────────────────────────────────────────────────

/// Byte-addressable persistent medium.
pub trait CredentialStore {
    fn read_byte(&mut self, addr: u16) -> Result<u8, StoreError>;

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), StoreError>;
}

impl<S: CredentialStore + ?Sized> CredentialStore for &mut S {
    fn read_byte(&mut self, addr: u16) -> Result<u8, StoreError> {
        (**self).read_byte(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), StoreError> {
        (**self).write_byte(addr, value)
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for Box<S> {
    fn read_byte(&mut self, addr: u16) -> Result<u8, StoreError> {
        (**self).read_byte(addr)
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), StoreError> {
        (**self).write_byte(addr, value)
    }
}

// ───────────────────────────────────────────────────────────────
// Actuation timer (both controllers)
// ───────────────────────────────────────────────────────────────

/// Periodic tick source.
///
/// The "callback" is fixed: each expiry advances the subscribed
/// [`TickCounter`] by one and does nothing else.  Cancellation is always
/// explicit through [`unsubscribe`](Self::unsubscribe).
pub trait ActuationTimer {
    /// Subscription handle returned by `subscribe`.
    type Handle;

    /// Start advancing `ticks` every `interval_ms`.
    fn subscribe(&mut self, interval_ms: u32, ticks: TickCounter) -> Self::Handle;

    /// Stop the subscription.  No tick is delivered after this returns.
    fn unsubscribe(&mut self, handle: Self::Handle);

    /// Park the control loop briefly while waiting for the next tick.
    /// A synchronous test timer delivers a tick here.
    fn idle(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Actuator (back: domain → motor / buzzer)
// ───────────────────────────────────────────────────────────────

/// Bolt motor and alarm indicator outputs.
pub trait Actuator {
    /// Drive the bolt towards open.
    fn drive_forward(&mut self);

    /// Drive the bolt towards closed.
    fn drive_reverse(&mut self);

    /// Stop the motor.
    fn stop(&mut self);

    fn alarm_on(&mut self);

    fn alarm_off(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Keypad and display (front: user ↔ domain)
// ───────────────────────────────────────────────────────────────

/// One decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Digit(u8),
    Enter,
    /// `+` on the keypad.
    Open,
    /// `-` on the keypad.
    Change,
    Other(char),
}

impl Key {
    pub fn from_char(c: char) -> Self {
        match c {
            '0'..='9' => Self::Digit(c as u8 - b'0'),
            '+' => Self::Open,
            '-' => Self::Change,
            '\n' | '\r' | '=' | '#' => Self::Enter,
            other => Self::Other(other),
        }
    }
}

/// Blocking key source.
pub trait Keypad {
    /// Block until the next key press.  Fails only when input is gone
    /// (host simulation).
    fn read_key(&mut self) -> Result<Key, Error>;
}

impl<K: Keypad + ?Sized> Keypad for Box<K> {
    fn read_key(&mut self) -> Result<Key, Error> {
        (**self).read_key()
    }
}

/// What the front controller is asking the display to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    EnterPassword,
    ConfirmPassword,
    MainOptions,
    DoorUnlocking,
    DoorUnlocked,
    DoorLocking,
    Lockout,
}

impl Prompt {
    /// Two 16-column lines.
    pub fn lines(self) -> (&'static str, &'static str) {
        match self {
            Self::EnterPassword => ("Enter password:", ""),
            Self::ConfirmPassword => ("Repeat password:", ""),
            Self::MainOptions => ("+ : Open door", "- : Change pass"),
            Self::DoorUnlocking => ("Door unlocking", ""),
            Self::DoorUnlocked => ("Door unlocked", ""),
            Self::DoorLocking => ("Door locking", ""),
            Self::Lockout => ("Access denied", "Please wait"),
        }
    }
}

/// Character display.
pub trait Display {
    /// Clear and show `prompt`.
    fn show(&mut self, prompt: Prompt);

    /// Echo one masked symbol after an accepted digit.
    fn mask_symbol(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`LockEvent`](super::events::LockEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::LockEvent);
}
