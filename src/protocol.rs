//! Front ⇄ back command protocol.
//!
//! Wire format (no framing bytes, boundaries implied by the command kind):
//! ```text
//! CreatePassword  ┌──────┬───────────────┬────────────────┐
//!                 │ 0x10 │ candidate (5B)│ confirmation(5B)│
//!                 └──────┴───────────────┴────────────────┘
//! OpenDoor        ┌──────┬─────────────┐
//! ChangePassword  │ 0x11 │ attempt (5B)│      (0x12 for change)
//!                 └──────┴─────────────┘
//! Reply           ┌───────────────────────┐
//!                 │ 0x20 Match / 0x19 Mismatch │
//!                 └───────────────────────┘
//! ```
//!
//! The link is assumed reliable and ordered; there are no checksums.  A
//! corrupted byte is handled exactly like a mismatch.

use heapless::Vec;
use log::debug;

use crate::credential::{CREDENTIAL_LEN, Credential, Verdict};
use crate::error::LinkError;
use crate::link::Link;

pub const CREATE_PASSWORD_BYTE: u8 = 0x10;
pub const OPEN_DOOR_BYTE: u8 = 0x11;
pub const CHANGE_PASSWORD_BYTE: u8 = 0x12;

pub const MATCH_BYTE: u8 = 0x20;
pub const MISMATCH_BYTE: u8 = 0x19;

/// Most credentials any command carries.
pub const MAX_PAYLOADS: usize = 2;

/// Largest encoded request: command byte plus two credentials.
pub const MAX_REQUEST_LEN: usize = 1 + MAX_PAYLOADS * CREDENTIAL_LEN;

// ---------------------------------------------------------------------------
// Command kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    CreatePassword = CREATE_PASSWORD_BYTE,
    OpenDoor = OPEN_DOOR_BYTE,
    ChangePassword = CHANGE_PASSWORD_BYTE,
}

impl Command {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            CREATE_PASSWORD_BYTE => Some(Self::CreatePassword),
            OPEN_DOOR_BYTE => Some(Self::OpenDoor),
            CHANGE_PASSWORD_BYTE => Some(Self::ChangePassword),
            _ => None,
        }
    }

    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Credentials that follow the command byte on the wire.
    pub const fn payload_count(self) -> usize {
        match self {
            Self::CreatePassword => 2,
            Self::OpenDoor | Self::ChangePassword => 1,
        }
    }
}

impl Verdict {
    pub const fn byte(self) -> u8 {
        match self {
            Self::Match => MATCH_BYTE,
            Self::Mismatch => MISMATCH_BYTE,
        }
    }

    /// Anything other than the match byte is a mismatch.
    pub fn from_byte(byte: u8) -> Self {
        if byte == MATCH_BYTE { Self::Match } else { Self::Mismatch }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// A complete front → back message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    CreatePassword {
        candidate: Credential,
        confirmation: Credential,
    },
    OpenDoor(Credential),
    ChangePassword(Credential),
}

impl Request {
    pub fn command(&self) -> Command {
        match self {
            Self::CreatePassword { .. } => Command::CreatePassword,
            Self::OpenDoor(_) => Command::OpenDoor,
            Self::ChangePassword(_) => Command::ChangePassword,
        }
    }

    /// Serialise to wire bytes.
    pub fn encode(&self) -> Vec<u8, MAX_REQUEST_LEN> {
        let (first, second) = match self {
            Self::CreatePassword {
                candidate,
                confirmation,
            } => (candidate, Some(confirmation)),
            Self::OpenDoor(c) | Self::ChangePassword(c) => (c, None),
        };
        core::iter::once(self.command().byte())
            .chain(first.as_bytes().iter().copied())
            .chain(second.into_iter().flat_map(|c| c.as_bytes().iter().copied()))
            .collect()
    }
}

/// Outcome of reading one request from the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Incoming {
    Request(Request),
    /// The first byte was not a known command.  No payload was consumed.
    Unknown(u8),
}

// ---------------------------------------------------------------------------
// Link helpers
// ---------------------------------------------------------------------------

/// Send a full request (front side).
pub fn send_request(link: &mut impl Link, request: &Request) -> Result<(), LinkError> {
    debug!("protocol: -> {:?}", request.command());
    for &b in request.encode().iter() {
        link.send_byte(b)?;
    }
    Ok(())
}

/// Block for the next request (back side).
pub fn receive_request(link: &mut impl Link) -> Result<Incoming, LinkError> {
    let first = link.receive_byte()?;
    let Some(command) = Command::from_byte(first) else {
        return Ok(Incoming::Unknown(first));
    };
    debug!("protocol: <- {command:?}");
    let mut payload = [Credential::new([0; CREDENTIAL_LEN]); MAX_PAYLOADS];
    for slot in payload.iter_mut().take(command.payload_count()) {
        *slot = receive_credential(link)?;
    }
    let [first, second] = payload;
    let request = match command {
        Command::CreatePassword => Request::CreatePassword {
            candidate: first,
            confirmation: second,
        },
        Command::OpenDoor => Request::OpenDoor(first),
        Command::ChangePassword => Request::ChangePassword(first),
    };
    Ok(Incoming::Request(request))
}

/// Reply with a verdict (back side).
pub fn send_verdict(link: &mut impl Link, verdict: Verdict) -> Result<(), LinkError> {
    link.send_byte(verdict.byte())
}

/// Block for the verdict (front side).
pub fn receive_verdict(link: &mut impl Link) -> Result<Verdict, LinkError> {
    link.receive_byte().map(Verdict::from_byte)
}

fn receive_credential(link: &mut impl Link) -> Result<Credential, LinkError> {
    let mut symbols = [0u8; CREDENTIAL_LEN];
    for slot in &mut symbols {
        *slot = link.receive_byte()?;
    }
    Ok(Credential::new(symbols))
}
