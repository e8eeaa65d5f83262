//! Unified error types for the door-lock controllers.
//!
//! A single `Error` enum that every subsystem converts into, keeping the
//! control loops' error handling uniform.  All variants are `Copy` so they
//! can be passed through the FSM handlers without allocation.
//!
//! Note that a credential mismatch is **not** an error: it is a normal
//! protocol outcome carried by [`Verdict`](crate::credential::Verdict).

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The credential store reported a failure.
    Store(StoreError),
    /// The controller-to-controller link is gone.
    Link(LinkError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
    /// The keypad has no more input (host simulation only).
    InputClosed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
            Self::InputClosed => write!(f, "keypad input closed"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Credential store errors
// ---------------------------------------------------------------------------

/// Failures of the byte-addressable persistent medium.  Each carries the
/// address that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// The medium did not return the byte.
    ReadFailed(u16),
    /// The medium did not accept the byte.
    WriteFailed(u16),
    /// The byte read back after a write differs from what was written.
    VerifyFailed(u16),
    /// The address lies outside the medium.
    OutOfRange(u16),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed(a) => write!(f, "read failed at 0x{a:04X}"),
            Self::WriteFailed(a) => write!(f, "write failed at 0x{a:04X}"),
            Self::VerifyFailed(a) => write!(f, "read-back mismatch at 0x{a:04X}"),
            Self::OutOfRange(a) => write!(f, "address 0x{a:04X} out of range"),
        }
    }
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

/// The serial link never fails on hardware; it blocks.  These variants
/// only describe a torn-down host link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The peer end was dropped.
    Closed,
    /// The underlying byte stream reported an I/O error.
    Io,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "peer closed the link"),
            Self::Io => write!(f, "I/O error"),
        }
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    Invalid(&'static str),
    /// The config file could not be read.
    Io,
    /// The config file is not valid JSON for [`LockConfig`](crate::config::LockConfig).
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid(msg) => write!(f, "validation failed: {msg}"),
            Self::Io => write!(f, "I/O error"),
            Self::Parse => write!(f, "malformed config"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
