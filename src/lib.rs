//! Door-lock access control library.
//!
//! Two controllers share this crate: the front (keypad and display) and
//! the back (credential store, bolt motor, alarm).  They talk over a
//! point-to-point byte link with a one-byte verdict for every request.
//!
//! Everything hardware-facing sits behind the port traits in
//! [`app::ports`] and the [`link::Link`] trait; [`adapters`] holds the
//! concrete implementations, including host stand-ins for simulation.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod credential;
pub mod error;
pub mod fsm;
pub mod link;
pub mod protocol;
pub mod safety;
pub mod sequencer;
pub mod tick;

pub use error::{Error, Result};
