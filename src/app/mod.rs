//! Application core: lock logic with no direct I/O.
//!
//! The two controller services live in [`service`].  Everything they touch
//! goes through the port traits in [`ports`] (plus the byte
//! [`Link`](crate::link::Link)), so the whole flow runs under test with
//! in-memory adapters.

pub mod events;
pub mod ports;
pub mod service;
