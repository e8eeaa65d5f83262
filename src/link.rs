//! Link abstraction: the point-to-point byte channel between controllers.
//!
//! Concrete implementations:
//! - [`MemoryLink`]: two ends of an in-process channel (simulator, tests)
//! - [`IoLink`]: any `Read + Write` byte stream (serial device node)
//! - [`SliceLink`]: replays a fixed byte script and records writes
//!
//! Both calls block.  On hardware they never fail; on the host they fail
//! only when the peer is gone.

use std::io::{ErrorKind, Read, Write};
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::error::LinkError;

/// Byte-oriented, reliable, ordered channel.
pub trait Link {
    /// Block until the byte has been handed to the transport.
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError>;

    /// Block until one byte is available.
    fn receive_byte(&mut self) -> Result<u8, LinkError>;
}

impl<L: Link + ?Sized> Link for &mut L {
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        (**self).send_byte(byte)
    }

    fn receive_byte(&mut self) -> Result<u8, LinkError> {
        (**self).receive_byte()
    }
}

impl<L: Link + ?Sized> Link for Box<L> {
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        (**self).send_byte(byte)
    }

    fn receive_byte(&mut self) -> Result<u8, LinkError> {
        (**self).receive_byte()
    }
}

// ── In-process link ───────────────────────────────────────────

/// One end of a full-duplex in-memory link.
pub struct MemoryLink {
    tx: Sender<u8>,
    rx: Receiver<u8>,
}

impl MemoryLink {
    /// Create both ends: bytes sent on one are received on the other.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = channel();
        let (b_tx, a_rx) = channel();
        (Self { tx: a_tx, rx: a_rx }, Self { tx: b_tx, rx: b_rx })
    }
}

impl Link for MemoryLink {
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.tx.send(byte).map_err(|_| LinkError::Closed)
    }

    fn receive_byte(&mut self) -> Result<u8, LinkError> {
        self.rx.recv().map_err(|_| LinkError::Closed)
    }
}

// ── Byte-stream link ──────────────────────────────────────────

/// Link over a blocking byte stream, e.g. an opened `/dev/ttyUSB0`.
pub struct IoLink<T> {
    inner: T,
}

impl<T: Read + Write> IoLink<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl<T: Read + Write> Link for IoLink<T> {
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.inner.write_all(&[byte]).map_err(|_| LinkError::Io)?;
        self.inner.flush().map_err(|_| LinkError::Io)
    }

    fn receive_byte(&mut self) -> Result<u8, LinkError> {
        let mut buf = [0u8; 1];
        loop {
            match self.inner.read(&mut buf) {
                Ok(0) => return Err(LinkError::Closed),
                Ok(_) => return Ok(buf[0]),
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(_) => return Err(LinkError::Io),
            }
        }
    }
}

// ── Scripted link ─────────────────────────────────────────────

/// Replays `input` byte by byte and collects everything sent.
/// Reports [`LinkError::Closed`] once the script is exhausted.
pub struct SliceLink<'a> {
    input: &'a [u8],
    pos: usize,
    pub sent: Vec<u8>,
}

impl<'a> SliceLink<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            sent: Vec::new(),
        }
    }

    /// Bytes not yet consumed.
    pub fn remaining(&self) -> &'a [u8] {
        &self.input[self.pos..]
    }
}

impl Link for SliceLink<'_> {
    fn send_byte(&mut self, byte: u8) -> Result<(), LinkError> {
        self.sent.push(byte);
        Ok(())
    }

    fn receive_byte(&mut self) -> Result<u8, LinkError> {
        let byte = *self.input.get(self.pos).ok_or(LinkError::Closed)?;
        self.pos += 1;
        Ok(byte)
    }
}
