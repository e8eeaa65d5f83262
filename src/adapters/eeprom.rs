//! Credential store adapters.
//!
//! Implements [`CredentialStore`] for three media:
//!
//! - [`I2cEeprom`]: a 24C16-class part on an `embedded-hal` I2C bus.
//! - [`FileEeprom`]: a 2 KiB image file, so the simulator keeps its
//!   credential across runs.
//! - [`MemoryEeprom`]: RAM only, with per-address fault injection for
//!   tests.
//!
//! All three start erased (`0xFF`) and reject addresses at or beyond
//! [`STORE_CAPACITY`].

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info, warn};

use crate::app::ports::CredentialStore;
use crate::config::STORE_CAPACITY;
use crate::error::StoreError;

/// Value of an erased cell.
pub const ERASED: u8 = 0xFF;

fn check_range(addr: u16) -> Result<usize, StoreError> {
    if addr < STORE_CAPACITY {
        Ok(addr as usize)
    } else {
        Err(StoreError::OutOfRange(addr))
    }
}

// ───────────────────────────────────────────────────────────────
// In-memory
// ───────────────────────────────────────────────────────────────

/// RAM-backed store.
#[derive(Debug, Clone)]
pub struct MemoryEeprom {
    cells: Vec<u8>,
    fail_reads: Vec<u16>,
    fail_writes: Vec<u16>,
}

impl Default for MemoryEeprom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryEeprom {
    pub fn new() -> Self {
        Self {
            cells: vec![ERASED; STORE_CAPACITY as usize],
            fail_reads: Vec::new(),
            fail_writes: Vec::new(),
        }
    }

    /// Raw cell value, bypassing fault injection.  Out-of-range reads
    /// return [`ERASED`].
    pub fn peek(&self, addr: u16) -> u8 {
        self.cells.get(addr as usize).copied().unwrap_or(ERASED)
    }

    /// Make every later read of `addr` fail.
    pub fn fail_reads_at(&mut self, addr: u16) {
        self.fail_reads.push(addr);
    }

    /// Make every later write of `addr` fail.
    pub fn fail_writes_at(&mut self, addr: u16) {
        self.fail_writes.push(addr);
    }

    /// Remove all injected faults.
    pub fn heal(&mut self) {
        self.fail_reads.clear();
        self.fail_writes.clear();
    }
}

impl CredentialStore for MemoryEeprom {
    fn read_byte(&mut self, addr: u16) -> Result<u8, StoreError> {
        let idx = check_range(addr)?;
        if self.fail_reads.contains(&addr) {
            return Err(StoreError::ReadFailed(addr));
        }
        Ok(self.cells[idx])
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), StoreError> {
        let idx = check_range(addr)?;
        if self.fail_writes.contains(&addr) {
            return Err(StoreError::WriteFailed(addr));
        }
        self.cells[idx] = value;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// File image (simulator)
// ───────────────────────────────────────────────────────────────

/// Store backed by an image file.  Every write is flushed through to the
/// file before it is acknowledged.
#[derive(Debug)]
pub struct FileEeprom {
    path: PathBuf,
    image: Vec<u8>,
}

impl FileEeprom {
    /// Open `path`, creating an erased image if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let image = match fs::read(&path) {
            Ok(mut bytes) => {
                bytes.resize(STORE_CAPACITY as usize, ERASED);
                info!("eeprom: loaded image {}", path.display());
                bytes
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let bytes = vec![ERASED; STORE_CAPACITY as usize];
                fs::write(&path, &bytes)?;
                info!("eeprom: created erased image {}", path.display());
                bytes
            }
            Err(e) => return Err(e),
        };
        Ok(Self { path, image })
    }
}

impl CredentialStore for FileEeprom {
    fn read_byte(&mut self, addr: u16) -> Result<u8, StoreError> {
        let idx = check_range(addr)?;
        Ok(self.image[idx])
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), StoreError> {
        let idx = check_range(addr)?;
        let old = self.image[idx];
        self.image[idx] = value;
        if let Err(e) = fs::write(&self.path, &self.image) {
            warn!("eeprom: image write failed: {e}");
            self.image[idx] = old;
            return Err(StoreError::WriteFailed(addr));
        }
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// I2C part
// ───────────────────────────────────────────────────────────────

/// Base 7-bit device address of a 24C16.
pub const EEPROM_I2C_BASE: u8 = 0x50;

/// Byte-write cycle time from the datasheet.
pub const WRITE_CYCLE_MS: u32 = 10;

/// 24C16-style EEPROM: the top three address bits select one of eight
/// 256-byte blocks through the device address; one word-address byte
/// follows.
pub struct I2cEeprom<I, D> {
    bus: I,
    delay: D,
}

impl<I: I2c, D: DelayNs> I2cEeprom<I, D> {
    pub fn new(bus: I, delay: D) -> Self {
        Self { bus, delay }
    }

    pub fn release(self) -> (I, D) {
        (self.bus, self.delay)
    }

    fn device_address(addr: u16) -> u8 {
        EEPROM_I2C_BASE | ((addr >> 8) & 0x07) as u8
    }
}

impl<I: I2c, D: DelayNs> CredentialStore for I2cEeprom<I, D> {
    fn read_byte(&mut self, addr: u16) -> Result<u8, StoreError> {
        check_range(addr)?;
        let mut buf = [0u8; 1];
        self.bus
            .write_read(Self::device_address(addr), &[addr as u8], &mut buf)
            .map_err(|e| {
                warn!("eeprom: read 0x{addr:04X} failed: {:?}", e.kind());
                StoreError::ReadFailed(addr)
            })?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, addr: u16, value: u8) -> Result<(), StoreError> {
        check_range(addr)?;
        self.bus
            .write(Self::device_address(addr), &[addr as u8, value])
            .map_err(|e| {
                warn!("eeprom: write 0x{addr:04X} failed: {:?}", e.kind());
                StoreError::WriteFailed(addr)
            })?;
        self.delay.delay_ms(WRITE_CYCLE_MS);
        debug!("eeprom: wrote 0x{addr:04X}");
        Ok(())
    }
}
