//! Credential manager.
//!
//! Owns the comparison and persistence rules for the 5-symbol password:
//!
//! - `create_credential` compares a candidate against its confirmation.
//! - `persist` writes the credential into a fixed region of the store and
//!   reads every byte back.
//! - `verify_against_store` compares an attempt with the persisted copy.
//!
//! Comparisons always walk the full length so the time taken does not
//! depend on which symbol differs.  A store failure on the verification
//! path yields [`Verdict::Mismatch`]; it never surfaces as a distinct
//! outcome.

use core::fmt;

use log::{error, warn};

use crate::app::ports::CredentialStore;
use crate::error::StoreError;

/// Number of symbols in a credential.
pub const CREDENTIAL_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Credential
// ---------------------------------------------------------------------------

/// A fixed-length sequence of symbols.  No meaning beyond equality.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Credential([u8; CREDENTIAL_LEN]);

impl Credential {
    pub const fn new(symbols: [u8; CREDENTIAL_LEN]) -> Self {
        Self(symbols)
    }

    pub fn as_bytes(&self) -> &[u8; CREDENTIAL_LEN] {
        &self.0
    }

    /// Full-length comparison; every position is examined.
    pub fn matches(&self, other: &Credential) -> bool {
        let diff = self
            .0
            .iter()
            .zip(other.0.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        diff == 0
    }
}

impl From<[u8; CREDENTIAL_LEN]> for Credential {
    fn from(symbols: [u8; CREDENTIAL_LEN]) -> Self {
        Self(symbols)
    }
}

// Symbols stay out of logs and panic messages.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(*****)")
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// Binary outcome of any credential comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Mismatch,
}

impl Verdict {
    pub fn from_bool(matched: bool) -> Self {
        if matched { Self::Match } else { Self::Mismatch }
    }

    pub fn is_match(self) -> bool {
        self == Self::Match
    }
}

// ---------------------------------------------------------------------------
// CredentialManager
// ---------------------------------------------------------------------------

/// Compares and persists credentials over a [`CredentialStore`].
///
/// Only the back controller owns one; the store is never shared, so the
/// read-compare-write ordering needs no locking.
pub struct CredentialManager<S> {
    store: S,
    base_addr: u16,
    end_addr: u16,
}

impl<S: CredentialStore> CredentialManager<S> {
    /// Fails with `OutOfRange` when the region would run past the top of
    /// the 16-bit address space.
    pub fn new(store: S, base_addr: u16) -> Result<Self, StoreError> {
        let end_addr = base_addr
            .checked_add(CREDENTIAL_LEN as u16)
            .ok_or(StoreError::OutOfRange(base_addr))?;
        Ok(Self {
            store,
            base_addr,
            end_addr,
        })
    }

    /// Candidate/confirmation check for the create flow.  Does not touch
    /// the store; the caller persists on `Match`.
    pub fn create_credential(candidate: &Credential, confirmation: &Credential) -> Verdict {
        Verdict::from_bool(candidate.matches(confirmation))
    }

    /// Write every symbol to the credential region, then read it back.
    ///
    /// Write failures are propagated without retry; the medium exposes no
    /// recovery primitive.
    pub fn persist(&mut self, credential: &Credential) -> Result<(), StoreError> {
        for (addr, &symbol) in self.region().zip(credential.as_bytes().iter()) {
            self.store.write_byte(addr, symbol).inspect_err(|e| {
                error!("credential: persist aborted: {e}");
            })?;
        }
        for (addr, &symbol) in self.region().zip(credential.as_bytes().iter()) {
            let stored = self.store.read_byte(addr)?;
            if stored != symbol {
                error!("credential: read-back mismatch at 0x{addr:04X}");
                return Err(StoreError::VerifyFailed(addr));
            }
        }
        Ok(())
    }

    /// Compare `attempt` with the persisted credential.  Any read failure
    /// is a `Mismatch`.
    pub fn verify_against_store(&mut self, attempt: &Credential) -> Verdict {
        match self.load() {
            Ok(stored) => Verdict::from_bool(stored.matches(attempt)),
            Err(e) => {
                warn!("credential: {e}, failing closed");
                Verdict::Mismatch
            }
        }
    }

    /// Borrow the underlying store (diagnostics and tests).
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn load(&mut self) -> Result<Credential, StoreError> {
        let mut symbols = [0u8; CREDENTIAL_LEN];
        for (addr, slot) in self.region().zip(symbols.iter_mut()) {
            *slot = self.store.read_byte(addr)?;
        }
        Ok(Credential(symbols))
    }

    fn region(&self) -> core::ops::Range<u16> {
        self.base_addr..self.end_addr
    }
}
