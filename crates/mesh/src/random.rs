//! Random sources for wait point jitter.

use crate::error::RandomError;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};

/// Failed OS entropy reads tolerated before giving up on one request.
const DEFAULT_MAX_FILL_ATTEMPTS: u32 = 4;

/// Supplies uniformly distributed integers.
pub trait RandomSource {
    /// Uniform integer in `[lo, hi)`.
    fn next_in_range(&mut self, lo: u64, hi: u64) -> Result<u64, RandomError>;
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_in_range(&mut self, lo: u64, hi: u64) -> Result<u64, RandomError> {
        (**self).next_in_range(lo, hi)
    }
}

fn check_range(lo: u64, hi: u64) -> Result<(), RandomError> {
    if hi <= lo {
        return Err(RandomError::EmptyRange { lo, hi });
    }
    Ok(())
}

/// Deterministic source for simulations and reproducible runs.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Create a source from a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_in_range(&mut self, lo: u64, hi: u64) -> Result<u64, RandomError> {
        check_range(lo, hi)?;
        Ok(self.rng.gen_range(lo..hi))
    }
}

/// The thread-local generator from `rand`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_in_range(&mut self, lo: u64, hi: u64) -> Result<u64, RandomError> {
        check_range(lo, hi)?;
        Ok(rand::thread_rng().gen_range(lo..hi))
    }
}

/// Operating system entropy, read on every request.
///
/// A request fails with [`RandomError::EntropyUnavailable`] once the entropy
/// source refuses `max_fill_attempts` reads in a row. The source defaults to
/// [`OsRng`]; any fallible [`RngCore`] can stand in for it.
#[derive(Debug, Clone)]
pub struct OsRandom<R = OsRng> {
    rng: R,
    max_fill_attempts: u32,
}

impl Default for OsRandom {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILL_ATTEMPTS)
    }
}

impl OsRandom {
    /// Create a source that tolerates `max_fill_attempts` failed reads
    pub fn new(max_fill_attempts: u32) -> Self {
        Self::with_source(OsRng, max_fill_attempts)
    }
}

impl<R: RngCore> OsRandom<R> {
    /// Read entropy from `rng` instead of the OS. At least one read is
    /// always attempted.
    pub fn with_source(rng: R, max_fill_attempts: u32) -> Self {
        Self {
            rng,
            max_fill_attempts: max_fill_attempts.max(1),
        }
    }

    /// Reads allowed per request before giving up
    pub fn max_fill_attempts(&self) -> u32 {
        self.max_fill_attempts
    }

    fn fill_u64(&mut self) -> Result<u64, RandomError> {
        let mut failures = 0;
        loop {
            let mut bytes = [0u8; 8];
            match self.rng.try_fill_bytes(&mut bytes) {
                Ok(()) => return Ok(u64::from_le_bytes(bytes)),
                Err(err) => {
                    failures += 1;
                    tracing::debug!(error = %err, failures, "Entropy read failed");
                    if failures >= self.max_fill_attempts {
                        return Err(RandomError::EntropyUnavailable);
                    }
                }
            }
        }
    }
}

impl<R: RngCore> RandomSource for OsRandom<R> {
    fn next_in_range(&mut self, lo: u64, hi: u64) -> Result<u64, RandomError> {
        check_range(lo, hi)?;
        let span = hi - lo;
        // Largest multiple of span that fits; anything above it would bias
        // the low residues.
        let zone = span * (u64::MAX / span);
        loop {
            let raw = self.fill_u64()?;
            if raw < zone {
                return Ok(lo + raw % span);
            }
        }
    }
}
