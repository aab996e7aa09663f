//! Hardcoded rate oracle for v1.
//!
//! In the initial version of Ochra, a stub oracle provides a fixed exchange
//! rate. This avoids the complexity of MPC-TLS oracle infrastructure while
//! still allowing the rest of the economy to function.
//!
//! The default rate is `100_000_000` micro-seeds per unit, corresponding to
//! 1 Seed = 1 USD at the baseline.

use crate::Result;

/// Default rate: 1 Seed = 1 USD = 100,000,000 micro-seeds.
pub const DEFAULT_RATE: u64 = 100_000_000;

/// A stub oracle that returns a hardcoded exchange rate.
///
/// Used in v1 where a real MPC-TLS oracle is not yet deployed. The rate
/// can be adjusted for development and testing purposes via [`dev_set_rate`](StubOracle::dev_set_rate).
#[derive(Debug, Clone)]
pub struct StubOracle {
    /// The current exchange rate in micro-seeds per unit.
    rate: u64,
}

impl StubOracle {
    /// Create a new stub oracle with the default rate.
    pub fn new() -> Self {
        Self { rate: DEFAULT_RATE }
    }

    /// Create a stub oracle with a custom rate.
    ///
    /// # Arguments
    ///
    /// * `rate` - The exchange rate in micro-seeds per unit
    pub fn with_rate(rate: u64) -> Self {
        Self { rate }
    }

    /// Get the current exchange rate in micro-seeds per unit.
    pub fn get_rate(&self) -> u64 {
        self.rate
    }

    /// Set the exchange rate (development/testing only).
    ///
    /// In production, the rate should be determined by the MPC-TLS oracle.
    /// This method is provided for development and integration testing.
    ///
    /// # Arguments
    ///
    /// * `rate` - The new exchange rate in micro-seeds per unit
    pub fn dev_set_rate(&mut self, rate: u64) {
        tracing::warn!(new_rate = rate, "stub oracle: rate changed (dev only)");
        self.rate = rate;
    }

    /// Convert a fiat amount to micro-seeds using the current rate.
    ///
    /// # Arguments
    ///
    /// * `fiat_amount` - The amount in fiat units
    pub fn to_micro_seeds(&self, fiat_amount: u64) -> Result<u64> {
        let result = (fiat_amount as u128)
            .checked_mul(self.rate as u128)
            .and_then(|v| u64::try_from(v).ok())
            .ok_or(crate::OracleError::InvalidPrice(fiat_amount))?;
        Ok(result)
    }

    /// Convert micro-seeds to a fiat amount using the current rate.
    ///
    /// # Arguments
    ///
    /// * `micro_seeds` - The amount in micro-seeds
    pub fn from_micro_seeds(&self, micro_seeds: u64) -> u64 {
        if self.rate == 0 {
            return 0;
        }
        micro_seeds / self.rate
    }
}

impl Default for StubOracle {
    fn default() -> Self {
        Self::new()
    }
}
