// Timeout scaling for slow hosts
//
// Every bounded wait in the harness is expressed in "scaled seconds": one
// thousand milliseconds multiplied by a host-dependent adjustment factor.

use crate::constants::{
    DEFAULT_SYSLOG_WAIT_SECONDS, DEFAULT_TIMEOUT_FACTOR, MILLIS_PER_SECOND, TIMEOUT_FACTOR_ENV,
};
use crate::error::{HarnessError, HarnessResult};
use std::time::Duration;

/// Multiplier applied to every bounded wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutFactor(u32);

impl TimeoutFactor {
    /// Create a factor; zero is rejected
    pub fn new(factor: u32) -> HarnessResult<Self> {
        if factor == 0 {
            return Err(HarnessError::Config(
                "timeout factor must be a positive integer".to_string(),
            ));
        }
        Ok(Self(factor))
    }

    /// Read the factor from `TS_TIMEOUT_FACTOR`, defaulting to 1 when unset
    pub fn from_env() -> HarnessResult<Self> {
        match std::env::var(TIMEOUT_FACTOR_ENV) {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Parse a factor from its textual form
    pub fn parse(raw: &str) -> HarnessResult<Self> {
        let factor = raw.trim().parse::<u32>().map_err(|e| {
            HarnessError::Config(format!(
                "Invalid {} value '{}': {}",
                TIMEOUT_FACTOR_ENV, raw, e
            ))
        })?;
        Self::new(factor)
    }

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Scale a duration given in milliseconds
    pub fn adjust_millis(&self, millis: u64) -> Duration {
        Duration::from_millis(millis.saturating_mul(u64::from(self.0)))
    }

    /// One scaled second
    pub fn adjusted_second(&self) -> Duration {
        self.adjust_millis(MILLIS_PER_SECOND)
    }

    /// How long to wait for a syslog datagram (5 scaled seconds)
    pub fn syslog_wait(&self) -> Duration {
        self.adjusted_second() * DEFAULT_SYSLOG_WAIT_SECONDS as u32
    }
}

impl Default for TimeoutFactor {
    fn default() -> Self {
        Self(DEFAULT_TIMEOUT_FACTOR)
    }
}
