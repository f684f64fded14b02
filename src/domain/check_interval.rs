use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_CHECK_INTERVAL_MINUTES: i64 = 5;
pub const MAX_CHECK_INTERVAL_MINUTES: i64 = 525_600;

/// How often a project is polled, in whole minutes. Between one minute and one year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "i64", into = "i64")]
#[sqlx(transparent)]
pub struct CheckInterval(i64);

impl CheckInterval {
    pub fn new(minutes: i64) -> Result<Self, ValidationError> {
        if minutes < 1 {
            return Err(ValidationError::CheckInterval);
        }
        if minutes > MAX_CHECK_INTERVAL_MINUTES {
            return Err(ValidationError::CheckIntervalTooLong(
                MAX_CHECK_INTERVAL_MINUTES,
            ));
        }
        Ok(Self(minutes))
    }

    pub fn minutes(&self) -> i64 {
        self.0
    }

    /// The timer period this interval stands for.
    ///
    /// Rows decoded from the database skip `new`, so the value is clamped here too.
    pub fn period(&self) -> Duration {
        let minutes = self.0.clamp(1, MAX_CHECK_INTERVAL_MINUTES).unsigned_abs();
        let seconds = minutes
            .checked_mul(60)
            .unwrap_or(MAX_CHECK_INTERVAL_MINUTES.unsigned_abs() * 60);
        Duration::from_secs(seconds)
    }
}

impl Default for CheckInterval {
    fn default() -> Self {
        Self(DEFAULT_CHECK_INTERVAL_MINUTES)
    }
}

impl TryFrom<i64> for CheckInterval {
    type Error = ValidationError;

    fn try_from(minutes: i64) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<CheckInterval> for i64 {
    fn from(interval: CheckInterval) -> Self {
        interval.0
    }
}
