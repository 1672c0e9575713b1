//! Wall-clock implementation of the Clock port.

use chrono::{DateTime, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::foundation::Timestamp;
use crate::ports::{Clock, ClockError};

/// Reads the host's system clock.
///
/// A clock set before the Unix epoch is treated as broken rather than
/// trusted, since every expiry decision would be wrong.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Result<Timestamp, ClockError> {
        let now = SystemTime::now();
        now.duration_since(UNIX_EPOCH).map_err(|e| {
            ClockError::Unavailable(format!("system clock is before the Unix epoch: {}", e))
        })?;
        Ok(Timestamp::from_datetime(DateTime::<Utc>::from(now)))
    }
}
