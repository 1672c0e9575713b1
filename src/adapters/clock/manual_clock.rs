//! Manually driven clock for tests and demos.

use std::sync::{Arc, Mutex};

use crate::domain::foundation::Timestamp;
use crate::ports::{Clock, ClockError};

#[derive(Debug)]
struct State {
    now: Timestamp,
    unavailable: bool,
}

/// Clock whose time only moves when told to.
///
/// Clones share the same time, so a test can keep a handle while the
/// lifecycle owns another.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<State>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                now: start,
                unavailable: false,
            })),
        }
    }

    pub fn advance_days(&self, days: i64) {
        self.update(|state| state.now = state.now.plus_days(days));
    }

    pub fn advance_secs(&self, secs: i64) {
        self.update(|state| state.now = state.now.plus_secs(secs));
    }

    pub fn set(&self, now: Timestamp) {
        self.update(|state| state.now = now);
    }

    /// Makes `now()` fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.update(|state| state.unavailable = unavailable);
    }

    fn update(&self, f: impl FnOnce(&mut State)) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Result<Timestamp, ClockError> {
        let state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if state.unavailable {
            return Err(ClockError::Unavailable("manual clock switched off".to_string()));
        }
        Ok(state.now)
    }
}
