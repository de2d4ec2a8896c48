//! Shared test doubles and fixtures for unit tests in `src/`.

use std::sync::Mutex;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::RecipeDraft;

/// Fixed instant used as "now" by fixture clocks.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("fixture timestamp is unambiguous"),
    }
}

/// The breakfast recipe used throughout the tests.
pub fn sample_draft() -> RecipeDraft {
    RecipeDraft {
        name: "spam and eggs".into(),
        ingredients: vec!["spam".into(), "eggs".into()],
        directions: vec!["fry".into(), "eat".into()],
        tags: vec!["breakfast".into(), "fast".into()],
        ..RecipeDraft::default()
    }
}

/// Clock whose time only moves when a test advances it.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> std::sync::MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}
