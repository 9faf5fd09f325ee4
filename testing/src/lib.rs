//! # Todo Sync Testing
//!
//! Testing utilities and helpers for todo-sync reducers.
//!
//! This crate provides:
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - A deterministic [`Clock`] for repositories under test
//! - Assertion helpers for effect lists
//!
//! ## Example
//!
//! ```ignore
//! use todo_sync_testing::{assertions, ReducerTest};
//!
//! ReducerTest::new(TodoReducer::new())
//!     .with_env(test_environment())
//!     .given_state(TodoState::default())
//!     .when_action(TodoAction::Refresh)
//!     .then_state(|state| assert!(state.is_loading))
//!     .then_effects(assertions::assert_has_future_effect)
//!     .run();
//! ```

use chrono::{DateTime, Duration, Utc};
use std::sync::Mutex;
use todo_sync_core::environment::Clock;

pub mod reducer_test;

pub use reducer_test::{assertions, ReducerTest};

/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Duration, Mutex, Utc};

    /// Clock that advances by a fixed step on every reading
    ///
    /// Gives every record created in a test a distinct, increasing
    /// timestamp, so newest-first ordering is observable.
    #[derive(Debug)]
    pub struct SteppingClock {
        next: Mutex<DateTime<Utc>>,
        step: Duration,
    }

    impl SteppingClock {
        /// Create a clock whose first reading is `start`
        #[must_use]
        pub const fn new(start: DateTime<Utc>, step: Duration) -> Self {
            Self {
                next: Mutex::new(start),
                step,
            }
        }
    }

    impl Clock for SteppingClock {
        fn now(&self) -> DateTime<Utc> {
            // A poisoned lock only means another test thread panicked mid-read
            let mut next = self
                .next
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let now = *next;
            *next = now + self.step;
            now
        }
    }

    /// 2025-01-01 00:00:00 UTC
    #[must_use]
    pub fn epoch() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_735_689_600, 0).unwrap_or_default()
    }

    /// Create a stepping clock starting at 2025-01-01 that advances one second per reading
    #[must_use]
    pub fn stepping_clock() -> SteppingClock {
        SteppingClock::new(epoch(), Duration::seconds(1))
    }
}

// Re-export commonly used items
pub use mocks::{stepping_clock, SteppingClock};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepping_clock_advances() {
        let clock = stepping_clock();
        let first = clock.now();
        assert_eq!(first.to_rfc3339(), "2025-01-01T00:00:00+00:00");
        let second = clock.now();
        assert_eq!(second - first, Duration::seconds(1));
    }
}
