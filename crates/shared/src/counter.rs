//! Bounded display counter.
//!
//! The counter is a plain `Copy` value: transitions take the current value and
//! return the next one, so a host always derives the new state from the latest
//! value it owns instead of a snapshot captured earlier in the same handler.

use std::{fmt, str::FromStr};

use thiserror::Error;
use tracing::debug;

pub const COUNTER_MIN: u8 = 0;
pub const COUNTER_MAX: u8 = 20;

/// Integer value that never leaves `COUNTER_MIN..=COUNTER_MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct BoundedCounter {
    value: u8,
}

impl BoundedCounter {
    pub const fn new() -> Self {
        Self { value: COUNTER_MIN }
    }

    /// Clamps any integer into range.
    pub fn from_value(value: i64) -> Self {
        let clamped = value.clamp(i64::from(COUNTER_MIN), i64::from(COUNTER_MAX));
        Self {
            value: clamped as u8,
        }
    }

    pub const fn value(self) -> u8 {
        self.value
    }

    pub const fn is_at_max(self) -> bool {
        self.value >= COUNTER_MAX
    }

    pub const fn is_at_min(self) -> bool {
        self.value <= COUNTER_MIN
    }

    /// One unit up, or unchanged at the ceiling.
    #[must_use]
    pub fn increment(self) -> Self {
        debug!(value = self.value, "counter: increment requested");
        if self.value < COUNTER_MAX {
            Self {
                value: self.value + 1,
            }
        } else {
            self
        }
    }

    /// One unit down, or unchanged at the floor.
    #[must_use]
    pub fn decrement(self) -> Self {
        debug!(value = self.value, "counter: decrement requested");
        if self.value > COUNTER_MIN {
            Self {
                value: self.value - 1,
            }
        } else {
            self
        }
    }

    #[must_use]
    pub fn apply(self, action: CounterAction) -> Self {
        match action {
            CounterAction::Increment => self.increment(),
            CounterAction::Decrement => self.decrement(),
        }
    }

    /// Folds a sequence of actions, each one applied to the result of the previous.
    #[must_use]
    pub fn apply_all(self, actions: impl IntoIterator<Item = CounterAction>) -> Self {
        actions
            .into_iter()
            .fold(self, |counter, action| counter.apply(action))
    }
}

impl fmt::Display for BoundedCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl From<BoundedCounter> for i64 {
    fn from(counter: BoundedCounter) -> Self {
        i64::from(counter.value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterAction {
    Increment,
    Decrement,
}

impl CounterAction {
    pub fn label(self) -> &'static str {
        match self {
            CounterAction::Increment => "Add value",
            CounterAction::Decrement => "Remove value",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown counter action '{0}' (expected add/+ or remove/-)")]
pub struct ParseCounterActionError(pub String);

impl FromStr for CounterAction {
    type Err = ParseCounterActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" | "+" | "inc" | "increment" => Ok(CounterAction::Increment),
            "remove" | "-" | "dec" | "decrement" => Ok(CounterAction::Decrement),
            other => Err(ParseCounterActionError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "tests/counter_tests.rs"]
mod tests;
