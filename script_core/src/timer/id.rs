//! Timer identifiers.

use serde::{Deserialize, Serialize};

/// Opaque handle returned by the scheduling calls and accepted by `cancel`.
///
/// Only meaningful for lookup; firing order does not depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

impl TimerId {
    /// Wrap a raw value.
    #[inline]
    pub fn new(raw: u64) -> Self {
        TimerId(raw)
    }

    /// Return the raw value.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Strictly increasing id source owned by one timer queue. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct TimerIdGen {
    last: u64,
}

impl TimerIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint the next id.
    pub fn next_id(&mut self) -> TimerId {
        self.last += 1;
        TimerId(self.last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let mut ids = TimerIdGen::new();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a.raw(), 1);
        assert_eq!(b.raw(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(TimerId::new(12).to_string(), "#12");
    }
}
