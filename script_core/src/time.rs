//! Virtual time for the script event core.
//!
//! Time is whatever the host says it is. It only moves when the host calls
//! `advance`, never from wall-clock observation.

use serde::{Deserialize, Serialize};

/// Milliseconds since an epoch chosen by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct VirtualTime(u64);

impl VirtualTime {
    /// The epoch.
    pub const ZERO: VirtualTime = VirtualTime(0);

    /// Create a time from raw milliseconds.
    #[inline]
    pub fn new(millis: u64) -> Self {
        VirtualTime(millis)
    }

    /// Return the raw millisecond value.
    #[inline]
    pub fn millis(self) -> u64 {
        self.0
    }

    /// The time `delay` milliseconds after `self`, `None` on overflow.
    #[inline]
    pub fn plus(self, delay: u64) -> Option<VirtualTime> {
        self.0.checked_add(delay).map(VirtualTime)
    }

    /// Like [`plus`](Self::plus) but pinned at the far end of the clock.
    #[inline]
    pub fn saturating_plus(self, delay: u64) -> VirtualTime {
        VirtualTime(self.0.saturating_add(delay))
    }

    /// Returns `true` if `self` is strictly before `other`.
    #[inline]
    pub fn is_before(self, other: VirtualTime) -> bool {
        self.0 < other.0
    }
}

impl From<u64> for VirtualTime {
    fn from(millis: u64) -> Self {
        VirtualTime(millis)
    }
}

impl std::fmt::Display for VirtualTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}
