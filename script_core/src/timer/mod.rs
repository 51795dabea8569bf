//! Virtual clock and timer queue.
//!
//! The queue owns the current virtual time and every pending one-shot or
//! repeating timer. It is generic over the callback type `C` so that the
//! scripting context can store callbacks that borrow the context itself.
//!
//! Firing happens in *passes*. [`TimerQueue::begin_pass`] moves the clock and
//! snapshots the pending set; [`TimerQueue::next_due`] hands out due entries
//! one at a time; [`TimerQueue::settle`] re-arms or drops the entry after its
//! callback ran; [`TimerQueue::end_pass`] merges everything back. Timers
//! scheduled while a pass is open land outside the snapshot and are only
//! considered by the next pass.

mod id;

pub use id::*;

use std::collections::VecDeque;

use crate::config::RepeatPolicy;
use crate::error::{Result, ScriptError};
use crate::time::VirtualTime;

/// A scheduled callback.
pub struct TimerEntry<C> {
    id: TimerId,
    due_at: VirtualTime,
    /// Zero for one-shot timers.
    repeat_interval: u64,
    pub callback: C,
}

impl<C> TimerEntry<C> {
    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn due_at(&self) -> VirtualTime {
        self.due_at
    }

    pub fn repeat_interval(&self) -> u64 {
        self.repeat_interval
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_interval > 0
    }
}

impl<C> std::fmt::Debug for TimerEntry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerEntry")
            .field("id", &self.id)
            .field("due_at", &self.due_at)
            .field("repeat_interval", &self.repeat_interval)
            .finish_non_exhaustive()
    }
}

/// State of an open firing pass.
struct FiringPass<C> {
    /// Snapshot entries not yet examined, in queue order.
    remaining: VecDeque<TimerEntry<C>>,

    /// Examined entries that stay queued, in queue order.
    kept: Vec<TimerEntry<C>>,

    /// The entry whose callback is currently running.
    in_flight: Option<TimerId>,

    /// Set when the in-flight entry is cancelled from its own callback.
    in_flight_cancelled: bool,
}

/// The virtual clock plus its pending timers.
pub struct TimerQueue<C> {
    now: VirtualTime,
    /// Entries outside any open pass, in insertion order.
    pending: Vec<TimerEntry<C>>,
    ids: TimerIdGen,
    policy: RepeatPolicy,
    pass: Option<FiringPass<C>>,
}

impl<C> TimerQueue<C> {
    /// Create an empty queue at time zero.
    pub fn new(policy: RepeatPolicy) -> Self {
        Self {
            now: VirtualTime::ZERO,
            pending: Vec::new(),
            ids: TimerIdGen::new(),
            policy,
            pass: None,
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// The drift policy applied when re-arming repeating timers.
    pub fn policy(&self) -> RepeatPolicy {
        self.policy
    }

    /// Number of live timers, including one whose callback is running.
    pub fn len(&self) -> usize {
        let in_pass = self.pass.as_ref().map_or(0, |pass| {
            let flying = usize::from(pass.in_flight.is_some() && !pass.in_flight_cancelled);
            pass.remaining.len() + pass.kept.len() + flying
        });
        self.pending.len() + in_pass
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a firing pass is open.
    pub fn is_firing(&self) -> bool {
        self.pass.is_some()
    }

    /// Check if a timer is still live.
    pub fn contains(&self, id: TimerId) -> bool {
        let in_pass = self.pass.as_ref().is_some_and(|pass| {
            (pass.in_flight == Some(id) && !pass.in_flight_cancelled)
                || pass.remaining.iter().any(|e| e.id == id)
                || pass.kept.iter().any(|e| e.id == id)
        });
        in_pass || self.pending.iter().any(|e| e.id == id)
    }

    /// Schedule `callback` to fire once, `delay` milliseconds from now.
    pub fn schedule_once(&mut self, callback: C, delay: i64) -> Result<TimerId> {
        let delay = u64::try_from(delay).map_err(|_| ScriptError::InvalidArgument {
            name: "delay",
            value: delay,
            reason: "must not be negative",
        })?;
        self.insert(callback, delay, 0)
    }

    /// Schedule `callback` to fire every `interval` milliseconds, first at
    /// `now + interval`.
    pub fn schedule_repeating(&mut self, callback: C, interval: i64) -> Result<TimerId> {
        let interval = match u64::try_from(interval) {
            Ok(interval) if interval > 0 => interval,
            _ => {
                return Err(ScriptError::InvalidArgument {
                    name: "interval",
                    value: interval,
                    reason: "must be positive",
                })
            }
        };
        self.insert(callback, interval, interval)
    }

    fn insert(&mut self, callback: C, delay: u64, repeat_interval: u64) -> Result<TimerId> {
        let due_at = self
            .now
            .plus(delay)
            .ok_or_else(|| ScriptError::InvalidArgument {
                name: "delay",
                value: i64::try_from(delay).unwrap_or(i64::MAX),
                reason: "overflows the virtual clock",
            })?;
        let id = self.ids.next_id();
        self.pending.push(TimerEntry {
            id,
            due_at,
            repeat_interval,
            callback,
        });
        tracing::debug!(timer = %id, %due_at, repeat_interval, "timer scheduled");
        Ok(id)
    }

    /// Remove a timer. Unknown or already-fired ids are ignored.
    ///
    /// Returns `true` if a live timer was cancelled. Cancelling the entry that
    /// is currently firing stops it from being re-armed.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if let Some(pos) = self.pending.iter().position(|e| e.id == id) {
            self.pending.remove(pos);
            tracing::debug!(timer = %id, "timer cancelled");
            return true;
        }

        let Some(pass) = self.pass.as_mut() else {
            return false;
        };

        let removed = if pass.in_flight == Some(id) {
            let live = !pass.in_flight_cancelled;
            pass.in_flight_cancelled = true;
            live
        } else if let Some(pos) = pass.remaining.iter().position(|e| e.id == id) {
            pass.remaining.remove(pos);
            true
        } else if let Some(pos) = pass.kept.iter().position(|e| e.id == id) {
            pass.kept.remove(pos);
            true
        } else {
            false
        };

        if removed {
            tracing::debug!(timer = %id, "timer cancelled");
        }
        removed
    }

    /// Drop every timer, including any in an open pass.
    pub fn clear(&mut self) {
        self.pending.clear();
        if let Some(pass) = self.pass.as_mut() {
            pass.remaining.clear();
            pass.kept.clear();
            pass.in_flight_cancelled = true;
        }
    }

    /// Move the clock to `new_time` and open a firing pass.
    ///
    /// Fails without touching any state if a pass is already open or if
    /// `new_time` is earlier than the current clock.
    pub fn begin_pass(&mut self, new_time: VirtualTime) -> Result<()> {
        if self.pass.is_some() {
            return Err(ScriptError::ReentrantAdvance);
        }
        if new_time.is_before(self.now) {
            return Err(ScriptError::ClockRegression {
                requested: new_time,
                current: self.now,
            });
        }

        self.now = new_time;
        self.pass = Some(FiringPass {
            remaining: std::mem::take(&mut self.pending).into(),
            kept: Vec::new(),
            in_flight: None,
            in_flight_cancelled: false,
        });
        Ok(())
    }

    /// Hand out the next due entry of the open pass.
    ///
    /// The caller runs its callback and must give it back with
    /// [`settle`](Self::settle) before asking for the next one.
    pub fn next_due(&mut self) -> Option<TimerEntry<C>> {
        let now = self.now;
        let pass = self.pass.as_mut()?;
        debug_assert!(pass.in_flight.is_none(), "previous entry was not settled");

        while let Some(entry) = pass.remaining.pop_front() {
            if entry.due_at <= now {
                pass.in_flight = Some(entry.id);
                pass.in_flight_cancelled = false;
                return Some(entry);
            }
            pass.kept.push(entry);
        }
        None
    }

    /// Return an entry after its callback ran.
    ///
    /// One-shot entries and entries cancelled while firing are dropped;
    /// repeating entries are re-armed according to the drift policy.
    pub fn settle(&mut self, mut entry: TimerEntry<C>) {
        let now = self.now;
        let policy = self.policy;
        let Some(pass) = self.pass.as_mut() else {
            return;
        };
        debug_assert_eq!(pass.in_flight, Some(entry.id));

        let cancelled = std::mem::take(&mut pass.in_flight_cancelled);
        pass.in_flight = None;

        if cancelled || !entry.is_repeating() {
            return;
        }

        entry.due_at = match policy {
            RepeatPolicy::FixedRate => entry.due_at.saturating_plus(entry.repeat_interval),
            RepeatPolicy::FixedDelay => now.saturating_plus(entry.repeat_interval),
        };
        pass.kept.push(entry);
    }

    /// Close the open pass.
    ///
    /// Surviving snapshot entries keep their order and come before anything
    /// scheduled during the pass.
    pub fn end_pass(&mut self) {
        let Some(pass) = self.pass.take() else {
            return;
        };
        let mut merged = pass.kept;
        merged.extend(pass.remaining);
        merged.append(&mut self.pending);
        self.pending = merged;
    }
}

impl<C> Default for TimerQueue<C> {
    fn default() -> Self {
        Self::new(RepeatPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: u64) -> VirtualTime {
        VirtualTime::new(millis)
    }

    /// Open a pass at `new_time`, run `fire` on every due entry, close it.
    fn run_pass<C, F>(
        queue: &mut TimerQueue<C>,
        new_time: VirtualTime,
        mut fire: F,
    ) -> Result<usize>
    where
        F: FnMut(TimerId, &mut C),
    {
        queue.begin_pass(new_time)?;
        let mut fired = 0;
        while let Some(mut entry) = queue.next_due() {
            fire(entry.id(), &mut entry.callback);
            fired += 1;
            queue.settle(entry);
        }
        queue.end_pass();
        Ok(fired)
    }

    fn fired_labels(queue: &mut TimerQueue<&'static str>, now: u64) -> Vec<&'static str> {
        let mut out = Vec::new();
        run_pass(queue, at(now), |_, label| out.push(*label)).unwrap();
        out
    }

    #[test]
    fn test_one_shot_fires_exactly_once() {
        let mut queue = TimerQueue::default();
        queue.schedule_once("once", 100).unwrap();

        assert!(fired_labels(&mut queue, 99).is_empty());
        assert_eq!(fired_labels(&mut queue, 150), vec!["once"]);
        assert!(fired_labels(&mut queue, 1_000).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_delay_is_relative_to_registration_time() {
        let mut queue = TimerQueue::default();
        run_pass(&mut queue, at(500), |_, _| {}).unwrap();

        queue.schedule_once("later", 100).unwrap();
        assert!(fired_labels(&mut queue, 599).is_empty());
        assert_eq!(fired_labels(&mut queue, 600), vec!["later"]);
    }

    #[test]
    fn test_same_call_fires_in_insertion_order() {
        let mut queue = TimerQueue::default();
        queue.schedule_once("a", 30).unwrap();
        queue.schedule_once("b", 10).unwrap();
        queue.schedule_once("c", 20).unwrap();

        assert_eq!(fired_labels(&mut queue, 30), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fixed_rate_repeat() {
        let mut queue = TimerQueue::new(RepeatPolicy::FixedRate);
        let id = queue.schedule_repeating("tick", 1_000).unwrap();

        assert_eq!(fired_labels(&mut queue, 999).len(), 0);
        assert_eq!(fired_labels(&mut queue, 1_000).len(), 1);
        // Once per advance even though more than one interval elapsed.
        assert_eq!(fired_labels(&mut queue, 2_500).len(), 1);

        // Re-armed from the previous due time: 2000 -> 3000.
        let due = queue.pending.iter().find(|e| e.id == id).map(|e| e.due_at);
        assert_eq!(due, Some(at(3_000)));
        assert!(fired_labels(&mut queue, 2_999).is_empty());
        assert_eq!(fired_labels(&mut queue, 3_000).len(), 1);
    }

    #[test]
    fn test_fixed_delay_repeat() {
        let mut queue = TimerQueue::new(RepeatPolicy::FixedDelay);
        queue.schedule_repeating("tick", 1_000).unwrap();

        assert_eq!(fired_labels(&mut queue, 1_000).len(), 1);
        assert_eq!(fired_labels(&mut queue, 2_500).len(), 1);
        // Re-armed from the clock: 2500 -> 3500.
        assert!(fired_labels(&mut queue, 3_000).is_empty());
        assert_eq!(fired_labels(&mut queue, 3_500).len(), 1);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut queue: TimerQueue<()> = TimerQueue::default();

        assert!(matches!(
            queue.schedule_once((), -1),
            Err(ScriptError::InvalidArgument { name: "delay", value: -1, .. })
        ));
        assert!(matches!(
            queue.schedule_repeating((), 0),
            Err(ScriptError::InvalidArgument { name: "interval", value: 0, .. })
        ));
        assert!(matches!(
            queue.schedule_repeating((), -5),
            Err(ScriptError::InvalidArgument { name: "interval", .. })
        ));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_zero_delay_is_allowed() {
        let mut queue = TimerQueue::default();
        queue.schedule_once("now", 0).unwrap();
        assert_eq!(fired_labels(&mut queue, 0), vec!["now"]);
    }

    #[test]
    fn test_delay_overflow_is_rejected() {
        let mut queue: TimerQueue<()> = TimerQueue::default();
        run_pass(&mut queue, at(u64::MAX - 5), |_, _| {}).unwrap();
        assert!(matches!(
            queue.schedule_once((), 10),
            Err(ScriptError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_cancel_unknown_is_noop() {
        let mut queue: TimerQueue<()> = TimerQueue::default();
        assert!(!queue.cancel(TimerId::new(42)));

        let id = queue.schedule_once((), 5).unwrap();
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clock_regression_leaves_state_untouched() {
        let mut queue = TimerQueue::default();
        run_pass(&mut queue, at(100), |_, _| {}).unwrap();
        queue.schedule_once("x", 0).unwrap();

        let err = run_pass(&mut queue, at(50), |_, _| {}).unwrap_err();
        assert!(matches!(err, ScriptError::ClockRegression { .. }));
        assert_eq!(queue.now(), at(100));
        assert_eq!(queue.len(), 1);
        assert!(!queue.is_firing());
    }

    #[test]
    fn test_pass_cancel_in_flight_stops_rearm() {
        let mut queue = TimerQueue::default();
        let id = queue.schedule_repeating("r", 10).unwrap();

        queue.begin_pass(at(10)).unwrap();
        let entry = queue.next_due().unwrap();
        assert!(queue.contains(id));
        assert!(queue.cancel(id));
        assert!(!queue.contains(id));
        queue.settle(entry);
        assert!(queue.next_due().is_none());
        queue.end_pass();

        assert!(queue.is_empty());
        assert!(fired_labels(&mut queue, 100).is_empty());
    }

    #[test]
    fn test_pass_cancel_sibling_before_it_fires() {
        let mut queue = TimerQueue::default();
        queue.schedule_once("first", 0).unwrap();
        let second = queue.schedule_once("second", 0).unwrap();

        queue.begin_pass(at(0)).unwrap();
        let entry = queue.next_due().unwrap();
        assert_eq!(entry.callback, "first");
        queue.cancel(second);
        queue.settle(entry);
        assert!(queue.next_due().is_none());
        queue.end_pass();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_scheduled_during_pass_waits_for_next_pass() {
        let mut queue = TimerQueue::default();
        queue.schedule_once("outer", 0).unwrap();

        queue.begin_pass(at(10)).unwrap();
        let entry = queue.next_due().unwrap();
        // Already due relative to the clock, but not part of this pass.
        queue.schedule_once("inner", 0).unwrap();
        queue.settle(entry);
        assert!(queue.next_due().is_none());
        queue.end_pass();

        assert_eq!(fired_labels(&mut queue, 10), vec!["inner"]);
    }

    #[test]
    fn test_survivors_precede_timers_added_during_pass() {
        let mut queue = TimerQueue::default();
        queue.schedule_repeating("rep", 10).unwrap();
        queue.schedule_once("idle", 1_000).unwrap();

        queue.begin_pass(at(10)).unwrap();
        let entry = queue.next_due().unwrap();
        queue.schedule_once("new", 10).unwrap();
        queue.settle(entry);
        assert!(queue.next_due().is_none());
        queue.end_pass();

        let order: Vec<_> = queue.pending.iter().map(|e| e.callback).collect();
        assert_eq!(order, vec!["rep", "idle", "new"]);
    }

    #[test]
    fn test_nested_pass_is_rejected() {
        let mut queue: TimerQueue<()> = TimerQueue::default();
        queue.begin_pass(at(1)).unwrap();
        assert!(matches!(
            queue.begin_pass(at(2)),
            Err(ScriptError::ReentrantAdvance)
        ));
        queue.end_pass();
        assert_eq!(queue.now(), at(1));
    }

    #[test]
    fn test_clear_drops_everything() {
        let mut queue = TimerQueue::default();
        queue.schedule_once("a", 5).unwrap();
        queue.schedule_repeating("b", 5).unwrap();

        queue.clear();
        assert!(queue.is_empty());
        assert!(fired_labels(&mut queue, 100).is_empty());
    }
}
