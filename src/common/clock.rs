//! Game clock and the per-run timer queue.
//!
//! Every deadline in the simulation (reload, dash, invulnerability, knockback,
//! pickup despawn, ability durations) is a [`GameTime`] on this clock. The
//! clock only moves inside `SimSet::Clock`, so pausing the run pauses every
//! timer at once without touching them individually.
//!
//! ```text
//!  tick N:  advance_clock ──► drain_due(now) ──► TimerElapsed(action) ──► consumers
//!                                                       │
//!                                 consumer re-checks liveness before mutating
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use bevy::prelude::*;

use super::pool::{Enemies, Pickups, PoolHandle};

/// Milliseconds since the run started.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameTime(pub u64);

impl GameTime {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn after(self, ms: u64) -> Self {
        Self(self.0.saturating_add(ms))
    }

    /// Milliseconds elapsed since `earlier` (zero if `earlier` is in the future).
    #[inline]
    pub fn since(self, earlier: GameTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

#[derive(Resource, Debug, Default, Clone)]
pub struct GameClock {
    elapsed: Duration,
    last_delta: Duration,
    /// Whole milliseconds reported before the last advance.
    previous_ms: u64,
}

impl GameClock {
    pub fn advance(&mut self, dt: Duration) {
        self.previous_ms = self.now().0;
        self.elapsed += dt;
        self.last_delta = dt;
    }

    #[inline]
    pub fn now(&self) -> GameTime {
        GameTime(self.elapsed.as_millis() as u64)
    }

    #[inline]
    pub fn delta(&self) -> Duration {
        self.last_delta
    }

    #[inline]
    pub fn delta_secs(&self) -> f32 {
        self.last_delta.as_secs_f32()
    }

    /// Whole milliseconds crossed by the last advance.
    ///
    /// Summed over ticks this always equals `now()`, even when the step is
    /// not a whole number of milliseconds.
    #[inline]
    pub fn delta_millis(&self) -> u64 {
        self.now().0 - self.previous_ms
    }
}

/// What a deadline means once it is reached.
///
/// Entity-bound actions carry a pool handle, not an `Entity`: the slot may
/// have been recycled by the time the timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    ReloadComplete,
    DashEnd,
    DashReady,
    InvulnerabilityEnd,
    MagnetEnd,
    TimeDilationEnd,
    KnockbackEnd(PoolHandle<Enemies>),
    PickupExpired(PoolHandle<Pickups>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TimerHandle {
    due: GameTime,
    id: u64,
}

/// Deadline-ordered deferred actions.
///
/// Ties on the same deadline fire in scheduling order.
#[derive(Resource, Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    entries: BTreeMap<(GameTime, u64), TimerAction>,
}

impl TimerQueue {
    pub fn schedule(&mut self, due: GameTime, action: TimerAction) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert((due, id), action);
        TimerHandle { due, id }
    }

    /// Withdraw a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.entries.remove(&(handle.due, handle.id)).is_some()
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.entries.contains_key(&(handle.due, handle.id))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove and return every action due at or before `now`, earliest first.
    pub fn drain_due(&mut self, now: GameTime) -> Vec<TimerAction> {
        let later = self.entries.split_off(&(now.after(1), 0));
        std::mem::replace(&mut self.entries, later)
            .into_values()
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// A deadline was reached this tick.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerElapsed(pub TimerAction);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_reports_whole_milliseconds() {
        let mut clock = GameClock::default();
        clock.advance(Duration::from_micros(15_625));
        clock.advance(Duration::from_micros(15_625));
        assert_eq!(clock.now(), GameTime(31));
        assert_eq!(clock.delta_millis(), 16);
    }

    #[test]
    fn millisecond_deltas_add_up_to_the_clock() {
        let mut clock = GameClock::default();
        let mut summed = 0;
        for _ in 0..64 {
            clock.advance(Duration::from_micros(15_625));
            summed += clock.delta_millis();
        }
        assert_eq!(summed, 1000);
        assert_eq!(clock.now(), GameTime(1000));
    }

    #[test]
    fn drain_is_inclusive_and_ordered() {
        let mut q = TimerQueue::default();
        q.schedule(GameTime(200), TimerAction::DashReady);
        q.schedule(GameTime(100), TimerAction::DashEnd);
        q.schedule(GameTime(100), TimerAction::ReloadComplete);
        q.schedule(GameTime(101), TimerAction::MagnetEnd);

        assert!(q.drain_due(GameTime(99)).is_empty());
        assert_eq!(
            q.drain_due(GameTime(100)),
            vec![TimerAction::DashEnd, TimerAction::ReloadComplete]
        );
        assert_eq!(q.len(), 2);
        assert_eq!(
            q.drain_due(GameTime(1_000)),
            vec![TimerAction::MagnetEnd, TimerAction::DashReady]
        );
        assert!(q.is_empty());
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut q = TimerQueue::default();
        let h = q.schedule(GameTime(50), TimerAction::InvulnerabilityEnd);
        assert!(q.is_pending(h));
        assert!(q.cancel(h));
        assert!(!q.cancel(h));
        assert!(q.drain_due(GameTime(50)).is_empty());
    }
}
