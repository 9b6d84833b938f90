//! Cancellable repeating timers for a cooperative, single-threaded loop.
//!
//! An [`IntervalTimer`] is a plain value: it is armed by constructing it and
//! disarmed by dropping it. Owners keep it in an `Option` so that replacing or
//! clearing the slot is the only way to cancel, and a stale tick can be told
//! apart from a live one by its [`TimerId`].

use std::time::Duration;

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out unique timer ids for one owner.
#[derive(Debug, Default)]
pub struct TimerIds {
    next: u64,
}

impl TimerIds {
    pub fn next_id(&mut self) -> TimerId {
        self.next += 1;
        TimerId(self.next)
    }
}

#[derive(Debug)]
pub struct IntervalTimer {
    id: TimerId,
    label: &'static str,
    period_ns: u64,
    next_due_ns: u64,
    fired: u64,
}

impl IntervalTimer {
    /// Arms a timer whose first tick is due one `period` after `now_ns`.
    pub fn arm(id: TimerId, label: &'static str, now_ns: u64, period: Duration) -> Self {
        let period_ns = u64::try_from(period.as_nanos())
            .unwrap_or(u64::MAX)
            .max(1);
        trace!(timer = %id, label, period_ms = period_ns / 1_000_000, "timer armed");
        Self {
            id,
            label,
            period_ns,
            next_due_ns: now_ns.saturating_add(period_ns),
            fired: 0,
        }
    }

    pub fn id(&self) -> TimerId {
        self.id
    }

    pub fn next_due_ns(&self) -> u64 {
        self.next_due_ns
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Returns true when a tick is due and schedules the following one.
    ///
    /// Periods missed while the loop was stalled collapse into the single tick
    /// reported here. The next tick stays on the grid set at arming, at the
    /// first boundary after `now_ns`.
    pub fn poll(&mut self, now_ns: u64) -> bool {
        if now_ns < self.next_due_ns {
            return false;
        }
        let missed = (now_ns - self.next_due_ns) / self.period_ns;
        if missed > 0 {
            trace!(timer = %self.id, label = self.label, missed, "late ticks coalesced");
        }
        let step = self.period_ns.saturating_mul(missed.saturating_add(1));
        self.next_due_ns = self.next_due_ns.saturating_add(step);
        self.fired += 1;
        true
    }
}

impl Drop for IntervalTimer {
    fn drop(&mut self) {
        trace!(timer = %self.id, label = self.label, fired = self.fired, "timer disarmed");
    }
}
