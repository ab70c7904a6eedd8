//! Deterministic timers driven by an explicit clock.
//!
//! A [`TimerSet`] belongs to exactly one crossing session. Timers never fire on
//! their own: the owner moves the clock forward and pops due timers one at a
//! time, so a handler that cancels other timers takes effect immediately.

/// What a timer does when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Re-evaluate beam strain and decay break particles.
    StrainTick,
    /// Push the vehicle forward.
    VehiclePush,
    /// Check the vehicle against the success and failure thresholds.
    OutcomePoll,
    /// Spawn the vehicle.
    VehicleSpawn,
    /// Stop pushing the vehicle.
    PushTimeout,
    /// Tear the session down after an outcome was shown.
    Settle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Timer {
    kind: TimerKind,
    due_ms: f64,
    period_ms: Option<f64>,
}

/// Owned collection of pending timers plus the clock they run against.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimerSet {
    timers: Vec<Timer>,
    now_ms: f64,
}

impl TimerSet {
    /// An empty set with the clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock reading.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now_ms
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Whether a timer of `kind` is pending.
    #[must_use]
    pub fn is_scheduled(&self, kind: TimerKind) -> bool {
        self.timers.iter().any(|timer| timer.kind == kind)
    }

    /// Fire `kind` every `period_ms`, first one period from now.
    ///
    /// Replaces any pending timer of the same kind.
    pub fn every(&mut self, kind: TimerKind, period_ms: f64) {
        self.schedule(kind, period_ms, Some(period_ms));
    }

    /// Fire `kind` once, `delay_ms` from now.
    ///
    /// Replaces any pending timer of the same kind.
    pub fn after(&mut self, kind: TimerKind, delay_ms: f64) {
        self.schedule(kind, delay_ms, None);
    }

    fn schedule(&mut self, kind: TimerKind, delay_ms: f64, period_ms: Option<f64>) {
        self.cancel(kind);
        self.timers.push(Timer {
            kind,
            due_ms: self.now_ms + delay_ms,
            period_ms,
        });
    }

    /// Drop the pending timer of `kind`, if any.
    pub fn cancel(&mut self, kind: TimerKind) {
        self.timers.retain(|timer| timer.kind != kind);
    }

    /// Drop every pending timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// The clock moves to the timer's deadline. Periodic timers are re-armed
    /// one period later; one-shot timers are removed. Ties fire in the order
    /// the timers were scheduled.
    pub fn pop_due(&mut self, until_ms: f64) -> Option<TimerKind> {
        let (index, timer) = self
            .timers
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, timer)| timer.due_ms <= until_ms)
            .min_by(|(_, a), (_, b)| a.due_ms.total_cmp(&b.due_ms))?;
        self.now_ms = self.now_ms.max(timer.due_ms);
        match timer.period_ms {
            Some(period) => self.timers[index].due_ms += period,
            None => {
                self.timers.remove(index);
            }
        }
        Some(timer.kind)
    }

    /// Move the clock forward to `now_ms` without firing anything.
    pub fn advance_to(&mut self, now_ms: f64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}
