//! Virtual-clock timer queue
//!
//! The game is single-threaded and cooperative: every wait is a timer that
//! fires when the host advances the clock. Periodic timers drive motion ticks,
//! one-shot timers pace the gaps between arm phases.

use std::collections::BTreeMap;

use super::motion::MotionTask;
use super::sequencer::Continuation;

/// Handle of a live timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimerTask {
    /// One step of an in-flight motion (periodic)
    Motion(MotionTask),
    /// Pacing delay, then resume the arm cycle (one-shot)
    Delay(Continuation),
}

#[derive(Debug, Clone)]
struct Timer {
    due: u64,
    period: Option<u64>,
    task: TimerTask,
}

/// All live timers, ordered by due time then creation order
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    now: u64,
    next_id: u64,
    timers: BTreeMap<TimerId, Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time (ms)
    pub fn now(&self) -> u64 {
        self.now
    }

    fn insert(&mut self, due: u64, period: Option<u64>, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.insert(id, Timer { due, period, task });
        id
    }

    /// Fire `task` every `period_ms`, first one period from now
    pub fn schedule_repeating(&mut self, period_ms: u64, task: TimerTask) -> TimerId {
        let period = period_ms.max(1);
        self.insert(self.now + period, Some(period), task)
    }

    /// Fire `task` once, `delay_ms` from now
    pub fn schedule_once(&mut self, delay_ms: u64, task: TimerTask) -> TimerId {
        self.insert(self.now + delay_ms, None, task)
    }

    /// Remove a timer, returning its task if it was live
    pub fn cancel(&mut self, id: TimerId) -> Option<TimerTask> {
        self.timers.remove(&id).map(|t| t.task)
    }

    pub fn is_live(&self, id: TimerId) -> bool {
        self.timers.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Pop the earliest timer due at or before `deadline`.
    ///
    /// The clock moves to the timer's due time. Periodic timers stay live and
    /// are rescheduled one period later; one-shot timers are removed.
    pub fn pop_due(&mut self, deadline: u64) -> Option<(TimerId, TimerTask)> {
        let (id, due) = self
            .timers
            .iter()
            .filter(|(_, t)| t.due <= deadline)
            .min_by_key(|(id, t)| (t.due, **id))
            .map(|(id, t)| (*id, t.due))?;

        self.now = self.now.max(due);
        let timer = self.timers.get_mut(&id)?;
        let task = timer.task;
        match timer.period {
            Some(period) => timer.due = due + period,
            None => {
                self.timers.remove(&id);
            }
        }
        Some((id, task))
    }

    /// Move the clock forward to `deadline` once nothing else is due
    pub fn settle(&mut self, deadline: u64) {
        self.now = self.now.max(deadline);
    }

    /// Cancel every live timer in one pass; returns how many were live
    pub fn clear(&mut self) -> usize {
        let count = self.timers.len();
        self.timers.clear();
        count
    }
}
