//! Virtual-time task queue for timed actions and the fermentation clock.
//!
//! Tasks carry the generation they were scheduled under. The queue only
//! orders them; deciding whether a popped task is still current is the
//! session's job, so a late task from a superseded generation can always be
//! recognised and dropped.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::actions::ActionTicket;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    /// Next step (or completion) of a timed action.
    ActionStep(ActionTicket),
    /// One fermentation clock tick for the given clock run.
    FermentationTick { run: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub due: Duration,
    pub generation: u64,
    pub kind: TaskKind,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), ScheduledTask>,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    pub fn schedule_in(&mut self, delay: Duration, generation: u64, kind: TaskKind) {
        let due = self.now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.insert(
            (due, seq),
            ScheduledTask {
                due,
                generation,
                kind,
            },
        );
    }

    /// Remove and return the earliest task due at or before `until`, moving
    /// the clock to its due time. Ties run in scheduling order.
    pub fn pop_due(&mut self, until: Duration) -> Option<ScheduledTask> {
        let (&key, _) = self.queue.first_key_value()?;
        if key.0 > until {
            return None;
        }
        let task = self.queue.remove(&key)?;
        self.now = self.now.max(task.due);
        Some(task)
    }

    /// Move the clock forward to `until` once every due task has run.
    pub fn settle(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }

    /// Drop queued tasks matching `predicate`, returning how many were dropped.
    pub fn cancel_where(&mut self, mut predicate: impl FnMut(&ScheduledTask) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, task| !predicate(task));
        before - self.queue.len()
    }

    /// Drop every queued task. The clock keeps its current time.
    pub fn clear(&mut self) {
        self.queue.clear();
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest queued task.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.queue.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(run: u64) -> TaskKind {
        TaskKind::FermentationTick { run }
    }

    #[test]
    fn pops_in_due_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(Duration::from_millis(500), 0, tick(2));
        scheduler.schedule_in(Duration::from_millis(100), 0, tick(0));
        scheduler.schedule_in(Duration::from_millis(500), 0, tick(3));
        scheduler.schedule_in(Duration::from_millis(100), 0, tick(1));

        let mut order = Vec::new();
        while let Some(task) = scheduler.pop_due(Duration::from_secs(1)) {
            if let TaskKind::FermentationTick { run } = task.kind {
                order.push(run);
            }
        }
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(scheduler.now(), Duration::from_millis(500));
        scheduler.settle(Duration::from_secs(1));
        assert_eq!(scheduler.now(), Duration::from_secs(1));
    }

    #[test]
    fn tasks_beyond_horizon_stay_queued() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(Duration::from_millis(300), 0, tick(0));
        assert!(scheduler.pop_due(Duration::from_millis(299)).is_none());
        assert_eq!(scheduler.pending(), 1);
        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(300)));
        assert!(scheduler.pop_due(Duration::from_millis(300)).is_some());
    }

    #[test]
    fn cancel_where_drops_matching_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_in(Duration::from_millis(10), 1, tick(0));
        scheduler.schedule_in(Duration::from_millis(20), 2, tick(0));
        let dropped = scheduler.cancel_where(|task| task.generation == 1);
        assert_eq!(dropped, 1);
        assert_eq!(scheduler.iter().next().map(|t| t.generation), Some(2));
        scheduler.clear();
        assert_eq!(scheduler.pending(), 0);
    }
}
