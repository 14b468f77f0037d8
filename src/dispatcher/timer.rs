//! Timer table keyed by deadline.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// Handle for cancelling an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Armed timers ordered by (deadline, arm order).
pub(crate) struct TimerTable<T> {
    by_deadline: BTreeMap<(Instant, TimerId), T>,
    deadlines: HashMap<TimerId, Instant>,
    next_id: u64,
}

impl<T> TimerTable<T> {
    pub(crate) fn new() -> Self {
        Self {
            by_deadline: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }

    pub(crate) fn arm(&mut self, delay: Duration, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let deadline = Instant::now() + delay;
        self.by_deadline.insert((deadline, id), payload);
        self.deadlines.insert(id, deadline);
        id
    }

    pub(crate) fn cancel(&mut self, id: TimerId) -> Option<T> {
        let deadline = self.deadlines.remove(&id)?;
        self.by_deadline.remove(&(deadline, id))
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.by_deadline.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return every timer due at or before `now`, earliest first.
    pub(crate) fn expire(&mut self, now: Instant) -> Vec<T> {
        let mut expired = Vec::new();
        while let Some(entry) = self.by_deadline.first_entry() {
            if entry.key().0 > now {
                break;
            }
            let ((_, id), payload) = entry.remove_entry();
            self.deadlines.remove(&id);
            expired.push(payload);
        }
        expired
    }

    pub(crate) fn len(&self) -> usize {
        self.deadlines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expire_in_deadline_order() {
        let mut timers = TimerTable::new();
        timers.arm(Duration::from_secs(3), "c");
        timers.arm(Duration::from_secs(1), "a");
        timers.arm(Duration::from_secs(1), "b");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(timers.expire(Instant::now()), vec!["a", "b"]);
        assert_eq!(timers.len(), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(timers.expire(Instant::now()), vec!["c"]);
        assert!(timers.next_deadline().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut timers = TimerTable::new();
        let id = timers.arm(Duration::from_secs(1), 7);
        assert_eq!(timers.cancel(id), Some(7));
        assert_eq!(timers.cancel(id), None);

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(timers.expire(Instant::now()).is_empty());
    }
}
