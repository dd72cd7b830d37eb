/// Deterministic timer queue standing in for the browser event loop.
///
/// Tasks run in order of due time, ties broken by scheduling order. Time only
/// moves when the host advances it, so every race between timers can be
/// reproduced exactly in tests.
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;

/// Handle to a scheduled task, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    now: u64,
    next_id: u64,
    queue: BTreeMap<(u64, u64), T>,
    /// Live handle → due time, so `cancel` can find the queue entry.
    due: FxHashMap<u64, u64>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now: 0,
            next_id: 0,
            queue: BTreeMap::new(),
            due: FxHashMap::default(),
        }
    }

    /// Current virtual time.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule `task` to run `delay` units from now.
    pub fn schedule(&mut self, delay: u64, task: T) -> TimerHandle {
        let id = self.next_id;
        self.next_id += 1;
        let at = self.now.saturating_add(delay);
        self.queue.insert((at, id), task);
        self.due.insert(id, at);
        TimerHandle(id)
    }

    /// Cancel a pending task. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        match self.due.remove(&handle.0) {
            Some(at) => self.queue.remove(&(at, handle.0)).is_some(),
            None => false,
        }
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.due.contains_key(&handle.0)
    }

    /// Drop every pending task.
    pub fn cancel_all(&mut self) {
        self.queue.clear();
        self.due.clear();
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Remove and return the earliest task due at or before `until`,
    /// moving the clock to its due time.
    pub fn pop_due(&mut self, until: u64) -> Option<(TimerHandle, T)> {
        let (&(at, id), _) = self.queue.first_key_value()?;
        if at > until {
            return None;
        }
        let task = self.queue.remove(&(at, id))?;
        self.due.remove(&id);
        self.now = self.now.max(at);
        Some((TimerHandle(id), task))
    }

    /// Move the clock forward without running anything.
    pub fn set_now(&mut self, now: u64) {
        self.now = self.now.max(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_in_due_order() {
        let mut s = Scheduler::new();
        s.schedule(30, "c");
        s.schedule(10, "a");
        s.schedule(20, "b");

        let mut order = Vec::new();
        while let Some((_, task)) = s.pop_due(100) {
            order.push(task);
        }
        assert_eq!(order, vec!["a", "b", "c"]);
        assert_eq!(s.now(), 30);
    }

    #[test]
    fn ties_keep_schedule_order() {
        let mut s = Scheduler::new();
        s.schedule(0, 1);
        s.schedule(0, 2);
        s.schedule(0, 3);
        let order: Vec<i32> = std::iter::from_fn(|| s.pop_due(0).map(|(_, t)| t)).collect();
        assert_eq!(order, vec![1, 2, 3]);
    }

    #[test]
    fn not_due_yet() {
        let mut s = Scheduler::new();
        s.schedule(50, ());
        assert!(s.pop_due(49).is_none());
        assert!(s.pop_due(50).is_some());
    }

    #[test]
    fn cancel_removes_task() {
        let mut s = Scheduler::new();
        let h = s.schedule(10, "gone");
        s.schedule(20, "kept");
        assert!(s.is_pending(h));
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert!(!s.is_pending(h));
        assert_eq!(s.pop_due(100).map(|(_, t)| t), Some("kept"));
    }

    #[test]
    fn cancel_after_run_is_noop() {
        let mut s = Scheduler::new();
        let h = s.schedule(0, ());
        assert!(s.pop_due(0).is_some());
        assert!(!s.cancel(h));
    }

    #[test]
    fn delays_are_relative_to_clock() {
        let mut s = Scheduler::new();
        s.set_now(100);
        s.schedule(10, ());
        assert!(s.pop_due(105).is_none());
        assert!(s.pop_due(110).is_some());
        assert_eq!(s.now(), 110);
    }

    #[test]
    fn cancel_all_empties_queue() {
        let mut s = Scheduler::new();
        let h = s.schedule(10, ());
        s.schedule(20, ());
        s.cancel_all();
        assert_eq!(s.pending(), 0);
        assert!(!s.is_pending(h));
    }
}
