//! Host-owned delayed tasks
//!
//! Audio stingers, level-transition delays and similar "do this in N ms"
//! work go here instead of ambient timers. The host advances the queue with
//! the same dt it feeds the simulation and clears it on teardown, so nothing
//! fires after a restart.

use serde::{Deserialize, Serialize};

/// Handle for cancelling a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduledTask<T> {
    id: TaskId,
    due_ms: f32,
    payload: T,
}

/// Cancellable list of delayed payloads, fired in due order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskQueue<T> {
    now_ms: f32,
    next_id: u64,
    tasks: Vec<ScheduledTask<T>>,
}

impl<T> Default for TaskQueue<T> {
    fn default() -> Self {
        Self {
            now_ms: 0.0,
            next_id: 1,
            tasks: Vec::new(),
        }
    }
}

impl<T> TaskQueue<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `payload` to fire `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: f32, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(ScheduledTask {
            id,
            due_ms: self.now_ms + delay_ms.max(0.0),
            payload,
        });
        id
    }

    /// Drop a pending task. False if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Advance time and return everything now due, earliest first
    /// (ties fire in scheduling order)
    pub fn advance(&mut self, dt_ms: f32) -> Vec<T> {
        self.now_ms += dt_ms.max(0.0);
        let now = self.now_ms;
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.due_ms <= now);
        self.tasks = pending;
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.0.cmp(&b.id.0)));
        due.into_iter().map(|t| t.payload).collect()
    }

    /// Teardown: forget every pending task
    pub fn clear(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!("Cancelling {} scheduled tasks", self.tasks.len());
        }
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_in_due_order() {
        let mut q = TaskQueue::new();
        q.schedule(300.0, "late");
        q.schedule(100.0, "early");
        q.schedule(100.0, "early-second");
        assert!(q.advance(50.0).is_empty());
        assert_eq!(q.advance(60.0), vec!["early", "early-second"]);
        assert_eq!(q.advance(1000.0), vec!["late"]);
        assert!(q.is_empty());
    }

    #[test]
    fn test_cancel_and_clear() {
        let mut q = TaskQueue::new();
        let a = q.schedule(10.0, 1);
        q.schedule(10.0, 2);
        assert!(q.cancel(a));
        assert!(!q.cancel(a));
        assert_eq!(q.advance(20.0), vec![2]);
        q.schedule(10.0, 3);
        q.clear();
        assert!(q.advance(100.0).is_empty());
    }
}
