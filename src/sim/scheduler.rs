//! Deferred work keyed by simulation tick
//!
//! Replaces timer callbacks: each entry fires on the first tick at or after
//! its due tick, and cancelling means removing it from the queue.

/// Handle for a scheduled entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
struct Scheduled<T> {
    due_tick: u64,
    ticket: Ticket,
    task: T,
}

#[derive(Debug, Clone)]
pub struct Scheduler<T> {
    queue: Vec<Scheduled<T>>,
    next_ticket: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: Vec::new(),
            next_ticket: 1,
        }
    }

    pub fn schedule(&mut self, due_tick: u64, task: T) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        self.queue.push(Scheduled { due_tick, ticket, task });
        ticket
    }

    /// Remove a pending entry. Returns false if it already ran or was cancelled.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        let before = self.queue.len();
        self.queue.retain(|s| s.ticket != ticket);
        self.queue.len() != before
    }

    /// Remove every pending entry matching `pred`, returning how many were removed
    pub fn cancel_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let before = self.queue.len();
        self.queue.retain(|s| !pred(&s.task));
        before - self.queue.len()
    }

    /// Pop every entry due at or before `now`, ordered by due tick then
    /// scheduling order
    pub fn drain_due(&mut self, now: u64) -> Vec<T> {
        let (mut due, pending): (Vec<_>, Vec<_>) = self.queue.drain(..).partition(|s| s.due_tick <= now);
        self.queue = pending;
        due.sort_by_key(|s| (s.due_tick, s.ticket));
        due.into_iter().map(|s| s.task).collect()
    }

    pub fn is_pending(&self, ticket: Ticket) -> bool {
        self.queue.iter().any(|s| s.ticket == ticket)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_due_in_order() {
        let mut s = Scheduler::new();
        s.schedule(5, "late");
        s.schedule(2, "early");
        s.schedule(2, "early-second");
        s.schedule(9, "future");

        assert!(s.drain_due(1).is_empty());
        assert_eq!(s.drain_due(5), vec!["early", "early-second", "late"]);
        assert_eq!(s.len(), 1);
        assert_eq!(s.drain_due(100), vec!["future"]);
        assert!(s.is_empty());
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let a = s.schedule(3, 1);
        let b = s.schedule(3, 2);
        assert!(s.is_pending(a));
        assert!(s.cancel(a));
        assert!(!s.cancel(a));
        assert!(!s.is_pending(a));
        assert_eq!(s.drain_due(3), vec![2]);
        assert!(!s.cancel(b));
    }

    #[test]
    fn test_cancel_where() {
        let mut s = Scheduler::new();
        s.schedule(1, 10);
        s.schedule(1, 11);
        s.schedule(1, 20);
        assert_eq!(s.cancel_where(|t| *t < 20), 2);
        assert_eq!(s.drain_due(1), vec![20]);
    }
}
