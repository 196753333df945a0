use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

/// Unbounded blocking FIFO.
///
/// Only the push onto an empty queue wakes a waiter; consumers drain until
/// empty before blocking again.
#[derive(Debug)]
pub struct Queue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
}

impl<T> Default for Queue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Queue<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
        }
    }

    // A poisoned lock only means another thread panicked mid-push; the
    // deque itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.items.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `item`. Returns `true` if the queue was empty before.
    pub fn push(&self, item: T) -> bool {
        let was_empty = {
            let mut q = self.lock();
            let was_empty = q.is_empty();
            q.push_back(item);
            was_empty
        };
        if was_empty {
            self.not_empty.notify_one();
        }
        was_empty
    }

    /// Blocks until an item is available.
    pub fn pop(&self) -> T {
        let mut q = self.lock();
        loop {
            if let Some(item) = q.pop_front() {
                return item;
            }
            q = self
                .not_empty
                .wait(q)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Waits at most `timeout` for an item.
    pub fn try_pop(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut q = self.lock();
        loop {
            if let Some(item) = q.pop_front() {
                return Some(item);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .not_empty
                .wait_timeout(q, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            q = guard;
        }
    }

    /// Takes every queued item in FIFO order.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;
    use std::{sync::Arc, thread};

    #[test]
    fn push_reports_transition_from_empty() {
        let q = Queue::new();
        assert!(q.push(1));
        assert!(!q.push(2));
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), 1);
        assert_eq!(q.pop(), 2);
        assert!(q.push(3));
    }

    #[test]
    fn try_pop_times_out_on_empty() {
        let q: Queue<u8> = Queue::new();
        let t0 = Instant::now();
        assert_eq!(q.try_pop(Duration::from_millis(30)), None);
        assert!(t0.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn drain_keeps_order_and_empties() {
        let q = Queue::new();
        for i in 0..5 {
            q.push(i);
        }
        assert_eq!(q.drain(), vec![0, 1, 2, 3, 4]);
        assert!(q.is_empty());
    }

    #[test]
    fn pop_wakes_on_push_from_other_thread() {
        let q = Arc::new(Queue::new());
        let q2 = Arc::clone(&q);
        let consumer = thread::spawn(move || q2.pop());
        thread::sleep(Duration::from_millis(20));
        q.push("frame");
        assert_eq!(consumer.join().unwrap(), "frame");
    }

    #[test]
    fn try_pop_returns_item_pushed_while_waiting() {
        let q = Arc::new(Queue::new());
        let q2 = Arc::clone(&q);
        let producer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            q2.push(42u32);
        });
        assert_eq!(q.try_pop(Duration::from_secs(2)), Some(42));
        producer.join().unwrap();
    }
}
