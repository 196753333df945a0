use std::{
    mem,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

/// Single-slot "latest value" exchange between one producer and one consumer.
///
/// The producer never waits for the consumer: an unread value is simply
/// replaced. Values move by swapping, so each side hands its spare buffer to
/// the other instead of allocating.
///
/// Every push advances a wrapping counter starting at `u64::MAX`, so the first
/// pushed value carries sequence number 0 and a gap between two popped
/// numbers is the count of values the consumer never saw.
#[derive(Debug)]
pub struct Swapper<T> {
    state: Mutex<Slot<T>>,
    fresh: Condvar,
}

#[derive(Debug)]
struct Slot<T> {
    item: T,
    push_counter: u64,
    pop_counter: u64,
    is_waiting: bool,
}

impl<T> Slot<T> {
    fn has_fresh(&self) -> bool {
        self.push_counter != self.pop_counter
    }

    fn take(&mut self, item: T) -> (T, u64) {
        let out = mem::replace(&mut self.item, item);
        self.pop_counter = self.push_counter;
        self.is_waiting = false;
        (out, self.pop_counter)
    }
}

impl<T> Swapper<T> {
    pub fn new(item: T) -> Self {
        Self {
            state: Mutex::new(Slot {
                item,
                push_counter: u64::MAX,
                pop_counter: u64::MAX,
                is_waiting: false,
            }),
            fresh: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Publishes `item` and returns the value it replaced.
    pub fn push(&self, item: T) -> T {
        let (old, should_signal) = {
            let mut slot = self.lock();
            let old = mem::replace(&mut slot.item, item);
            slot.push_counter = slot.push_counter.wrapping_add(1);
            (old, slot.is_waiting)
        };
        if should_signal {
            self.fresh.notify_one();
        }
        old
    }

    /// Blocks until a value newer than the last popped one is available,
    /// leaves `item` in its place and returns it with its sequence number.
    pub fn pop(&self, item: T) -> (T, u64) {
        let mut slot = self.lock();
        slot.is_waiting = true;
        while !slot.has_fresh() {
            slot = self
                .fresh
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
        slot.take(item)
    }

    /// Like [`pop`](Self::pop) but gives up after `timeout`.
    ///
    /// # Errors
    /// On timeout the caller's `item` is handed back untouched.
    pub fn try_pop(&self, item: T, timeout: Duration) -> Result<(T, u64), T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        slot.is_waiting = true;
        while !slot.has_fresh() {
            let now = Instant::now();
            if now >= deadline {
                slot.is_waiting = false;
                return Err(item);
            }
            let (guard, _) = self
                .fresh
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            slot = guard;
        }
        Ok(slot.take(item))
    }
}
