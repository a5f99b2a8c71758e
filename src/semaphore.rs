//! A signed-monotone counting semaphore used as a join barrier.
//!
//! Direct translation of the original `semaphore_t` (`GMutex` + `GCond`)
//! to `std::sync::{Mutex, Condvar}`. Exactly one waiter is expected at a
//! time; that ordering is a caller invariant, not something this type
//! enforces.

use std::sync::{Condvar, Mutex};

pub struct CountingSemaphore {
    value: Mutex<u64>,
    signal: Condvar,
}

impl CountingSemaphore {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(0),
            signal: Condvar::new(),
        }
    }

    /// Increment the counter by 1 and wake one waiter.
    pub fn signal(&self) {
        let mut value = self.value.lock().unwrap();
        *value += 1;
        self.signal.notify_one();
    }

    /// Block until the counter reaches at least `target`, then subtract
    /// `target` from it.
    pub fn wait_for(&self, target: u64) {
        let mut value = self.value.lock().unwrap();
        while *value < target {
            value = self.signal.wait(value).unwrap();
        }
        *value -= target;
    }
}

impl Default for CountingSemaphore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn wait_for_blocks_until_target_reached() {
        let sem = Arc::new(CountingSemaphore::new());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let sem = Arc::clone(&sem);
            handles.push(thread::spawn(move || sem.signal()));
        }
        sem.wait_for(4);
        for h in handles {
            h.join().unwrap();
        }
    }

    #[test]
    fn wait_for_consumes_exactly_target() {
        let sem = CountingSemaphore::new();
        sem.signal();
        sem.signal();
        sem.signal();
        sem.wait_for(2);
        // One signal remains outstanding.
        sem.wait_for(1);
    }
}
