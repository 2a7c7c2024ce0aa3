//! # Admission Queue
//!
//! A counting wait/notify primitive: `release(k)` hands out exactly `k`
//! permits, `acquire()` parks until one is available.
//!
//! Permits are not addressed to a particular waiter. Whichever parked unit
//! the scheduler wakes first takes the permit, so a queue is fair in
//! aggregate but not FIFO.
//!
//! ## Ordering
//!
//! Permits are counted under the queue's mutex. Anything the releasing
//! thread wrote before `release` happens-before everything the acquiring
//! thread does after `acquire` returns.

use parking_lot::{Condvar, Mutex};

/// Counting admission queue for one side of the rendezvous.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    permits: Mutex<usize>,
    available: Condvar,
}

impl AdmissionQueue {
    /// Creates a queue with no permits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `count` permits available and wakes up to `count` waiters.
    pub fn release(&self, count: usize) {
        if count == 0 {
            return;
        }
        let mut permits = self.permits.lock();
        *permits += count;
        for _ in 0..count {
            self.available.notify_one();
        }
    }

    /// Blocks until a permit is available and consumes it.
    pub fn acquire(&self) {
        let mut permits = self.permits.lock();
        while *permits == 0 {
            self.available.wait(&mut permits);
        }
        *permits -= 1;
    }

    /// Permits currently available.
    #[must_use]
    pub fn permits(&self) -> usize {
        *self.permits.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_release_then_acquire() {
        let queue = AdmissionQueue::new();
        queue.release(2);
        assert_eq!(queue.permits(), 2);

        queue.acquire();
        queue.acquire();
        assert_eq!(queue.permits(), 0);
    }

    #[test]
    fn test_release_zero_is_noop() {
        let queue = AdmissionQueue::new();
        queue.release(0);
        assert_eq!(queue.permits(), 0);
    }

    #[test]
    fn test_release_wakes_exactly_k_waiters() {
        let queue = Arc::new(AdmissionQueue::new());
        let passed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let passed = Arc::clone(&passed);
                thread::spawn(move || {
                    queue.acquire();
                    passed.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(passed.load(Ordering::SeqCst), 0);

        queue.release(3);
        while passed.load(Ordering::SeqCst) < 3 {
            thread::yield_now();
        }
        thread::sleep(Duration::from_millis(50));
        assert_eq!(passed.load(Ordering::SeqCst), 3);
        assert_eq!(queue.permits(), 0);

        queue.release(2);
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(passed.load(Ordering::SeqCst), 5);
    }
}
