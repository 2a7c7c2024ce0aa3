//! # Creation Barrier
//!
//! Reusable rendezvous for a fixed number of parties.
//!
//! ## State Machine
//!
//! ```text
//!   Filling(0) ──arrive──▶ Filling(1) ──arrive──▶ ... Filling(n-1)
//!        ▲                                              │
//!        │                                        n-th arrival
//!        │                                              ▼
//!   last waiter leaves ◀── Draining(k) ◀──────── Draining(n-1)
//! ```
//!
//! While the barrier is `Draining`, newcomers park before counting
//! themselves. A party therefore leaves completely before the next one
//! starts filling, and a slow waiter can never be overtaken by an arrival
//! from the following party.

use parking_lot::{Condvar, Mutex};

/// Where the barrier currently is in its cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BarrierPhase {
    /// `count` parties have arrived and are waiting.
    Filling(usize),
    /// The barrier has tripped; `count` released parties have yet to leave.
    Draining(usize),
}

/// Reusable barrier with explicit `Filling`/`Draining` phases.
#[derive(Debug)]
pub struct CreationBarrier {
    parties: usize,
    phase: Mutex<BarrierPhase>,
    changed: Condvar,
}

impl CreationBarrier {
    /// Creates a barrier for `parties` participants.
    ///
    /// # Panics
    ///
    /// Panics if `parties` is zero.
    #[must_use]
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "a barrier needs at least one party");
        Self {
            parties,
            phase: Mutex::new(BarrierPhase::Filling(0)),
            changed: Condvar::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> BarrierPhase {
        *self.phase.lock()
    }

    /// Blocks until `parties` callers have arrived, then releases them all.
    ///
    /// Returns `true` for exactly one caller per cycle: the arrival that
    /// tripped the barrier.
    pub fn arrive_and_wait(&self) -> bool {
        let mut phase = self.phase.lock();

        // Previous party still leaving.
        while matches!(*phase, BarrierPhase::Draining(_)) {
            self.changed.wait(&mut phase);
        }

        let BarrierPhase::Filling(arrived) = *phase else {
            unreachable!("barrier left the draining loop while draining");
        };
        let arrived = arrived + 1;

        if arrived == self.parties {
            *phase = if self.parties == 1 {
                BarrierPhase::Filling(0)
            } else {
                BarrierPhase::Draining(self.parties - 1)
            };
            self.changed.notify_all();
            return true;
        }

        *phase = BarrierPhase::Filling(arrived);
        while matches!(*phase, BarrierPhase::Filling(_)) {
            self.changed.wait(&mut phase);
        }

        if let BarrierPhase::Draining(remaining) = *phase {
            let remaining = remaining - 1;
            *phase = if remaining == 0 {
                self.changed.notify_all();
                BarrierPhase::Filling(0)
            } else {
                BarrierPhase::Draining(remaining)
            };
        }
        false
    }
}
