//! # Shared Coordination State
//!
//! The single record every unit serializes through.
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────────────────────────────────┐
//!            │               Coordinator                │
//!            │                                          │
//!            │  Mutex<SharedState>  ◀── gate (Condvar)  │
//!            │   waiting / formed / consumed / flag     │
//!            │   party_open / party_molecule            │
//!            │                                          │
//!            │  oxygen_queue   hydrogen_queue   barrier │
//!            └──────────────────────────────────────────┘
//! ```
//!
//! ## The Open Party
//!
//! From the moment a reservation is made until the party's oxygen has
//! evaluated the remaining supply, `party_open` is set and every new
//! arrival parks on `gate` before it may count itself. Creation parties are
//! therefore strictly sequential: the molecule number, the barrier and the
//! consumption counters always belong to exactly one party. No lock guard
//! ever crosses a thread; the "held" exclusion is plain state.
//!
//! ## Insufficient Supply
//!
//! `insufficient_supply` is sticky. It is only raised while no party is
//! open (at construction, when a party closes, or by [`Coordinator::abort`])
//! and no reservation is made once it is up, so a party member never
//! observes it. Whoever raises it releases a permit afterwards; the flag
//! write is sequenced before that release and the woken unit reads it
//! under the same mutex after `acquire` returns.

use parking_lot::{Condvar, Mutex};

use crate::log::UnitKind;
use crate::sync::{AdmissionQueue, CreationBarrier};

/// Participants in one creation party: 1 oxygen + 2 hydrogen.
pub const PARTY_SIZE: usize = 3;

/// Hydrogen units consumed per molecule.
pub const HYDROGEN_PER_MOLECULE: u32 = 2;

/// Counters guarded by the coordinator mutex.
#[derive(Debug, Default)]
struct SharedState {
    oxygen_waiting: u32,
    hydrogen_waiting: u32,
    molecules_formed: u32,
    oxygen_consumed: u32,
    hydrogen_consumed: u32,
    insufficient_supply: bool,
    party_open: bool,
    party_molecule: u32,
}

impl SharedState {
    fn can_match(&self) -> bool {
        self.oxygen_waiting >= 1 && self.hydrogen_waiting >= HYDROGEN_PER_MOLECULE
    }
}

/// Point-in-time copy of the shared counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// Oxygen units parked and not yet matched.
    pub oxygen_waiting: u32,
    /// Hydrogen units parked and not yet matched.
    pub hydrogen_waiting: u32,
    /// Molecules whose creation has started.
    pub molecules_formed: u32,
    /// Oxygen units that completed a molecule.
    pub oxygen_consumed: u32,
    /// Hydrogen units that completed a molecule.
    pub hydrogen_consumed: u32,
    /// Whether the shutdown cascade is active.
    pub insufficient_supply: bool,
    /// Whether a creation party is in progress.
    pub party_open: bool,
}

/// Result of seeking admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// This arrival completed a 1:2 ratio and reserved molecule `molecule`.
    Reserved {
        /// Number assigned to the reserved molecule.
        molecule: u32,
    },
    /// No match yet; the unit must wait on its queue.
    Parked,
}

/// What a unit finds after its queue releases it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Release {
    /// Join the open creation party for `molecule`.
    Join {
        /// Molecule being created.
        molecule: u32,
    },
    /// No further molecule can form; leave through the cascade.
    Exhausted,
}

/// Outcome of the supply check made when a party closes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyVerdict {
    /// Another molecule may still form, or nothing is left at all.
    Sufficient,
    /// Oxygen remains but fewer than two hydrogen do; one oxygen waiter woken.
    HydrogenShort,
    /// Hydrogen remains but no oxygen does; one hydrogen waiter woken.
    OxygenShort,
}

/// Shared coordination state for one run.
#[derive(Debug)]
pub struct Coordinator {
    total_oxygen: u32,
    total_hydrogen: u32,
    state: Mutex<SharedState>,
    gate: Condvar,
    oxygen_queue: AdmissionQueue,
    hydrogen_queue: AdmissionQueue,
    barrier: CreationBarrier,
}

impl Coordinator {
    /// Creates the state for a run with the given supply.
    ///
    /// If the supply cannot form a single molecule the flag is raised up
    /// front and each queue gets one permit, so the first arrivals on each
    /// side start the cascade.
    #[must_use]
    pub fn new(total_oxygen: u32, total_hydrogen: u32) -> Self {
        let coordinator = Self {
            total_oxygen,
            total_hydrogen,
            state: Mutex::new(SharedState::default()),
            gate: Condvar::new(),
            oxygen_queue: AdmissionQueue::new(),
            hydrogen_queue: AdmissionQueue::new(),
            barrier: CreationBarrier::new(PARTY_SIZE),
        };

        if total_oxygen == 0 || total_hydrogen < HYDROGEN_PER_MOLECULE {
            tracing::warn!(
                "supply O={} H={} cannot form a molecule, shutting down at startup",
                total_oxygen,
                total_hydrogen
            );
            coordinator.state.lock().insufficient_supply = true;
            coordinator.oxygen_queue.release(1);
            coordinator.hydrogen_queue.release(1);
        }
        coordinator
    }

    fn queue(&self, kind: UnitKind) -> &AdmissionQueue {
        match kind {
            UnitKind::Oxygen => &self.oxygen_queue,
            UnitKind::Hydrogen => &self.hydrogen_queue,
        }
    }

    /// Counts a unit of `kind` as waiting and reserves a molecule if its
    /// arrival completes a 1:2 ratio.
    ///
    /// Blocks first while another creation party is open. On a reservation
    /// the waiting counts drop by 1 oxygen + 2 hydrogen and exactly that many
    /// permits are released. Either way the caller must then call
    /// [`Coordinator::wait_for_release`].
    pub fn admit(&self, kind: UnitKind) -> Admission {
        let mut state = self.state.lock();
        while state.party_open {
            self.gate.wait(&mut state);
        }

        match kind {
            UnitKind::Oxygen => state.oxygen_waiting += 1,
            UnitKind::Hydrogen => state.hydrogen_waiting += 1,
        }

        if state.insufficient_supply || !state.can_match() {
            return Admission::Parked;
        }

        state.oxygen_waiting -= 1;
        state.hydrogen_waiting -= HYDROGEN_PER_MOLECULE;
        state.party_open = true;
        state.party_molecule = state.molecules_formed + 1;
        debug_assert!(!state.can_match(), "reservation left a match un-drained");

        let molecule = state.party_molecule;
        drop(state);

        tracing::debug!("{} completed a ratio, reserving molecule {}", kind, molecule);
        self.oxygen_queue.release(1);
        self.hydrogen_queue.release(HYDROGEN_PER_MOLECULE as usize);
        Admission::Reserved { molecule }
    }

    /// Parks on the queue for `kind` until released, then reports whether
    /// to join the open party or leave.
    pub fn wait_for_release(&self, kind: UnitKind) -> Release {
        self.queue(kind).acquire();

        let state = self.state.lock();
        if state.insufficient_supply {
            Release::Exhausted
        } else {
            debug_assert!(state.party_open, "released without an open party");
            Release::Join {
                molecule: state.party_molecule,
            }
        }
    }

    /// Passes the shutdown signal on: one permit on each queue.
    pub fn cascade(&self) {
        self.oxygen_queue.release(1);
        self.hydrogen_queue.release(1);
    }

    /// Oxygen marks the open party's molecule as started, after building.
    pub fn record_formed(&self, molecule: u32) {
        let mut state = self.state.lock();
        state.molecules_formed += 1;
        debug_assert_eq!(state.molecules_formed, molecule);
    }

    /// First barrier phase: all three participants have arrived.
    pub fn assemble(&self) -> bool {
        let tripped = self.barrier.arrive_and_wait();
        if tripped {
            tracing::debug!("creation party assembled");
        }
        tripped
    }

    /// Credits one completed unit of `kind`.
    pub fn record_consumed(&self, kind: UnitKind) {
        let mut state = self.state.lock();
        match kind {
            UnitKind::Oxygen => {
                state.oxygen_consumed += 1;
                debug_assert!(state.oxygen_consumed <= self.total_oxygen);
            }
            UnitKind::Hydrogen => {
                state.hydrogen_consumed += 1;
                debug_assert!(state.hydrogen_consumed <= self.total_hydrogen);
            }
        }
    }

    /// Second barrier phase: all three participants have been credited.
    pub fn settle(&self) -> bool {
        self.barrier.arrive_and_wait()
    }

    /// Evaluates the remaining supply and closes the open party.
    ///
    /// Called once per party, by its oxygen, after [`Coordinator::settle`].
    pub fn close_party(&self) -> SupplyVerdict {
        let mut state = self.state.lock();
        let oxygen_left = self.total_oxygen - state.oxygen_consumed;
        let hydrogen_left = self.total_hydrogen - state.hydrogen_consumed;

        let verdict = if oxygen_left >= 1 && hydrogen_left < HYDROGEN_PER_MOLECULE {
            SupplyVerdict::HydrogenShort
        } else if oxygen_left == 0 && hydrogen_left > 0 {
            SupplyVerdict::OxygenShort
        } else {
            SupplyVerdict::Sufficient
        };

        if verdict != SupplyVerdict::Sufficient {
            state.insufficient_supply = true;
        }
        state.party_open = false;
        self.gate.notify_all();
        drop(state);

        match verdict {
            SupplyVerdict::HydrogenShort => {
                tracing::warn!(
                    "{} oxygen left but only {} hydrogen, starting shutdown cascade",
                    oxygen_left,
                    hydrogen_left
                );
                self.oxygen_queue.release(1);
            }
            SupplyVerdict::OxygenShort => {
                tracing::warn!(
                    "{} hydrogen left but no oxygen, starting shutdown cascade",
                    hydrogen_left
                );
                self.hydrogen_queue.release(1);
            }
            SupplyVerdict::Sufficient => {}
        }
        verdict
    }

    /// Forces the shutdown cascade.
    ///
    /// Waits for any open party to close, then raises the flag and releases
    /// one permit per queue. Every unit that is or will be parked leaves
    /// without forming a molecule.
    pub fn abort(&self) {
        let mut state = self.state.lock();
        while state.party_open {
            self.gate.wait(&mut state);
        }
        state.insufficient_supply = true;
        drop(state);

        tracing::warn!("coordinator aborted");
        self.cascade();
    }

    /// Copies the current counters.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            oxygen_waiting: state.oxygen_waiting,
            hydrogen_waiting: state.hydrogen_waiting,
            molecules_formed: state.molecules_formed,
            oxygen_consumed: state.oxygen_consumed,
            hydrogen_consumed: state.hydrogen_consumed,
            insufficient_supply: state.insufficient_supply,
            party_open: state.party_open,
        }
    }
}
