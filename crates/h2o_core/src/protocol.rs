//! # Unit Protocol
//!
//! What every oxygen and hydrogen unit runs, start to finish.
//!
//! ```text
//! started ─ prepare ─ going to queue ─ admit ─ wait on queue ─┬─ not enough ─ cascade
//!                                                             │
//!                                                             └─ creating n
//!                                                                   │ (O: build, formed += 1)
//!                                                                assemble (barrier)
//!                                                                   │
//!                                                             molecule n created
//!                                                                consumed += 1
//!                                                                   │
//!                                                                settle (barrier)
//!                                                                   │ (O: close party)
//!                                                                  done
//! ```
//!
//! A unit owns nothing shared: it borrows the [`Coordinator`] and the
//! [`EventLog`] for the duration of [`Unit::run`] and returns normally on
//! every path.

use std::io::Write;
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::SimulationConfig;
use crate::log::{Event, EventLog, UnitId, UnitKind};
use crate::state::{Admission, Coordinator, Release};

/// How a unit's run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnitOutcome {
    /// The unit took part in molecule `molecule`.
    Bonded {
        /// Number of the molecule.
        molecule: u32,
    },
    /// The unit left through the shutdown cascade.
    Exhausted,
}

/// One oxygen or hydrogen worker.
#[derive(Debug)]
pub struct Unit {
    id: UnitId,
    max_startup_delay: Duration,
    max_build_delay: Duration,
    rng: ChaCha8Rng,
}

impl Unit {
    /// Creates a unit with its own delay generator derived from `run_seed`.
    #[must_use]
    pub fn new(id: UnitId, config: &SimulationConfig, run_seed: u64) -> Self {
        let kind_bits: u64 = match id.kind {
            UnitKind::Oxygen => 0,
            UnitKind::Hydrogen => 1 << 32,
        };
        Self {
            id,
            max_startup_delay: config.max_startup_delay(),
            max_build_delay: config.max_build_delay(),
            rng: ChaCha8Rng::seed_from_u64(run_seed ^ kind_bits ^ u64::from(id.index)),
        }
    }

    /// This unit's id.
    #[must_use]
    pub const fn id(&self) -> UnitId {
        self.id
    }

    /// Sleeps for a uniform random whole number of milliseconds in `[0, max]`.
    fn pause(&mut self, max: Duration) {
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        let millis = self.rng.gen_range(0..=max_ms);
        if millis > 0 {
            thread::sleep(Duration::from_millis(millis));
        }
    }

    /// Runs the unit to completion.
    pub fn run<W: Write + Send>(mut self, coordinator: &Coordinator, log: &EventLog<W>) -> UnitOutcome {
        let id = self.id;
        log.append(id, Event::Started);
        self.pause(self.max_startup_delay);
        log.append(id, Event::GoingToQueue);

        if let Admission::Reserved { molecule } = coordinator.admit(id.kind) {
            tracing::debug!("{} reserved molecule {}", id, molecule);
        }

        let molecule = match coordinator.wait_for_release(id.kind) {
            Release::Join { molecule } => molecule,
            Release::Exhausted => {
                log.append(id, Event::NotEnough);
                coordinator.cascade();
                tracing::debug!("{} left through the cascade", id);
                return UnitOutcome::Exhausted;
            }
        };

        log.append(id, Event::Creating(molecule));
        match id.kind {
            UnitKind::Oxygen => self.build_as_oxygen(molecule, coordinator, log),
            UnitKind::Hydrogen => Self::build_as_hydrogen(id, molecule, coordinator, log),
        }
        UnitOutcome::Bonded { molecule }
    }

    fn build_as_oxygen<W: Write + Send>(
        &mut self,
        molecule: u32,
        coordinator: &Coordinator,
        log: &EventLog<W>,
    ) {
        self.pause(self.max_build_delay);
        coordinator.record_formed(molecule);

        coordinator.assemble();
        log.append(self.id, Event::Created(molecule));
        coordinator.record_consumed(UnitKind::Oxygen);
        coordinator.settle();

        let verdict = coordinator.close_party();
        tracing::debug!("molecule {} closed: {:?}", molecule, verdict);
    }

    fn build_as_hydrogen<W: Write + Send>(
        id: UnitId,
        molecule: u32,
        coordinator: &Coordinator,
        log: &EventLog<W>,
    ) {
        coordinator.assemble();
        log.append(id, Event::Created(molecule));
        coordinator.record_consumed(UnitKind::Hydrogen);
        coordinator.settle();
    }
}
