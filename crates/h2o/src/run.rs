//! # Simulation Runner
//!
//! Spawns one task per unit, waits for all of them and summarizes the run.
//!
//! ```text
//!   Simulation::new ──▶ spawn O 1..NO ──▶ spawn H 1..NH ──▶ join all ──▶ RunReport
//!                            │ spawn fails
//!                            ▼
//!                  coordinator.abort() ──▶ join spawned ──▶ H2oError::Spawn
//! ```
//!
//! Threads cannot be killed from outside, so a spawn failure is handled by
//! forcing the shutdown cascade: every unit already running leaves through
//! it and returns normally.

use std::io::{self, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{SystemTime, UNIX_EPOCH};

use h2o_core::{
    Coordinator, EventLog, H2oError, H2oResult, SimulationConfig, Unit, UnitId, UnitKind,
    UnitOutcome,
};

/// Work a spawned unit performs.
pub type UnitTask = Box<dyn FnOnce() -> UnitOutcome + Send + 'static>;

/// Starts unit tasks.
pub trait UnitSpawner {
    /// Starts `task` for `unit`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the task could not be started.
    fn spawn(&mut self, unit: UnitId, task: UnitTask) -> io::Result<JoinHandle<UnitOutcome>>;
}

/// One named OS thread per unit (`O-1`, `H-2`, ...).
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadSpawner;

impl UnitSpawner for ThreadSpawner {
    fn spawn(&mut self, unit: UnitId, task: UnitTask) -> io::Result<JoinHandle<UnitOutcome>> {
        thread::Builder::new()
            .name(format!("{}-{}", unit.kind, unit.index))
            .spawn(task)
    }
}

/// Summary of a finished run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Molecules formed.
    pub molecules: u32,
    /// Oxygen units that took part in a molecule.
    pub bonded_oxygen: u32,
    /// Hydrogen units that took part in a molecule.
    pub bonded_hydrogen: u32,
    /// Oxygen units that left through the cascade.
    pub exhausted_oxygen: u32,
    /// Hydrogen units that left through the cascade.
    pub exhausted_hydrogen: u32,
    /// Lines written to the event log.
    pub log_lines: u64,
    /// Seed the delay generators used.
    pub seed: u64,
}

impl RunReport {
    fn tally(&mut self, unit: UnitId, outcome: UnitOutcome) {
        match (unit.kind, outcome) {
            (UnitKind::Oxygen, UnitOutcome::Bonded { .. }) => self.bonded_oxygen += 1,
            (UnitKind::Hydrogen, UnitOutcome::Bonded { .. }) => self.bonded_hydrogen += 1,
            (UnitKind::Oxygen, UnitOutcome::Exhausted) => self.exhausted_oxygen += 1,
            (UnitKind::Hydrogen, UnitOutcome::Exhausted) => self.exhausted_hydrogen += 1,
        }
    }
}

/// One configured run: shared state, log and seed.
pub struct Simulation<W: Write + Send + 'static> {
    config: SimulationConfig,
    seed: u64,
    coordinator: Arc<Coordinator>,
    log: Arc<EventLog<W>>,
}

impl<W: Write + Send + 'static> Simulation<W> {
    /// Validates `config` and builds the shared state around `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`H2oError::InvalidConfig`] if the config is out of range.
    pub fn new(config: SimulationConfig, writer: W) -> H2oResult<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(clock_seed);
        Ok(Self {
            config,
            seed,
            coordinator: Arc::new(Coordinator::new(config.oxygen, config.hydrogen)),
            log: Arc::new(EventLog::new(writer)),
        })
    }

    /// The run's configuration.
    #[must_use]
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Shared coordinator, for inspection.
    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    /// Runs with one OS thread per unit.
    ///
    /// # Errors
    ///
    /// See [`Simulation::run_with`].
    pub fn run(&self) -> H2oResult<RunReport> {
        self.run_with(&mut ThreadSpawner)
    }

    /// Spawns every oxygen, then every hydrogen unit, and joins them all.
    ///
    /// # Errors
    ///
    /// - [`H2oError::Spawn`] if a unit could not be started; all units
    ///   already running are drained through the shutdown cascade first.
    /// - [`H2oError::UnitPanicked`] if a unit panicked.
    /// - [`H2oError::LogWrite`] if the event log could not be written.
    pub fn run_with<S: UnitSpawner>(&self, spawner: &mut S) -> H2oResult<RunReport> {
        tracing::info!(
            "starting run: NO={} NH={} TI={}ms TB={}ms seed={}",
            self.config.oxygen,
            self.config.hydrogen,
            self.config.max_startup_delay_ms,
            self.config.max_build_delay_ms,
            self.seed
        );

        let ids = (1..=self.config.oxygen)
            .map(|i| UnitId::new(UnitKind::Oxygen, i))
            .chain((1..=self.config.hydrogen).map(|i| UnitId::new(UnitKind::Hydrogen, i)));

        let mut handles = Vec::with_capacity(usize::try_from(self.config.total_units()).unwrap_or(0));
        for id in ids {
            let unit = Unit::new(id, &self.config, self.seed);
            let coordinator = Arc::clone(&self.coordinator);
            let log = Arc::clone(&self.log);

            match spawner.spawn(id, Box::new(move || unit.run(&*coordinator, &*log))) {
                Ok(handle) => handles.push((id, handle)),
                Err(source) => {
                    tracing::warn!("failed to spawn {}: {}, draining {} units", id, source, handles.len());
                    self.coordinator.abort();
                    // Outcomes no longer matter; the run has failed.
                    let _ = join_all(handles);
                    return Err(H2oError::Spawn { unit: id, source });
                }
            }
        }

        let mut report = join_all(handles)?;
        if let Some(err) = self.log.take_failure() {
            return Err(H2oError::LogWrite(err));
        }

        report.molecules = self.coordinator.snapshot().molecules_formed;
        report.log_lines = self.log.lines_written();
        report.seed = self.seed;
        tracing::info!(
            "run finished: {} molecules, {} O and {} H left over, {} log lines",
            report.molecules,
            report.exhausted_oxygen,
            report.exhausted_hydrogen,
            report.log_lines
        );
        Ok(report)
    }
}

/// Joins every handle, even after one has panicked.
fn join_all(handles: Vec<(UnitId, JoinHandle<UnitOutcome>)>) -> H2oResult<RunReport> {
    let mut report = RunReport::default();
    let mut panicked = None;
    for (id, handle) in handles {
        match handle.join() {
            Ok(outcome) => report.tally(id, outcome),
            Err(_) => {
                tracing::warn!("{} panicked", id);
                panicked.get_or_insert(id);
            }
        }
    }
    match panicked {
        Some(unit) => Err(H2oError::UnitPanicked { unit }),
        None => Ok(report),
    }
}

/// Seed for runs without `H2O_SEED`.
fn clock_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_nanos());
    #[allow(clippy::cast_possible_truncation)]
    let nanos = nanos as u64;
    nanos ^ u64::from(std::process::id())
}
