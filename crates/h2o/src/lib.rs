//! # H2O
//!
//! Runs the water rendezvous simulation: parses `NO NH TI TB`, opens the
//! event log and drives one thread per unit through [`h2o_core`].
//!
//! ## Example
//!
//! ```rust,ignore
//! use h2o::{Simulation, SimulationConfig};
//! use h2o_core::MemorySink;
//!
//! let sink = MemorySink::new();
//! let report = Simulation::new(SimulationConfig::new(3, 6, 0, 0), sink.clone())?.run()?;
//! assert_eq!(report.molecules, 3);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cli;
pub mod run;

pub use cli::{parse_args, Settings};
pub use h2o_core::{H2oError, H2oResult, SimulationConfig};
pub use run::{RunReport, Simulation, ThreadSpawner, UnitSpawner, UnitTask};
