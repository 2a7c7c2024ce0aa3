//! # H2O Core
//!
//! Water synthesis as a synchronization protocol. Oxygen and hydrogen units
//! arrive independently and must meet in a strict 1:2 ratio:
//!
//! - **Pairing** - whichever arrival completes a 1:2 ratio reserves the
//!   molecule and releases exactly one oxygen and two hydrogen.
//! - **Creation** - the three participants rendezvous on a reusable barrier,
//!   so all of them credit the same molecule number before any moves on.
//! - **Shutdown** - once the remaining supply cannot form another molecule,
//!   a sticky flag is raised and every parked unit is woken in a chain and
//!   leaves.
//!
//! ## Architecture Rules
//!
//! 1. **One shared record** - units share only the [`Coordinator`] and the
//!    [`EventLog`], both passed in explicitly.
//! 2. **Scoped locking** - no guard outlives the call that took it; the
//!    exclusion held across a creation party is explicit state.
//! 3. **No unit waits forever** - every transition that can leave a unit
//!    parked also guarantees a future release.
//!
//! ## Example
//!
//! ```rust,ignore
//! use h2o_core::{Coordinator, EventLog, MemorySink, SimulationConfig, Unit, UnitId, UnitKind};
//!
//! let config = SimulationConfig::new(1, 2, 0, 0);
//! let coordinator = Coordinator::new(config.oxygen, config.hydrogen);
//! let log = EventLog::new(MemorySink::new());
//! // Spawn one thread per unit, each calling `Unit::run(&coordinator, &log)`.
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod audit;
pub mod config;
pub mod error;
pub mod log;
pub mod protocol;
pub mod state;
pub mod sync;

pub use audit::{audit, AuditError, AuditSummary};
pub use config::{SimulationConfig, MAX_DELAY_MS};
pub use error::{H2oError, H2oResult};
pub use log::{Event, EventLog, LogLine, MemorySink, UnitId, UnitKind};
pub use protocol::{Unit, UnitOutcome};
pub use state::{Coordinator, Snapshot, SupplyVerdict};
pub use sync::{AdmissionQueue, BarrierPhase, CreationBarrier};
