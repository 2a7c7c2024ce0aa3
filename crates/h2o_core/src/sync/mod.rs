//! # Synchronization Primitives for the Rendezvous
//!
//! ## The Problem
//!
//! ```text
//! O arrives:  needs 2 H already waiting, otherwise park
//! H arrives:  needs 1 O + 1 other H waiting, otherwise park
//! Matched:    1 O + 2 H must all see "created" before anyone leaves
//! ```
//!
//! ## The Pieces
//!
//! - [`AdmissionQueue`]: one per side. Parked units wait for a permit; the
//!   unit that completes a 1:2 ratio releases exactly the permits needed.
//! - [`CreationBarrier`]: reusable rendezvous for one creation party. It
//!   refuses new arrivals while the previous party is still leaving, so two
//!   molecules never mix.

mod admission;
mod barrier;

pub use admission::AdmissionQueue;
pub use barrier::{BarrierPhase, CreationBarrier};
