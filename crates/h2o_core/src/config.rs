//! # Simulation Configuration
//!
//! Immutable run parameters. Every unit gets its own copy at spawn time.

use std::time::Duration;

use crate::error::{H2oError, H2oResult};

/// Upper bound for both delay parameters, in milliseconds.
pub const MAX_DELAY_MS: u32 = 1000;

/// Parameters for one simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Total oxygen units (`NO`).
    pub oxygen: u32,
    /// Total hydrogen units (`NH`).
    pub hydrogen: u32,
    /// Maximum "time to prepare" before queueing (`TI`), milliseconds.
    pub max_startup_delay_ms: u32,
    /// Maximum bond formation time (`TB`), milliseconds.
    pub max_build_delay_ms: u32,
    /// Seed for the delay generators. `None` seeds from the clock.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    /// Creates a config with no fixed seed.
    #[must_use]
    pub const fn new(
        oxygen: u32,
        hydrogen: u32,
        max_startup_delay_ms: u32,
        max_build_delay_ms: u32,
    ) -> Self {
        Self {
            oxygen,
            hydrogen,
            max_startup_delay_ms,
            max_build_delay_ms,
            seed: None,
        }
    }

    /// Returns the config with a fixed seed.
    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the delay bounds.
    ///
    /// Zero oxygen or fewer than two hydrogen is accepted here: such a run
    /// forms no molecule and every unit leaves through the shutdown cascade.
    ///
    /// # Errors
    ///
    /// Returns [`H2oError::InvalidConfig`] if a delay exceeds [`MAX_DELAY_MS`].
    pub fn validate(&self) -> H2oResult<()> {
        for (name, value) in [
            ("max_startup_delay_ms", self.max_startup_delay_ms),
            ("max_build_delay_ms", self.max_build_delay_ms),
        ] {
            if value > MAX_DELAY_MS {
                return Err(H2oError::InvalidConfig(format!(
                    "{name} = {value} exceeds {MAX_DELAY_MS}"
                )));
            }
        }
        Ok(())
    }

    /// Molecules this supply can form: `min(NO, NH / 2)`.
    #[must_use]
    pub const fn expected_molecules(&self) -> u32 {
        let by_hydrogen = self.hydrogen / 2;
        if self.oxygen < by_hydrogen {
            self.oxygen
        } else {
            by_hydrogen
        }
    }

    /// Total units of both kinds.
    #[must_use]
    pub const fn total_units(&self) -> u64 {
        self.oxygen as u64 + self.hydrogen as u64
    }

    /// Startup delay bound as a duration.
    #[must_use]
    pub const fn max_startup_delay(&self) -> Duration {
        Duration::from_millis(self.max_startup_delay_ms as u64)
    }

    /// Build delay bound as a duration.
    #[must_use]
    pub const fn max_build_delay(&self) -> Duration {
        Duration::from_millis(self.max_build_delay_ms as u64)
    }
}
