//! # Command Line
//!
//! ```bash
//! h2o NO NH TI TB
//! ```
//!
//! | Arg | Meaning                           | Range          |
//! |-----|-----------------------------------|----------------|
//! | NO  | oxygen units                      | 1 ..= u32::MAX |
//! | NH  | hydrogen units                    | 1 ..= u32::MAX |
//! | TI  | max startup delay (ms)            | 0 ..= 1000     |
//! | TB  | max molecule build delay (ms)     | 0 ..= 1000     |
//!
//! Environment:
//!
//! - `H2O_OUTPUT` - log path (default `h2o.out`)
//! - `H2O_SEED` - fixed seed for the delay generators
//! - `RUST_LOG` - diagnostics filter (stderr)

use std::path::PathBuf;

use h2o_core::{H2oError, H2oResult, SimulationConfig, MAX_DELAY_MS};

/// Default log file name.
pub const DEFAULT_OUTPUT: &str = "h2o.out";

/// Environment variable overriding the log path.
pub const OUTPUT_ENV: &str = "H2O_OUTPUT";

/// Environment variable fixing the delay seed.
pub const SEED_ENV: &str = "H2O_SEED";

/// Parses one unsigned decimal argument and checks it against `min..=max`.
///
/// Only plain ASCII digits are accepted: no sign, no whitespace.
///
/// # Errors
///
/// Returns [`H2oError::InvalidArgument`] on any format or range failure.
pub fn parse_argument(name: &'static str, value: &str, min: u32, max: u32) -> H2oResult<u32> {
    let invalid = |reason: String| H2oError::InvalidArgument {
        name,
        value: value.to_string(),
        reason,
    };

    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("not an unsigned integer".to_string()));
    }
    let number: u32 = value
        .parse()
        .map_err(|_| invalid(format!("must be in {min}..={max}")))?;
    if !(min..=max).contains(&number) {
        return Err(invalid(format!("must be in {min}..={max}")));
    }
    Ok(number)
}

/// Parses `NO NH TI TB` (program name already stripped).
///
/// # Errors
///
/// [`H2oError::ArgumentCount`] unless exactly four arguments are given,
/// otherwise the first [`H2oError::InvalidArgument`].
pub fn parse_args<I, S>(args: I) -> H2oResult<SimulationConfig>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let args: Vec<S> = args.into_iter().collect();
    let [no, nh, ti, tb] = args.as_slice() else {
        return Err(H2oError::ArgumentCount(args.len()));
    };

    Ok(SimulationConfig::new(
        parse_argument("NO", no.as_ref(), 1, u32::MAX)?,
        parse_argument("NH", nh.as_ref(), 1, u32::MAX)?,
        parse_argument("TI", ti.as_ref(), 0, MAX_DELAY_MS)?,
        parse_argument("TB", tb.as_ref(), 0, MAX_DELAY_MS)?,
    ))
}

/// Settings taken from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Where the event log is written.
    pub output: PathBuf,
    /// Fixed delay seed, if any.
    pub seed: Option<u64>,
}

impl Settings {
    /// Reads the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`H2oError::InvalidConfig`] if `H2O_SEED` is not a `u64`.
    pub fn from_env() -> H2oResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`H2oError::InvalidConfig`] if the seed is not a `u64`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> H2oResult<Self> {
        let output = lookup(OUTPUT_ENV)
            .filter(|path| !path.is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_OUTPUT), PathBuf::from);

        let seed = lookup(SEED_ENV)
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    H2oError::InvalidConfig(format!("{SEED_ENV}={raw:?} is not a u64"))
                })
            })
            .transpose()?;

        Ok(Self { output, seed })
    }

    /// Applies the settings that affect the simulation itself.
    #[must_use]
    pub fn apply(&self, config: SimulationConfig) -> SimulationConfig {
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}
