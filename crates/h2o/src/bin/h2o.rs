//! # H2O Simulation
//!
//! ## Usage
//!
//! ```bash
//! h2o NO NH TI TB
//! RUST_LOG=debug H2O_SEED=7 h2o 3 7 100 100
//! ```
//!
//! The event log goes to `h2o.out` (or `$H2O_OUTPUT`); diagnostics go to
//! stderr. Exit code 0 on a completed run, 1 on any error.

use std::fs::File;
use std::process::ExitCode;

use h2o::{cli, H2oError, H2oResult, RunReport, Settings, Simulation};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(report) => {
            tracing::info!(
                "{} molecules formed ({} O, {} H bonded)",
                report.molecules,
                report.bonded_oxygen,
                report.bonded_hydrogen
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

fn run() -> H2oResult<RunReport> {
    // Arguments first: a rejected command line must not create the log.
    let config = cli::parse_args(std::env::args().skip(1))?;
    let settings = Settings::from_env()?;
    let config = settings.apply(config);

    let file = File::create(&settings.output).map_err(|source| H2oError::LogOpen {
        path: settings.output.clone(),
        source,
    })?;

    Simulation::new(config, file)?.run()
}
