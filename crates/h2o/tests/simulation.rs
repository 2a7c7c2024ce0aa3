//! # Simulation Verification Tests
//!
//! End-to-end runs on real threads. Every log produced here is audited for:
//!
//! 1. Contiguous sequence numbers from 1
//! 2. Exactly 1 O + 2 H credits per molecule, each after its "creating" line
//! 3. `min(NO, NH / 2)` molecules, everyone else leaving through the cascade
//!
//! Run with: cargo test -p h2o --test simulation

use std::path::PathBuf;
use std::process::Command;

use h2o::{RunReport, Simulation, SimulationConfig};
use h2o_core::{audit, AuditSummary, MemorySink};
use proptest::prelude::*;

fn run(config: SimulationConfig) -> (RunReport, AuditSummary, Vec<String>) {
    let sink = MemorySink::new();
    let report = Simulation::new(config, sink.clone())
        .expect("valid config")
        .run()
        .expect("run completes");
    let lines = sink.lines();
    let summary = audit(&lines).unwrap_or_else(|err| panic!("audit failed: {err}\n{lines:#?}"));
    (report, summary, lines)
}

fn temp_log_path(tag: &str) -> PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("h2o_{tag}_{id}.out"))
}

// ============================================================================
// SCENARIOS
// ============================================================================

#[test]
fn test_one_oxygen_two_hydrogen_forms_one_molecule() {
    let (report, summary, lines) = run(SimulationConfig::new(1, 2, 0, 0));

    assert_eq!(report.molecules, 1);
    assert_eq!(summary.molecules, 1);
    let created: Vec<_> = lines.iter().filter(|l| l.ends_with("created")).collect();
    assert_eq!(created.len(), 3);
    assert!(created.iter().all(|l| l.ends_with("molecule 1 created")));
    // started + going to queue + creating + created, three units
    assert_eq!(report.log_lines, 12);
}

#[test]
fn test_surplus_oxygen_reports_not_enough_hydrogen() {
    let (report, summary, lines) = run(SimulationConfig::new(5, 2, 0, 0));

    assert_eq!(report.molecules, 1);
    assert_eq!(report.exhausted_oxygen, 4);
    assert_eq!(summary.oxygen_exits, 4);
    assert_eq!(
        lines.iter().filter(|l| l.ends_with(": not enough H")).count(),
        4
    );
}

#[test]
fn test_no_oxygen_shuts_down_immediately() {
    let (report, summary, lines) = run(SimulationConfig::new(0, 5, 0, 0));

    assert_eq!(report.molecules, 0);
    assert_eq!(report.exhausted_hydrogen, 5);
    assert_eq!(summary.hydrogen_exits, 5);
    assert!(lines.iter().all(|l| !l.contains("creating")));
}

#[test]
fn test_single_hydrogen_shuts_down_immediately() {
    let (report, _, _) = run(SimulationConfig::new(3, 1, 0, 0));
    assert_eq!(report.molecules, 0);
    assert_eq!(report.exhausted_oxygen, 3);
    assert_eq!(report.exhausted_hydrogen, 1);
}

#[test]
fn test_leftover_hydrogen_after_last_oxygen() {
    let (report, summary, _) = run(SimulationConfig::new(2, 7, 0, 0));
    assert_eq!(report.molecules, 2);
    assert_eq!(report.exhausted_hydrogen, 3);
    assert_eq!(summary.hydrogen_exits, 3);
}

#[test]
fn test_many_units_with_delays() {
    let (report, summary, _) = run(SimulationConfig::new(20, 35, 10, 5));
    assert_eq!(report.molecules, 17);
    assert_eq!(summary.molecules, 17);
    assert_eq!(report.bonded_oxygen, 17);
    assert_eq!(report.bonded_hydrogen, 34);
    assert_eq!(report.exhausted_oxygen, 3);
    assert_eq!(report.exhausted_hydrogen, 1);
}

#[test]
fn test_molecule_count_ignores_delays() {
    for (ti, tb) in [(0, 0), (3, 0), (0, 3), (5, 5)] {
        let (report, _, _) = run(SimulationConfig::new(4, 9, ti, tb));
        assert_eq!(report.molecules, 4, "TI={ti} TB={tb}");
    }
}

// ============================================================================
// BINARY
// ============================================================================

#[test]
fn test_binary_writes_log_and_exits_zero() {
    let path = temp_log_path("ok");
    let status = Command::new(env!("CARGO_BIN_EXE_h2o"))
        .args(["1", "2", "0", "0"])
        .env("H2O_OUTPUT", &path)
        .env("H2O_SEED", "5")
        .status()
        .expect("binary runs");

    assert_eq!(status.code(), Some(0));
    let contents = std::fs::read_to_string(&path).expect("log written");
    let summary = audit(contents.lines()).expect("clean log");
    assert_eq!(summary.molecules, 1);
    std::fs::remove_file(&path).ok();
}

#[test]
fn test_binary_rejects_bad_arguments_without_creating_log() {
    for args in [
        ["1", "2", "2000", "0"],
        ["1", "2", "0", "abc"],
        ["0", "2", "0", "0"],
    ] {
        let path = temp_log_path("bad");
        let output = Command::new(env!("CARGO_BIN_EXE_h2o"))
            .args(args)
            .env("H2O_OUTPUT", &path)
            .output()
            .expect("binary runs");

        assert_eq!(output.status.code(), Some(1), "args {args:?}");
        assert!(!output.stderr.is_empty());
        assert!(!path.exists(), "log created for {args:?}");
    }

    let path = temp_log_path("arity");
    let output = Command::new(env!("CARGO_BIN_EXE_h2o"))
        .args(["1", "2", "0"])
        .env("H2O_OUTPUT", &path)
        .output()
        .expect("binary runs");
    assert_eq!(output.status.code(), Some(1));
    assert!(!path.exists());
}

#[test]
fn test_binary_reports_unwritable_log() {
    let path = std::env::temp_dir()
        .join("h2o_missing_dir_for_test")
        .join("nested")
        .join("h2o.out");
    let output = Command::new(env!("CARGO_BIN_EXE_h2o"))
        .args(["1", "2", "0", "0"])
        .env("H2O_OUTPUT", &path)
        .output()
        .expect("binary runs");
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not open log file"));
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_molecules_are_min_of_supply(oxygen in 0u32..8, hydrogen in 0u32..14, tb in 0u32..3) {
        let config = SimulationConfig::new(oxygen, hydrogen, 0, tb);
        let (report, summary, _) = run(config);

        let expected = oxygen.min(hydrogen / 2);
        prop_assert_eq!(report.molecules, expected);
        prop_assert_eq!(summary.molecules, expected);
        prop_assert_eq!(report.bonded_oxygen, expected);
        prop_assert_eq!(report.bonded_hydrogen, 2 * expected);
        prop_assert_eq!(report.exhausted_oxygen, oxygen - expected);
        prop_assert_eq!(report.exhausted_hydrogen, hydrogen - 2 * expected);
    }
}
