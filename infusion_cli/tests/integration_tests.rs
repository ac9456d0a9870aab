//! Integration tests for the infuse binary.
//!
//! These tests verify end-to-end behavior including:
//! - Dose/rate conversion with clamping notices
//! - Display order management and persistence
//! - Per-drug edits and resets
//! - Recovery from corrupted settings files

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a test data directory
fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

/// Helper to get the path to the CLI binary
fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("infuse"))
}

fn saved_order(data_dir: &Path) -> Vec<String> {
    let json = fs::read_to_string(data_dir.join("settings/drug_order.json"))
        .expect("Failed to read saved order");
    serde_json::from_str(&json).expect("Saved order is not a JSON list")
}

#[test]
fn test_cli_help() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Infusion dose-rate and flow-rate converter",
        ));
}

#[test]
fn test_default_command_converts_startup_drug() {
    let temp_dir = setup_test_dir();

    cli()
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Norepinephrine"))
        .stdout(predicate::str::contains("Dose: 0.03 µg/kg/min"))
        .stdout(predicate::str::contains("Rate: 0.9 ml/hr"));

    assert!(temp_dir.path().join("settings/initial_drug.json").exists());
}

#[test]
fn test_convert_dose_to_rate() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["convert", "--drug", "norepinephrine", "--weight", "50", "--dose", "0.1"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Concentration: 100.0 µg/ml"))
        .stdout(predicate::str::contains("Rate: 3 ml/hr"));
}

#[test]
fn test_convert_rate_to_dose() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["convert", "--drug", "norepinephrine", "--weight", "50", "--rate", "3"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dose: 0.1 µg/kg/min"));
}

#[test]
fn test_convert_out_of_range_dose_is_clamped() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["convert", "--drug", "norepinephrine", "--dose", "0.5"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Dose: 0.3 µg/kg/min"))
        .stdout(predicate::str::contains("! Dose must be within 0\u{2013}0.3"))
        .stdout(predicate::str::contains("HIGH DOSE"));
}

#[test]
fn test_convert_rejects_invalid_recipe() {
    let temp_dir = setup_test_dir();

    cli()
        .args([
            "convert", "--drug", "norepinephrine", "--amount", "5", "--unit", "mg", "--volume",
            "0",
        ])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("! Concentration must be within"))
        .stdout(predicate::str::contains("Recipe: 5 mg / 50 ml"));
}

#[test]
fn test_convert_accepts_shipped_strong_recipe() {
    let temp_dir = setup_test_dir();

    cli()
        .args([
            "convert", "--drug", "propofol", "--amount", "500", "--unit", "mg", "--volume", "50",
        ])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Concentration: 10000.0 µg/ml"))
        .stdout(predicate::str::contains("Rate: 20 ml/hr"))
        .stdout(predicate::str::contains("! Concentration").not());
}

#[test]
fn test_convert_ignores_nan_dose() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["convert", "--drug", "norepinephrine", "--dose", "NaN"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("! Dose must be a number"))
        .stdout(predicate::str::contains("Dose: 0.03 µg/kg/min"))
        .stdout(predicate::str::contains("Rate: 0.9 ml/hr"));
}

#[test]
fn test_convert_unknown_drug_fails() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["convert", "--drug", "aspirin"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure();
}

#[test]
fn test_disable_moves_drug_behind_enabled() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .args(["disable", "norepinephrine"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    let order = saved_order(data_dir);
    assert_eq!(order.len(), 13);
    assert_eq!(order[0], "dopamine");
    assert_eq!(order.last().unwrap(), "norepinephrine");

    // Startup drug follows the new head of the order
    cli()
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dopamine (dopamine)"));
}

#[test]
fn test_move_and_list() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .args(["move", "propofol", "0"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?m)^ 0\. \[x\] propofol .*\*$").unwrap());
}

#[test]
fn test_order_rejects_non_permutation() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["order", "propofol", "dopamine"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidOrder"));
}

#[test]
fn test_set_and_reset_drug() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .args(["set", "dopamine", "--dose-max", "15", "--danger-dose", "12"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated dopamine"));

    cli()
        .args(["show", "dopamine"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dose range: 0\u{2013}15 µg/kg/min"));

    cli()
        .args(["reset", "dopamine"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dopamine restored to defaults"));

    cli()
        .args(["show", "dopamine"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("Dose range: 0\u{2013}20 µg/kg/min"));
}

#[test]
fn test_set_rejects_invalid_danger_threshold() {
    let temp_dir = setup_test_dir();

    cli()
        .args(["set", "propofol", "--danger-dose", "50"])
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidDrugConfig"));
}

#[test]
fn test_reset_all_restores_natural_order() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    cli()
        .args(["disable", "dopamine"])
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();

    cli()
        .arg("reset")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("restored to defaults"));

    let order = saved_order(data_dir);
    assert_eq!(order[0], "norepinephrine");
    assert_eq!(order[1], "dopamine");
}

#[test]
fn test_corrupted_settings_fall_back_to_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    fs::create_dir_all(data_dir.join("settings")).unwrap();
    fs::write(
        data_dir.join("settings/drug_configs.json"),
        "{ invalid json }}}}",
    )
    .unwrap();

    cli()
        .arg("list")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("! Failed to load settings"))
        .stdout(predicate::str::contains("norepinephrine"));
}
