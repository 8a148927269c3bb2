//! CLI output integration tests.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::path::{Path, PathBuf};

fn surebet(config_dir: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("surebet");
    cmd.arg("--config")
        .arg(config_dir.join("Surebet.toml"))
        .env_remove("RUST_LOG");
    cmd
}

fn sample_snapshot() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/snapshot.json")
}

#[test]
fn test_help() {
    let dir = tempfile::tempdir().unwrap();
    surebet(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("correlate"))
        .stdout(predicate::str::contains("demo"))
        .stdout(predicate::str::contains("similarity"));
}

#[test]
fn test_demo_reports_one_accepted_plan() {
    let dir = tempfile::tempdir().unwrap();
    surebet(dir.path())
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 accepted, 1 discarded"))
        .stdout(predicate::str::contains("ACCEPTED Fc Barcelona vs Sevilla"))
        .stdout(predicate::str::contains("DISCARDED Real vs City: unprofitable"));
}

#[test]
fn test_correlate_snapshot_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = surebet(dir.path())
        .args(["correlate", "--json", "--snapshot"])
        .arg(sample_snapshot())
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["stats"]["accepted"], 1);
    assert_eq!(report["stats"]["batches"], 3);
    assert_eq!(report["accepted"][0]["plan"]["state"], "masked");
}

#[test]
fn test_target_override_changes_outcome() {
    let dir = tempfile::tempdir().unwrap();
    surebet(dir.path())
        .args(["correlate", "--target", "2000", "--snapshot"])
        .arg(sample_snapshot())
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCEPTED Barcelona vs Sevilla"))
        .stdout(predicate::str::contains("profit 150"))
        .stdout(predicate::str::contains("DISCARDED Real vs City: unprofitable"));
}

#[test]
fn test_profile_overlay_switches_strategy() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("Surebet.toml"), "[engine]\nrounding_multiple = 50\n").unwrap();
    std::fs::write(
        dir.path().join("Surebet.strict.toml"),
        "[matcher]\nstrategy = \"exact\"\n",
    )
    .unwrap();

    // Demo names are only title-cased, so "Fc Barcelona" no longer matches.
    surebet(dir.path())
        .args(["--profile", "strict", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 accepted"));
}

#[test]
fn test_missing_snapshot_fails() {
    let dir = tempfile::tempdir().unwrap();
    surebet(dir.path())
        .args(["correlate", "--snapshot"])
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read snapshot"));
}

#[test]
fn test_invalid_override_fails() {
    let dir = tempfile::tempdir().unwrap();
    surebet(dir.path())
        .args(["demo", "--multiple", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rounding_multiple"));
}

#[test]
fn test_similarity_lists_every_metric() {
    let dir = tempfile::tempdir().unwrap();
    surebet(dir.path())
        .args(["similarity", "FC Barcelona", "Barcelona"])
        .assert()
        .success()
        .stdout(predicate::str::contains("indel"))
        .stdout(predicate::str::contains("0.8571  match"))
        .stdout(predicate::str::contains("jaro_winkler"))
        .stdout(predicate::str::contains("sorensen_dice"));
}
