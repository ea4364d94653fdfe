//! CLI smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_commands() {
    Command::cargo_bin("keylift")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn info_prints_calibrated_layout() {
    Command::cargo_bin("keylift")
        .unwrap()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("850x1100"))
        .stdout(predicate::str::contains("English"))
        .stdout(predicate::str::contains("POW, KLA, CSE"));
}

#[test]
fn scan_rejects_bad_test_code() {
    Command::cargo_bin("keylift")
        .unwrap()
        .args(["scan", "-r", ".", "-c", ".", "-t", "april"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("yyyymm"));
}

#[test]
fn scan_reports_missing_input_directory() {
    Command::cargo_bin("keylift")
        .unwrap()
        .args(["scan", "-r", "/nonexistent/refs", "-c", "/nonexistent/caps", "-t", "202304"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn scan_requires_arguments() {
    Command::cargo_bin("keylift")
        .unwrap()
        .arg("scan")
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}
