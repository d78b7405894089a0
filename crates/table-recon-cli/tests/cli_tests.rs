//! CLI integration tests for table-recon.
//!
//! These tests run the binary against the JSON fixtures in `tests/fixtures`
//! and verify output and exit codes for each outcome.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

const TARGET: &str = "PROD.SALES.ORDERS";
const SOURCE: &str = "EDW.SALES.ORDERS";

/// Get a command for the table-recon binary, run from an empty directory so
/// no stray recon.yaml is picked up.
fn cmd(workdir: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("table-recon").unwrap();
    cmd.current_dir(workdir.path());
    cmd
}

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Reconcile the standard source snapshot against a target payload fixture.
fn reconcile(workdir: &tempfile::TempDir, payload: &str) -> Command {
    let mut cmd = cmd(workdir);
    cmd.args([TARGET, SOURCE])
        .arg("--source-snapshot")
        .arg(fixture("source.json"))
        .arg("--target-payload")
        .arg(fixture(payload));
    cmd
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_arguments() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("<SNOWFLAKE_TABLE_NAME>"))
        .stdout(predicate::str::contains("<NETEZZA_TABLE_NAME>"))
        .stdout(predicate::str::contains("--date_column"))
        .stdout(predicate::str::contains("--start_date"))
        .stdout(predicate::str::contains("--end_date"))
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_version_flag() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("table-recon"));
}

#[test]
fn test_missing_table_names_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .arg(TARGET)
        .assert()
        .failure()
        .stderr(predicate::str::contains("NETEZZA_TABLE_NAME"));
}

// =============================================================================
// Outcome Tests
// =============================================================================

#[test]
fn test_matching_tables_pass() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Reconciliation passed"))
        .stdout(predicate::str::contains("All compared metrics match"));
}

#[test]
fn test_count_mismatch_exits_3() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_count_mismatch.json")
        .assert()
        .code(3)
        .stdout(predicate::str::contains("source=27 target=25"))
        .stdout(predicate::str::contains("Discrepancies").not())
        .stderr(predicate::str::contains("Row count mismatch"));
}

#[test]
fn test_data_mismatch_exits_4() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_data_mismatch.json")
        .assert()
        .code(4)
        .stdout(predicate::str::contains("NAME"))
        .stdout(predicate::str::contains("MAX_LENGTH"))
        .stderr(predicate::str::contains("1 discrepancies"));
}

#[test]
fn test_missing_column_exits_5() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_missing_column.json")
        .assert()
        .code(5)
        .stdout(predicate::str::contains("ACTIVE (missing from target)"));
}

#[test]
fn test_output_json() {
    let dir = tempfile::tempdir().unwrap();
    let output = reconcile(&dir, "target_data_mismatch.json")
        .arg("--output-json")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "data_mismatch");
    assert_eq!(json["source_table"], SOURCE);
    assert_eq!(json["target_table"], TARGET);
    let discrepancies = json["report"]["discrepancies"].as_array().unwrap();
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(discrepancies[0]["column"], "NAME");
    assert_eq!(discrepancies[0]["source_value"], 20);
    assert_eq!(discrepancies[0]["target_value"], 22);
}

#[test]
fn test_date_filter_applied_to_source() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args([TARGET, SOURCE])
        .args(["--date_column", "CREATED_AT", "--start-date", "2023-01-01"])
        .arg("--source-snapshot")
        .arg(fixture("source_filtered.json"))
        .arg("--target-payload")
        .arg(fixture("target_filtered.json"))
        .assert()
        .code(0)
        .stdout(predicate::str::contains("Filter: \"CREATED_AT\" > '2023-01-01'"));
}

#[test]
fn test_date_column_matches_catalog_case_insensitively() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args([TARGET, SOURCE])
        .args(["--date_column", "created_at", "--start_date", "2023-01-01"])
        .arg("--source-snapshot")
        .arg(fixture("source_filtered.json"))
        .arg("--target-payload")
        .arg(fixture("target_filtered.json"))
        .assert()
        .code(0);
}

#[test]
fn test_unknown_date_column_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .args(["--date_column", "LOAD_DT", "--start_date", "2023-01-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("LOAD_DT"));
}

#[test]
fn test_snapshot_filter_mismatch_is_source_error() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .args(["--date_column", "CREATED_AT", "--end_date", "2024-01-01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Source warehouse error"));
}

// =============================================================================
// Configuration Error Tests
// =============================================================================

#[test]
fn test_bound_without_date_column_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .args(["--start_date", "2023-01-01"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--date_column"));
}

#[test]
fn test_empty_date_range_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .args([
            "--date_column",
            "CREATED_AT",
            "--start_date",
            "2023-02-01",
            "--end_date",
            "2023-01-01",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("empty date range"));
}

#[test]
fn test_invalid_date_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .args(["--date_column", "CREATED_AT", "--start_date", "01/02/2023"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid date bound"));
}

#[test]
fn test_unqualified_table_name_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args([TARGET, "ORDERS"])
        .arg("--source-snapshot")
        .arg(fixture("source.json"))
        .arg("--target-payload")
        .arg(fixture("target_pass.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("DB.SCHEMA.TABLE"));
}

#[test]
fn test_missing_config_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    cmd(&dir)
        .args([TARGET, SOURCE])
        .args(["--config", "/nonexistent/recon.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}

#[test]
fn test_config_file_selects_drivers() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("recon.yaml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(
        file,
        "source:\n  kind: snapshot\n  snapshot_path: {:?}\ntarget:\n  kind: file\n  payload_path: {:?}\nreconcile:\n  profile_concurrency: 2\n",
        fixture("source.json"),
        fixture("target_pass.json")
    )
    .unwrap();

    cmd(&dir).args([TARGET, SOURCE]).assert().code(0);
}

#[test]
fn test_invalid_config_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("bad.yaml");
    std::fs::write(&config_path, "reconcile:\n  profile_concurrency: 0\n").unwrap();

    cmd(&dir)
        .args([TARGET, SOURCE])
        .arg("--config")
        .arg(&config_path)
        .arg("--source-snapshot")
        .arg(fixture("source.json"))
        .arg("--target-payload")
        .arg(fixture("target_pass.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("profile_concurrency"));
}

#[cfg(not(feature = "odbc"))]
#[test]
fn test_odbc_kind_without_feature_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("odbc.yaml");
    std::fs::write(
        &config_path,
        "source:\n  kind: odbc\n  connection_string: \"DSN=NZ\"\n",
    )
    .unwrap();

    cmd(&dir)
        .args([TARGET, SOURCE])
        .arg("--config")
        .arg(&config_path)
        .arg("--target-payload")
        .arg(fixture("target_pass.json"))
        .assert()
        .code(2)
        .stderr(predicate::str::contains("'odbc' feature"));
}

#[test]
fn test_invalid_log_format_exits_2() {
    let dir = tempfile::tempdir().unwrap();
    reconcile(&dir, "target_pass.json")
        .args(["--log-format", "xml"])
        .assert()
        .code(2);
}

#[test]
fn test_json_logs_go_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let output = reconcile(&dir, "target_pass.json")
        .args(["--log-format", "json", "--output-json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["status"], "passed");
    assert!(String::from_utf8_lossy(&output.stderr).contains("\"level\""));
}
