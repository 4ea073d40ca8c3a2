//! End-to-end `import` runs against directory-backed storage and commit
//! targets.

mod common;

use std::fs;

use assert_cmd::Command;
use common::TestWorkspace;
use predicates::str::contains;
use serde_json::Value;

const READINGS_A: &str = "timestamp,power_kw\n\
                          2024-03-01 00:00:00,57.2\n\
                          2024-03-01 00:15:00,63.8\n";
const READINGS_B: &str = "timestamp,power_kw\n\
                          2024-03-01 00:00:00,12.5\n";

fn ingest_cmd() -> Command {
    Command::cargo_bin("scada-ingest").expect("binary exists")
}

fn read_commit(workspace: &TestWorkspace, name: &str) -> Value {
    let path = workspace.path().join("commits").join(name);
    let contents = fs::read_to_string(&path).expect("read commit document");
    serde_json::from_str(&contents).expect("parse commit document")
}

#[test]
fn import_commits_each_file_and_stores_raw_uploads() {
    let workspace = TestWorkspace::new();
    let input_a = workspace.write("a.csv", READINGS_A);
    let input_b = workspace.write("b.csv", READINGS_B);
    let storage_dir = workspace.path().join("uploads");
    let commit_dir = workspace.path().join("commits");

    ingest_cmd()
        .args([
            "import",
            "-i",
            input_a.to_str().unwrap(),
            "-i",
            input_b.to_str().unwrap(),
            "--batch-key",
            "night-run",
            "--storage-dir",
            storage_dir.to_str().unwrap(),
            "--commit-dir",
            commit_dir.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(contains("done"));

    // Raw bytes land untouched under the batch key.
    let stored = fs::read_to_string(storage_dir.join("night-run").join("a.csv"))
        .expect("read stored upload");
    assert_eq!(stored, READINGS_A);

    let document = read_commit(&workspace, "a.json");
    assert_eq!(document["file_name"], "a.csv");
    assert_eq!(document["association_id"], Value::Null);
    assert_eq!(
        document["headers"],
        serde_json::json!(["timestamp", "power_kw"])
    );
    assert_eq!(
        document["rows"],
        serde_json::json!([
            ["2024-03-01 00:00:00", "57.2"],
            ["2024-03-01 00:15:00", "63.8"]
        ])
    );
    assert_eq!(document["columns"][0]["data_type"], "DateTime");

    let second = read_commit(&workspace, "b.json");
    assert_eq!(second["file_name"], "b.csv");
}

#[test]
fn import_carries_associations_into_commit_documents() {
    let workspace = TestWorkspace::new();
    let input_a = workspace.write("a.csv", READINGS_A);
    let input_b = workspace.write("b.csv", READINGS_B);

    ingest_cmd()
        .args([
            "import",
            "-i",
            input_a.to_str().unwrap(),
            "-i",
            input_b.to_str().unwrap(),
            "--batch-key",
            "assoc-run",
            "--storage-dir",
            workspace.path().join("uploads").to_str().unwrap(),
            "--commit-dir",
            workspace.path().join("commits").to_str().unwrap(),
            "--associate",
            "a.csv=meter-17",
        ])
        .assert()
        .success();

    let document = read_commit(&workspace, "a.json");
    assert_eq!(document["association_id"], "meter-17");
    let second = read_commit(&workspace, "b.json");
    assert_eq!(second["association_id"], Value::Null);
}

#[test]
fn import_rejects_a_duplicate_association_id() {
    let workspace = TestWorkspace::new();
    let input_a = workspace.write("a.csv", READINGS_A);
    let input_b = workspace.write("b.csv", READINGS_B);

    ingest_cmd()
        .args([
            "import",
            "-i",
            input_a.to_str().unwrap(),
            "-i",
            input_b.to_str().unwrap(),
            "--storage-dir",
            workspace.path().join("uploads").to_str().unwrap(),
            "--commit-dir",
            workspace.path().join("commits").to_str().unwrap(),
            "--associate",
            "a.csv=meter-17",
            "--associate",
            "b.csv=meter-17",
        ])
        .assert()
        .failure()
        .stderr(contains("Associating 'b.csv'"));
}

#[test]
fn import_rejects_inputs_that_share_a_file_name() {
    let workspace = TestWorkspace::new();
    let first = workspace.write("plant-a/readings.csv", READINGS_A);
    let second = workspace.write("plant-b/readings.csv", READINGS_B);
    let storage_dir = workspace.path().join("uploads");
    let commit_dir = workspace.path().join("commits");

    ingest_cmd()
        .args([
            "import",
            "-i",
            first.to_str().unwrap(),
            "-i",
            second.to_str().unwrap(),
            "--batch-key",
            "twin-run",
            "--storage-dir",
            storage_dir.to_str().unwrap(),
            "--commit-dir",
            commit_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("Duplicate input file name 'readings.csv'"));

    // The batch was rejected before anything touched storage.
    assert!(!storage_dir.exists());
    assert!(!commit_dir.exists());
}

#[test]
fn import_fails_the_run_when_any_file_fails() {
    let workspace = TestWorkspace::new();
    let good = workspace.write("good.csv", READINGS_A);
    let bad = workspace.write("bad.pdf", "%PDF-1.7");
    let commit_dir = workspace.path().join("commits");

    ingest_cmd()
        .args([
            "import",
            "-i",
            good.to_str().unwrap(),
            "-i",
            bad.to_str().unwrap(),
            "--batch-key",
            "mixed-run",
            "--storage-dir",
            workspace.path().join("uploads").to_str().unwrap(),
            "--commit-dir",
            commit_dir.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stdout(contains("Unsupported file format"))
        .stderr(contains("1 of 2 file(s) failed to import"));

    // The healthy file still went all the way through.
    let document = read_commit(&workspace, "good.json");
    assert_eq!(document["file_name"], "good.csv");
    assert!(!commit_dir.join("bad.json").exists());
}

#[test]
fn import_separator_override_beats_detection() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("levels.csv", "tank;level\nT1;4.25\n");

    ingest_cmd()
        .args([
            "import",
            "-i",
            input.to_str().unwrap(),
            "--batch-key",
            "forced-comma",
            "--storage-dir",
            workspace.path().join("uploads").to_str().unwrap(),
            "--commit-dir",
            workspace.path().join("commits").to_str().unwrap(),
            "--separator",
            "comma",
        ])
        .assert()
        .success();

    // Under a comma separator the semicolon line never splits.
    let document = read_commit(&workspace, "levels.json");
    assert_eq!(document["headers"], serde_json::json!(["tank;level"]));
    assert_eq!(document["rows"], serde_json::json!([["T1;4.25"]]));
}

#[test]
fn import_applies_a_stored_profile() {
    let workspace = TestWorkspace::new();
    let input = workspace.write("readings.csv", READINGS_A);
    let profile_path = workspace.path().join("readings.profile.yaml");
    ingest_cmd()
        .args([
            "probe",
            "-i",
            input.to_str().unwrap(),
            "-p",
            profile_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    ingest_cmd()
        .args([
            "import",
            "-i",
            input.to_str().unwrap(),
            "--batch-key",
            "profiled-run",
            "--storage-dir",
            workspace.path().join("uploads").to_str().unwrap(),
            "--commit-dir",
            workspace.path().join("commits").to_str().unwrap(),
            "-p",
            profile_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let document = read_commit(&workspace, "readings.json");
    assert_eq!(
        document["headers"],
        serde_json::json!(["timestamp", "power_kw"])
    );
    assert_eq!(document["columns"][0]["data_type"], "DateTime");
}
