//! Corruption recovery tests for medtrack.
//!
//! These tests verify the binary keeps working with:
//! - Corrupted store files
//! - Records written by older app versions
//! - Unknown ids

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn cli(data_dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("medtrack"));
    cmd.env("XDG_CONFIG_HOME", data_dir.join("config"))
        .arg("--data-dir")
        .arg(data_dir)
        .arg("--date")
        .arg("2024-01-01");
    cmd
}

fn write_store(data_dir: &Path, key: &str, contents: &str) {
    let store = data_dir.join("store");
    fs::create_dir_all(&store).unwrap();
    fs::write(store.join(format!("{}.json", key)), contents).unwrap();
}

#[test]
fn test_corrupted_medicines_file_reads_as_empty() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(data_dir, "medicines", "{ invalid json }}}}");

    cli(data_dir)
        .arg("today")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing due"));

    // The next write replaces the corrupted value
    cli(data_dir)
        .args([
            "add", "--name", "Metformin", "--brand", "Teva", "--days", "Daily", "--time",
            "08:30", "--weight", "500",
        ])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("store/medicines.json")).unwrap();
    let medicines: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(medicines.len(), 1);
}

#[test]
fn test_corrupted_settings_fall_back_to_defaults() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(data_dir, "userInfo", "[1, 2");
    write_store(data_dir, "darkMode", "maybe");

    cli(data_dir)
        .args(["profile", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Name:"));

    cli(data_dir)
        .arg("dark-mode")
        .assert()
        .success()
        .stdout(predicate::str::contains("Dark mode: off"));
}

#[test]
fn test_legacy_string_fields_accepted() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(
        data_dir,
        "medicines",
        r#"[{"id":1700000000000,"name":"Levothyroxine","brand":"Sandoz","days":["Monday","Funday"],
            "time":"420","amount":"1","weight":"75","weightUnit":"mcg","stock":"28",
            "notificationEnabled":true}]"#,
    );

    cli(data_dir)
        .arg("today")
        .assert()
        .success()
        .stdout(predicate::str::contains("07:00  1x  Levothyroxine, Sandoz"));

    cli(data_dir)
        .arg("supply")
        .assert()
        .success()
        .stdout(predicate::str::contains("1700000000000"))
        .stdout(predicate::str::contains("75mcg"))
        .stdout(predicate::str::contains("28 days left, until 29-01-2024"));
}

#[test]
fn test_bad_record_does_not_hide_the_others() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(
        data_dir,
        "medicines",
        r#"[{"id":"a1","name":"Aspirin","brand":"Bayer","days":["Daily"],"time":480,"amount":1},
            {"id":"b2","name":"Broken","brand":"Old","days":["Daily"],"time":"","amount":1}]"#,
    );

    cli(data_dir)
        .arg("today")
        .assert()
        .success()
        .stdout(predicate::str::contains("08:00  1x  Aspirin, Bayer"));

    cli(data_dir)
        .args([
            "add", "--name", "Zinc", "--brand", "Teva", "--days", "Daily", "--time", "10:00",
            "--weight", "25",
        ])
        .assert()
        .success();

    let raw = fs::read_to_string(data_dir.join("store/medicines.json")).unwrap();
    let medicines: Vec<serde_json::Value> = serde_json::from_str(&raw).unwrap();
    let names: Vec<&str> = medicines.iter().filter_map(|m| m["name"].as_str()).collect();
    assert_eq!(names, vec!["Aspirin", "Zinc"]);
}

#[test]
fn test_unknown_id_reports_not_found() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();

    for args in [
        vec!["remove", "missing"],
        vec!["stock", "add", "missing"],
        vec!["notify", "missing", "on"],
        vec!["time", "missing", "08:00"],
    ] {
        cli(data_dir)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("missing"));
    }

    assert!(!data_dir.join("store/medicines.json").exists());
}

#[test]
fn test_stray_files_in_store_are_ignored() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path();
    write_store(data_dir, "medicines", "[]");
    fs::write(data_dir.join("store/.tmpXYZ"), "partial").unwrap();

    cli(data_dir)
        .args(["reset", "--yes"])
        .assert()
        .success();

    assert!(!data_dir.join("store/medicines.json").exists());
    assert!(data_dir.join("store/.tmpXYZ").exists());
}
