//! Tests running the tonnage binary

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/campaign.json")
}

/// Run the binary isolated from any user or project config.
fn tonnage(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tonnage"))
        .arg("-C")
        .arg(home)
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run tonnage")
}

#[test]
fn given_top_zero_when_listing_drivers_then_reports_drivers_without_rows() {
    let home = TempDir::new().unwrap();
    let snapshot = fixture();

    let output = tonnage(home.path(), &["drivers", "--top", "0", snapshot.to_str().unwrap()]);

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(output.status.success(), "stderr: {stderr}");
    assert!(stdout.contains("3 drivers"), "stdout: {stdout}");
    assert!(!stdout.contains("Amadou Fall"));
    assert!(!stderr.contains("no deliveries in snapshot"));
}

#[test]
fn given_top_one_when_listing_drivers_then_prints_only_the_leader() {
    let home = TempDir::new().unwrap();
    let snapshot = fixture();

    let output = tonnage(home.path(), &["drivers", "-n", "1", snapshot.to_str().unwrap()]);

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(output.status.success());
    assert!(stdout.contains("Amadou Fall"));
    assert!(!stdout.contains("Ibrahima Sow"));
}

#[test]
fn given_snapshot_without_deliveries_when_listing_drivers_then_warns() {
    let home = TempDir::new().unwrap();
    let snapshot = home.path().join("empty.json");
    std::fs::write(&snapshot, r#"{"regions": []}"#).unwrap();

    let output = tonnage(home.path(), &["drivers", snapshot.to_str().unwrap()]);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(output.status.success());
    assert!(stderr.contains("no deliveries in snapshot"), "stderr: {stderr}");
}
