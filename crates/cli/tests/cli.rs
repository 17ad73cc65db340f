//! Binary-level behaviour that needs no browser

use std::process::Command;

fn bookprobe() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_bookprobe"));
    cmd.env("RUST_LOG", "error").env_remove("BOOKPROBE_CONFIG");
    cmd
}

#[test]
fn test_payment_without_arguments_prints_usage() {
    let output = bookprobe().arg("payment").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage: bookprobe payment"));
}

#[test]
fn test_payment_with_only_link_prints_usage() {
    let output = bookprobe()
        .args(["payment", "--link", "https://pay.example/invoice"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--method <name>"));
}

#[test]
fn test_unknown_payment_method_rejected() {
    let output = bookprobe()
        .args(["payment", "https://pay.example/invoice", "paypal"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown payment method: paypal"));
}

#[test]
fn test_data_is_reproducible_with_seed() {
    let run = || {
        bookprobe()
            .args(["--format", "json", "data", "--seed", "test", "--count", "2"])
            .output()
            .unwrap()
    };
    let first = run();
    assert!(first.status.success());
    assert_eq!(first.stdout, run().stdout);

    let records: serde_json::Value = serde_json::from_slice(&first.stdout).unwrap();
    assert_eq!(records.as_array().map(Vec::len), Some(2));
    assert_eq!(records[0]["name"], "Test User test");
}

#[test]
fn test_suite_list_needs_no_browser() {
    let output = bookprobe()
        .args(["--format", "plain", "suite", "--list", "--tag", "security"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("xss payload"));
    assert!(stdout.contains("sql payload"));
}

#[test]
fn test_suite_with_missing_cases_dir_fails() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("typo");
    let output = bookprobe()
        .args(["suite", "--no-builtin", "--cases"])
        .arg(&missing)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("case directory not found"));
}
