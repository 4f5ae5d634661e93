//! CLI integration tests
//!
//! Each test runs the built `rollcall` binary against a temporary data
//! directory and the employee fixtures.
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Report written |
//! | 1 | Validation, lookup or storage failure |

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn rollcall(work: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rollcall"))
        .current_dir(work)
        .env_remove("RUST_LOG")
        .env_remove("ROLLCALL_CONFIG")
        .env("ROLLCALL_DATA_DIR", work.join("data"))
        .env("ROLLCALL_EMPLOYEES", fixtures_dir().join("employees.json"))
        .args(args)
        .output()
        .expect("failed to execute rollcall")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn attendance_from_flags() {
    let work = TempDir::new().unwrap();
    let output = rollcall(
        work.path(),
        &[
            "attendance",
            "-e",
            "13536906",
            "-y",
            "2025",
            "-m",
            "2",
            "-p",
            "ALL_OFF",
            "--holiday",
            "2025-02-26",
            "--leave",
            "2025-02-10",
        ],
    );

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "attendance-2025.xlsx");
    let bytes = std::fs::read(work.path().join("attendance-2025.xlsx")).unwrap();
    assert_eq!(&bytes[0..2], b"PK");
    assert!(work.path().join("data/attendance-2025.json").is_file());
}

#[test]
fn attendance_from_request_file() {
    let work = TempDir::new().unwrap();
    let request = fixtures_dir().join("february.json");
    let out = work.path().join("sudhir.xlsx");
    let output = rollcall(
        work.path(),
        &[
            "attendance",
            "--request",
            request.to_str().unwrap(),
            "-o",
            out.to_str().unwrap(),
        ],
    );

    assert!(output.status.success(), "{output:?}");
    assert!(out.is_file());
}

#[test]
fn conflicting_saturday_fails() {
    let work = TempDir::new().unwrap();
    // 2025-02-08 is an off Saturday under ALL_OFF
    let output = rollcall(
        work.path(),
        &[
            "attendance", "-e", "13536906", "-y", "2025", "-m", "2", "-p", "ALL_OFF", "--leave",
            "2025-02-08",
        ],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2025-02-08"), "{stderr}");
    assert!(!work.path().join("data/attendance-2025.json").exists());
}

#[test]
fn unknown_employee_fails() {
    let work = TempDir::new().unwrap();
    let output = rollcall(
        work.path(),
        &["attendance", "-e", "404", "-y", "2025", "-m", "2"],
    );
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("404"));
}

#[test]
fn timesheet_with_remarks() {
    let work = TempDir::new().unwrap();
    let output = rollcall(
        work.path(),
        &[
            "timesheet",
            "-e",
            "13536906",
            "-y",
            "2025",
            "-m",
            "2",
            "-p",
            "SECOND_FOURTH",
            "--holiday",
            "2025-02-26=Maha Shivaratri",
            "--approval",
            "Approved",
        ],
    );

    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "timesheet-2025.xlsx");
}

#[test]
fn extract_one_employee() {
    let work = TempDir::new().unwrap();
    for id in ["13536906", "13536907"] {
        let output = rollcall(
            work.path(),
            &["attendance", "-e", id, "-y", "2025", "-m", "3"],
        );
        assert!(output.status.success(), "{output:?}");
    }

    let output = rollcall(
        work.path(),
        &[
            "extract", "-k", "attendance", "-y", "2025", "-e", "13536907", "-o", "ann.xlsx",
        ],
    );
    assert!(output.status.success(), "{output:?}");
    assert_eq!(stdout(&output), "ann.xlsx");
    assert!(work.path().join("ann.xlsx").is_file());
}

#[test]
fn employees_are_listed() {
    let work = TempDir::new().unwrap();
    let output = rollcall(work.path(), &["employees"]);

    assert!(output.status.success(), "{output:?}");
    let listing = stdout(&output);
    assert!(listing.contains("13536906\tSudhir Kumar"));
    assert!(listing.contains("13536907\tAnn Lee"));
}
