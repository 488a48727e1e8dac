//! Integration tests for the `plan` subcommand.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("pdflocate").unwrap()
}

fn setup() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let pdf = common::write_pdf(dir.path(), "report.pdf", true);
    let report = common::write_json(
        dir.path(),
        "scan.json",
        &common::scan_result_json("report.pdf", &pdf),
    );
    (dir, pdf, report)
}

#[test]
fn plan_image_page_highlights_focused_violation() {
    let (_dir, pdf, report) = setup();

    let output = cmd()
        .arg("plan")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .args(["--page", "2", "--focus", "0", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["page"], 1);
    let highlights = json["highlights"].as_array().unwrap();
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0]["emphasis"], "Focused");
    assert_eq!(highlights[0]["region"]["x0"], 100.0);
    assert_eq!(highlights[0]["region"]["y0"], 342.0);
    assert!(json["header"].is_null());
}

#[test]
fn plan_first_page_has_header_and_label() {
    let (_dir, pdf, report) = setup();

    cmd()
        .arg("plan")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .args(["--page", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "DOCUMENT COMPLIANCE ERRORS (Global/Metadata):",
        ))
        .stdout(predicate::str::contains("Metadata stream missing"))
        .stdout(predicate::str::contains(
            "[7.2-2] Natural language not determinable",
        ));
}

#[test]
fn plan_focus_on_document_level_shows_notice() {
    let (_dir, pdf, report) = setup();

    cmd()
        .arg("plan")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .args(["--page", "1", "--focus", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Global/Structure Error - Location not visual",
        ));
}

#[test]
fn plan_page_out_of_range() {
    let (_dir, pdf, report) = setup();

    cmd()
        .arg("plan")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .args(["--page", "5"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("out of range"));
}

#[test]
fn plan_focus_out_of_range() {
    let (_dir, pdf, report) = setup();

    cmd()
        .arg("plan")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .args(["--page", "1", "--focus", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("focus index 9 out of range"));
}
