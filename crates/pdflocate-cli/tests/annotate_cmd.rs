//! Integration tests for the `annotate` subcommand.

mod common;

use assert_cmd::Command;
use lopdf::Document;
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

/// Raw text of the last content stream of every page.
fn overlays(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .into_values()
        .map(|page| {
            let last = *doc.get_page_contents(page).last().unwrap();
            let stream = doc.get_object(last).unwrap().as_stream().unwrap();
            String::from_utf8_lossy(&stream.content).into_owned()
        })
        .collect()
}

#[test]
fn annotate_writes_copy_next_to_input() {
    let (dir, pdf, report) = setup();
    let original = std::fs::read(&pdf).unwrap();
    let expected = dir.path().join("report_annotated.pdf");

    cmd()
        .arg("annotate")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .assert()
        .success()
        .stdout(predicate::str::contains("report_annotated.pdf"));

    assert_eq!(std::fs::read(&pdf).unwrap(), original);
    let pages = overlays(&std::fs::read(&expected).unwrap());
    assert_eq!(pages.len(), 2);
    // page 1: header box plus the page-hinted label
    assert!(pages[0].contains("DOCUMENT COMPLIANCE ERRORS (Global/Metadata):"));
    assert!(pages[0].contains("Metadata stream missing"));
    // page 2: the image box (100, 300, 200x150 in user space)
    assert!(pages[1].contains("100 300 200 150 re"));
}

#[test]
fn annotate_to_explicit_output_with_focus() {
    let (dir, pdf, report) = setup();
    let out = dir.path().join("marked.pdf");

    cmd()
        .arg("annotate")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .arg("-o")
        .arg(&out)
        .args(["--focus", "0"])
        .assert()
        .success();

    let pages = overlays(&std::fs::read(&out).unwrap());
    assert!(pages[1].contains("1 0 0 RG\n3 w"));
    assert!(!dir.path().join("report_annotated.pdf").exists());
}

#[test]
fn annotate_refuses_to_overwrite_input() {
    let (_dir, pdf, report) = setup();
    let original = std::fs::read(&pdf).unwrap();

    cmd()
        .arg("annotate")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .arg("--output")
        .arg(&pdf)
        .assert()
        .failure()
        .stderr(predicate::str::contains("refusing to overwrite"));
    assert_eq!(std::fs::read(&pdf).unwrap(), original);
}

#[test]
fn annotate_focus_out_of_range() {
    let (_dir, pdf, report) = setup();

    cmd()
        .arg("annotate")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .args(["--focus", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("focus index 9 out of range"));
}

#[test]
fn verbose_logs_to_stderr() {
    let (_dir, pdf, report) = setup();

    cmd()
        .arg("annotate")
        .arg(&pdf)
        .arg("--report")
        .arg(&report)
        .arg("--verbose")
        .env_remove("RUST_LOG")
        .assert()
        .success()
        .stderr(predicate::str::contains("report loaded"))
        .stderr(predicate::str::contains("annotated copy written"));
}
