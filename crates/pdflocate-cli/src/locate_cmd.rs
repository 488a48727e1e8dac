use std::path::Path;

use pdflocate::{ExtractOptions, Localization};

use crate::cli::OutputFormat;
use crate::shared::{load_report, open_session, print_json, select_result};

pub fn run(
    file: &Path,
    report: &Path,
    file_name: Option<&str>,
    format: OutputFormat,
    options: ExtractOptions,
) -> Result<(), i32> {
    let job = load_report(report)?;
    let result = select_result(&job, file, file_name)?;
    if let Some(err) = &result.error {
        eprintln!("Error: validator failed on {}: {err}", result.filename);
        return Err(1);
    }

    let session = open_session(file, options)?;
    let located = session.locate(result.localizable_violations());

    match format {
        OutputFormat::Text => write_text(&located),
        OutputFormat::Json => print_json(&serde_json::json!({
            "file": result.filename,
            "page_count": session.page_count(),
            "violations": located.violations,
            "pages": located.buckets.by_page,
            "document_level": located.buckets.document_level,
        })),
    }
}

fn write_text(located: &Localization) -> Result<(), i32> {
    if located.violations.is_empty() {
        println!("No violations.");
        return Ok(());
    }

    println!("page\tindex\trule\tdescription");
    for (&page, items) in &located.buckets.by_page {
        for &i in items {
            let v = &located.violations[i];
            println!("{}\t{}\t{}\t{}", page + 1, i, v.rule_id, v.description);
        }
    }
    for (i, v) in located.document_level() {
        println!("-\t{}\t{}\t{}", i, v.rule_id, v.description);
    }

    Ok(())
}
