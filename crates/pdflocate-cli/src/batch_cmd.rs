use std::path::Path;

use pdflocate::{DocumentReport, ExtractOptions, process_batch};

use tracing::info;

use crate::cli::OutputFormat;
use crate::shared::{ProgressReporter, load_report, print_json};

pub fn run(report: &Path, format: OutputFormat, options: ExtractOptions) -> Result<(), i32> {
    let job = load_report(report)?;

    let progress = ProgressReporter::new();
    let reports = process_batch(&job, &options, |current, total, name| {
        progress.report(current, total, name);
    });
    progress.finish();
    info!(
        job = %job.job_id,
        files = reports.len(),
        failed = reports.iter().filter(|r| r.error.is_some()).count(),
        "batch finished"
    );

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "job_id": job.job_id,
            "total_files": job.results.len(),
            "compliant": job.compliant_count(),
            "non_compliant": job.non_compliant_count(),
            "errors": job.error_count(),
            "documents": reports,
        })),
        OutputFormat::Text => {
            write_text(&reports);
            println!(
                "{} files: {} compliant, {} non-compliant, {} errors ({:.1}% success)",
                job.results.len(),
                job.compliant_count(),
                job.non_compliant_count(),
                job.error_count(),
                job.success_rate()
            );
            Ok(())
        }
    }
}

fn write_text(reports: &[DocumentReport]) {
    println!("file\tstatus\tpages\tviolations\tlocated\tdocument_level\ttagged\terror");
    for r in reports {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            r.filename,
            r.status,
            r.page_count,
            r.violations,
            r.located(),
            r.document_level,
            if r.tagged { "yes" } else { "no" },
            r.error.as_deref().unwrap_or("")
        );
    }
}
