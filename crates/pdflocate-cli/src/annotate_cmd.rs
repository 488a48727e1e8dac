use std::path::Path;

use pdflocate::{ExtractOptions, annotated_path};
use tracing::info;

use crate::shared::{check_focus, load_report, open_session, select_result};

pub struct AnnotateArgs<'a> {
    pub file: &'a Path,
    pub report: &'a Path,
    pub output: Option<&'a Path>,
    pub focus: Option<usize>,
    pub file_name: Option<&'a str>,
}

pub fn run(args: AnnotateArgs<'_>, options: ExtractOptions) -> Result<(), i32> {
    let job = load_report(args.report)?;
    let result = select_result(&job, args.file, args.file_name)?;
    let session = open_session(args.file, options)?;

    let output = args
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| annotated_path(args.file));
    if same_file(&output, args.file) {
        eprintln!("Error: refusing to overwrite the input PDF {}", args.file.display());
        return Err(1);
    }

    let located = session.locate(result.localizable_violations());
    check_focus(&located, args.focus)?;

    session
        .annotate_to_file(&located, args.focus, &output)
        .map_err(|e| {
            eprintln!("Error: failed to write {}: {e}", output.display());
            1
        })?;
    info!(
        output = %output.display(),
        violations = located.violations.len(),
        document_level = located.buckets.document_level.len(),
        "annotated copy written"
    );
    println!("{}", output.display());
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
