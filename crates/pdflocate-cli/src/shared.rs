use std::io::{self, IsTerminal, Write};
use std::path::Path;

use pdflocate::{ExtractOptions, Localization, ScanJob, ScanResult, Session};
use tracing::debug;

/// Open a PDF file with user-friendly error messages.
///
/// Returns `Err(1)` with a message printed to stderr if the file is not found
/// or cannot be parsed as a valid PDF.
pub fn open_session(file: &Path, options: ExtractOptions) -> Result<Session, i32> {
    if !file.exists() {
        eprintln!("Error: file not found: {}", file.display());
        return Err(1);
    }

    Session::open_file(file, Some(options)).map_err(|e| {
        eprintln!("Error: failed to open PDF: {e}");
        1
    })
}

/// Read a scan summary: either a whole scan job (with `results`) or a
/// single scan result, which is wrapped in a one-entry job.
pub fn load_report(path: &Path) -> Result<ScanJob, i32> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("Error: cannot read report {}: {e}", path.display());
        1
    })?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| {
        eprintln!("Error: report is not valid JSON: {e}");
        1
    })?;

    let parsed = if value.get("results").is_some() {
        serde_json::from_value::<ScanJob>(value)
    } else {
        serde_json::from_value::<ScanResult>(value).map(|result| ScanJob {
            total_files: 1,
            results: vec![result],
            ..ScanJob::default()
        })
    };
    let job = parsed.map_err(|e| {
        eprintln!("Error: unrecognized report layout: {e}");
        1
    })?;
    debug!(path = %path.display(), results = job.results.len(), "report loaded");
    Ok(job)
}

/// Pick the report entry for `pdf`.
///
/// Matches `file_name` (or the PDF's own file name) against each result's
/// `filename`; a report with a single result is used as is.
pub fn select_result<'a>(
    job: &'a ScanJob,
    pdf: &Path,
    file_name: Option<&str>,
) -> Result<&'a ScanResult, i32> {
    let wanted = file_name
        .map(str::to_string)
        .or_else(|| pdf.file_name().map(|n| n.to_string_lossy().into_owned()));

    if let Some(name) = &wanted {
        if let Some(result) = job.results.iter().find(|r| &r.filename == name) {
            return Ok(result);
        }
    }
    if let [only] = job.results.as_slice() {
        return Ok(only);
    }
    eprintln!(
        "Error: no report entry for {} ({} entries)",
        wanted.as_deref().unwrap_or("<unnamed>"),
        job.results.len()
    );
    Err(1)
}

/// Reject a `--focus` index past the located violations.
pub fn check_focus(located: &Localization, focus: Option<usize>) -> Result<(), i32> {
    match focus {
        Some(focus) if focus >= located.violations.len() => {
            eprintln!(
                "Error: focus index {focus} out of range ({} violations)",
                located.violations.len()
            );
            Err(1)
        }
        _ => Ok(()),
    }
}

/// Print `value` as one line of JSON.
pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), i32> {
    let json = serde_json::to_string(value).map_err(|e| {
        eprintln!("Error: failed to serialize output: {e}");
        1
    })?;
    println!("{json}");
    Ok(())
}

/// A progress reporter that prints "Processing file N/M: name" to stderr,
/// but only when stderr is connected to a TTY (terminal).
pub struct ProgressReporter {
    is_tty: bool,
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            is_tty: io::stderr().is_terminal(),
        }
    }

    /// Report progress for file `current` (1-indexed) of `total`.
    pub fn report(&self, current: usize, total: usize, name: &str) {
        if self.is_tty {
            eprint!("\r\x1b[2KProcessing file {current}/{total}: {name}");
            let _ = io::stderr().flush();
        }
    }

    /// Clear the progress line (if TTY).
    pub fn finish(&self) {
        if self.is_tty {
            eprint!("\r\x1b[2K");
            let _ = io::stderr().flush();
        }
    }
}
