//! Localization over every file of a saved scan.

use std::collections::BTreeMap;

use pdflocate_core::{ExtractOptions, ScanJob, ScanResult, ScanStatus};
use tracing::{info, warn};

use crate::session::Session;

/// Localization outcome for one scanned file.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocumentReport {
    pub filename: String,
    pub filepath: String,
    pub status: ScanStatus,
    /// Pages in the document; 0 when it was not opened.
    pub page_count: usize,
    pub violations: usize,
    /// Violation count per 0-based page.
    pub pages: BTreeMap<usize, usize>,
    pub document_level: usize,
    /// Whether the document has a structure tree.
    pub tagged: bool,
    /// Validator or open failure; localization was skipped.
    pub error: Option<String>,
}

impl DocumentReport {
    fn skipped(result: &ScanResult, error: Option<String>) -> Self {
        Self {
            filename: result.filename.clone(),
            filepath: result.filepath.clone(),
            status: result.status(),
            page_count: 0,
            violations: result.total_violations(),
            pages: BTreeMap::new(),
            document_level: 0,
            tagged: false,
            error,
        }
    }

    pub fn located(&self) -> usize {
        self.pages.values().sum()
    }
}

/// Localize one scan result.
///
/// Results that record a validator error are reported without opening the
/// file. A file that cannot be opened yields a report carrying the error.
pub fn process_result(result: &ScanResult, options: &ExtractOptions) -> DocumentReport {
    if let Some(err) = &result.error {
        return DocumentReport::skipped(result, Some(err.clone()));
    }

    let session = match Session::open_file(&result.filepath, Some(options.clone())) {
        Ok(session) => session,
        Err(err) => {
            warn!(file = %result.filepath, %err, "cannot open document");
            return DocumentReport::skipped(result, Some(err.to_string()));
        }
    };

    let located = session.locate(result.localizable_violations());
    let pages = located
        .buckets
        .by_page
        .iter()
        .map(|(page, items)| (*page, items.len()))
        .collect();
    DocumentReport {
        filename: result.filename.clone(),
        filepath: result.filepath.clone(),
        status: result.status(),
        page_count: session.page_count(),
        violations: located.violations.len(),
        pages,
        document_level: located.buckets.document_level.len(),
        tagged: !session.structure_tree().is_empty(),
        error: None,
    }
}

/// Localize every result of `job` in order.
///
/// `progress` is called before each file with `(current, total, filename)`,
/// `current` counting from 1. A failing file never stops the batch.
pub fn process_batch<F>(job: &ScanJob, options: &ExtractOptions, mut progress: F) -> Vec<DocumentReport>
where
    F: FnMut(usize, usize, &str),
{
    let total = job.results.len();
    info!(job = %job.job_id, files = total, "starting batch");
    let reports: Vec<DocumentReport> = job
        .results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            progress(i + 1, total, &result.filename);
            process_result(result, options)
        })
        .collect();
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    info!(files = total, failed, "batch finished");
    reports
}
