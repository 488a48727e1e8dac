//! Scan summaries produced by an external validator run.

use std::fmt;

use crate::violation::ViolationDescriptor;

/// Outcome of scanning one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "SCREAMING-KEBAB-CASE")
)]
pub enum ScanStatus {
    Compliant,
    NonCompliant,
    /// The validator could not process the file.
    Error,
}

impl ScanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanStatus::Compliant => "COMPLIANT",
            ScanStatus::NonCompliant => "NON-COMPLIANT",
            ScanStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validator output for a single PDF.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ScanResult {
    pub filename: String,
    pub filepath: String,
    pub compliant: bool,
    /// Validation profile, e.g. `"PDF/UA-1"`.
    pub profile: String,
    pub statement: String,
    pub violations: Vec<ViolationDescriptor>,
    /// Set when the validator failed on this file.
    pub error: Option<String>,
    /// ISO-8601 timestamp, kept as written.
    pub scan_time: Option<String>,
}

impl ScanResult {
    pub fn status(&self) -> ScanStatus {
        if self.error.is_some() {
            ScanStatus::Error
        } else if self.compliant || self.violations.is_empty() {
            ScanStatus::Compliant
        } else {
            ScanStatus::NonCompliant
        }
    }

    pub fn total_violations(&self) -> usize {
        self.violations.len()
    }

    /// Sum of failed checks across all violations.
    pub fn total_failed_checks(&self) -> u64 {
        self.violations.iter().map(|v| u64::from(v.failed_checks)).sum()
    }

    /// Violations that should be localized; none when the scan itself failed.
    pub fn localizable_violations(&self) -> &[ViolationDescriptor] {
        if self.error.is_some() {
            &[]
        } else {
            &self.violations
        }
    }
}

/// A saved scanning session over many files.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct ScanJob {
    pub job_id: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub total_files: usize,
    pub results: Vec<ScanResult>,
}

impl ScanJob {
    fn count(&self, status: ScanStatus) -> usize {
        self.results.iter().filter(|r| r.status() == status).count()
    }

    pub fn compliant_count(&self) -> usize {
        self.count(ScanStatus::Compliant)
    }

    pub fn non_compliant_count(&self) -> usize {
        self.count(ScanStatus::NonCompliant)
    }

    pub fn error_count(&self) -> usize {
        self.count(ScanStatus::Error)
    }

    /// Percentage of compliant files, `0.0` for an empty job.
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.compliant_count() as f64 / self.results.len() as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.end_time.is_some()
    }
}
