//! Page resolution for violations.

use std::collections::BTreeMap;

use crate::page_index::PageIndex;
use crate::violation::ViolationDescriptor;

/// Where a violation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PageResolution {
    /// A 0-based page index.
    Page(usize),
    /// Document-level: no page could be determined.
    Unresolved,
}

impl PageResolution {
    pub fn page(self) -> Option<usize> {
        match self {
            PageResolution::Page(p) => Some(p),
            PageResolution::Unresolved => None,
        }
    }

    pub fn is_resolved(self) -> bool {
        matches!(self, PageResolution::Page(_))
    }
}

/// Resolve a violation to a page.
///
/// Order: an in-range page hint, then the indexed page of the object id,
/// then [`PageResolution::Unresolved`]. Never defaults to page 0.
pub fn resolve_page(violation: &ViolationDescriptor, index: &PageIndex) -> PageResolution {
    if let Some(page) = violation.page {
        if page >= 0 && (page as u64) < index.page_count() as u64 {
            return PageResolution::Page(page as usize);
        }
    }
    if let Some(page) = violation.object_ref().and_then(|obj| index.page_of(obj)) {
        return PageResolution::Page(page);
    }
    PageResolution::Unresolved
}

/// Violations grouped by resolved page.
///
/// Entries are indices into the slice passed to [`bucket_by_page`], in input order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PageBuckets {
    pub by_page: BTreeMap<usize, Vec<usize>>,
    pub document_level: Vec<usize>,
}

impl PageBuckets {
    /// Indices of the violations resolved to `page`.
    pub fn on_page(&self, page: usize) -> &[usize] {
        self.by_page.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of bucketed violations.
    pub fn len(&self) -> usize {
        self.by_page.values().map(Vec::len).sum::<usize>() + self.document_level.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Resolve every violation and group the results by page.
pub fn bucket_by_page(violations: &[ViolationDescriptor], index: &PageIndex) -> PageBuckets {
    let mut buckets = PageBuckets::default();
    for (i, v) in violations.iter().enumerate() {
        match resolve_page(v, index) {
            PageResolution::Page(p) => buckets.by_page.entry(p).or_default().push(i),
            PageResolution::Unresolved => buckets.document_level.push(i),
        }
    }
    buckets
}
