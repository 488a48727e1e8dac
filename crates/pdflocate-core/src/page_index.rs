//! Object-to-page index.

use std::collections::HashMap;

use crate::accessor::DocumentAccessor;
use crate::error::PdfError;
use crate::object::ObjectRef;

/// Maps every object reachable from a page to that page's 0-based index.
///
/// Built once per document and immutable afterwards. When an object is
/// reachable from several pages the lowest page wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageIndex {
    map: HashMap<ObjectRef, usize>,
    page_count: usize,
}

impl PageIndex {
    /// Scan every page of `doc` for images, annotations, widgets and XObjects.
    ///
    /// A page that fails to scan contributes nothing; the build itself never fails.
    pub fn build<D: DocumentAccessor + ?Sized>(doc: &D) -> Self {
        let page_count = doc.page_count();
        let mut map = HashMap::new();

        for page in 0..page_count {
            match scan_page(doc, page) {
                Ok(objects) => {
                    for obj in objects {
                        map.entry(obj).or_insert(page);
                    }
                }
                Err(err) => {
                    tracing::debug!(page, %err, "skipping page while building page index");
                }
            }
        }

        tracing::debug!(page_count, indexed = map.len(), "page index built");
        Self { map, page_count }
    }

    /// The page `object` was first seen on, or `None` when it is not indexed.
    pub fn page_of(&self, object: ObjectRef) -> Option<usize> {
        self.map.get(&object).copied()
    }

    /// Number of pages in the indexed document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries sorted by object number.
    pub fn entries(&self) -> Vec<(ObjectRef, usize)> {
        let mut entries: Vec<_> = self.map.iter().map(|(k, v)| (*k, *v)).collect();
        entries.sort();
        entries
    }
}

/// Objects reachable from one page, in discovery order.
///
/// Images come first, then annotations (widgets included), then XObjects.
/// Each source is read on its own, so unreadable content still leaves the
/// page's annotations indexed. Fails only when every source fails.
fn scan_page<D: DocumentAccessor + ?Sized>(
    doc: &D,
    page: usize,
) -> Result<Vec<ObjectRef>, PdfError> {
    let images = doc
        .page_images(page)
        .map(|v| v.into_iter().map(|i| i.object).collect::<Vec<_>>());
    let annotations = doc
        .page_annotations(page)
        .map(|v| v.into_iter().filter_map(|a| a.object).collect::<Vec<_>>());
    let xobjects = doc.page_xobjects(page);

    let mut objects = Vec::new();
    let mut last_err = None;
    for (source, result) in [
        ("images", images),
        ("annotations", annotations),
        ("xobjects", xobjects),
    ] {
        match result {
            Ok(found) => objects.extend(found),
            Err(err) => {
                tracing::debug!(page, source, %err, "cannot read page objects");
                last_err = Some(err);
            }
        }
    }
    match last_err {
        Some(err) if objects.is_empty() => Err(err),
        _ => Ok(objects),
    }
}
