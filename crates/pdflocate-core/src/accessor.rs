//! The [`DocumentAccessor`] trait: random access to a document's object graph.
//!
//! Everything in this crate is written against this trait. The lopdf-backed
//! implementation lives in `pdflocate-parse`; `MemoryDocument` (behind the
//! `test-util` feature) is an in-memory implementation for tests.

use crate::error::PdfError;
use crate::geometry::Region;
use crate::object::{ObjectRef, Value};
use crate::outline::{OutlineEntry, extract_outline};
use crate::search;

/// An image XObject drawn on a page.
///
/// The same image object drawn twice (tiling) yields two placements.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlacement {
    pub object: ObjectRef,
    /// Where the image lands, in user space.
    pub region: Region,
    /// Marked-content id enclosing the `Do` operator, if any.
    pub mcid: Option<i64>,
}

/// An annotation anchored to a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageAnnotation {
    /// The annotation dictionary, when it is an indirect object.
    pub object: Option<ObjectRef>,
    /// `/Subtype` name (e.g. `"Link"`, `"Widget"`), empty when missing.
    pub subtype: String,
    pub region: Region,
}

impl PageAnnotation {
    /// Form-field widgets are annotations with subtype `Widget`.
    pub fn is_widget(&self) -> bool {
        self.subtype == "Widget"
    }
}

/// Kind of content a [`ContentRun`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RunKind {
    Text,
    Image,
}

/// A positioned piece of page content with its marked-content id.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRun {
    pub kind: RunKind,
    /// Shown text; empty for image runs.
    pub text: String,
    pub region: Region,
    pub mcid: Option<i64>,
}

/// Random access to the objects, pages, images and annotations of one document.
///
/// Page indices are 0-based. Per-page methods return `Err` when the page
/// cannot be scanned (corrupt content, dangling references); callers decide
/// whether that is fatal.
pub trait DocumentAccessor {
    /// Number of pages.
    fn page_count(&self) -> usize;

    /// The page dictionary's object, or `None` for an out-of-range index.
    fn page_ref(&self, page: usize) -> Option<ObjectRef>;

    /// The document catalog.
    fn catalog(&self) -> Option<ObjectRef>;

    /// Raw key lookup on a dictionary (or stream dictionary) object.
    ///
    /// Returns `None` for missing objects, non-dictionaries and missing keys.
    /// References are not followed.
    fn get_key(&self, object: ObjectRef, key: &str) -> Option<Value>;

    /// Every image drawn on the page.
    fn page_images(&self, page: usize) -> Result<Vec<ImagePlacement>, PdfError>;

    /// Every annotation in the page's `/Annots`, widgets included.
    fn page_annotations(&self, page: usize) -> Result<Vec<PageAnnotation>, PdfError>;

    /// XObjects named by the page's resources (images and forms).
    fn page_xobjects(&self, page: usize) -> Result<Vec<ObjectRef>, PdfError>;

    /// Positioned content runs in drawing order.
    fn page_runs(&self, page: usize) -> Result<Vec<ContentRun>, PdfError>;

    /// The page's visible box in user space.
    fn page_rect(&self, page: usize) -> Option<Region>;

    /// The document outline. Documents without one return an empty list.
    fn outline(&self) -> Vec<OutlineEntry> {
        extract_outline(self)
    }

    /// Literal, case-insensitive search of the page text.
    ///
    /// Returns at most `max_hits` regions. Unreadable pages yield no hits.
    fn search_text(&self, page: usize, needle: &str, max_hits: usize) -> Vec<Region> {
        match self.page_runs(page) {
            Ok(runs) => search::search_runs(&runs, needle, max_hits),
            Err(err) => {
                tracing::debug!(page, %err, "page text unavailable for search");
                Vec::new()
            }
        }
    }
}

impl<T: DocumentAccessor + ?Sized> DocumentAccessor for &T {
    fn page_count(&self) -> usize {
        (**self).page_count()
    }
    fn page_ref(&self, page: usize) -> Option<ObjectRef> {
        (**self).page_ref(page)
    }
    fn catalog(&self) -> Option<ObjectRef> {
        (**self).catalog()
    }
    fn get_key(&self, object: ObjectRef, key: &str) -> Option<Value> {
        (**self).get_key(object, key)
    }
    fn page_images(&self, page: usize) -> Result<Vec<ImagePlacement>, PdfError> {
        (**self).page_images(page)
    }
    fn page_annotations(&self, page: usize) -> Result<Vec<PageAnnotation>, PdfError> {
        (**self).page_annotations(page)
    }
    fn page_xobjects(&self, page: usize) -> Result<Vec<ObjectRef>, PdfError> {
        (**self).page_xobjects(page)
    }
    fn page_runs(&self, page: usize) -> Result<Vec<ContentRun>, PdfError> {
        (**self).page_runs(page)
    }
    fn page_rect(&self, page: usize) -> Option<Region> {
        (**self).page_rect(page)
    }
    fn outline(&self) -> Vec<OutlineEntry> {
        (**self).outline()
    }
    fn search_text(&self, page: usize, needle: &str, max_hits: usize) -> Vec<Region> {
        (**self).search_text(page, needle, max_hits)
    }
}
