//! One open document and the queries made against it.

use std::cell::OnceCell;

use pdflocate_core::{
    AnnotationLayout, DocumentAccessor, DrawPlan, ExtractOptions, LayoutOptions, OutlineEntry,
    PageBuckets, PageIndex, PageResolution, PdfError, PlacedViolation, Region, RegionResolver,
    StructureNode, StructureTree, ViolationDescriptor, bucket_by_page, resolve_page,
};
use pdflocate_parse::LopdfAccessor;
use tracing::{debug, info};

/// Label attached to the outline when a document has no structure tree.
pub const TAGS_NOT_FOUND: &str = "tags not found";

/// Fallback page box when a page declares none (US Letter).
pub(crate) const DEFAULT_PAGE_RECT: Region = Region {
    x0: 0.0,
    y0: 0.0,
    x1: 612.0,
    y1: 792.0,
};

/// What a navigation pane shows for a document.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum Navigation {
    /// The logical structure tree.
    Tags { nodes: Vec<StructureNode> },
    /// The outline, shown because the document is untagged.
    Outline {
        notice: String,
        entries: Vec<OutlineEntry>,
    },
}

impl Navigation {
    pub fn is_tagged(&self) -> bool {
        matches!(self, Navigation::Tags { .. })
    }
}

/// Violations of one document, normalized and grouped by page.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Localization {
    /// Input violations with page and object hints filled in from their context.
    pub violations: Vec<ViolationDescriptor>,
    pub buckets: PageBuckets,
}

impl Localization {
    /// Violations resolved to `page`, with their indices.
    pub fn on_page(&self, page: usize) -> impl Iterator<Item = (usize, &ViolationDescriptor)> {
        self.buckets
            .on_page(page)
            .iter()
            .filter_map(|&i| self.violations.get(i).map(|v| (i, v)))
    }

    /// Violations with no page, with their indices.
    pub fn document_level(&self) -> impl Iterator<Item = (usize, &ViolationDescriptor)> {
        self.buckets
            .document_level
            .iter()
            .filter_map(|&i| self.violations.get(i).map(|v| (i, v)))
    }
}

/// An open document.
///
/// The session owns its accessor; the page index is built on first use and
/// reused until the session is dropped.
///
/// # Example
///
/// ```ignore
/// use pdflocate::{Session, ViolationDescriptor};
///
/// let session = Session::open_file("report.pdf", None)?;
/// let located = session.locate(&[ViolationDescriptor::new("7.1-3", "Content not tagged")]);
/// let plan = session.plan_page(0, &located, None)?;
/// ```
pub struct Session<D: DocumentAccessor = LopdfAccessor> {
    doc: D,
    options: ExtractOptions,
    layout: AnnotationLayout,
    index: OnceCell<PageIndex>,
}

impl Session<LopdfAccessor> {
    /// Open a document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PasswordRequired`] for encrypted documents and
    /// [`PdfError::ParseError`] for unreadable ones.
    pub fn open(bytes: &[u8], options: Option<ExtractOptions>) -> Result<Self, PdfError> {
        let options = options.unwrap_or_default();
        let doc = LopdfAccessor::open(bytes)
            .map_err(PdfError::from)?
            .with_options(options.clone());
        Ok(Self::from_accessor(doc, options))
    }

    /// Open a document from a file path.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::IoError`] if the file cannot be read, otherwise as
    /// [`Session::open`].
    #[cfg(feature = "std")]
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<ExtractOptions>,
    ) -> Result<Self, PdfError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| PdfError::IoError(e.to_string()))?;
        info!(path = %path.display(), "opening document");
        Self::open(&bytes, options)
    }
}

impl<D: DocumentAccessor> Session<D> {
    /// Wrap an existing accessor.
    pub fn from_accessor(doc: D, options: ExtractOptions) -> Self {
        Self {
            doc,
            options,
            layout: AnnotationLayout::default(),
            index: OnceCell::new(),
        }
    }

    /// Use `layout` for draw plans.
    pub fn with_layout(mut self, layout: LayoutOptions) -> Self {
        self.layout = AnnotationLayout::new(layout);
        self
    }

    pub fn accessor(&self) -> &D {
        &self.doc
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    /// The object-to-page index, built on first call.
    pub fn page_index(&self) -> &PageIndex {
        self.index.get_or_init(|| {
            let index = PageIndex::build(&self.doc);
            debug!(objects = index.len(), pages = index.page_count(), "built page index");
            index
        })
    }

    /// Resolve one violation to a page.
    pub fn resolve(&self, violation: &ViolationDescriptor) -> PageResolution {
        resolve_page(&violation.clone().with_context_hints(), self.page_index())
    }

    /// Normalize `violations` and group them by page.
    pub fn locate(&self, violations: &[ViolationDescriptor]) -> Localization {
        let violations: Vec<ViolationDescriptor> = violations
            .iter()
            .cloned()
            .map(ViolationDescriptor::with_context_hints)
            .collect();
        let buckets = bucket_by_page(&violations, self.page_index());
        info!(
            violations = violations.len(),
            pages = buckets.by_page.len(),
            document_level = buckets.document_level.len(),
            "located violations"
        );
        Localization {
            violations,
            buckets,
        }
    }

    pub fn structure_tree(&self) -> StructureTree {
        StructureTree::extract(&self.doc, &self.options)
    }

    /// The structure tree, or the outline labelled [`TAGS_NOT_FOUND`] when
    /// the document has no tags.
    pub fn navigation(&self) -> Navigation {
        let tree = self.structure_tree();
        if tree.is_empty() {
            debug!("no structure tree, falling back to outline");
            Navigation::Outline {
                notice: TAGS_NOT_FOUND.to_string(),
                entries: self.doc.outline(),
            }
        } else {
            Navigation::Tags {
                nodes: tree.to_nodes(),
            }
        }
    }

    pub fn resolver(&self) -> RegionResolver<'_, D> {
        RegionResolver::new(&self.doc, self.options.clone())
    }

    /// Regions on `page` for one violation.
    pub fn regions_for_violation(&self, page: usize, violation: &ViolationDescriptor) -> Vec<Region> {
        self.resolver().regions_for_violation(page, violation)
    }

    /// Regions covered by a structure node's marked content.
    pub fn regions_for_node(&self, node: &StructureNode) -> Vec<Region> {
        self.resolver().regions_for_node(node)
    }

    /// Lay out the violations of `located` that belong on `page`.
    ///
    /// `focused` is an index into `located.violations`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageOutOfRange`] for a page outside the document.
    pub fn plan_page(
        &self,
        page: usize,
        located: &Localization,
        focused: Option<usize>,
    ) -> Result<DrawPlan, PdfError> {
        let page_count = self.page_count();
        if page >= page_count {
            return Err(PdfError::PageOutOfRange { page, page_count });
        }
        let resolver = self.resolver();
        let on_page: Vec<PlacedViolation<'_>> = located
            .on_page(page)
            .map(|(index, violation)| PlacedViolation {
                index,
                violation,
                regions: resolver.regions_for_violation(page, violation),
            })
            .collect();
        let document_level: Vec<PlacedViolation<'_>> = located
            .document_level()
            .map(|(index, violation)| PlacedViolation {
                index,
                violation,
                regions: Vec::new(),
            })
            .collect();
        let page_rect = self.doc.page_rect(page).unwrap_or(DEFAULT_PAGE_RECT);
        Ok(self
            .layout
            .plan_page(page, page_rect, &on_page, &document_level, focused))
    }
}

impl<D: DocumentAccessor + std::fmt::Debug> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("doc", &self.doc)
            .field("indexed", &self.index.get().is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdflocate_core::{Emphasis, MemoryDocument, NOT_VISUAL_NOTICE, ObjectRef, Value, dict};

    fn session() -> Session<MemoryDocument> {
        let mut doc = MemoryDocument::with_pages(3);
        doc.pages[1] = doc.pages[1]
            .clone()
            .with_image(ObjectRef(42), Region::new(100.0, 500.0, 300.0, 700.0));
        Session::from_accessor(doc, ExtractOptions::default())
    }

    #[test]
    fn locate_applies_context_hints() {
        let s = session();
        let located = s.locate(&[
            ViolationDescriptor::new("a", "image").with_object_id("42 0 obj"),
            ViolationDescriptor::new("b", "font").with_context("root/document[0]/pages[2](7 0 obj)"),
            ViolationDescriptor::new("c", "metadata"),
        ]);
        assert_eq!(located.buckets.on_page(1), &[0]);
        assert_eq!(located.buckets.on_page(2), &[1]);
        assert_eq!(located.buckets.document_level, vec![2]);
        assert_eq!(located.violations[1].page, Some(2));
    }

    #[test]
    fn page_index_is_built_once() {
        let s = session();
        let first: *const PageIndex = s.page_index();
        let second: *const PageIndex = s.page_index();
        assert_eq!(first, second);
        let v = ViolationDescriptor::new("a", "b").with_object_id("42");
        assert_eq!(s.resolve(&v), PageResolution::Page(1));
    }

    #[test]
    fn untagged_navigation_falls_back_to_outline() {
        let s = session();
        match s.navigation() {
            Navigation::Outline { notice, entries } => {
                assert_eq!(notice, TAGS_NOT_FOUND);
                assert!(entries.is_empty());
            }
            other => panic!("expected outline, got {other:?}"),
        }
    }

    #[test]
    fn tagged_navigation_returns_nodes() {
        let mut doc = MemoryDocument::with_pages(1);
        doc.catalog = Some(ObjectRef(1));
        doc.insert(ObjectRef(1), dict([("StructTreeRoot", Value::Ref(ObjectRef(2)))]));
        doc.insert(ObjectRef(2), dict([("K", Value::Ref(ObjectRef(3)))]));
        doc.insert(ObjectRef(3), dict([("S", Value::Name("P".into()))]));
        let s = Session::from_accessor(doc, ExtractOptions::default());
        let nav = s.navigation();
        assert!(nav.is_tagged());
    }

    #[test]
    fn plan_page_highlights_and_notices() {
        let s = session();
        let located = s.locate(&[
            ViolationDescriptor::new("a", "image").with_object_id("42 0 obj"),
            ViolationDescriptor::new("b", "untraceable").with_page(1),
        ]);
        let plan = s.plan_page(1, &located, Some(1)).unwrap();
        assert_eq!(plan.highlights.len(), 1);
        assert_eq!(plan.highlights[0].emphasis, Emphasis::Normal);
        assert_eq!(plan.labels.len(), 1);
        assert_eq!(plan.notice.as_deref(), Some(NOT_VISUAL_NOTICE));
    }

    #[test]
    fn plan_page_out_of_range() {
        let s = session();
        let located = s.locate(&[]);
        assert!(matches!(
            s.plan_page(9, &located, None),
            Err(PdfError::PageOutOfRange { page: 9, page_count: 3 })
        ));
    }
}
