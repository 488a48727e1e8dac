//! In-memory [`DocumentAccessor`] for tests and synthetic documents.

use std::collections::HashMap;

use crate::accessor::{ContentRun, DocumentAccessor, ImagePlacement, PageAnnotation};
use crate::error::PdfError;
use crate::geometry::Region;
use crate::object::{ObjectRef, Value};

/// One page of a [`MemoryDocument`].
#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub object: ObjectRef,
    pub rect: Region,
    pub images: Vec<ImagePlacement>,
    pub annotations: Vec<PageAnnotation>,
    pub xobjects: Vec<ObjectRef>,
    pub runs: Vec<ContentRun>,
    /// Simulate a page whose dictionary cannot be read at all.
    pub broken: bool,
    /// Simulate a page whose content stream cannot be read; annotations
    /// and resources stay readable.
    pub broken_content: bool,
}

impl MemoryPage {
    /// An empty US-Letter page.
    pub fn new(object: ObjectRef) -> Self {
        Self {
            object,
            rect: Region::new(0.0, 0.0, 612.0, 792.0),
            images: Vec::new(),
            annotations: Vec::new(),
            xobjects: Vec::new(),
            runs: Vec::new(),
            broken: false,
            broken_content: false,
        }
    }

    pub fn with_image(mut self, object: ObjectRef, region: Region) -> Self {
        self.images.push(ImagePlacement {
            object,
            region,
            mcid: None,
        });
        self
    }

    pub fn with_annotation(mut self, object: ObjectRef, subtype: &str, region: Region) -> Self {
        self.annotations.push(PageAnnotation {
            object: Some(object),
            subtype: subtype.to_string(),
            region,
        });
        self
    }

    pub fn with_xobject(mut self, object: ObjectRef) -> Self {
        self.xobjects.push(object);
        self
    }

    pub fn with_run(mut self, run: ContentRun) -> Self {
        self.runs.push(run);
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn broken_content(mut self) -> Self {
        self.broken_content = true;
        self
    }
}

/// A document held entirely in memory.
///
/// Objects are plain [`Value`]s keyed by [`ObjectRef`]; pages carry their
/// placements directly instead of content streams.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
    pub objects: HashMap<ObjectRef, Value>,
    pub catalog: Option<ObjectRef>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document with `count` empty pages whose objects are numbered from 1000.
    pub fn with_pages(count: usize) -> Self {
        let mut doc = Self::new();
        for i in 0..count {
            doc.pages.push(MemoryPage::new(ObjectRef(1000 + i as u32)));
        }
        doc
    }

    pub fn insert(&mut self, object: ObjectRef, value: Value) {
        self.objects.insert(object, value);
    }

    fn page(&self, page: usize) -> Result<&MemoryPage, PdfError> {
        let p = self.pages.get(page).ok_or(PdfError::PageOutOfRange {
            page,
            page_count: self.pages.len(),
        })?;
        if p.broken {
            return Err(PdfError::ParseError(format!(
                "page {page} content is unreadable"
            )));
        }
        Ok(p)
    }

    fn content(&self, page: usize) -> Result<&MemoryPage, PdfError> {
        let p = self.page(page)?;
        if p.broken_content {
            return Err(PdfError::ParseError(format!(
                "page {page} content stream is unreadable"
            )));
        }
        Ok(p)
    }
}

impl DocumentAccessor for MemoryDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_ref(&self, page: usize) -> Option<ObjectRef> {
        self.pages.get(page).map(|p| p.object)
    }

    fn catalog(&self) -> Option<ObjectRef> {
        self.catalog
    }

    fn get_key(&self, object: ObjectRef, key: &str) -> Option<Value> {
        self.objects.get(&object)?.get(key).cloned()
    }

    fn page_images(&self, page: usize) -> Result<Vec<ImagePlacement>, PdfError> {
        Ok(self.content(page)?.images.clone())
    }

    fn page_annotations(&self, page: usize) -> Result<Vec<PageAnnotation>, PdfError> {
        Ok(self.page(page)?.annotations.clone())
    }

    fn page_xobjects(&self, page: usize) -> Result<Vec<ObjectRef>, PdfError> {
        Ok(self.page(page)?.xobjects.clone())
    }

    fn page_runs(&self, page: usize) -> Result<Vec<ContentRun>, PdfError> {
        Ok(self.content(page)?.runs.clone())
    }

    fn page_rect(&self, page: usize) -> Option<Region> {
        self.pages.get(page).map(|p| p.rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::dict;

    #[test]
    fn get_key_reads_dictionary_entries() {
        let mut doc = MemoryDocument::with_pages(1);
        doc.insert(ObjectRef(5), dict([("S", Value::Name("P".into()))]));
        assert_eq!(doc.get_key(ObjectRef(5), "S"), Some(Value::Name("P".into())));
        assert_eq!(doc.get_key(ObjectRef(5), "T"), None);
        assert_eq!(doc.get_key(ObjectRef(6), "S"), None);
    }

    #[test]
    fn broken_page_errors() {
        let mut doc = MemoryDocument::with_pages(2);
        doc.pages[1] = doc.pages[1].clone().broken();
        assert!(doc.page_images(0).is_ok());
        assert!(doc.page_images(1).is_err());
        assert!(matches!(
            doc.page_runs(5),
            Err(PdfError::PageOutOfRange { page: 5, page_count: 2 })
        ));
    }

    #[test]
    fn broken_content_only_hides_content() {
        let mut doc = MemoryDocument::with_pages(1);
        doc.pages[0] = doc.pages[0].clone().broken_content();
        assert!(doc.page_images(0).is_err());
        assert!(doc.page_runs(0).is_err());
        assert!(doc.page_annotations(0).is_ok());
        assert!(doc.page_xobjects(0).is_ok());
    }

    #[test]
    fn page_refs_are_numbered_from_1000() {
        let doc = MemoryDocument::with_pages(3);
        assert_eq!(doc.page_ref(2), Some(ObjectRef(1002)));
        assert_eq!(doc.page_ref(3), None);
    }
}
