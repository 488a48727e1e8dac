//! lopdf-based [`DocumentAccessor`] implementation.
//!
//! [`LopdfAccessor`] owns a parsed [`lopdf::Document`] and answers the
//! accessor queries: raw key lookup, page geometry, annotations, and the
//! images and text runs found by scanning page content.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use lopdf::{Dictionary, Object, ObjectId};
use pdflocate_core::{
    ContentRun, DocumentAccessor, ExtractOptions, ImagePlacement, ObjectRef, PageAnnotation,
    PdfError, Region, Value,
};
use tracing::debug;

use crate::content::{ContentScanner, PageScan, decode_stream, deref, deref_dict};
use crate::error::BackendError;

/// A parsed PDF document with cached page scans.
///
/// # Example
///
/// ```ignore
/// use pdflocate_parse::LopdfAccessor;
/// use pdflocate_core::DocumentAccessor;
///
/// let doc = LopdfAccessor::open_file("report.pdf")?;
/// println!("{} pages", doc.page_count());
/// ```
pub struct LopdfAccessor {
    inner: lopdf::Document,
    /// Page object IDs in page order.
    page_ids: Vec<ObjectId>,
    options: ExtractOptions,
    scans: RefCell<HashMap<usize, PageScan>>,
}

impl std::fmt::Debug for LopdfAccessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LopdfAccessor")
            .field("page_count", &self.page_ids.len())
            .finish_non_exhaustive()
    }
}

impl LopdfAccessor {
    /// Parse a document from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Parse`] for unreadable input and
    /// [`PdfError::PasswordRequired`] (wrapped) for encrypted documents.
    pub fn open(bytes: &[u8]) -> Result<Self, BackendError> {
        let inner = lopdf::Document::load_mem(bytes)
            .map_err(|e| BackendError::Parse(format!("failed to parse PDF: {e}")))?;

        if inner.is_encrypted() {
            return Err(BackendError::Core(PdfError::PasswordRequired));
        }

        // get_pages returns BTreeMap<u32, ObjectId> with 1-based keys
        let page_ids: Vec<ObjectId> = inner.get_pages().values().copied().collect();
        debug!(pages = page_ids.len(), "opened document");

        Ok(Self {
            inner,
            page_ids,
            options: ExtractOptions::default(),
            scans: RefCell::new(HashMap::new()),
        })
    }

    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Io`] if the file cannot be read, otherwise as
    /// [`LopdfAccessor::open`].
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::open(&bytes)
    }

    /// Replace the extraction bounds used for content scanning.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self.scans.borrow_mut().clear();
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// The underlying lopdf document.
    pub fn inner(&self) -> &lopdf::Document {
        &self.inner
    }

    /// Map an object number to a lopdf ID, whatever its generation.
    fn object_id(&self, object: ObjectRef) -> Option<ObjectId> {
        let n = object.0;
        if self.inner.objects.contains_key(&(n, 0)) {
            return Some((n, 0));
        }
        self.inner
            .objects
            .range((n, 0)..=(n, u16::MAX))
            .next()
            .map(|(id, _)| *id)
    }

    fn page_id(&self, page: usize) -> Result<ObjectId, BackendError> {
        self.page_ids.get(page).copied().ok_or_else(|| {
            BackendError::Core(PdfError::PageOutOfRange {
                page,
                page_count: self.page_ids.len(),
            })
        })
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary, BackendError> {
        self.inner
            .get_object(page_id)
            .and_then(|o| o.as_dict())
            .map_err(|e| BackendError::Parse(format!("failed to get page dictionary: {e}")))
    }

    /// Look up a page attribute, walking up `/Parent` links for inherited keys.
    fn resolve_inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut current = page_id;
        // a malformed /Parent chain could loop
        for _ in 0..64 {
            let dict = self.inner.get_object(current).ok()?.as_dict().ok()?;
            if let Ok(value) = dict.get(key) {
                return Some(value);
            }
            current = dict.get(b"Parent").ok()?.as_reference().ok()?;
        }
        None
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let obj = self.resolve_inherited(page_id, b"Resources")?;
        deref_dict(&self.inner, obj)
    }

    /// The page's content streams, concatenated.
    fn page_content(&self, page_dict: &Dictionary) -> Result<Vec<u8>, BackendError> {
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };
        let contents = deref(&self.inner, contents)
            .ok_or_else(|| BackendError::Parse("failed to resolve /Contents".to_string()))?;
        match contents {
            Object::Stream(stream) => decode_stream(stream),
            Object::Array(parts) => {
                let mut content = Vec::new();
                for part in parts {
                    let stream = deref(&self.inner, part)
                        .and_then(|o| o.as_stream().ok())
                        .ok_or_else(|| {
                            BackendError::Parse("/Contents array item is not a stream".to_string())
                        })?;
                    if !content.is_empty() {
                        content.push(b' ');
                    }
                    content.extend_from_slice(&decode_stream(stream)?);
                }
                Ok(content)
            }
            _ => Err(BackendError::Parse(
                "/Contents is not a stream or array".to_string(),
            )),
        }
    }

    fn scan_page(&self, page: usize) -> Result<PageScan, BackendError> {
        if let Some(scan) = self.scans.borrow().get(&page) {
            return Ok(scan.clone());
        }
        let page_id = self.page_id(page)?;
        let content = self.page_content(self.page_dict(page_id)?)?;
        let resources = self.page_resources(page_id);

        let mut scanner = ContentScanner::new(&self.inner, self.options.max_content_depth);
        scanner.scan(&content, resources, 0)?;
        let scan = scanner.finish();
        debug!(
            page,
            images = scan.images.len(),
            runs = scan.runs.len(),
            "scanned page content"
        );
        self.scans.borrow_mut().insert(page, scan.clone());
        Ok(scan)
    }

    fn annotations(&self, page: usize) -> Result<Vec<PageAnnotation>, BackendError> {
        let page_dict = self.page_dict(self.page_id(page)?)?;
        let Ok(annots) = page_dict.get(b"Annots") else {
            return Ok(Vec::new());
        };
        let annots = deref(&self.inner, annots)
            .and_then(|o| o.as_array().ok())
            .ok_or_else(|| BackendError::Parse("/Annots is not an array".to_string()))?;

        let mut out = Vec::new();
        for entry in annots {
            let object = entry.as_reference().ok().map(|id| ObjectRef(id.0));
            let Some(dict) = deref_dict(&self.inner, entry) else {
                debug!(page, "skipping unresolvable annotation");
                continue;
            };
            let Some(region) = dict
                .get(b"Rect")
                .ok()
                .and_then(|o| deref(&self.inner, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| region_from_array(arr))
            else {
                debug!(page, "skipping annotation without /Rect");
                continue;
            };
            let subtype = dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).into_owned())
                .unwrap_or_default();
            out.push(PageAnnotation {
                object,
                subtype,
                region,
            });
        }
        Ok(out)
    }

    fn xobjects(&self, page: usize) -> Result<Vec<ObjectRef>, BackendError> {
        let page_id = self.page_id(page)?;
        let Some(xobjects) = self
            .page_resources(page_id)
            .and_then(|res| res.get(b"XObject").ok())
            .and_then(|o| deref_dict(&self.inner, o))
        else {
            return Ok(Vec::new());
        };
        Ok(xobjects
            .iter()
            .filter_map(|(_, v)| v.as_reference().ok())
            .map(|id| ObjectRef(id.0))
            .collect())
    }
}

impl DocumentAccessor for LopdfAccessor {
    fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    fn page_ref(&self, page: usize) -> Option<ObjectRef> {
        self.page_ids.get(page).map(|id| ObjectRef(id.0))
    }

    fn catalog(&self) -> Option<ObjectRef> {
        self.inner
            .trailer
            .get(b"Root")
            .ok()?
            .as_reference()
            .ok()
            .map(|id| ObjectRef(id.0))
    }

    fn get_key(&self, object: ObjectRef, key: &str) -> Option<Value> {
        let id = self.object_id(object)?;
        let dict = match self.inner.get_object(id).ok()? {
            Object::Dictionary(dict) => dict,
            Object::Stream(stream) => &stream.dict,
            _ => return None,
        };
        dict.get(key.as_bytes()).ok().map(to_value)
    }

    fn page_images(&self, page: usize) -> Result<Vec<ImagePlacement>, PdfError> {
        Ok(self.scan_page(page)?.images)
    }

    fn page_annotations(&self, page: usize) -> Result<Vec<PageAnnotation>, PdfError> {
        Ok(self.annotations(page)?)
    }

    fn page_xobjects(&self, page: usize) -> Result<Vec<ObjectRef>, PdfError> {
        Ok(self.xobjects(page)?)
    }

    fn page_runs(&self, page: usize) -> Result<Vec<ContentRun>, PdfError> {
        Ok(self.scan_page(page)?.runs)
    }

    fn page_rect(&self, page: usize) -> Option<Region> {
        let page_id = *self.page_ids.get(page)?;
        [b"CropBox".as_slice(), b"MediaBox".as_slice()]
            .iter()
            .find_map(|key| {
                let obj = self.resolve_inherited(page_id, key)?;
                region_from_array(deref(&self.inner, obj)?.as_array().ok()?)
            })
    }
}

/// A `[x0 y0 x1 y1]` rectangle, normalized.
fn region_from_array(arr: &[Object]) -> Option<Region> {
    if arr.len() != 4 {
        return None;
    }
    let n: Vec<f64> = arr.iter().filter_map(number).collect();
    (n.len() == 4).then(|| Region::new(n[0], n[1], n[2], n[3]).normalized())
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(f64::from(*r)),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, UTF-8 when
/// valid, otherwise byte-per-character.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(b"\xFE\xFF") {
        return crate::content::decode_text(bytes);
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => crate::content::decode_text(bytes),
    }
}

/// Convert a lopdf object to a [`Value`]. References are kept, not followed.
fn to_value(obj: &Object) -> Value {
    match obj {
        Object::Null => Value::Null,
        Object::Boolean(b) => Value::Bool(*b),
        Object::Integer(i) => Value::Int(*i),
        Object::Real(r) => Value::Real(f64::from(*r)),
        Object::Name(name) => Value::Name(String::from_utf8_lossy(name).into_owned()),
        Object::String(bytes, _) => Value::Text(decode_pdf_string(bytes)),
        Object::Array(items) => Value::Array(items.iter().map(to_value).collect()),
        Object::Dictionary(dict) => Value::Dict(dict_to_map(dict)),
        Object::Stream(stream) => Value::Dict(dict_to_map(&stream.dict)),
        Object::Reference(id) => Value::Ref(ObjectRef(id.0)),
    }
}

fn dict_to_map(dict: &Dictionary) -> BTreeMap<String, Value> {
    dict.iter()
        .map(|(k, v)| (String::from_utf8_lossy(k).into_owned(), to_value(v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Stream, StringFormat, dictionary};

    fn save(mut doc: Document) -> Vec<u8> {
        let mut buf = Vec::new();
        doc.save_to(&mut buf).expect("failed to save test PDF");
        buf
    }

    /// Minimal document; `page` is extended with Type/Parent.
    fn single_page(doc: &mut Document, page: Dictionary) -> ObjectId {
        let pages_id = doc.new_object_id();
        let mut page = page;
        page.set("Type", "Page");
        page.set("Parent", pages_id);
        let page_id = doc.add_object(page);
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::from(page_id)],
                "Count" => 1i64,
                "MediaBox" => vec![0i64.into(), 0i64.into(), 612i64.into(), 792i64.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        page_id
    }

    #[test]
    fn open_rejects_garbage() {
        assert!(matches!(
            LopdfAccessor::open(b"not a pdf"),
            Err(BackendError::Parse(_))
        ));
    }

    #[test]
    fn open_file_missing_is_io_error() {
        assert!(matches!(
            LopdfAccessor::open_file("/nonexistent/file.pdf"),
            Err(BackendError::Io(_))
        ));
    }

    #[test]
    fn inherited_media_box_is_page_rect() {
        let mut doc = Document::with_version("1.5");
        single_page(&mut doc, Dictionary::new());
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        assert_eq!(acc.page_count(), 1);
        assert_eq!(acc.page_rect(0), Some(Region::new(0.0, 0.0, 612.0, 792.0)));
        assert_eq!(acc.page_rect(1), None);
    }

    #[test]
    fn crop_box_wins_over_media_box() {
        let mut doc = Document::with_version("1.5");
        single_page(
            &mut doc,
            dictionary! {
                "CropBox" => vec![10i64.into(), 10i64.into(), 300i64.into(), 400i64.into()],
            },
        );
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        assert_eq!(acc.page_rect(0), Some(Region::new(10.0, 10.0, 300.0, 400.0)));
    }

    #[test]
    fn get_key_converts_values() {
        let mut doc = Document::with_version("1.5");
        let page_id = single_page(&mut doc, Dictionary::new());
        let elem = doc.add_object(dictionary! {
            "S" => "H1",
            "T" => Object::String(b"Intro".to_vec(), StringFormat::Literal),
            "Pg" => page_id,
            "K" => vec![Object::Integer(0), Object::Integer(1)],
        });
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        let r = ObjectRef(elem.0);
        assert_eq!(acc.get_key(r, "S"), Some(Value::Name("H1".into())));
        assert_eq!(acc.get_key(r, "T"), Some(Value::Text("Intro".into())));
        assert_eq!(acc.get_key(r, "Pg"), Some(Value::Ref(ObjectRef(page_id.0))));
        assert_eq!(
            acc.get_key(r, "K"),
            Some(Value::Array(vec![Value::Int(0), Value::Int(1)]))
        );
        assert_eq!(acc.get_key(r, "Missing"), None);
        assert_eq!(acc.get_key(ObjectRef(9999), "S"), None);
    }

    #[test]
    fn utf16_strings_decode() {
        assert_eq!(decode_pdf_string(b"\xFE\xFF\x00H\x00i"), "Hi");
        assert_eq!(decode_pdf_string(b"plain"), "plain");
        assert_eq!(decode_pdf_string(b"\xE9t\xE9"), "été");
    }

    #[test]
    fn annotations_and_widgets_with_rects() {
        let mut doc = Document::with_version("1.5");
        let link = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![100i64.into(), 100i64.into(), 200i64.into(), 120i64.into()],
        });
        let widget = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "Rect" => vec![300i64.into(), 50i64.into(), 250i64.into(), 80i64.into()],
        });
        let no_rect = doc.add_object(dictionary! { "Subtype" => "Text" });
        single_page(
            &mut doc,
            dictionary! {
                "Annots" => vec![link.into(), widget.into(), no_rect.into()],
            },
        );
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        let annots = acc.page_annotations(0).unwrap();
        assert_eq!(annots.len(), 2);
        assert_eq!(annots[0].object, Some(ObjectRef(link.0)));
        assert_eq!(annots[0].subtype, "Link");
        assert!(annots[1].is_widget());
        assert_eq!(annots[1].region, Region::new(250.0, 50.0, 300.0, 80.0));
    }

    #[test]
    fn page_scan_finds_images_and_xobjects() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 2i64,
                "Height" => 2i64,
            },
            vec![0; 12],
        )));
        let content_id = doc.add_object(Object::Stream(Stream::new(
            Dictionary::new(),
            b"q 200 0 0 150 100 300 cm /Im0 Do Q q 50 0 0 50 400 600 cm /Im0 Do Q".to_vec(),
        )));
        single_page(
            &mut doc,
            dictionary! {
                "Contents" => content_id,
                "Resources" => Object::Dictionary(dictionary! {
                    "XObject" => Object::Dictionary(dictionary! { "Im0" => image_id }),
                }),
            },
        );
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        let images = acc.page_images(0).unwrap();
        assert_eq!(images.len(), 2);
        assert!(images.iter().all(|i| i.object == ObjectRef(image_id.0)));
        assert_eq!(images[0].region, Region::new(100.0, 300.0, 300.0, 450.0));
        assert_eq!(acc.page_xobjects(0).unwrap(), vec![ObjectRef(image_id.0)]);
        // cached scan returns the same result
        assert_eq!(acc.page_images(0).unwrap(), images);
    }

    #[test]
    fn out_of_range_page_is_an_error() {
        let mut doc = Document::with_version("1.5");
        single_page(&mut doc, Dictionary::new());
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        assert!(matches!(
            acc.page_runs(3),
            Err(PdfError::PageOutOfRange { page: 3, page_count: 1 })
        ));
    }

    #[test]
    fn catalog_is_trailer_root() {
        let mut doc = Document::with_version("1.5");
        single_page(&mut doc, Dictionary::new());
        let acc = LopdfAccessor::open(&save(doc)).unwrap();
        let catalog = acc.catalog().unwrap();
        assert_eq!(acc.get_key(catalog, "Type"), Some(Value::Name("Catalog".into())));
    }
}
