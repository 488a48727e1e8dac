//! Page content scanning.
//!
//! Follows the graphics state, text positioning and marked-content nesting of
//! a page's content stream and records where images land and where text is
//! shown. Glyph widths are approximated from the font size; the result is
//! meant for locating content, not for text extraction.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pdflocate_core::{ContentRun, Ctm, ImagePlacement, ObjectRef, Region, RunKind};
use tracing::debug;

use crate::error::BackendError;
use crate::tokenizer::{Operand, Operator, tokenize};

/// Advance of one glyph, as a fraction of the font size.
const GLYPH_ADVANCE: f64 = 0.5;

/// Everything found on one page.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageScan {
    pub images: Vec<ImagePlacement>,
    pub runs: Vec<ContentRun>,
}

/// Follow an indirect reference, if `obj` is one.
pub(crate) fn deref<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Resolve `obj` to a dictionary; stream dictionaries count.
pub(crate) fn deref_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    match deref(doc, obj)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Decode a content stream, decompressing if needed.
pub(crate) fn decode_stream(stream: &lopdf::Stream) -> Result<Vec<u8>, BackendError> {
    if stream.dict.get(b"Filter").is_ok() {
        stream
            .decompressed_content()
            .map_err(|e| BackendError::Parse(format!("failed to decompress content stream: {e}")))
    } else {
        Ok(stream.content.clone())
    }
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else Latin-1.
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(b"\xFE\xFF") {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        bytes.iter().map(|&b| char::from(b)).collect()
    }
}

#[derive(Debug, Clone)]
struct TextState {
    font_size: f64,
    leading: f64,
    char_spacing: f64,
    word_spacing: f64,
    tm: Ctm,
    tlm: Ctm,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            tm: Ctm::identity(),
            tlm: Ctm::identity(),
        }
    }
}

impl TextState {
    fn next_line(&mut self, tx: f64, ty: f64) {
        self.tlm = Ctm::new(1.0, 0.0, 0.0, 1.0, tx, ty).concat(&self.tlm);
        self.tm = self.tlm;
    }
}

/// Scans one content stream and the forms it draws.
pub(crate) struct ContentScanner<'a> {
    doc: &'a Document,
    max_depth: usize,
    ctm: Ctm,
    ctm_stack: Vec<Ctm>,
    text: TextState,
    /// One entry per open `BMC`/`BDC`; `None` for sequences without an MCID.
    marked: Vec<Option<i64>>,
    out: PageScan,
}

impl<'a> ContentScanner<'a> {
    pub(crate) fn new(doc: &'a Document, max_depth: usize) -> Self {
        Self {
            doc,
            max_depth,
            ctm: Ctm::identity(),
            ctm_stack: Vec::new(),
            text: TextState::default(),
            marked: Vec::new(),
            out: PageScan::default(),
        }
    }

    pub(crate) fn finish(self) -> PageScan {
        self.out
    }

    /// Scan `content` drawn with `resources`.
    pub(crate) fn scan(
        &mut self,
        content: &[u8],
        resources: Option<&'a Dictionary>,
        depth: usize,
    ) -> Result<(), BackendError> {
        let ops = tokenize(content);
        for op in &ops {
            self.apply(op, resources, depth)?;
        }
        Ok(())
    }

    fn current_mcid(&self) -> Option<i64> {
        self.marked.iter().rev().find_map(|m| *m)
    }

    fn apply(
        &mut self,
        op: &Operator,
        resources: Option<&'a Dictionary>,
        depth: usize,
    ) -> Result<(), BackendError> {
        let nums: Vec<f64> = op.operands.iter().filter_map(Operand::as_f64).collect();
        match op.name.as_str() {
            "q" => self.ctm_stack.push(self.ctm),
            "Q" => {
                if let Some(saved) = self.ctm_stack.pop() {
                    self.ctm = saved;
                }
            }
            "cm" if nums.len() == 6 => {
                let m = Ctm::new(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                self.ctm = m.concat(&self.ctm);
            }
            "BT" => {
                self.text.tm = Ctm::identity();
                self.text.tlm = Ctm::identity();
            }
            "Tf" => {
                if let Some(size) = op.operands.get(1).and_then(Operand::as_f64) {
                    self.text.font_size = size;
                }
            }
            "TL" if !nums.is_empty() => self.text.leading = nums[0],
            "Tc" if !nums.is_empty() => self.text.char_spacing = nums[0],
            "Tw" if !nums.is_empty() => self.text.word_spacing = nums[0],
            "Td" if nums.len() == 2 => self.text.next_line(nums[0], nums[1]),
            "TD" if nums.len() == 2 => {
                self.text.leading = -nums[1];
                self.text.next_line(nums[0], nums[1]);
            }
            "Tm" if nums.len() == 6 => {
                let m = Ctm::new(nums[0], nums[1], nums[2], nums[3], nums[4], nums[5]);
                self.text.tm = m;
                self.text.tlm = m;
            }
            "T*" => {
                let leading = self.text.leading;
                self.text.next_line(0.0, -leading);
            }
            "Tj" => {
                if let Some(Operand::Bytes(bytes)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                let leading = self.text.leading;
                self.text.next_line(0.0, -leading);
                if let Some(Operand::Bytes(bytes)) = op.operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                if nums.len() >= 2 {
                    self.text.word_spacing = nums[0];
                    self.text.char_spacing = nums[1];
                }
                let leading = self.text.leading;
                self.text.next_line(0.0, -leading);
                if let Some(Operand::Bytes(bytes)) = op.operands.last() {
                    self.show(bytes);
                }
            }
            "TJ" => {
                if let Some(Operand::Array(items)) = op.operands.first() {
                    for item in items {
                        match item {
                            Operand::Bytes(bytes) => self.show(bytes),
                            other => {
                                if let Some(adjust) = other.as_f64() {
                                    let tx = -adjust / 1000.0 * self.text.font_size;
                                    self.text.tm =
                                        Ctm::new(1.0, 0.0, 0.0, 1.0, tx, 0.0).concat(&self.text.tm);
                                }
                            }
                        }
                    }
                }
            }
            "BMC" => self.marked.push(None),
            "BDC" => {
                let mcid = self.bdc_mcid(op.operands.get(1), resources);
                self.marked.push(mcid);
            }
            "EMC" => {
                self.marked.pop();
            }
            "Do" => {
                if let Some(Operand::Name(name)) = op.operands.first() {
                    self.draw_xobject(name, resources, depth)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Record a shown string and advance the text matrix past it.
    fn show(&mut self, bytes: &[u8]) {
        let size = self.text.font_size;
        let spaces = bytes.iter().filter(|&&b| b == b' ').count() as f64;
        let width = bytes.len() as f64 * (GLYPH_ADVANCE * size + self.text.char_spacing)
            + spaces * self.text.word_spacing;
        let trm = self.text.tm.concat(&self.ctm);
        let region = trm.transform_region(&Region::new(0.0, 0.0, width, size));
        let text = decode_text(bytes);
        if !text.is_empty() {
            self.out.runs.push(ContentRun {
                kind: RunKind::Text,
                text,
                region,
                mcid: self.current_mcid(),
            });
        }
        self.text.tm = Ctm::new(1.0, 0.0, 0.0, 1.0, width, 0.0).concat(&self.text.tm);
    }

    /// The MCID of a `BDC` property list, inline or named in `/Properties`.
    fn bdc_mcid(&self, props: Option<&Operand>, resources: Option<&'a Dictionary>) -> Option<i64> {
        match props? {
            Operand::Dictionary(entries) => entries.iter().find_map(|(k, v)| match (k.as_str(), v) {
                ("MCID", Operand::Integer(n)) => Some(*n),
                _ => None,
            }),
            Operand::Name(name) => {
                let properties = deref_dict(self.doc, resources?.get(b"Properties").ok()?)?;
                let entry = deref_dict(self.doc, properties.get(name.as_bytes()).ok()?)?;
                entry.get(b"MCID").ok()?.as_i64().ok()
            }
            _ => None,
        }
    }

    fn draw_xobject(
        &mut self,
        name: &str,
        resources: Option<&'a Dictionary>,
        depth: usize,
    ) -> Result<(), BackendError> {
        let Some((id, stream)) = self.lookup_xobject(name, resources) else {
            debug!(name, "XObject not found in resources");
            return Ok(());
        };
        let subtype = stream
            .dict
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .unwrap_or_default();

        match subtype {
            b"Image" => {
                let region = self.ctm.unit_square();
                let mcid = self.current_mcid();
                self.out.images.push(ImagePlacement {
                    object: ObjectRef(id.0),
                    region,
                    mcid,
                });
                self.out.runs.push(ContentRun {
                    kind: RunKind::Image,
                    text: String::new(),
                    region,
                    mcid,
                });
            }
            b"Form" => {
                if depth >= self.max_depth {
                    debug!(name, depth, "form XObject nesting too deep, skipping");
                    return Ok(());
                }
                let content = match decode_stream(stream) {
                    Ok(content) => content,
                    Err(err) => {
                        debug!(name, %err, "cannot decode form XObject, skipping");
                        return Ok(());
                    }
                };
                let form_resources = stream
                    .dict
                    .get(b"Resources")
                    .ok()
                    .and_then(|o| deref_dict(self.doc, o))
                    .or(resources);

                let saved_ctm = self.ctm;
                let saved_stack = self.ctm_stack.len();
                let saved_text = self.text.clone();
                // the form sees the enclosing MCID; its own BDC/EMC do not leak out
                let saved_marked = self.marked.clone();
                if let Some(m) = stream
                    .dict
                    .get(b"Matrix")
                    .ok()
                    .and_then(|o| o.as_array().ok())
                    .and_then(|arr| matrix_from_array(arr))
                {
                    self.ctm = m.concat(&self.ctm);
                }
                let result = self.scan(&content, form_resources, depth + 1);
                self.ctm = saved_ctm;
                self.ctm_stack.truncate(saved_stack);
                self.text = saved_text;
                self.marked = saved_marked;
                result?;
            }
            other => {
                debug!(name, subtype = %String::from_utf8_lossy(other), "ignoring XObject");
            }
        }
        Ok(())
    }

    fn lookup_xobject(
        &self,
        name: &str,
        resources: Option<&'a Dictionary>,
    ) -> Option<(ObjectId, &'a lopdf::Stream)> {
        let xobjects = deref_dict(self.doc, resources?.get(b"XObject").ok()?)?;
        let id = xobjects.get(name.as_bytes()).ok()?.as_reference().ok()?;
        let stream = self.doc.get_object(id).ok()?.as_stream().ok()?;
        Some((id, stream))
    }
}

fn matrix_from_array(arr: &[Object]) -> Option<Ctm> {
    if arr.len() != 6 {
        return None;
    }
    let n: Vec<f64> = arr
        .iter()
        .filter_map(|o| match o {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(f64::from(*r)),
            _ => None,
        })
        .collect();
    (n.len() == 6).then(|| Ctm::new(n[0], n[1], n[2], n[3], n[4], n[5]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Stream, dictionary};

    fn scan_with(doc: &Document, content: &[u8], resources: Option<&Dictionary>) -> PageScan {
        let mut scanner = ContentScanner::new(doc, 10);
        scanner.scan(content, resources, 0).unwrap();
        scanner.finish()
    }

    fn image_doc() -> (Document, Dictionary) {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1i64,
                "Height" => 1i64,
            },
            vec![0],
        )));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! { "Im0" => image_id }),
        };
        (doc, resources)
    }

    #[test]
    fn image_placement_follows_ctm() {
        let (doc, resources) = image_doc();
        let scan = scan_with(
            &doc,
            b"q 200 0 0 150 100 300 cm /Im0 Do Q",
            Some(&resources),
        );
        assert_eq!(scan.images.len(), 1);
        assert_eq!(scan.images[0].region, Region::new(100.0, 300.0, 300.0, 450.0));
        assert_eq!(scan.images[0].mcid, None);
    }

    #[test]
    fn image_inside_marked_content_carries_mcid() {
        let (doc, resources) = image_doc();
        let scan = scan_with(
            &doc,
            b"/Figure <</MCID 4>> BDC q 10 0 0 10 0 0 cm /Im0 Do Q EMC",
            Some(&resources),
        );
        assert_eq!(scan.images[0].mcid, Some(4));
        assert_eq!(scan.runs[0].kind, RunKind::Image);
        assert_eq!(scan.runs[0].mcid, Some(4));
    }

    #[test]
    fn text_run_position_and_width() {
        let doc = Document::with_version("1.5");
        let scan = scan_with(&doc, b"BT /F1 10 Tf 72 700 Td (Hello) Tj ET", None);
        assert_eq!(scan.runs.len(), 1);
        assert_eq!(scan.runs[0].text, "Hello");
        assert_eq!(scan.runs[0].region, Region::new(72.0, 700.0, 97.0, 710.0));
    }

    #[test]
    fn tj_advances_the_text_matrix() {
        let doc = Document::with_version("1.5");
        let scan = scan_with(&doc, b"BT /F1 10 Tf (ab) Tj (cd) Tj ET", None);
        assert_eq!(scan.runs[1].region.x0, 10.0);
    }

    #[test]
    fn mcid_from_named_properties() {
        let doc = Document::with_version("1.5");
        let resources = dictionary! {
            "Properties" => Object::Dictionary(dictionary! {
                "P0" => Object::Dictionary(dictionary! { "MCID" => 7i64 }),
            }),
        };
        let scan = scan_with(
            &doc,
            b"/P /P0 BDC BT (x) Tj ET EMC BT (y) Tj ET",
            Some(&resources),
        );
        assert_eq!(scan.runs[0].mcid, Some(7));
        assert_eq!(scan.runs[1].mcid, None);
    }

    #[test]
    fn nested_bmc_keeps_outer_mcid() {
        let doc = Document::with_version("1.5");
        let scan = scan_with(
            &doc,
            b"/P <</MCID 2>> BDC /Span BMC BT (x) Tj ET EMC EMC",
            None,
        );
        assert_eq!(scan.runs[0].mcid, Some(2));
    }

    #[test]
    fn form_xobject_applies_matrix_and_recurses() {
        let mut doc = Document::with_version("1.5");
        let image_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! { "Subtype" => "Image", "Width" => 1i64, "Height" => 1i64 },
            vec![0],
        )));
        let form_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {
                "Subtype" => "Form",
                "BBox" => vec![0i64.into(), 0i64.into(), 100i64.into(), 100i64.into()],
                "Matrix" => vec![
                    1i64.into(),
                    0i64.into(),
                    0i64.into(),
                    1i64.into(),
                    50i64.into(),
                    50i64.into(),
                ],
                "Resources" => Object::Dictionary(dictionary! {
                    "XObject" => Object::Dictionary(dictionary! { "Im1" => image_id }),
                }),
            },
            b"q 20 0 0 20 0 0 cm /Im1 Do Q".to_vec(),
        )));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! { "Fm0" => form_id }),
        };
        let scan = scan_with(&doc, b"/Fm0 Do", Some(&resources));
        assert_eq!(scan.images.len(), 1);
        assert_eq!(scan.images[0].object, ObjectRef(image_id.0));
        assert_eq!(scan.images[0].region, Region::new(50.0, 50.0, 70.0, 70.0));
    }

    #[test]
    fn self_referencing_form_stops_at_depth_limit() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.new_object_id();
        doc.objects.insert(
            form_id,
            Object::Stream(Stream::new(
                dictionary! {
                    "Subtype" => "Form",
                    "Resources" => Object::Dictionary(dictionary! {
                        "XObject" => Object::Dictionary(dictionary! { "Fm0" => form_id }),
                    }),
                },
                b"/Fm0 Do".to_vec(),
            )),
        );
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! { "Fm0" => form_id }),
        };
        let scan = scan_with(&doc, b"/Fm0 Do", Some(&resources));
        assert!(scan.images.is_empty());
    }

    #[test]
    fn unbalanced_bdc_in_form_does_not_leak() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! { "Subtype" => "Form" },
            b"/Span <</MCID 9>> BDC BT (inner) Tj ET".to_vec(),
        )));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! { "Fm0" => form_id }),
        };
        let scan = scan_with(
            &doc,
            b"/P <</MCID 1>> BDC /Fm0 Do BT (after) Tj ET EMC BT (outside) Tj ET",
            Some(&resources),
        );
        let mcids: Vec<Option<i64>> = scan.runs.iter().map(|r| r.mcid).collect();
        assert_eq!(mcids, vec![Some(9), Some(1), None]);
    }

    #[test]
    fn form_inherits_enclosing_mcid() {
        let mut doc = Document::with_version("1.5");
        let form_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! { "Subtype" => "Form" },
            b"EMC BT (inner) Tj ET".to_vec(),
        )));
        let resources = dictionary! {
            "XObject" => Object::Dictionary(dictionary! { "Fm0" => form_id }),
        };
        let scan = scan_with(
            &doc,
            b"/P <</MCID 3>> BDC /Fm0 Do BT (after) Tj ET EMC",
            Some(&resources),
        );
        // the stray EMC inside the form closes nothing outside it
        assert_eq!(scan.runs[0].mcid, None);
        assert_eq!(scan.runs[1].mcid, Some(3));
    }

    #[test]
    fn truncated_stream_keeps_earlier_placements() {
        let (doc, resources) = image_doc();
        let scan = scan_with(
            &doc,
            b"q 10 0 0 10 0 0 cm /Im0 Do Q BT (unterminated",
            Some(&resources),
        );
        assert_eq!(scan.images.len(), 1);
        assert_eq!(scan.images[0].region, Region::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn missing_xobject_is_ignored() {
        let doc = Document::with_version("1.5");
        let scan = scan_with(&doc, b"/Nope Do", None);
        assert!(scan.images.is_empty());
    }

    #[test]
    fn decode_text_handles_utf16_bom() {
        assert_eq!(decode_text(&[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9]), "Aé");
        assert_eq!(decode_text(b"caf\xe9"), "café");
    }
}
