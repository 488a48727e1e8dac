//! Burn draw plans into a copy of the document.
//!
//! Each page with something to draw gets an extra content stream appended
//! after its own, bracketed so the page's graphics state cannot leak into
//! the overlay. Text uses a standard Helvetica font added once to the copy.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use pdflocate_core::{DocumentAccessor, DrawPlan, Emphasis, Label, PdfError, Point, Region};
use pdflocate_parse::LopdfAccessor;
use tracing::{debug, info};

use crate::session::{DEFAULT_PAGE_RECT, Localization, Session};

/// Font resource name added to annotated pages.
const FONT_NAME: &str = "PdfLocateHelv";

/// Bound on /Parent hops when looking for inherited resources.
const MAX_PARENT_HOPS: usize = 32;

/// Distance of the not-visual notice from the bottom-left corner.
const NOTICE_INSET: f64 = 30.0;

type Rgb = (f32, f32, f32);

const HIGHLIGHT: Rgb = (1.0, 0.39, 0.0);
const HIGHLIGHT_FOCUSED: Rgb = (1.0, 0.0, 0.0);
const LABEL: Rgb = (1.0, 0.0, 0.0);
const HEADER_FILL: Rgb = (1.0, 0.9, 0.9);
const HEADER_BORDER: Rgb = (0.8, 0.0, 0.0);
const TITLE: Rgb = (0.5, 0.0, 0.0);
const BLACK: Rgb = (0.0, 0.0, 0.0);

/// Where the annotated copy of `input` goes: `<stem>_annotated.<ext>` in the
/// same directory.
pub fn annotated_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pdf".to_string());
    input.with_file_name(format!("{stem}_annotated.{ext}"))
}

impl Session<LopdfAccessor> {
    /// Draw every page's plan into a copy of the document and serialize it.
    ///
    /// The open document is not modified. Pages with nothing to draw are
    /// written unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Other`] when the copy cannot be modified or saved.
    pub fn annotate(
        &self,
        located: &Localization,
        focused: Option<usize>,
    ) -> Result<Vec<u8>, PdfError> {
        let mut doc = self.accessor().inner().clone();
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        let font = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut drawn = 0usize;
        for (page, &page_id) in page_ids.iter().enumerate() {
            let plan = self.plan_page(page, located, focused)?;
            if plan.is_empty() {
                continue;
            }
            let page_rect = self.accessor().page_rect(page).unwrap_or(DEFAULT_PAGE_RECT);
            let overlay = Content {
                operations: plan_operations(&plan, &page_rect),
            }
            .encode()
            .map_err(write_error)?;
            add_font(&mut doc, page_id, font)?;
            append_overlay(&mut doc, page_id, overlay)?;
            drawn += 1;
            debug!(
                page,
                highlights = plan.highlights.len(),
                labels = plan.labels.len(),
                header = plan.header.is_some(),
                "page annotated"
            );
        }

        let mut out = Vec::new();
        doc.save_to(&mut out).map_err(write_error)?;
        info!(pages = drawn, bytes = out.len(), "annotated copy built");
        Ok(out)
    }

    /// [`Session::annotate`], written to `output`.
    ///
    /// # Errors
    ///
    /// As [`Session::annotate`], plus [`PdfError::IoError`] when `output`
    /// cannot be written.
    #[cfg(feature = "std")]
    pub fn annotate_to_file(
        &self,
        located: &Localization,
        focused: Option<usize>,
        output: impl AsRef<Path>,
    ) -> Result<(), PdfError> {
        let output = output.as_ref();
        let bytes = self.annotate(located, focused)?;
        std::fs::write(output, bytes)?;
        info!(path = %output.display(), "annotated copy saved");
        Ok(())
    }
}

fn write_error(err: impl std::fmt::Display) -> PdfError {
    PdfError::Other(format!("cannot write annotated document: {err}"))
}

fn op(operator: &str, operands: Vec<Object>) -> Operation {
    Operation::new(operator, operands)
}

fn real(v: f64) -> Object {
    Object::Real(v as f32)
}

fn rgb(operator: &str, (r, g, b): Rgb) -> Operation {
    op(operator, vec![r.into(), g.into(), b.into()])
}

/// `re` for a top-left `rect` on `page`.
fn rect(rect: &Region, page: &Region) -> Operation {
    let x = page.x0 + rect.x0;
    let y = page.y1 - rect.y1;
    op(
        "re",
        vec![real(x), real(y), real(rect.width()), real(rect.height())],
    )
}

fn draw_text(ops: &mut Vec<Operation>, text: &str, at: Point, page: &Region, size: f32, colour: Rgb) {
    ops.push(op("BT", vec![]));
    ops.push(op("Tf", vec![Object::Name(FONT_NAME.into()), size.into()]));
    ops.push(rgb("rg", colour));
    ops.push(op("Td", vec![real(page.x0 + at.x), real(page.y1 - at.y)]));
    ops.push(op(
        "Tj",
        vec![Object::String(win_ansi(text), StringFormat::Literal)],
    ));
    ops.push(op("ET", vec![]));
}

fn draw_label(ops: &mut Vec<Operation>, label: &Label, page: &Region, size: f32, colour: Rgb) {
    draw_text(ops, &label.text, label.position, page, size, colour);
}

/// The overlay for one page, in drawing order: header box, highlights,
/// labels, notice.
fn plan_operations(plan: &DrawPlan, page: &Region) -> Vec<Operation> {
    // the page's streams are wrapped in q ... so this Q returns to the
    // initial graphics state
    let mut ops = vec![op("Q", vec![]), op("q", vec![])];

    if let Some(header) = &plan.header {
        ops.push(rgb("rg", HEADER_FILL));
        ops.push(rgb("RG", HEADER_BORDER));
        ops.push(op("w", vec![1.0f32.into()]));
        ops.push(rect(&header.rect, page));
        ops.push(op("B", vec![]));
        draw_label(&mut ops, &header.title, page, 10.0, TITLE);
        for line in &header.lines {
            draw_label(&mut ops, line, page, 8.0, BLACK);
        }
        if let Some(summary) = &header.summary {
            draw_label(&mut ops, summary, page, 8.0, BLACK);
        }
    }

    for highlight in &plan.highlights {
        let (colour, width) = match highlight.emphasis {
            Emphasis::Focused => (HIGHLIGHT_FOCUSED, 3.0f32),
            Emphasis::Normal => (HIGHLIGHT, 2.0f32),
        };
        ops.push(rgb("RG", colour));
        ops.push(op("w", vec![width.into()]));
        ops.push(rect(&highlight.region, page));
        ops.push(op("S", vec![]));
    }

    for label in &plan.labels {
        let size = match label.emphasis {
            Emphasis::Focused => 9.0,
            Emphasis::Normal => 8.0,
        };
        draw_label(&mut ops, label, page, size, LABEL);
    }

    if let Some(notice) = &plan.notice {
        let at = Point::new(NOTICE_INSET, page.height() - NOTICE_INSET);
        draw_text(&mut ops, notice, at, page, 9.0, LABEL);
    }

    ops.push(op("Q", vec![]));
    ops
}

/// Encode `text` for a WinAnsi standard font; unmapped characters become `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => 0x95,
            '\u{2026}' => 0x85,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            c if (c as u32) < 0x80 || (0xA0..=0xFF).contains(&(c as u32)) => c as u8,
            _ => b'?',
        })
        .collect()
}

/// The resources a page sees, following /Parent for inherited ones.
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut node = doc.get_dictionary(page_id).ok();
    for _ in 0..MAX_PARENT_HOPS {
        let Some(dict) = node else { break };
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(resources)) => return resources.clone(),
            Ok(Object::Reference(id)) => {
                return doc
                    .get_dictionary(*id)
                    .map(Dictionary::clone)
                    .unwrap_or_else(|_| Dictionary::new());
            }
            _ => {}
        }
        node = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .ok()
            .and_then(|id| doc.get_dictionary(id).ok());
    }
    Dictionary::new()
}

/// Give the page its own /Resources with the overlay font added.
fn add_font(doc: &mut Document, page_id: ObjectId, font: ObjectId) -> Result<(), PdfError> {
    let mut resources = effective_resources(doc, page_id);
    let mut fonts = match resources.get(b"Font") {
        Ok(Object::Dictionary(fonts)) => fonts.clone(),
        Ok(Object::Reference(id)) => doc
            .get_dictionary(*id)
            .map(Dictionary::clone)
            .unwrap_or_else(|_| Dictionary::new()),
        _ => Dictionary::new(),
    };
    fonts.set(FONT_NAME, font);
    resources.set("Font", fonts);
    doc.get_dictionary_mut(page_id)
        .map_err(write_error)?
        .set("Resources", resources);
    Ok(())
}

/// Rewrite /Contents as `[q, original streams..., overlay]`.
fn append_overlay(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<(), PdfError> {
    let existing: Vec<Object> = match doc
        .get_dictionary(page_id)
        .map_err(write_error)?
        .get(b"Contents")
    {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    let save = doc.add_object(Stream::new(Dictionary::new(), b"q".to_vec()));
    let overlay = doc.add_object(Stream::new(Dictionary::new(), overlay));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save));
    contents.extend(existing);
    contents.push(Object::Reference(overlay));
    doc.get_dictionary_mut(page_id)
        .map_err(write_error)?
        .set("Contents", contents);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotated_path_keeps_directory_and_extension() {
        assert_eq!(
            annotated_path(Path::new("/scans/report.pdf")),
            PathBuf::from("/scans/report_annotated.pdf")
        );
        assert_eq!(
            annotated_path(Path::new("report.PDF")),
            PathBuf::from("report_annotated.PDF")
        );
        assert_eq!(annotated_path(Path::new("report")), PathBuf::from("report_annotated.pdf"));
    }

    #[test]
    fn win_ansi_maps_bullets_and_replaces_the_rest() {
        assert_eq!(win_ansi("• café"), vec![0x95, b' ', b'c', b'a', b'f', 0xE9]);
        assert_eq!(win_ansi("図"), b"?".to_vec());
    }

    #[test]
    fn rect_flips_to_user_space() {
        let page = Region::new(0.0, 0.0, 612.0, 792.0);
        let re = rect(&Region::new(100.0, 92.0, 300.0, 292.0), &page);
        assert_eq!(re.operator, "re");
        assert_eq!(
            re.operands,
            vec![real(100.0), real(500.0), real(200.0), real(200.0)]
        );
    }

    #[test]
    fn overlay_is_balanced() {
        let page = Region::new(0.0, 0.0, 612.0, 792.0);
        let plan = DrawPlan {
            page: 0,
            highlights: Vec::new(),
            labels: vec![Label {
                position: Point::new(30.0, 150.0),
                text: "[6.1] Missing alt".to_string(),
                violation: Some(0),
                emphasis: Emphasis::Focused,
            }],
            header: None,
            notice: None,
        };
        let ops = plan_operations(&plan, &page);
        let saves = ops.iter().filter(|o| o.operator == "q").count();
        let restores = ops.iter().filter(|o| o.operator == "Q").count();
        // one extra Q closes the q that precedes the page's own streams
        assert_eq!(restores, saves + 1);
        let td = ops.iter().find(|o| o.operator == "Td").unwrap();
        assert_eq!(td.operands, vec![real(30.0), real(642.0)]);
    }
}
