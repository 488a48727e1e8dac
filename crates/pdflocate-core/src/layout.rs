//! Placement of highlights and text labels for rendering violations on a page.
//!
//! The output is a [`DrawPlan`]: pure geometry in top-left page space
//! (`y` grows downward from the top edge), ready for any renderer.

use std::collections::HashSet;

use crate::geometry::{Point, Region};
use crate::violation::{ViolationDescriptor, truncate};

/// Title written at the top of the document-level header box.
pub const HEADER_TITLE: &str = "DOCUMENT COMPLIANCE ERRORS (Global/Metadata):";

/// Notice shown when the focused violation has nothing to highlight.
pub const NOT_VISUAL_NOTICE: &str = "Global/Structure Error - Location not visual";

/// Layout constants. All distances are in points.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutOptions {
    /// Top edge of the header box (default: 20).
    pub header_top: f64,
    /// Left and right inset of the header box (default: 20).
    pub header_inset: f64,
    /// Baseline of the header title (default: 40).
    pub header_title_y: f64,
    /// Baseline of the first header line (default: 60).
    pub header_first_line_y: f64,
    /// Header line spacing (default: 12).
    pub header_line_height: f64,
    /// Maximum header box height (default: 300).
    pub header_max_height: f64,
    /// Space kept free at the bottom of the header box (default: 10).
    pub header_padding: f64,
    /// Header messages are cut to this many characters (default: 80).
    pub header_text_len: usize,
    /// Left edge of labels and header text (default: 30).
    pub label_x: f64,
    /// First label baseline (default: 50).
    pub label_base_y: f64,
    /// Extra offset for labels on the first page (default: 100).
    pub first_page_label_offset: f64,
    /// Label spacing (default: 15).
    pub label_step: f64,
    /// Maximum labels per page (default: 20).
    pub max_label_slots: usize,
    /// Labels never go below `page_height - bottom_margin` (default: 50).
    pub bottom_margin: f64,
    /// Label descriptions are cut to this many characters (default: 60).
    pub label_text_len: usize,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            header_top: 20.0,
            header_inset: 20.0,
            header_title_y: 40.0,
            header_first_line_y: 60.0,
            header_line_height: 12.0,
            header_max_height: 300.0,
            header_padding: 10.0,
            header_text_len: 80,
            label_x: 30.0,
            label_base_y: 50.0,
            first_page_label_offset: 100.0,
            label_step: 15.0,
            max_label_slots: 20,
            bottom_margin: 50.0,
            label_text_len: 60,
        }
    }
}

/// Visual weight of a drawn item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Emphasis {
    Normal,
    Focused,
}

/// A rectangle to outline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Highlight {
    pub region: Region,
    /// Index of the first violation that claimed this region.
    pub violation: usize,
    pub emphasis: Emphasis,
}

/// A line of text anchored at its baseline start.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Label {
    pub position: Point,
    pub text: String,
    /// The violation this label describes; `None` for summaries.
    pub violation: Option<usize>,
    pub emphasis: Emphasis,
}

/// The box listing document-level violations on the first page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderBox {
    pub rect: Region,
    pub title: Label,
    pub lines: Vec<Label>,
    /// `"+N more"` when the box overflowed.
    pub summary: Option<Label>,
}

/// Everything to draw on one page.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DrawPlan {
    pub page: usize,
    pub highlights: Vec<Highlight>,
    pub labels: Vec<Label>,
    pub header: Option<HeaderBox>,
    pub notice: Option<String>,
}

impl DrawPlan {
    /// True when there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.highlights.is_empty()
            && self.labels.is_empty()
            && self.header.is_none()
            && self.notice.is_none()
    }
}

/// A violation prepared for layout.
#[derive(Debug, Clone)]
pub struct PlacedViolation<'a> {
    /// Index into the caller's violation list.
    pub index: usize,
    pub violation: &'a ViolationDescriptor,
    /// Regions in user space; empty when nothing could be located.
    pub regions: Vec<Region>,
}

/// Slots already taken on a page, keyed by `(page, discriminant)`.
#[derive(Debug, Default)]
struct SlotRegistry {
    claimed: HashSet<(usize, String)>,
}

impl SlotRegistry {
    /// Claim a slot; false when it was already taken.
    fn claim(&mut self, page: usize, discriminant: String) -> bool {
        self.claimed.insert((page, discriminant))
    }
}

/// Computes non-overlapping highlight and label placement.
#[derive(Debug, Clone, Default)]
pub struct AnnotationLayout {
    pub options: LayoutOptions,
}

impl AnnotationLayout {
    pub fn new(options: LayoutOptions) -> Self {
        Self { options }
    }

    /// Lay out one page.
    ///
    /// `located` holds the violations resolved to `page`; `document_level`
    /// the unresolved ones, which are drawn only on page 0. `page_rect` is
    /// the page box in user space.
    pub fn plan_page(
        &self,
        page: usize,
        page_rect: Region,
        located: &[PlacedViolation<'_>],
        document_level: &[PlacedViolation<'_>],
        focused: Option<usize>,
    ) -> DrawPlan {
        let emphasis = |index: usize| {
            if focused == Some(index) {
                Emphasis::Focused
            } else {
                Emphasis::Normal
            }
        };
        let mut slots = SlotRegistry::default();
        let mut highlights: Vec<Highlight> = Vec::new();
        let mut unplaced: Vec<&PlacedViolation<'_>> = Vec::new();

        for v in located {
            if v.regions.is_empty() {
                unplaced.push(v);
                continue;
            }
            for region in &v.regions {
                let region = region.to_top_left(&page_rect);
                let signature = region.signature();
                if slots.claim(page, format!("rect:{signature}")) {
                    highlights.push(Highlight {
                        region,
                        violation: v.index,
                        emphasis: emphasis(v.index),
                    });
                } else if emphasis(v.index) == Emphasis::Focused {
                    if let Some(h) = highlights
                        .iter_mut()
                        .find(|h| h.region.signature() == signature)
                    {
                        h.emphasis = Emphasis::Focused;
                    }
                }
            }
        }

        let header = if page == 0 && !document_level.is_empty() {
            Some(self.header(page_rect.width(), document_level, &emphasis))
        } else {
            None
        };

        let labels = self.labels(
            page,
            page_rect.height(),
            header.as_ref(),
            &unplaced,
            &mut slots,
            &emphasis,
        );

        let focused_not_visual = focused.is_some_and(|f| {
            located.iter().any(|v| v.index == f && v.regions.is_empty())
                || (page == 0 && document_level.iter().any(|v| v.index == f))
        });

        DrawPlan {
            page,
            highlights,
            labels,
            header,
            notice: focused_not_visual.then(|| NOT_VISUAL_NOTICE.to_string()),
        }
    }

    fn header(
        &self,
        page_width: f64,
        document_level: &[PlacedViolation<'_>],
        emphasis: &dyn Fn(usize) -> Emphasis,
    ) -> HeaderBox {
        let o = &self.options;

        // distinct messages, first occurrence wins
        let mut seen = HashSet::new();
        let mut messages: Vec<(usize, String)> = Vec::new();
        for v in document_level {
            let msg = format!("• {}", truncate(&v.violation.description, o.header_text_len));
            if seen.insert(msg.clone()) {
                messages.push((v.index, msg));
            }
        }

        let wanted = o.header_first_line_y + messages.len() as f64 * o.header_line_height;
        let y1 = wanted.min(o.header_top + o.header_max_height);
        let rect = Region::new(o.header_inset, o.header_top, page_width - o.header_inset, y1);

        let mut lines = Vec::new();
        let mut y = o.header_first_line_y;
        for (index, msg) in &messages {
            if y > y1 - o.header_padding {
                break;
            }
            lines.push(Label {
                position: Point::new(o.label_x, y),
                text: msg.clone(),
                violation: Some(*index),
                emphasis: emphasis(*index),
            });
            y += o.header_line_height;
        }

        let hidden = messages.len() - lines.len();
        let summary = (hidden > 0).then(|| Label {
            position: Point::new(o.label_x, y),
            text: format!("+{hidden} more"),
            violation: None,
            emphasis: Emphasis::Normal,
        });

        HeaderBox {
            rect,
            title: Label {
                position: Point::new(o.label_x, o.header_title_y),
                text: HEADER_TITLE.to_string(),
                violation: None,
                emphasis: Emphasis::Normal,
            },
            lines,
            summary,
        }
    }

    fn labels(
        &self,
        page: usize,
        page_height: f64,
        header: Option<&HeaderBox>,
        unplaced: &[&PlacedViolation<'_>],
        slots: &mut SlotRegistry,
        emphasis: &dyn Fn(usize) -> Emphasis,
    ) -> Vec<Label> {
        let o = &self.options;
        if unplaced.is_empty() {
            return Vec::new();
        }

        let mut base_y = o.label_base_y;
        if page == 0 {
            base_y += o.first_page_label_offset;
            if let Some(h) = header {
                let below_header = h.summary.as_ref().map_or(h.rect.y1, |s| s.position.y.max(h.rect.y1));
                base_y = base_y.max(below_header + o.label_step);
            }
        }
        let limit = page_height - o.bottom_margin;

        let mut labels = Vec::new();
        let mut remaining = unplaced.iter();
        let mut slot = 0;
        while slot < o.max_label_slots {
            let y = base_y + slot as f64 * o.label_step;
            if y > limit {
                break;
            }
            slot += 1;
            if !slots.claim(page, format!("text:{y:.2}")) {
                continue;
            }
            let Some(v) = remaining.next() else {
                break;
            };
            labels.push(Label {
                position: Point::new(o.label_x, y),
                text: v.violation.short_label(o.label_text_len),
                violation: Some(v.index),
                emphasis: emphasis(v.index),
            });
        }

        let mut hidden = remaining.count();
        if hidden > 0 {
            let mut y = base_y + slot as f64 * o.label_step;
            if y > limit {
                // no row left below the grid: the summary takes the last label's row
                match labels.pop() {
                    Some(last) => {
                        y = last.position.y;
                        hidden += 1;
                    }
                    None => y = limit,
                }
            }
            labels.push(Label {
                position: Point::new(o.label_x, y),
                text: format!("+{hidden} more"),
                violation: None,
                emphasis: Emphasis::Normal,
            });
        }
        labels
    }
}
