//! Document outline (bookmarks), used for navigation when a document is untagged.

use std::collections::HashSet;

use crate::accessor::DocumentAccessor;
use crate::object::{ObjectRef, Value};

/// Outline nesting deeper than this is ignored.
const MAX_OUTLINE_DEPTH: usize = 64;
/// Safety limit on outline items across the whole tree.
const MAX_ITEMS: usize = 10_000;

/// One entry of the document outline, flattened in reading order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutlineEntry {
    pub title: String,
    /// Nesting level, 0 for top-level entries.
    pub level: usize,
    /// 0-based destination page, when it can be resolved.
    pub page: Option<usize>,
}

/// Walk `/Outlines` from the catalog.
///
/// Explicit destinations (`/Dest [page ...]`) and `GoTo` actions are
/// resolved; named destinations are left without a page.
pub fn extract_outline<D: DocumentAccessor + ?Sized>(doc: &D) -> Vec<OutlineEntry> {
    let Some(catalog) = doc.catalog() else {
        return Vec::new();
    };
    let Some(outlines) = doc.get_key(catalog, "Outlines").and_then(|v| v.as_ref()) else {
        return Vec::new();
    };
    let Some(first) = doc.get_key(outlines, "First").and_then(|v| v.as_ref()) else {
        return Vec::new();
    };

    let page_refs: Vec<ObjectRef> = (0..doc.page_count()).filter_map(|p| doc.page_ref(p)).collect();
    let mut entries = Vec::new();
    let mut visited = HashSet::new();
    walk(doc, first, 0, &page_refs, &mut visited, &mut entries);
    entries
}

fn walk<D: DocumentAccessor + ?Sized>(
    doc: &D,
    item: ObjectRef,
    level: usize,
    page_refs: &[ObjectRef],
    visited: &mut HashSet<ObjectRef>,
    entries: &mut Vec<OutlineEntry>,
) {
    if level >= MAX_OUTLINE_DEPTH {
        return;
    }

    let mut current = Some(item);
    while let Some(node) = current {
        // each item is emitted once, whichever /First or /Next reaches it
        if !visited.insert(node) || visited.len() > MAX_ITEMS {
            tracing::debug!(object = %node, "outline item revisited, stopping branch");
            break;
        }

        let title = doc
            .get_key(node, "Title")
            .and_then(|v| v.as_text().map(str::to_string))
            .unwrap_or_default();
        entries.push(OutlineEntry {
            title,
            level,
            page: destination_page(doc, node, page_refs),
        });

        if let Some(child) = doc.get_key(node, "First").and_then(|v| v.as_ref()) {
            walk(doc, child, level + 1, page_refs, visited, entries);
        }
        current = doc.get_key(node, "Next").and_then(|v| v.as_ref());
    }
}

fn destination_page<D: DocumentAccessor + ?Sized>(
    doc: &D,
    node: ObjectRef,
    page_refs: &[ObjectRef],
) -> Option<usize> {
    if let Some(dest) = doc.get_key(node, "Dest") {
        if let Some(page) = dest_array_page(&dest, page_refs) {
            return Some(page);
        }
    }
    let action = match doc.get_key(node, "A")? {
        Value::Ref(r) => {
            let kind = doc.get_key(r, "S")?;
            if kind.as_name() != Some("GoTo") {
                return None;
            }
            doc.get_key(r, "D")?
        }
        Value::Dict(d) => {
            if d.get("S").and_then(Value::as_name) != Some("GoTo") {
                return None;
            }
            d.get("D")?.clone()
        }
        _ => return None,
    };
    dest_array_page(&action, page_refs)
}

fn dest_array_page(dest: &Value, page_refs: &[ObjectRef]) -> Option<usize> {
    let target = dest.as_array()?.first()?.as_ref()?;
    page_refs.iter().position(|p| *p == target)
}
