//! Mapping object ids, marked-content ids and context text to page regions.

use crate::accessor::DocumentAccessor;
use crate::context::best_search_text;
use crate::error::ExtractOptions;
use crate::geometry::Region;
use crate::object::ObjectRef;
use crate::struct_tree::StructureNode;
use crate::violation::ViolationDescriptor;

/// Resolves on-page geometry for objects, structure elements and violations.
///
/// All regions are in the page's user space. Accessor failures are logged
/// and produce no regions.
pub struct RegionResolver<'a, D: ?Sized> {
    doc: &'a D,
    options: ExtractOptions,
}

impl<'a, D: DocumentAccessor + ?Sized> RegionResolver<'a, D> {
    pub fn new(doc: &'a D, options: ExtractOptions) -> Self {
        Self { doc, options }
    }

    /// Every image placement and annotation rectangle on `page` belonging to `object`.
    ///
    /// A tiled image yields one region per placement.
    pub fn regions_for_object(&self, page: usize, object: ObjectRef) -> Vec<Region> {
        let mut regions = Vec::new();
        match self.doc.page_images(page) {
            Ok(images) => regions.extend(
                images
                    .into_iter()
                    .filter(|i| i.object == object)
                    .map(|i| i.region),
            ),
            Err(err) => tracing::debug!(page, %err, "cannot read page images"),
        }
        match self.doc.page_annotations(page) {
            Ok(annots) => regions.extend(
                annots
                    .into_iter()
                    .filter(|a| a.object == Some(object))
                    .map(|a| a.region),
            ),
            Err(err) => tracing::debug!(page, %err, "cannot read page annotations"),
        }
        regions
    }

    /// Bounding boxes of every content run on `page` tagged with one of `mcids`.
    pub fn regions_for_mcids(&self, page: usize, mcids: &[i64]) -> Vec<Region> {
        if mcids.is_empty() {
            return Vec::new();
        }
        match self.doc.page_runs(page) {
            Ok(runs) => runs
                .into_iter()
                .filter(|r| r.mcid.is_some_and(|m| mcids.contains(&m)))
                .map(|r| r.region)
                .collect(),
            Err(err) => {
                tracing::debug!(page, %err, "cannot read page content");
                Vec::new()
            }
        }
    }

    /// Search `page` for the most telling quoted fragment of `context`.
    pub fn regions_from_context(&self, page: usize, context: &str) -> Vec<Region> {
        match best_search_text(context, self.options.min_context_len) {
            Some(needle) => self
                .doc
                .search_text(page, needle, self.options.max_search_hits),
            None => Vec::new(),
        }
    }

    /// Regions for a violation already resolved to `page`.
    ///
    /// Object regions come first; the context search runs only when the
    /// object yields nothing.
    pub fn regions_for_violation(&self, page: usize, violation: &ViolationDescriptor) -> Vec<Region> {
        let regions = violation
            .object_ref()
            .map(|obj| self.regions_for_object(page, obj))
            .unwrap_or_default();
        if !regions.is_empty() {
            return regions;
        }
        match violation.context.as_deref() {
            Some(context) => self.regions_from_context(page, context),
            None => Vec::new(),
        }
    }

    /// Regions covered by a structure element's own marked content.
    pub fn regions_for_node(&self, node: &StructureNode) -> Vec<Region> {
        match node.page_index() {
            Some(page) => self.regions_for_mcids(page, &node.marked_content_ids),
            None => Vec::new(),
        }
    }
}
