//! pdflocate-core: Backend-independent violation localization and structure extraction.
//!
//! This crate provides the object model ([`ObjectRef`], [`Value`], [`Region`]),
//! the [`DocumentAccessor`] trait that PDF backends implement, and the
//! algorithms built on it: the object-to-page [`PageIndex`], page resolution
//! for validator violations, structure tree extraction, region lookup and
//! annotation layout.
//!
//! Nothing here parses PDF bytes; see `pdflocate-parse` for the lopdf backend.

pub mod accessor;
pub mod context;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod localizer;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod object;
pub mod outline;
pub mod page_index;
pub mod region;
pub mod report;
pub mod search;
pub mod struct_tree;
pub mod violation;

pub use accessor::{ContentRun, DocumentAccessor, ImagePlacement, PageAnnotation, RunKind};
pub use context::{ContextHints, best_search_text, hints_from_context, quoted_candidates};
pub use error::{ExtractOptions, PdfError};
pub use geometry::{Ctm, Point, Region};
pub use layout::{
    AnnotationLayout, DrawPlan, Emphasis, HEADER_TITLE, HeaderBox, Highlight, Label,
    LayoutOptions, NOT_VISUAL_NOTICE, PlacedViolation,
};
pub use localizer::{PageBuckets, PageResolution, bucket_by_page, resolve_page};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{MemoryDocument, MemoryPage};
pub use object::{ObjectRef, Value, dict};
pub use outline::{OutlineEntry, extract_outline};
pub use page_index::PageIndex;
pub use region::RegionResolver;
pub use report::{ScanJob, ScanResult, ScanStatus};
pub use search::search_runs;
pub use struct_tree::{NodeId, StructureElement, StructureNode, StructureTree, UNKNOWN_TAG};
pub use violation::ViolationDescriptor;
