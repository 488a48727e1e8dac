//! pdflocate: Place PDF compliance violations on the page and expose the
//! document's logical structure.
//!
//! This is the public API facade crate. It re-exports the types of
//! pdflocate-core and opens documents through pdflocate-parse.
//!
//! # Architecture
//!
//! - **pdflocate-core**: Backend-independent object model and algorithms
//!   (page index, page resolution, structure tree, regions, layout)
//! - **pdflocate-parse**: lopdf-backed document accessor and content scanning
//! - **pdflocate** (this crate): [`Session`], batch processing and, with
//!   the `write` feature, annotated copies of documents
//!
//! # Example
//!
//! ```ignore
//! use pdflocate::{Session, ViolationDescriptor};
//!
//! let session = Session::open_file("report.pdf", None)?;
//! let violations = vec![
//!     ViolationDescriptor::new("7.3-1", "Figure without alternate text").with_object_id("42 0 obj"),
//! ];
//! let located = session.locate(&violations);
//! for page in 0..session.page_count() {
//!     let plan = session.plan_page(page, &located, None)?;
//!     println!("page {page}: {} highlights", plan.highlights.len());
//! }
//! ```

#[cfg(feature = "write")]
mod annotate;
#[cfg(feature = "std")]
mod batch;
mod session;

#[cfg(feature = "write")]
pub use annotate::annotated_path;
#[cfg(feature = "std")]
pub use batch::{DocumentReport, process_batch, process_result};
pub use pdflocate_core;
pub use pdflocate_core::{
    AnnotationLayout, ContentRun, Ctm, DocumentAccessor, DrawPlan, Emphasis, ExtractOptions,
    HEADER_TITLE, HeaderBox, Highlight, ImagePlacement, Label, LayoutOptions,
    NOT_VISUAL_NOTICE, ObjectRef, OutlineEntry, PageAnnotation, PageBuckets,
    PageIndex, PageResolution, PdfError, PlacedViolation, Point, Region, RegionResolver, RunKind,
    ScanJob, ScanResult, ScanStatus, StructureElement, StructureNode, StructureTree, Value,
    ViolationDescriptor,
};
#[cfg(feature = "test-util")]
pub use pdflocate_core::{MemoryDocument, MemoryPage};
pub use pdflocate_parse;
pub use pdflocate_parse::LopdfAccessor;
pub use session::{Localization, Navigation, Session, TAGS_NOT_FOUND};
