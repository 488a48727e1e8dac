//! pdflocate-parse: lopdf backend for pdflocate.
//!
//! Implements [`DocumentAccessor`](pdflocate_core::DocumentAccessor) on top of
//! [`lopdf`], including a content stream scanner that records image
//! placements and marked-content text runs for each page.

mod content;
pub mod error;
pub mod lopdf_backend;
pub mod tokenizer;

pub use error::BackendError;
pub use lopdf_backend::LopdfAccessor;
pub use pdflocate_core;
