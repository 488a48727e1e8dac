//! Error type and extraction options for pdflocate.
//!
//! Provides [`PdfError`] for failures that end a document session, and
//! [`ExtractOptions`] for the bounds applied while walking untrusted
//! documents.
//!
//! Indexing gaps (an object that is not on any page, a marked-content id with
//! no geometry, a missing structure root) are *not* errors. They surface as
//! `None`, [`PageResolution::Unresolved`](crate::PageResolution) or empty
//! collections.

use std::fmt;

use crate::object::ObjectRef;

/// Fatal error types for a document session.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfError {
    /// Error parsing PDF structure or syntax.
    ParseError(String),
    /// I/O error reading PDF data.
    IoError(String),
    /// A referenced object does not exist in the document.
    ObjectNotFound(ObjectRef),
    /// A page index outside `0..page_count` was requested.
    PageOutOfRange {
        /// The requested 0-based page index.
        page: usize,
        /// Number of pages in the document.
        page_count: usize,
    },
    /// The PDF is encrypted and requires a password to open.
    PasswordRequired,
    /// Any other error not covered by specific variants.
    Other(String),
}

impl fmt::Display for PdfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PdfError::ParseError(msg) => write!(f, "parse error: {msg}"),
            PdfError::IoError(msg) => write!(f, "I/O error: {msg}"),
            PdfError::ObjectNotFound(obj) => write!(f, "object not found: {obj}"),
            PdfError::PageOutOfRange { page, page_count } => {
                write!(f, "page index {page} out of range (0..{page_count})")
            }
            PdfError::PasswordRequired => write!(f, "PDF is encrypted and requires a password"),
            PdfError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for PdfError {}

impl From<std::io::Error> for PdfError {
    fn from(err: std::io::Error) -> Self {
        PdfError::IoError(err.to_string())
    }
}

/// Bounds and heuristics applied while extracting from a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum structure tree depth (default: 64).
    pub max_struct_depth: usize,
    /// Maximum nesting of Form XObjects during content scanning (default: 10).
    pub max_content_depth: usize,
    /// Maximum hits returned by the context-text fallback search (default: 5).
    pub max_search_hits: usize,
    /// Context fragments this long or shorter are ignored as noise (default: 3).
    pub min_context_len: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_struct_depth: 64,
            max_content_depth: 10,
            max_search_hits: 5,
            min_context_len: 3,
        }
    }
}
