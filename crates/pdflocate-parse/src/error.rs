//! Error types for the lopdf backend.
//!
//! Uses [`thiserror`] for ergonomic error derivation. Provides [`BackendError`]
//! that wraps backend-specific errors and converts them to [`PdfError`].

use pdflocate_core::PdfError;
use thiserror::Error;

/// Error type for PDF backend operations.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error from PDF parsing (structure, syntax, object resolution).
    #[error("PDF parse error: {0}")]
    Parse(String),

    /// Error reading PDF data.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed content stream or XObject.
    #[error("content stream error: {0}")]
    Content(String),

    /// A core library error.
    #[error(transparent)]
    Core(#[from] PdfError),
}

impl From<BackendError> for PdfError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Parse(msg) => PdfError::ParseError(msg),
            BackendError::Io(e) => PdfError::IoError(e.to_string()),
            BackendError::Content(msg) => PdfError::ParseError(format!("content stream: {msg}")),
            BackendError::Core(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_error_parse() {
        let err = BackendError::Parse("invalid xref table".to_string());
        assert_eq!(err.to_string(), "PDF parse error: invalid xref table");
    }

    #[test]
    fn backend_error_io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: BackendError = io_err.into();
        assert!(matches!(err, BackendError::Io(_)));
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn backend_error_from_pdf_error() {
        let err: BackendError = PdfError::PasswordRequired.into();
        assert!(matches!(err, BackendError::Core(_)));
        assert_eq!(err.to_string(), "PDF is encrypted and requires a password");
    }

    #[test]
    fn backend_error_to_pdf_error() {
        let pdf_err: PdfError = BackendError::Parse("bad syntax".to_string()).into();
        assert_eq!(pdf_err, PdfError::ParseError("bad syntax".to_string()));

        let pdf_err: PdfError = BackendError::Content("unterminated array".to_string()).into();
        assert_eq!(
            pdf_err,
            PdfError::ParseError("content stream: unterminated array".to_string())
        );
    }

    #[test]
    fn core_error_passes_through() {
        let pdf_err: PdfError = BackendError::Core(PdfError::PasswordRequired).into();
        assert_eq!(pdf_err, PdfError::PasswordRequired);
    }
}
