//! Error types for the signature verification library.
//!
//! Per-signature failures are folded into [`crate::signatures::VerificationResult::errors`]
//! by the verifier; the variants below only escape the library for input-level
//! failures (unreadable files, undecodable certificates, report serialization).

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while locating, decoding, or verifying signatures.
#[derive(Debug, thiserror::Error)]
#[allow(clippy::enum_variant_names)] // "Invalid" prefix is intentional for clarity
pub enum Error {
    /// Invalid PDF structure (generic)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// Parse error at specific byte offset
    #[error("Failed to parse object at byte {offset}: {reason}")]
    ParseError {
        /// Byte offset where error occurred
        offset: usize,
        /// Reason for parse failure
        reason: String,
    },

    /// Malformed or out-of-bounds /ByteRange
    #[error("Invalid ByteRange: {0}")]
    ByteRange(String),

    /// The signature envelope (CMS SignedData) could not be decoded
    #[error("Invalid signature envelope: {0}")]
    Envelope(String),

    /// A certificate could not be decoded
    #[error("Certificate error: {0}")]
    Certificate(String),

    /// The signature does not match the signed content
    #[error("Integrity check failed: {0}")]
    Integrity(String),

    /// Unsupported algorithm or structure
    #[error("Unsupported feature: {0}")]
    Unsupported(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Self {
        Error::Envelope(err.to_string())
    }
}
