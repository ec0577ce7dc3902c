//! ByteRange handling for PDF signatures.
//!
//! PDF digital signatures use a ByteRange array to specify which portions
//! of the document are covered by the signature. The signature itself is
//! stored in a placeholder that is excluded from the signed bytes.
//!
//! ## ByteRange Format
//!
//! The ByteRange is an array of integer pairs, usually four integers:
//! `[offset1, length1, offset2, length2]`
//!
//! Where:
//! - `offset1` = 0 (start of file)
//! - `length1` = byte offset where the signature value begins
//! - `offset2` = byte offset where the signature value ends
//! - `length2` = remaining bytes up to the end of the revision
//!
//! Signatures followed by incremental updates do not reach the end of the
//! file; that is reported as incomplete coverage, not as an error.

use super::types::ByteSpan;
use crate::error::{Error, Result};

/// Extracts the signed bytes described by a /ByteRange.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteRangeExtractor;

impl ByteRangeExtractor {
    /// Turn raw /ByteRange numbers into spans.
    ///
    /// The array must be non-empty, hold an even number of entries and
    /// contain no negative values.
    pub fn parse_spans(raw: &[i64]) -> Result<Vec<ByteSpan>> {
        if raw.is_empty() || raw.len() % 2 != 0 {
            return Err(Error::ByteRange(format!(
                "expected (offset, length) pairs, got {} numbers",
                raw.len()
            )));
        }

        raw.chunks_exact(2)
            .map(|pair| {
                let offset = usize::try_from(pair[0])
                    .map_err(|_| Error::ByteRange(format!("negative offset {}", pair[0])))?;
                let length = usize::try_from(pair[1])
                    .map_err(|_| Error::ByteRange(format!("negative length {}", pair[1])))?;
                Ok(ByteSpan::new(offset, length))
            })
            .collect()
    }

    /// Check that spans are in bounds, ascending and non-overlapping.
    pub fn validate_spans(spans: &[ByteSpan], file_size: usize) -> Result<()> {
        let mut previous_end = 0usize;
        for (idx, span) in spans.iter().enumerate() {
            let end = span.end().ok_or_else(|| {
                Error::ByteRange(format!("span {} overflows: {} + {}", idx + 1, span.offset, span.length))
            })?;
            if end > file_size {
                return Err(Error::ByteRange(format!(
                    "span {} exceeds file size: {} + {} > {}",
                    idx + 1,
                    span.offset,
                    span.length,
                    file_size
                )));
            }
            if idx > 0 && span.offset < previous_end {
                return Err(Error::ByteRange(format!(
                    "span {} starts at {} before the previous span ends at {}",
                    idx + 1,
                    span.offset,
                    previous_end
                )));
            }
            previous_end = end;
        }
        Ok(())
    }

    /// Extract the bytes covered by the signature.
    ///
    /// Returns the concatenation of the spans, in order, after validating
    /// them against the file size.
    pub fn extract_signed_bytes(pdf_data: &[u8], spans: &[ByteSpan]) -> Result<Vec<u8>> {
        Self::validate_spans(spans, pdf_data.len())?;

        let total: usize = spans.iter().map(|span| span.length).sum();
        let mut signed_bytes = Vec::with_capacity(total);
        for span in spans {
            signed_bytes.extend_from_slice(&pdf_data[span.offset..span.offset + span.length]);
        }

        Ok(signed_bytes)
    }

    /// Check if the spans start at byte 0 and end at the end of the file.
    pub fn covers_entire_document(spans: &[ByteSpan], file_size: usize) -> bool {
        match (spans.first(), spans.last()) {
            (Some(first), Some(last)) => first.offset == 0 && last.end() == Some(file_size),
            _ => false,
        }
    }
}
