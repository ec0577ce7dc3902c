//! PDF signature verification.
//!
//! Orchestrates the locator, the byte range extractor, the envelope decoder
//! and the certificate analyzer into one [`VerificationResult`] per signature
//! field. Failures are recorded on the result of the field they concern and
//! never abort sibling fields.

use super::byterange::ByteRangeExtractor;
use super::envelope::SignatureEnvelope;
use super::locator::SignatureFieldLocator;
use super::types::{SignatureFieldDescriptor, VerificationResult};
use crate::config::VerifyConfig;
use crate::document::{count_pages, DocumentVerification};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use std::thread;

/// Warning attached to every signature: no root store is consulted.
pub const CHAIN_NOT_VALIDATED: &str = "certificate chain not validated against a trusted root store";

/// Warning attached to every signature: no OCSP or CRL lookup happens.
pub const REVOCATION_NOT_CHECKED: &str = "revocation status (OCSP/CRL) not checked";

/// Warning or error for byte ranges that leave part of the file unsigned.
pub const INCOMPLETE_COVERAGE: &str = "signature does not cover the entire document";

/// Verifier for PDF digital signatures.
///
/// Stateless apart from its configuration; one verifier can be shared across
/// threads and reused for any number of documents.
#[derive(Debug, Clone, Default)]
pub struct SignatureVerifier {
    config: VerifyConfig,
}

impl SignatureVerifier {
    /// Create a new signature verifier.
    pub fn new(config: VerifyConfig) -> Self {
        Self { config }
    }

    /// The configuration in use.
    pub fn config(&self) -> &VerifyConfig {
        &self.config
    }

    /// Find the signature fields of a document, in document order.
    pub fn locate(&self, data: &[u8]) -> Vec<SignatureFieldDescriptor> {
        SignatureFieldLocator::new(self.config.locator).locate(data)
    }

    /// Verify one signature field against the full document bytes.
    pub fn verify_field(&self, descriptor: &SignatureFieldDescriptor, data: &[u8]) -> VerificationResult {
        let now = self.config.now();
        let mut result = VerificationResult::new(descriptor.field_name.clone());
        result.signer_name = descriptor.signer_name.clone();
        result.reason = descriptor.reason.clone();
        result.location = descriptor.location.clone();
        result.signing_time = descriptor.claimed_signing_time;

        let (raw_range, contents) = match (&descriptor.byte_range, &descriptor.contents) {
            (Some(raw_range), Some(contents)) => (raw_range, contents),
            (None, _) => {
                result.add_error("signature field has no /ByteRange");
                return result;
            },
            (_, None) => {
                result.add_error("signature field has no signature envelope (/Contents)");
                return result;
            },
        };

        // A bad range only rules out the integrity check; the envelope and
        // its certificates are still reported.
        let signed_bytes = match self.signed_bytes(raw_range, data, &mut result) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                result.add_error(e.to_string());
                None
            },
        };

        let envelope = match SignatureEnvelope::from_hex(contents) {
            Ok(envelope) => envelope,
            Err(e) => {
                log::debug!("{}: envelope decode failed: {}", descriptor.field_name, e);
                result.add_error(e.to_string());
                return result;
            },
        };
        if envelope.is_time_stamp() {
            log::debug!("{}: RFC 3161 document timestamp", descriptor.field_name);
        }

        let Some(leaf) = envelope.signer() else {
            result.add_error("no certificates found");
            return result;
        };
        if !envelope.signer_identified {
            result.add_warning("signer certificate presumed to be the first embedded certificate");
        }

        result.signer_name = Some(leaf.display_subject());
        result.signer_email = leaf.email.clone();
        result.is_expired = leaf.is_expired(now);
        result.is_self_signed = leaf.is_self_signed();
        result.certificates = envelope
            .certificates
            .iter()
            .map(|cert| cert.summary(now))
            .collect();

        if let Some(signed_bytes) = &signed_bytes {
            match envelope.verify_integrity(signed_bytes, descriptor.sub_filter) {
                Ok(()) => result.integrity_valid = true,
                // A mismatch means altered content, which the status reports as
                // tampered; anything else is a structural failure.
                Err(Error::Integrity(cause)) => result.add_warning(cause),
                Err(e) => result.add_error(e.to_string()),
            }
        }

        result.cert_trust_valid = !result.is_self_signed && !result.is_expired;

        if let Some(signing_time) = envelope.signing_time {
            result.signing_time = Some(signing_time);
        }

        result.add_warning(CHAIN_NOT_VALIDATED);
        result.add_warning(REVOCATION_NOT_CHECKED);
        if result.is_expired {
            result.add_warning(format!("signer certificate expired on {}", leaf.not_after.to_rfc3339()));
        }
        if result.is_self_signed {
            result.add_warning("signer certificate is self-signed");
        }
        if leaf.is_not_yet_valid(now) {
            result.add_warning(format!(
                "signer certificate is not valid before {}",
                leaf.not_before.to_rfc3339()
            ));
        }

        log::debug!(
            "{}: integrity={} trust={} status={}",
            result.field_name,
            result.integrity_valid,
            result.cert_trust_valid,
            result.overall_status()
        );
        result
    }

    /// Validate the byte range and pull out the signed bytes.
    fn signed_bytes(&self, raw_range: &[i64], data: &[u8], result: &mut VerificationResult) -> Result<Vec<u8>> {
        let spans = ByteRangeExtractor::parse_spans(raw_range)?;
        let signed_bytes = ByteRangeExtractor::extract_signed_bytes(data, &spans)?;
        if !ByteRangeExtractor::covers_entire_document(&spans, data.len()) {
            if self.config.require_full_coverage {
                result.add_error(INCOMPLETE_COVERAGE);
            } else {
                result.add_warning(INCOMPLETE_COVERAGE);
            }
        }
        Ok(signed_bytes)
    }

    /// Verify every signature of a document, in document order.
    pub fn verify_document(&self, data: &[u8]) -> DocumentVerification {
        let signatures: Vec<VerificationResult> = self
            .locate(data)
            .iter()
            .map(|descriptor| self.verify_field(descriptor, data))
            .collect();
        let verification = DocumentVerification::new(count_pages(data), signatures);
        log::info!(
            "Verified {} signature(s) over {} page(s): {}",
            verification.signatures.len(),
            verification.num_pages,
            verification.status()
        );
        verification
    }

    /// Read a file and verify its signatures.
    ///
    /// Only reading the file can fail; verification problems end up in the
    /// per-signature results.
    pub fn verify_file(&self, path: impl AsRef<Path>) -> Result<DocumentVerification> {
        let data = fs::read(path.as_ref())?;
        log::debug!("Read {} bytes from {}", data.len(), path.as_ref().display());
        Ok(self.verify_document(&data))
    }

    /// Verify independent documents concurrently, one thread each.
    ///
    /// Results come back in input order, paired with the document name.
    pub fn verify_batch(&self, documents: &[(String, Vec<u8>)]) -> Vec<(String, DocumentVerification)> {
        thread::scope(|scope| {
            let handles: Vec<_> = documents
                .iter()
                .map(|(name, data)| scope.spawn(move || (name.clone(), self.verify_document(data))))
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    }
}
