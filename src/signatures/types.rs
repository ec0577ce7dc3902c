//! Digital signature types and data structures.
//!
//! This module defines the core types shared by the locator, the envelope
//! decoder and the verifier.

use crate::certificates::CertificateSummary;
use chrono::{DateTime, Utc};
use der::asn1::ObjectIdentifier;
use serde::Serialize;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Digest algorithm used for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-1 (deprecated, but still common in legacy PDFs)
    Sha1,
    /// SHA-256 (recommended)
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    const SHA1_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
    const SHA256_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
    const SHA384_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
    const SHA512_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

    /// Get the OID for this digest algorithm.
    pub fn oid(&self) -> ObjectIdentifier {
        match self {
            DigestAlgorithm::Sha1 => Self::SHA1_OID,
            DigestAlgorithm::Sha256 => Self::SHA256_OID,
            DigestAlgorithm::Sha384 => Self::SHA384_OID,
            DigestAlgorithm::Sha512 => Self::SHA512_OID,
        }
    }

    /// Map a digest algorithm OID to a supported algorithm.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        [
            DigestAlgorithm::Sha1,
            DigestAlgorithm::Sha256,
            DigestAlgorithm::Sha384,
            DigestAlgorithm::Sha512,
        ]
        .into_iter()
        .find(|alg| alg.oid() == *oid)
    }

    /// Get the name of this algorithm.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "SHA-1",
            DigestAlgorithm::Sha256 => "SHA-256",
            DigestAlgorithm::Sha384 => "SHA-384",
            DigestAlgorithm::Sha512 => "SHA-512",
        }
    }

    /// Hash `data` with this algorithm.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            DigestAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            DigestAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            DigestAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            DigestAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

/// Signature sub-filter type (signature format).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureSubFilter {
    /// adbe.pkcs7.detached - PKCS#7 detached signature
    #[default]
    Pkcs7Detached,
    /// adbe.pkcs7.sha1 - PKCS#7 with SHA-1 digest
    Pkcs7Sha1,
    /// ETSI.CAdES.detached - PAdES CAdES signature
    CadesDetached,
    /// ETSI.RFC3161 - Timestamp token
    Rfc3161,
}

impl SignatureSubFilter {
    /// Get the PDF name for this sub-filter.
    pub fn as_pdf_name(&self) -> &'static str {
        match self {
            SignatureSubFilter::Pkcs7Detached => "adbe.pkcs7.detached",
            SignatureSubFilter::Pkcs7Sha1 => "adbe.pkcs7.sha1",
            SignatureSubFilter::CadesDetached => "ETSI.CAdES.detached",
            SignatureSubFilter::Rfc3161 => "ETSI.RFC3161",
        }
    }

    /// Parse a PDF name into a sub-filter type.
    pub fn from_pdf_name(name: &str) -> Option<Self> {
        match name {
            "adbe.pkcs7.detached" => Some(SignatureSubFilter::Pkcs7Detached),
            "adbe.pkcs7.sha1" => Some(SignatureSubFilter::Pkcs7Sha1),
            "ETSI.CAdES.detached" => Some(SignatureSubFilter::CadesDetached),
            "ETSI.RFC3161" => Some(SignatureSubFilter::Rfc3161),
            _ => None,
        }
    }
}

/// One contiguous signed region of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    /// Offset of the first byte
    pub offset: usize,
    /// Number of bytes
    pub length: usize,
}

impl ByteSpan {
    /// Create a span.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Exclusive end offset, `None` on overflow.
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}

/// A signature field as found in the document, before any verification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignatureFieldDescriptor {
    /// Fully qualified field name, or a synthetic "Signature N"
    pub field_name: String,
    /// Raw /ByteRange numbers (validated by the extractor)
    pub byte_range: Option<Vec<i64>>,
    /// Hex digits of the /Contents envelope
    pub contents: Option<String>,
    /// /Reason
    pub reason: Option<String>,
    /// /Location
    pub location: Option<String>,
    /// /Name
    pub signer_name: Option<String>,
    /// /ContactInfo
    pub contact_info: Option<String>,
    /// /M, the signing time claimed by the signing application
    pub claimed_signing_time: Option<DateTime<Utc>>,
    /// /SubFilter when it names a known format
    pub sub_filter: Option<SignatureSubFilter>,
    /// Byte offset of the signature dictionary (or its /ByteRange marker)
    pub offset: Option<usize>,
}

/// Result of verifying one signature field.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    /// Name of the signature field
    pub field_name: String,
    /// Signer display name (from the leaf certificate)
    pub signer_name: Option<String>,
    /// Signer email (from the leaf certificate)
    pub signer_email: Option<String>,
    /// Signing time
    pub signing_time: Option<DateTime<Utc>>,
    /// Reason for signing
    pub reason: Option<String>,
    /// Signing location
    pub location: Option<String>,
    /// Embedded certificates, signer first
    pub certificates: Vec<CertificateSummary>,
    /// Signature matches the signed bytes
    pub integrity_valid: bool,
    /// Local trust approximation: neither expired nor self-signed
    pub cert_trust_valid: bool,
    /// Signer certificate expired at verification time
    pub is_expired: bool,
    /// Signer certificate is self-signed
    pub is_self_signed: bool,
    /// Structural and cryptographic failures
    pub errors: Vec<String>,
    /// Non-fatal findings
    pub warnings: Vec<String>,
}

impl VerificationResult {
    /// Create an empty result for a field.
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            ..Default::default()
        }
    }

    /// Record an error.
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
    }

    /// Record a warning.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Status label for this result.
    pub fn overall_status(&self) -> super::OverallStatus {
        super::status::classify(self)
    }
}
