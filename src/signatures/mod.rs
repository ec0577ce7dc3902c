//! PDF digital signature verification.
//!
//! This module locates the signature fields of a PDF, isolates the bytes each
//! signature covers, decodes the CMS envelope stored in `/Contents` and checks
//! that the signature still matches the document.
//!
//! ## Pipeline
//!
//! 1. [`SignatureFieldLocator`] finds signature dictionaries (structurally,
//!    or by positional marker scanning as a fallback).
//! 2. [`ByteRangeExtractor`] concatenates the `/ByteRange` spans.
//! 3. [`SignatureEnvelope`] decodes the PKCS#7 / CMS `SignedData` and checks
//!    digest and signature.
//! 4. [`SignatureVerifier`] combines the above with certificate facts into a
//!    [`VerificationResult`], which [`classify`] maps to an [`OverallStatus`].
//!
//! Trust is local only: a signer is trusted when its certificate is neither
//! expired nor self-signed. No root store, OCSP or CRL is consulted.
//!
//! ## Signature Types Supported
//!
//! - PKCS#7 detached signatures (adbe.pkcs7.detached)
//! - PKCS#7 SHA-1 signatures (adbe.pkcs7.sha1)
//! - PAdES signatures (ETSI.CAdES.detached)
//!
//! ## Example
//!
//! ```no_run
//! use pdfsig_oxide::config::VerifyConfig;
//! use pdfsig_oxide::signatures::SignatureVerifier;
//!
//! let data = std::fs::read("signed.pdf")?;
//! let verifier = SignatureVerifier::new(VerifyConfig::new());
//! let doc = verifier.verify_document(&data);
//! for sig in &doc.signatures {
//!     println!("{}: {}", sig.field_name, sig.overall_status());
//! }
//! # Ok::<(), pdfsig_oxide::error::Error>(())
//! ```
//!
//! ## PDF Specification Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - RFC 5652 - Cryptographic Message Syntax

mod byterange;
mod envelope;
mod locator;
mod scanner;
mod status;
mod types;
mod verifier;

pub use byterange::ByteRangeExtractor;
pub use envelope::SignatureEnvelope;
pub use locator::SignatureFieldLocator;
pub use scanner::{correlate, scan_markers, MarkerScan};
pub use status::{classify, reduce, OverallStatus};
pub use types::{ByteSpan, DigestAlgorithm, SignatureFieldDescriptor, SignatureSubFilter, VerificationResult};
pub use verifier::{SignatureVerifier, CHAIN_NOT_VALIDATED, INCOMPLETE_COVERAGE, REVOCATION_NOT_CHECKED};
