// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::enum_variant_names)]
#![allow(clippy::should_implement_trait)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Signature Oxide
//!
//! Verification of digital signatures embedded in PDF documents, and
//! inspection of standalone X.509 certificate files.
//!
//! ## Core Features
//!
//! - **Field Location**: signature dictionaries resolved through the object
//!   graph, with positional marker scanning as a fallback
//! - **Integrity**: `/ByteRange` extraction and CMS / PKCS#7 `SignedData`
//!   verification (RSA PKCS#1 v1.5, ECDSA P-256/P-384, SHA-1/2)
//! - **Certificates**: subject, issuer, validity, fingerprint, key facts and
//!   extensions for every embedded certificate
//! - **Status**: one label per signature (`valid`, `invalid`, `tampered`,
//!   `self-signed`, `expired`, `untrusted`) and per document (`none` when
//!   unsigned)
//! - **Reports**: JSON export of a document's verification
//!
//! Trust is evaluated locally. Chains are not validated against a root store
//! and revocation is not checked; every result carries warnings saying so.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsig_oxide::{Report, SignatureVerifier, VerifyConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = SignatureVerifier::new(VerifyConfig::new());
//! let doc = verifier.verify_file("contract.pdf")?;
//! println!("{} ({})", doc.message, doc.status());
//!
//! let report = Report::new("contract.pdf", &doc, chrono::Utc::now());
//! println!("{}", report.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Core PDF parsing
pub mod object;
pub mod objects;
pub mod parser;

// Certificates
pub mod certificates;

// Digital signatures
pub mod signatures;

// Document-level output
pub mod document;
pub mod report;

// Configuration
pub mod config;

// Re-exports
pub use certificates::{decode_certificate_file, inspect_certificate, Certificate, CertificateInspection};
pub use config::{LocatorStrategy, VerifyConfig};
pub use document::{count_pages, DocumentVerification};
pub use error::{Error, Result};
pub use report::Report;
pub use signatures::{OverallStatus, SignatureVerifier, VerificationResult};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
