//! X.509 certificate analysis.
//!
//! Decodes certificates embedded in signature envelopes or supplied as
//! standalone PEM/DER files and derives the facts shown to users: display
//! names, validity, fingerprint, key type and extensions.

mod analyzer;
mod extensions;
mod inspector;
mod model;

pub use analyzer::fingerprint;
pub use inspector::{decode_certificate_file, inspect_certificate};
pub use model::{
    AttributeType, Certificate, CertificateExtension, CertificateInspection, CertificateSummary,
    DistinguishedName, PublicKeyInfo,
};
