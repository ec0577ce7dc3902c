//! Standalone certificate file inspection.

use super::model::{Certificate, CertificateInspection};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use x509_parser::pem::parse_x509_pem;

/// Decode a certificate file: PEM first, then raw DER.
///
/// Fails when neither encoding yields a certificate; there is no partial
/// result.
pub fn decode_certificate_file(data: &[u8]) -> Result<Certificate> {
    let pem_error = match parse_x509_pem(data) {
        Ok((_, pem)) if pem.label.contains("CERTIFICATE") => {
            log::debug!("Decoding PEM block labelled {}", pem.label);
            return Certificate::from_der(&pem.contents);
        },
        Ok((_, pem)) => format!("unexpected PEM label {}", pem.label),
        Err(e) => e.to_string(),
    };

    Certificate::from_der(data).map_err(|der_error| {
        Error::Certificate(format!(
            "not a PEM ({}) or DER ({}) certificate",
            pem_error, der_error
        ))
    })
}

/// Inspect a certificate file, evaluating expiry at `now`.
pub fn inspect_certificate(data: &[u8], now: DateTime<Utc>) -> Result<CertificateInspection> {
    let cert = decode_certificate_file(data)?;
    log::info!("Inspected certificate {} ({})", cert.display_subject(), cert.fingerprint);
    Ok(cert.inspection(now))
}
