//! Certificate decoding and analysis.
//!
//! Everything here is local: expiry is checked against a caller-supplied
//! instant and self-signed status is a structural comparison of the encoded
//! names. No trust store or network access is involved.

use super::extensions::{colon_hex, oid_name, render_extensions};
use super::model::{
    AttributeType, Certificate, CertificateInspection, CertificateSummary, DistinguishedName,
    PublicKeyInfo,
};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use x509_parser::certificate::X509Certificate;
use x509_parser::extensions::{GeneralName, ParsedExtension};
use x509_parser::public_key::PublicKey;
use x509_parser::time::ASN1Time;
use x509_parser::x509::{AttributeTypeAndValue, SubjectPublicKeyInfo, X509Name};

/// SHA-256 fingerprint of a DER encoding, as colon-separated uppercase hex.
pub fn fingerprint(der: &[u8]) -> String {
    colon_hex(&Sha256::digest(der))
}

fn to_datetime(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| Error::Certificate(format!("validity time out of range: {}", time)))
}

/// Attribute value as text.
///
/// String types decode directly; BMPString is read as UTF-16BE; anything
/// else is rendered as `#` followed by the hex of its content.
fn attribute_value(attr: &AttributeTypeAndValue) -> String {
    if let Ok(text) = attr.as_str() {
        return text.to_string();
    }
    let raw = attr.as_slice();
    if !raw.is_empty() && raw.len() % 2 == 0 {
        let units: Vec<u16> = raw
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        if let Ok(text) = String::from_utf16(&units) {
            return text;
        }
    }
    format!("#{}", raw.iter().map(|b| format!("{:02x}", b)).collect::<String>())
}

fn distinguished_name(name: &X509Name) -> DistinguishedName {
    let mut dn = DistinguishedName::new();
    for attr in name.iter_attributes() {
        dn.push(AttributeType::from_oid(&attr.attr_type().to_id_string()), attribute_value(attr));
    }
    dn
}

/// Bit length of a big-endian unsigned integer.
fn bit_length(bytes: &[u8]) -> usize {
    let trimmed: &[u8] = match bytes.iter().position(|&b| b != 0) {
        Some(first) => &bytes[first..],
        None => return 0,
    };
    trimmed.len() * 8 - trimmed[0].leading_zeros() as usize
}

fn hex_trimmed(bytes: &[u8]) -> String {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    bytes[start..].iter().map(|b| format!("{:02x}", b)).collect()
}

fn public_key_info(spki: &SubjectPublicKeyInfo) -> PublicKeyInfo {
    let algorithm = || PublicKeyInfo::Other {
        algorithm: oid_name(&spki.algorithm.algorithm),
    };
    match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => PublicKeyInfo::Rsa {
            modulus: hex_trimmed(rsa.modulus),
            exponent: rsa.try_exponent().unwrap_or(0),
            bits: bit_length(rsa.modulus),
        },
        Ok(PublicKey::EC(point)) => {
            let curve = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|params| params.as_oid().ok())
                .map(|oid| oid_name(&oid))
                .unwrap_or_else(|| "unknown".to_string());
            PublicKeyInfo::Ec {
                curve,
                point: point.data().iter().map(|b| format!("{:02x}", b)).collect(),
                bits: point.key_size(),
            }
        },
        Ok(_) => algorithm(),
        Err(e) => {
            log::debug!("Unparsed public key ({}), reporting algorithm only", e);
            algorithm()
        },
    }
}

fn email(cert: &X509Certificate, subject: &DistinguishedName) -> Option<String> {
    if let Some(email) = subject.get(&AttributeType::EmailAddress) {
        return Some(email.to_string());
    }
    cert.extensions().iter().find_map(|ext| match ext.parsed_extension() {
        ParsedExtension::SubjectAlternativeName(san) => san.general_names.iter().find_map(|name| match name {
            GeneralName::RFC822Name(email) => Some(email.to_string()),
            _ => None,
        }),
        _ => None,
    })
}

impl Certificate {
    /// Decode a DER-encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (rest, cert) = x509_parser::parse_x509_certificate(der)
            .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {}", e)))?;
        if !rest.is_empty() {
            log::debug!("{} trailing bytes after certificate", rest.len());
        }
        let encoded = &der[..der.len() - rest.len()];

        let subject = distinguished_name(cert.subject());
        let issuer = distinguished_name(cert.issuer());
        let email = email(&cert, &subject);

        Ok(Certificate {
            serial_number: cert.tbs_certificate.serial.to_str_radix(16),
            not_before: to_datetime(&cert.validity().not_before)?,
            not_after: to_datetime(&cert.validity().not_after)?,
            public_key: public_key_info(cert.public_key()),
            extensions: render_extensions(cert.extensions()),
            fingerprint: fingerprint(encoded),
            raw_subject: cert.subject().as_raw().to_vec(),
            raw_issuer: cert.issuer().as_raw().to_vec(),
            der: encoded.to_vec(),
            subject,
            issuer,
            email,
        })
    }

    /// Expired when `now` is strictly after notAfter.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }

    /// Not valid yet when `now` is strictly before notBefore.
    pub fn is_not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.not_before
    }

    /// Issuer and subject names have identical encodings.
    pub fn is_self_signed(&self) -> bool {
        self.raw_issuer == self.raw_subject
    }

    /// Check whether `other` names this certificate as its issuer.
    pub fn issued(&self, other: &Certificate) -> bool {
        other.raw_issuer == self.raw_subject
    }

    /// Subject display name.
    pub fn display_subject(&self) -> String {
        self.subject.display_name()
    }

    /// Issuer display name.
    pub fn display_issuer(&self) -> String {
        self.issuer.display_name()
    }

    /// Per-signature summary evaluated at `now`.
    pub fn summary(&self, now: DateTime<Utc>) -> CertificateSummary {
        CertificateSummary {
            subject: self.display_subject(),
            issuer: self.display_issuer(),
            valid_from: self.not_before,
            valid_to: self.not_after,
            serial_number: self.serial_number.clone(),
            is_expired: self.is_expired(now),
            fingerprint: self.fingerprint.clone(),
        }
    }

    /// Full inspection view evaluated at `now`.
    pub fn inspection(&self, now: DateTime<Utc>) -> CertificateInspection {
        CertificateInspection {
            subject: self.subject.clone(),
            issuer: self.issuer.clone(),
            serial_number: self.serial_number.clone(),
            valid_from: self.not_before,
            valid_to: self.not_after,
            is_expired: self.is_expired(now),
            is_self_signed: self.is_self_signed(),
            fingerprint: self.fingerprint.clone(),
            public_key_algorithm: self.public_key.algorithm_name().to_string(),
            key_size: self.public_key.bits(),
            extensions: self.extensions.clone(),
        }
    }
}
