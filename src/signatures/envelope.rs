//! CMS / PKCS#7 signature envelope decoding and integrity checking.
//!
//! The /Contents value of a signature dictionary is a DER `ContentInfo`
//! wrapping `SignedData` (RFC 5652), padded with zeros to the size reserved
//! when the document was prepared. Only the first signer is verified.
//!
//! Document timestamps (`/ETSI.RFC3161`) use the same envelope, but the
//! encapsulated content is an RFC 3161 `TSTInfo` whose message imprint is the
//! hash of the signed bytes.

use super::types::{DigestAlgorithm, SignatureSubFilter};
use crate::certificates::Certificate;
use crate::error::{Error, Result};
use crate::parser::decode_hex;
use chrono::{DateTime, Utc};
use cms::cert::x509::ext::pkix::SubjectKeyIdentifier;
use cms::cert::x509::time::Time;
use cms::cert::x509::Certificate as X509Certificate;
use cms::cert::CertificateChoices;
use cms::content_info::ContentInfo;
use cms::signed_data::{SignedData, SignerIdentifier, SignerInfo};
use der::asn1::{GeneralizedTime, ObjectIdentifier, OctetString};
use der::{Decode, Encode, Reader, SliceReader};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use signature::hazmat::PrehashVerifier;
use spki::DecodePublicKey;

const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
const ID_CT_TST_INFO: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.16.1.4");
const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
const ID_MESSAGE_DIGEST: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
const ID_SIGNING_TIME: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");
const ID_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.5.29.14");

/// Signature algorithm families that can be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SignatureScheme {
    /// RSASSA-PKCS1-v1_5, with the hash named by the algorithm if any
    RsaPkcs1(Option<DigestAlgorithm>),
    /// ECDSA over P-256 or P-384
    Ecdsa(Option<DigestAlgorithm>),
}

impl SignatureScheme {
    fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        let scheme = match oid.to_string().as_str() {
            "1.2.840.113549.1.1.1" => SignatureScheme::RsaPkcs1(None),
            "1.2.840.113549.1.1.5" => SignatureScheme::RsaPkcs1(Some(DigestAlgorithm::Sha1)),
            "1.2.840.113549.1.1.11" => SignatureScheme::RsaPkcs1(Some(DigestAlgorithm::Sha256)),
            "1.2.840.113549.1.1.12" => SignatureScheme::RsaPkcs1(Some(DigestAlgorithm::Sha384)),
            "1.2.840.113549.1.1.13" => SignatureScheme::RsaPkcs1(Some(DigestAlgorithm::Sha512)),
            "1.2.840.10045.2.1" => SignatureScheme::Ecdsa(None),
            "1.2.840.10045.4.1" => SignatureScheme::Ecdsa(Some(DigestAlgorithm::Sha1)),
            "1.2.840.10045.4.3.2" => SignatureScheme::Ecdsa(Some(DigestAlgorithm::Sha256)),
            "1.2.840.10045.4.3.3" => SignatureScheme::Ecdsa(Some(DigestAlgorithm::Sha384)),
            "1.2.840.10045.4.3.4" => SignatureScheme::Ecdsa(Some(DigestAlgorithm::Sha512)),
            _ => return None,
        };
        Some(scheme)
    }
}

/// The parts of an RFC 3161 `TSTInfo` that verification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TimeStampInfo {
    imprint_algorithm: ObjectIdentifier,
    imprint: Vec<u8>,
    gen_time: Option<DateTime<Utc>>,
}

impl TimeStampInfo {
    /// Decode version, policy, messageImprint, serialNumber and genTime;
    /// the optional trailing fields are skipped.
    fn from_der(bytes: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(bytes)?;
        let (imprint_algorithm, imprint, gen_time) = reader.sequence(|tst| {
            tst.tlv_bytes()?; // version
            tst.tlv_bytes()?; // policy
            let (algorithm, hashed) = tst.sequence(|imprint| {
                let algorithm = imprint.sequence(|alg| {
                    let oid = ObjectIdentifier::decode(alg)?;
                    alg.read_slice(alg.remaining_len())?;
                    Ok(oid)
                })?;
                Ok((algorithm, OctetString::decode(imprint)?))
            })?;
            tst.tlv_bytes()?; // serialNumber
            let gen_time = GeneralizedTime::decode(tst)?;
            tst.read_slice(tst.remaining_len())?;
            Ok((algorithm, hashed, gen_time))
        })?;

        let gen_time = i64::try_from(gen_time.to_unix_duration().as_secs())
            .ok()
            .and_then(|seconds| DateTime::from_timestamp(seconds, 0));
        Ok(TimeStampInfo {
            imprint_algorithm,
            imprint: imprint.into_bytes(),
            gen_time,
        })
    }

    /// Compare the message imprint with the hash of `signed_bytes`.
    fn check_imprint(&self, signed_bytes: &[u8]) -> Result<()> {
        let algorithm = DigestAlgorithm::from_oid(&self.imprint_algorithm).ok_or_else(|| {
            Error::Unsupported(format!("timestamp imprint algorithm {}", self.imprint_algorithm))
        })?;
        if self.imprint.as_slice() != algorithm.digest(signed_bytes).as_slice() {
            return Err(Error::Integrity(format!(
                "timestamp {} message imprint does not match the signed bytes",
                algorithm.name()
            )));
        }
        Ok(())
    }
}

/// A decoded signature envelope.
#[derive(Debug, Clone)]
pub struct SignatureEnvelope {
    /// Embedded certificates, signer first, then its issuers
    pub certificates: Vec<Certificate>,
    /// Signing time from the signingTime signed attribute
    pub signing_time: Option<DateTime<Utc>>,
    /// The signer was identified through the SignerInfo, not presumed
    pub signer_identified: bool,
    signer_info: SignerInfo,
    signer_cert: Option<X509Certificate>,
    content_type: ObjectIdentifier,
    encapsulated_content: Option<Vec<u8>>,
    time_stamp: Option<TimeStampInfo>,
}

impl SignatureEnvelope {
    /// Decode the hex digits of a /Contents string.
    pub fn from_hex(hex: &str) -> Result<Self> {
        let bytes = decode_hex(hex.as_bytes())
            .map_err(|e| Error::Envelope(format!("invalid hex in /Contents: {}", e)))?;
        Self::from_der(&bytes)
    }

    /// Decode a DER `ContentInfo`, ignoring trailing padding.
    pub fn from_der(bytes: &[u8]) -> Result<Self> {
        let mut reader = SliceReader::new(bytes)?;
        let content_info = ContentInfo::decode(&mut reader)?;
        let consumed = usize::try_from(reader.position())?;
        if bytes[consumed..].iter().any(|&b| b != 0) {
            log::warn!("Non-zero bytes after the signature envelope ({} trailing)", bytes.len() - consumed);
        }

        if content_info.content_type != ID_SIGNED_DATA {
            return Err(Error::Envelope(format!(
                "content type {} is not signedData",
                content_info.content_type
            )));
        }

        // Get the raw content and parse as SignedData
        let signed_data = SignedData::from_der(&content_info.content.to_der()?)?;

        let signer_info = signed_data
            .signer_infos
            .0
            .iter()
            .next()
            .cloned()
            .ok_or_else(|| Error::Envelope("no SignerInfo present".to_string()))?;
        if signed_data.signer_infos.0.len() > 1 {
            log::debug!("Envelope has {} signers, verifying the first", signed_data.signer_infos.0.len());
        }

        let x509_certs: Vec<X509Certificate> = signed_data
            .certificates
            .iter()
            .flat_map(|set| set.0.iter())
            .filter_map(|choice| match choice {
                CertificateChoices::Certificate(cert) => Some(cert.clone()),
                CertificateChoices::Other(_) => None,
            })
            .collect();

        let certificates = x509_certs
            .iter()
            .map(|cert| Certificate::from_der(&cert.to_der()?))
            .collect::<Result<Vec<_>>>()?;

        let signer_index = x509_certs.iter().position(|cert| matches_signer(cert, &signer_info.sid));
        let signer_identified = signer_index.is_some();
        if !signer_identified && !x509_certs.is_empty() {
            log::warn!("No certificate matches the SignerInfo, presuming the first one is the signer");
        }
        let signer_index = signer_index.unwrap_or(0);

        let encapsulated_content = signed_data
            .encap_content_info
            .econtent
            .as_ref()
            .map(|any| any.decode_as::<OctetString>().map(|octets| octets.into_bytes()))
            .transpose()?;

        let content_type = signed_data.encap_content_info.econtent_type;
        let time_stamp = match &encapsulated_content {
            Some(tst_info) if content_type == ID_CT_TST_INFO => Some(
                TimeStampInfo::from_der(tst_info)
                    .map_err(|e| Error::Envelope(format!("malformed TSTInfo: {}", e)))?,
            ),
            _ => None,
        };

        let signing_time = signing_time(&signer_info)?.or_else(|| time_stamp.as_ref().and_then(|tst| tst.gen_time));

        Ok(SignatureEnvelope {
            signing_time,
            certificates: order_chain(certificates, signer_index),
            signer_identified,
            signer_cert: x509_certs.get(signer_index).cloned(),
            signer_info,
            content_type,
            encapsulated_content,
            time_stamp,
        })
    }

    /// The signer certificate, if the envelope carries any certificate.
    pub fn signer(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    /// Digest algorithm declared by the signer, if supported.
    pub fn digest_algorithm(&self) -> Option<DigestAlgorithm> {
        DigestAlgorithm::from_oid(&self.signer_info.digest_alg.oid)
    }

    /// Check whether the envelope is an RFC 3161 timestamp token.
    pub fn is_time_stamp(&self) -> bool {
        self.time_stamp.is_some()
    }

    /// Check whether the envelope carries signed attributes.
    pub fn has_signed_attributes(&self) -> bool {
        self.signer_info.signed_attrs.is_some()
    }

    /// Verify that the signature covers `signed_bytes`.
    ///
    /// Returns `Ok(())` only when the digest and the signature both match;
    /// every other outcome is an error describing the cause.
    pub fn verify_integrity(&self, signed_bytes: &[u8], sub_filter: Option<SignatureSubFilter>) -> Result<()> {
        let digest_alg = self.digest_algorithm().ok_or_else(|| {
            Error::Unsupported(format!("digest algorithm {}", self.signer_info.digest_alg.oid))
        })?;
        let signer_cert = self
            .signer_cert
            .as_ref()
            .ok_or_else(|| Error::Integrity("no signer certificate".to_string()))?;

        // The signer signs the encapsulated content when there is one: a
        // TSTInfo for timestamps, the SHA-1 of the byte range for adbe.pkcs7.sha1
        let content: &[u8] = match (&self.encapsulated_content, &self.time_stamp) {
            (Some(tst_info), Some(time_stamp)) => {
                time_stamp.check_imprint(signed_bytes)?;
                tst_info
            },
            _ if sub_filter == Some(SignatureSubFilter::Rfc3161) => {
                return Err(Error::Unsupported(format!(
                    "ETSI.RFC3161 envelope with content type {} instead of TSTInfo",
                    self.content_type
                )));
            },
            (Some(encapsulated), None) if self.content_type == ID_DATA => {
                if sub_filter != Some(SignatureSubFilter::Pkcs7Sha1) {
                    log::debug!("Envelope carries encapsulated data, treating it as a SHA-1 digest");
                }
                if encapsulated.as_slice() != DigestAlgorithm::Sha1.digest(signed_bytes).as_slice() {
                    return Err(Error::Integrity(
                        "encapsulated SHA-1 digest does not match the signed bytes".to_string(),
                    ));
                }
                encapsulated
            },
            (Some(_), None) => {
                return Err(Error::Unsupported(format!(
                    "encapsulated content type {}",
                    self.content_type
                )));
            },
            (None, _) => signed_bytes,
        };

        let message = match &self.signer_info.signed_attrs {
            Some(attrs) => {
                let claimed = attrs
                    .iter()
                    .find(|attr| attr.oid == ID_MESSAGE_DIGEST)
                    .and_then(|attr| attr.values.iter().next())
                    .ok_or_else(|| Error::Integrity("messageDigest attribute missing".to_string()))?
                    .decode_as::<OctetString>()?;
                if claimed.as_bytes() != digest_alg.digest(content).as_slice() {
                    return Err(Error::Integrity(format!(
                        "{} digest of the signed bytes does not match messageDigest",
                        digest_alg.name()
                    )));
                }
                // The signature covers the attributes re-encoded as a SET OF
                attrs.to_der()?
            },
            None => content.to_vec(),
        };

        let scheme = SignatureScheme::from_oid(&self.signer_info.signature_algorithm.oid).ok_or_else(|| {
            Error::Unsupported(format!(
                "signature algorithm {}",
                self.signer_info.signature_algorithm.oid
            ))
        })?;
        let spki_der = signer_cert.tbs_certificate.subject_public_key_info.to_der()?;
        let signature = self.signer_info.signature.as_bytes();

        match scheme {
            SignatureScheme::RsaPkcs1(hash) => {
                let hash = hash.unwrap_or(digest_alg);
                verify_rsa(&spki_der, hash, &hash.digest(&message), signature)
            },
            SignatureScheme::Ecdsa(hash) => {
                let hash = hash.unwrap_or(digest_alg);
                verify_ecdsa(&spki_der, &hash.digest(&message), signature)
            },
        }
    }
}

fn verify_rsa(spki_der: &[u8], hash: DigestAlgorithm, hashed: &[u8], signature: &[u8]) -> Result<()> {
    let key = RsaPublicKey::from_public_key_der(spki_der)
        .map_err(|e| Error::Unsupported(format!("signer key is not a usable RSA key: {}", e)))?;
    let padding = match hash {
        DigestAlgorithm::Sha1 => Pkcs1v15Sign::new::<sha1::Sha1>(),
        DigestAlgorithm::Sha256 => Pkcs1v15Sign::new::<sha2::Sha256>(),
        DigestAlgorithm::Sha384 => Pkcs1v15Sign::new::<sha2::Sha384>(),
        DigestAlgorithm::Sha512 => Pkcs1v15Sign::new::<sha2::Sha512>(),
    };
    key.verify(padding, hashed, signature)
        .map_err(|_| Error::Integrity("RSA signature does not match".to_string()))
}

fn verify_ecdsa(spki_der: &[u8], prehash: &[u8], signature: &[u8]) -> Result<()> {
    if let Ok(key) = p256::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        let sig = p256::ecdsa::Signature::from_der(signature)
            .map_err(|e| Error::Integrity(format!("malformed ECDSA signature: {}", e)))?;
        return key
            .verify_prehash(prehash, &sig)
            .map_err(|_| Error::Integrity("ECDSA signature does not match".to_string()));
    }
    if let Ok(key) = p384::ecdsa::VerifyingKey::from_public_key_der(spki_der) {
        let sig = p384::ecdsa::Signature::from_der(signature)
            .map_err(|e| Error::Integrity(format!("malformed ECDSA signature: {}", e)))?;
        return key
            .verify_prehash(prehash, &sig)
            .map_err(|_| Error::Integrity("ECDSA signature does not match".to_string()));
    }
    Err(Error::Unsupported("elliptic curve of the signer key".to_string()))
}

/// Check whether a certificate is the one named by a SignerIdentifier.
fn matches_signer(cert: &X509Certificate, sid: &SignerIdentifier) -> bool {
    match sid {
        SignerIdentifier::IssuerAndSerialNumber(isn) => {
            cert.tbs_certificate.issuer == isn.issuer && cert.tbs_certificate.serial_number == isn.serial_number
        },
        SignerIdentifier::SubjectKeyIdentifier(SubjectKeyIdentifier(ski)) => cert
            .tbs_certificate
            .extensions
            .iter()
            .flatten()
            .filter(|ext| ext.extn_id == ID_SUBJECT_KEY_IDENTIFIER)
            .filter_map(|ext| OctetString::from_der(ext.extn_value.as_bytes()).ok())
            .any(|id| id.as_bytes() == ski.as_bytes()),
    }
}

/// Order certificates signer first, following issuer links, then the rest.
fn order_chain(certificates: Vec<Certificate>, signer_index: usize) -> Vec<Certificate> {
    let mut remaining: Vec<Option<Certificate>> = certificates.into_iter().map(Some).collect();
    let mut chain = Vec::with_capacity(remaining.len());

    let mut current = remaining.get_mut(signer_index).and_then(Option::take);
    while let Some(cert) = current.take() {
        if !cert.is_self_signed() {
            current = remaining
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|candidate| candidate.issued(&cert)))
                .and_then(Option::take);
        }
        chain.push(cert);
    }

    chain.extend(remaining.into_iter().flatten());
    chain
}

fn signing_time(signer_info: &SignerInfo) -> Result<Option<DateTime<Utc>>> {
    let Some(value) = signer_info
        .signed_attrs
        .iter()
        .flat_map(|attrs| attrs.iter())
        .find(|attr| attr.oid == ID_SIGNING_TIME)
        .and_then(|attr| attr.values.iter().next())
    else {
        return Ok(None);
    };
    let time = Time::from_der(&value.to_der()?)?;
    let seconds = i64::try_from(time.to_unix_duration().as_secs())
        .map_err(|_| Error::Envelope("signingTime out of range".to_string()))?;
    Ok(DateTime::from_timestamp(seconds, 0))
}
