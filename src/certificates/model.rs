//! Certificate data model.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Distinguished name attribute type.
///
/// Unrecognized types keep their dotted OID so no attribute is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    /// CN (2.5.4.3)
    CommonName,
    /// C (2.5.4.6)
    Country,
    /// O (2.5.4.10)
    Organization,
    /// OU (2.5.4.11)
    OrganizationalUnit,
    /// L (2.5.4.7)
    Locality,
    /// ST (2.5.4.8)
    StateOrProvince,
    /// E, emailAddress (1.2.840.113549.1.9.1)
    EmailAddress,
    /// SERIALNUMBER (2.5.4.5)
    SerialNumber,
    /// STREET (2.5.4.9)
    Street,
    /// DC (0.9.2342.19200300.100.1.25)
    DomainComponent,
    /// UID (0.9.2342.19200300.100.1.1)
    UserId,
    /// GN (2.5.4.42)
    GivenName,
    /// SN (2.5.4.4)
    Surname,
    /// T (2.5.4.12)
    Title,
    /// Any other attribute, by dotted OID
    Other(String),
}

impl AttributeType {
    /// Map a dotted OID to an attribute type.
    pub fn from_oid(oid: &str) -> Self {
        match oid {
            "2.5.4.3" => AttributeType::CommonName,
            "2.5.4.6" => AttributeType::Country,
            "2.5.4.10" => AttributeType::Organization,
            "2.5.4.11" => AttributeType::OrganizationalUnit,
            "2.5.4.7" => AttributeType::Locality,
            "2.5.4.8" => AttributeType::StateOrProvince,
            "1.2.840.113549.1.9.1" => AttributeType::EmailAddress,
            "2.5.4.5" => AttributeType::SerialNumber,
            "2.5.4.9" => AttributeType::Street,
            "0.9.2342.19200300.100.1.25" => AttributeType::DomainComponent,
            "0.9.2342.19200300.100.1.1" => AttributeType::UserId,
            "2.5.4.42" => AttributeType::GivenName,
            "2.5.4.4" => AttributeType::Surname,
            "2.5.4.12" => AttributeType::Title,
            other => AttributeType::Other(other.to_string()),
        }
    }

    /// Short name used in display strings and serialized maps.
    pub fn short_name(&self) -> &str {
        match self {
            AttributeType::CommonName => "CN",
            AttributeType::Country => "C",
            AttributeType::Organization => "O",
            AttributeType::OrganizationalUnit => "OU",
            AttributeType::Locality => "L",
            AttributeType::StateOrProvince => "ST",
            AttributeType::EmailAddress => "E",
            AttributeType::SerialNumber => "SERIALNUMBER",
            AttributeType::Street => "STREET",
            AttributeType::DomainComponent => "DC",
            AttributeType::UserId => "UID",
            AttributeType::GivenName => "GN",
            AttributeType::Surname => "SN",
            AttributeType::Title => "T",
            AttributeType::Other(oid) => oid,
        }
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

impl Serialize for AttributeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.short_name())
    }
}

/// Distinguished name: attributes in encoding order.
///
/// Serializes as a map keyed by short name; a type that occurs more than once
/// (e.g. several OU) has its values joined with ", " there.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    attributes: Vec<(AttributeType, String)>,
}

impl DistinguishedName {
    /// Create an empty name.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute.
    pub fn push(&mut self, attr_type: AttributeType, value: impl Into<String>) {
        self.attributes.push((attr_type, value.into()));
    }

    /// First value of an attribute type.
    pub fn get(&self, attr_type: &AttributeType) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(attr, _)| attr == attr_type)
            .map(|(_, value)| value.as_str())
    }

    /// Common name, if present.
    pub fn common_name(&self) -> Option<&str> {
        self.get(&AttributeType::CommonName)
    }

    /// Attributes in encoding order.
    pub fn iter(&self) -> impl Iterator<Item = (&AttributeType, &str)> {
        self.attributes.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check whether the name has no attributes.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Display form: the CN when present, otherwise `short=value` pairs.
    pub fn display_name(&self) -> String {
        if let Some(cn) = self.common_name() {
            return cn.to_string();
        }
        self.iter()
            .map(|(attr, value)| format!("{}={}", attr, value))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Serialize for DistinguishedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut merged: IndexMap<&AttributeType, String> = IndexMap::new();
        for (attr, value) in self.iter() {
            merged
                .entry(attr)
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
        merged.serialize(serializer)
    }
}

/// Public key facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeyInfo {
    /// RSA key
    Rsa {
        /// Modulus, lowercase hex without leading zeros
        modulus: String,
        /// Public exponent
        exponent: u64,
        /// Modulus length in bits
        bits: usize,
    },
    /// Elliptic curve key
    Ec {
        /// Curve short name (or dotted OID when unknown)
        curve: String,
        /// Encoded point, lowercase hex
        point: String,
        /// Field size in bits
        bits: usize,
    },
    /// Any other algorithm
    Other {
        /// Algorithm short name or dotted OID
        algorithm: String,
    },
}

impl PublicKeyInfo {
    /// Algorithm label: "RSA", "EC" or the algorithm name.
    pub fn algorithm_name(&self) -> &str {
        match self {
            PublicKeyInfo::Rsa { .. } => "RSA",
            PublicKeyInfo::Ec { .. } => "EC",
            PublicKeyInfo::Other { algorithm } => algorithm,
        }
    }

    /// Key size in bits, when derivable.
    pub fn bits(&self) -> Option<usize> {
        match self {
            PublicKeyInfo::Rsa { bits, .. } | PublicKeyInfo::Ec { bits, .. } if *bits > 0 => Some(*bits),
            _ => None,
        }
    }
}

/// A certificate extension with a displayable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateExtension {
    /// Extension short name (or dotted OID)
    pub name: String,
    /// Rendered value
    pub value: String,
    /// Critical flag
    #[serde(skip)]
    pub critical: bool,
}

/// A decoded X.509 certificate.
#[derive(Debug, Clone)]
pub struct Certificate {
    /// Subject name
    pub subject: DistinguishedName,
    /// Issuer name
    pub issuer: DistinguishedName,
    /// Serial number, lowercase hex
    pub serial_number: String,
    /// Start of the validity window
    pub not_before: DateTime<Utc>,
    /// End of the validity window
    pub not_after: DateTime<Utc>,
    /// Public key facts
    pub public_key: PublicKeyInfo,
    /// Extensions in encoding order
    pub extensions: Vec<CertificateExtension>,
    /// SHA-256 of the DER encoding, colon-separated uppercase hex
    pub fingerprint: String,
    /// Subject email, falling back to the first rfc822Name alternative name
    pub email: Option<String>,
    pub(crate) raw_subject: Vec<u8>,
    pub(crate) raw_issuer: Vec<u8>,
    pub(crate) der: Vec<u8>,
}

impl Certificate {
    /// DER encoding the certificate was decoded from.
    pub fn der(&self) -> &[u8] {
        &self.der
    }
}

/// Per-signature view of a certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSummary {
    /// Subject display name
    pub subject: String,
    /// Issuer display name
    pub issuer: String,
    /// notBefore
    pub valid_from: DateTime<Utc>,
    /// notAfter
    pub valid_to: DateTime<Utc>,
    /// Serial number, lowercase hex
    pub serial_number: String,
    /// Expired at verification time
    pub is_expired: bool,
    /// SHA-256 fingerprint
    pub fingerprint: String,
}

/// Result of inspecting a standalone certificate file.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateInspection {
    /// Subject attributes
    pub subject: DistinguishedName,
    /// Issuer attributes
    pub issuer: DistinguishedName,
    /// Serial number, lowercase hex
    pub serial_number: String,
    /// notBefore
    pub valid_from: DateTime<Utc>,
    /// notAfter
    pub valid_to: DateTime<Utc>,
    /// Expired at inspection time
    pub is_expired: bool,
    /// Issuer and subject are identical
    pub is_self_signed: bool,
    /// SHA-256 fingerprint
    pub fingerprint: String,
    /// "RSA", "EC" or another algorithm name
    pub public_key_algorithm: String,
    /// Key size in bits
    pub key_size: Option<usize>,
    /// Extensions in encoding order
    pub extensions: Vec<CertificateExtension>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_type_mapping() {
        assert_eq!(AttributeType::from_oid("2.5.4.3"), AttributeType::CommonName);
        assert_eq!(AttributeType::from_oid("1.2.840.113549.1.9.1").short_name(), "E");
        let unknown = AttributeType::from_oid("1.3.6.1.4.1.311.60.2.1.3");
        assert_eq!(unknown.short_name(), "1.3.6.1.4.1.311.60.2.1.3");
    }

    #[test]
    fn test_display_name_prefers_cn() {
        let mut name = DistinguishedName::new();
        name.push(AttributeType::Country, "CH");
        name.push(AttributeType::CommonName, "Alice Example");
        assert_eq!(name.display_name(), "Alice Example");
    }

    #[test]
    fn test_display_name_without_cn() {
        let mut name = DistinguishedName::new();
        name.push(AttributeType::Country, "CH");
        name.push(AttributeType::OrganizationalUnit, "QA");
        name.push(AttributeType::Organization, "Oxide Test");
        name.push(AttributeType::OrganizationalUnit, "Ops");
        assert_eq!(name.display_name(), "C=CH, OU=QA, O=Oxide Test, OU=Ops");
        assert_eq!(name.len(), 4);
        assert_eq!(name.get(&AttributeType::OrganizationalUnit), Some("QA"));

        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#"{"C":"CH","OU":"QA, Ops","O":"Oxide Test"}"#);
    }

    #[test]
    fn test_distinguished_name_serializes_in_order() {
        let mut name = DistinguishedName::new();
        name.push(AttributeType::Organization, "Oxide Test");
        name.push(AttributeType::Country, "CH");
        name.push(AttributeType::Other("2.5.4.97".into()), "VATCH-123");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, r#"{"O":"Oxide Test","C":"CH","2.5.4.97":"VATCH-123"}"#);
    }

    #[test]
    fn test_public_key_info() {
        let rsa = PublicKeyInfo::Rsa {
            modulus: "c0ffee".into(),
            exponent: 65537,
            bits: 2048,
        };
        assert_eq!(rsa.algorithm_name(), "RSA");
        assert_eq!(rsa.bits(), Some(2048));
        let other = PublicKeyInfo::Other {
            algorithm: "Ed25519".into(),
        };
        assert_eq!(other.algorithm_name(), "Ed25519");
        assert_eq!(other.bits(), None);
    }
}
