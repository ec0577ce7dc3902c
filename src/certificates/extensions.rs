//! Text rendering of X.509 extensions.

use super::model::CertificateExtension;
use x509_parser::extensions::{DistributionPointName, GeneralName, ParsedExtension, X509Extension};
use x509_parser::objects::{oid2sn, oid_registry};
use x509_parser::oid_registry::Oid;

/// Short name of an OID, or its dotted form when unregistered.
pub(crate) fn oid_name(oid: &Oid) -> String {
    oid2sn(oid, oid_registry())
        .map(|sn| sn.to_string())
        .unwrap_or_else(|_| oid.to_id_string())
}

/// Colon-separated hex, the way key identifiers are usually shown.
pub(crate) fn colon_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(":")
}

fn general_names(names: &[GeneralName]) -> String {
    names
        .iter()
        .map(|name| match name {
            GeneralName::RFC822Name(email) => format!("email:{}", email),
            GeneralName::DNSName(dns) => format!("DNS:{}", dns),
            GeneralName::URI(uri) => format!("URI:{}", uri),
            GeneralName::IPAddress(ip) => format!("IP:{}", ip_address(ip)),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn ip_address(bytes: &[u8]) -> String {
    match bytes.len() {
        4 => std::net::Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3]).to_string(),
        16 => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(bytes);
            std::net::Ipv6Addr::from(octets).to_string()
        },
        _ => colon_hex(bytes),
    }
}

fn render(ext: &X509Extension) -> String {
    match ext.parsed_extension() {
        ParsedExtension::BasicConstraints(bc) => match bc.path_len_constraint {
            Some(len) => format!("CA:{}, pathlen:{}", bc.ca.to_string().to_uppercase(), len),
            None => format!("CA:{}", bc.ca.to_string().to_uppercase()),
        },
        ParsedExtension::KeyUsage(usage) => usage.to_string(),
        ParsedExtension::ExtendedKeyUsage(eku) => {
            let mut purposes = Vec::new();
            if eku.any {
                purposes.push("Any Extended Key Usage".to_string());
            }
            if eku.server_auth {
                purposes.push("TLS Web Server Authentication".to_string());
            }
            if eku.client_auth {
                purposes.push("TLS Web Client Authentication".to_string());
            }
            if eku.code_signing {
                purposes.push("Code Signing".to_string());
            }
            if eku.email_protection {
                purposes.push("E-mail Protection".to_string());
            }
            if eku.time_stamping {
                purposes.push("Time Stamping".to_string());
            }
            if eku.ocsp_signing {
                purposes.push("OCSP Signing".to_string());
            }
            purposes.extend(eku.other.iter().map(oid_name));
            purposes.join(", ")
        },
        ParsedExtension::SubjectAlternativeName(san) => general_names(&san.general_names),
        ParsedExtension::IssuerAlternativeName(ian) => general_names(&ian.general_names),
        ParsedExtension::SubjectKeyIdentifier(id) => colon_hex(id.0),
        ParsedExtension::AuthorityKeyIdentifier(aki) => {
            let mut parts = Vec::new();
            if let Some(id) = &aki.key_identifier {
                parts.push(format!("keyid:{}", colon_hex(id.0)));
            }
            if let Some(issuer) = &aki.authority_cert_issuer {
                parts.push(general_names(issuer));
            }
            if let Some(serial) = aki.authority_cert_serial {
                parts.push(format!("serial:{}", colon_hex(serial)));
            }
            parts.join(", ")
        },
        ParsedExtension::CRLDistributionPoints(points) => points
            .iter()
            .filter_map(|point| match &point.distribution_point {
                Some(DistributionPointName::FullName(names)) => Some(general_names(names)),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(", "),
        ParsedExtension::AuthorityInfoAccess(aia) => aia
            .iter()
            .map(|desc| {
                format!(
                    "{} - {}",
                    oid_name(&desc.access_method),
                    general_names(std::slice::from_ref(&desc.access_location))
                )
            })
            .collect::<Vec<_>>()
            .join(", "),
        ParsedExtension::CertificatePolicies(policies) => policies
            .iter()
            .map(|policy| format!("Policy: {}", oid_name(&policy.policy_id)))
            .collect::<Vec<_>>()
            .join(", "),
        ParsedExtension::NsCertComment(comment) => comment.to_string(),
        _ => colon_hex(ext.value),
    }
}

/// Render every extension of a certificate.
pub fn render_extensions(extensions: &[X509Extension]) -> Vec<CertificateExtension> {
    extensions
        .iter()
        .map(|ext| CertificateExtension {
            name: oid_name(&ext.oid),
            value: render(ext),
            critical: ext.critical,
        })
        .collect()
}
