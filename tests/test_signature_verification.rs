//! End-to-end signature verification against the signed fixtures.

use chrono::{DateTime, TimeZone, Utc};
use pdfsig_oxide::signatures::{
    SignatureVerifier, CHAIN_NOT_VALIDATED, INCOMPLETE_COVERAGE, REVOCATION_NOT_CHECKED,
};
use pdfsig_oxide::{OverallStatus, VerifyConfig};
use std::path::PathBuf;

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(&path).unwrap_or_else(|e| panic!("missing fixture {}: {}", path.display(), e))
}

fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
}

fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(VerifyConfig::new().with_reference_time(reference_time()))
}

/// Replace the first occurrence of `from` with `to` (same length).
fn patch(data: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    assert_eq!(from.len(), to.len());
    let at = data
        .windows(from.len())
        .position(|w| w == from)
        .expect("pattern not found");
    let mut out = data.to_vec();
    out[at..at + to.len()].copy_from_slice(to);
    out
}

#[test]
fn test_valid_rsa_signature() {
    let doc = verifier().verify_document(&fixture("signed_rsa.pdf"));
    assert!(doc.has_signatures);
    assert_eq!(doc.num_pages, 1);
    assert_eq!(doc.signatures.len(), 1);

    let sig = &doc.signatures[0];
    assert_eq!(sig.field_name, "Signature1");
    assert!(sig.errors.is_empty(), "unexpected errors: {:?}", sig.errors);
    assert!(sig.integrity_valid);
    assert!(sig.cert_trust_valid);
    assert!(!sig.is_expired);
    assert!(!sig.is_self_signed);
    assert_eq!(sig.signer_name.as_deref(), Some("Alice Example"));
    assert_eq!(sig.signer_email.as_deref(), Some("alice@example.com"));
    assert_eq!(sig.reason.as_deref(), Some("Approval"));
    assert_eq!(sig.location.as_deref(), Some("Zurich"));
    assert!(sig.signing_time.is_some());
    assert_eq!(sig.overall_status(), OverallStatus::Valid);
    assert_eq!(doc.status(), OverallStatus::Valid);

    // Leaf first, then the issuing CA
    assert_eq!(sig.certificates.len(), 2);
    assert_eq!(sig.certificates[0].subject, "Alice Example");
    assert_eq!(sig.certificates[0].serial_number, "1a2b3c4d");
    assert_eq!(sig.certificates[1].subject, "Oxide Test Root CA");

    assert!(sig.warnings.iter().any(|w| w == CHAIN_NOT_VALIDATED));
    assert!(sig.warnings.iter().any(|w| w == REVOCATION_NOT_CHECKED));
    assert!(!sig.warnings.iter().any(|w| w == INCOMPLETE_COVERAGE));
}

#[test]
fn test_valid_ec_signature() {
    let doc = verifier().verify_document(&fixture("signed_ec.pdf"));
    let sig = &doc.signatures[0];
    assert!(sig.errors.is_empty(), "unexpected errors: {:?}", sig.errors);
    assert!(sig.integrity_valid);
    assert_eq!(sig.signer_name.as_deref(), Some("Erin Curve"));
    assert_eq!(sig.reason.as_deref(), Some("Review"));
    assert_eq!(sig.location.as_deref(), Some("Bern"));
    assert_eq!(sig.overall_status(), OverallStatus::Valid);
}

#[test]
fn test_signature_without_signed_attributes() {
    let doc = verifier().verify_document(&fixture("signed_rsa_no_attrs.pdf"));
    let sig = &doc.signatures[0];
    assert!(sig.errors.is_empty(), "unexpected errors: {:?}", sig.errors);
    assert!(sig.integrity_valid);
    // No signingTime attribute: the /M entry is used
    let claimed = Utc.with_ymd_and_hms(2026, 3, 1, 11, 0, 0).unwrap();
    assert_eq!(sig.signing_time, Some(claimed));
    assert_eq!(sig.overall_status(), OverallStatus::Valid);
}

#[test]
fn test_tampered_document() {
    let original = fixture("signed_rsa.pdf");
    let tampered = patch(&original, b"612 792", b"613 792");
    assert_eq!(tampered.len(), original.len());

    let sig = &verifier().verify_document(&tampered).signatures[0];
    assert!(!sig.integrity_valid);
    assert!(sig.errors.is_empty(), "tampering is not a structural error: {:?}", sig.errors);
    assert!(sig.warnings.iter().any(|w| w.contains("messageDigest")));
    assert_eq!(sig.overall_status(), OverallStatus::Tampered);
}

#[test]
fn test_tampered_document_without_signed_attributes() {
    let tampered = patch(&fixture("signed_rsa_no_attrs.pdf"), b"612 792", b"613 792");
    let sig = &verifier().verify_document(&tampered).signatures[0];
    assert!(!sig.integrity_valid);
    assert_eq!(sig.overall_status(), OverallStatus::Tampered);
}

#[test]
fn test_self_signed_signer() {
    let doc = verifier().verify_document(&fixture("signed_self.pdf"));
    let sig = &doc.signatures[0];
    assert!(sig.integrity_valid);
    assert!(sig.is_self_signed);
    assert!(!sig.cert_trust_valid);
    assert_eq!(sig.certificates.len(), 1);
    assert!(sig.warnings.iter().any(|w| w.contains("self-signed")));
    assert_eq!(sig.overall_status(), OverallStatus::SelfSigned);
    assert_eq!(doc.status(), OverallStatus::SelfSigned);
}

#[test]
fn test_expired_signer() {
    let sig = &verifier().verify_document(&fixture("signed_expired.pdf")).signatures[0];
    assert!(sig.integrity_valid);
    assert!(sig.is_expired);
    assert!(!sig.cert_trust_valid);
    assert!(sig.certificates[0].is_expired);
    assert!(sig.warnings.iter().any(|w| w.contains("expired on 2016-01-01")));
    assert_eq!(sig.overall_status(), OverallStatus::Expired);
}

#[test]
fn test_expiry_follows_reference_time() {
    let before_expiry = Utc.with_ymd_and_hms(2015, 6, 1, 0, 0, 0).unwrap();
    let verifier = SignatureVerifier::new(VerifyConfig::new().with_reference_time(before_expiry));
    let sig = &verifier.verify_document(&fixture("signed_expired.pdf")).signatures[0];
    assert!(!sig.is_expired);
    assert_eq!(sig.overall_status(), OverallStatus::Valid);
}

#[test]
fn test_incremental_update_with_two_signatures() {
    let doc = verifier().verify_document(&fixture("signed_twice.pdf"));
    assert_eq!(doc.num_pages, 1);
    assert_eq!(doc.signatures.len(), 2);

    let first = &doc.signatures[0];
    assert_eq!(first.field_name, "Signature1");
    assert_eq!(first.reason.as_deref(), Some("Author"));
    assert!(first.integrity_valid);
    assert!(first.warnings.iter().any(|w| w == INCOMPLETE_COVERAGE));
    assert_eq!(first.overall_status(), OverallStatus::Valid);

    let second = &doc.signatures[1];
    assert_eq!(second.field_name, "Countersignature");
    assert_eq!(second.reason.as_deref(), Some("Countersign"));
    assert_eq!(second.location.as_deref(), Some("Geneva"));
    assert_eq!(second.signer_name.as_deref(), Some("Erin Curve"));
    assert!(second.integrity_valid);
    assert!(!second.warnings.iter().any(|w| w == INCOMPLETE_COVERAGE));

    assert_eq!(doc.status(), OverallStatus::Valid);
}

#[test]
fn test_full_coverage_required() {
    let verifier = SignatureVerifier::new(
        VerifyConfig::new()
            .with_reference_time(reference_time())
            .with_full_coverage(true),
    );
    let doc = verifier.verify_document(&fixture("signed_twice.pdf"));
    assert_eq!(doc.signatures[0].overall_status(), OverallStatus::Invalid);
    assert!(doc.signatures[0].errors.iter().any(|e| e == INCOMPLETE_COVERAGE));
    assert_eq!(doc.signatures[1].overall_status(), OverallStatus::Valid);
    assert_eq!(doc.status(), OverallStatus::Invalid);
}

#[test]
fn test_out_of_bounds_range_spares_sibling() {
    let mut data = fixture("signed_rsa.pdf");
    data.extend_from_slice(
        b"8 0 obj\n<< /Type /Annot /Subtype /Widget /FT /Sig /T (Broken) /V 9 0 R >>\nendobj\n\
          9 0 obj\n<< /Type /Sig /ByteRange [0 10 20 999999] /Contents <3000> >>\nendobj\n%%EOF\n",
    );

    let doc = verifier().verify_document(&data);
    assert_eq!(doc.signatures.len(), 2);

    let good = &doc.signatures[0];
    assert!(good.integrity_valid);
    assert!(good.errors.is_empty());
    assert_eq!(good.overall_status(), OverallStatus::Valid);

    let broken = &doc.signatures[1];
    assert_eq!(broken.field_name, "Broken");
    assert!(broken.errors.iter().any(|e| e.contains("exceeds file size")));
    assert!(!broken.integrity_valid);
    assert_eq!(broken.overall_status(), OverallStatus::Invalid);

    assert_eq!(doc.status(), OverallStatus::Invalid);
}

#[test]
fn test_signature_without_envelope_is_reported() {
    let mut data = fixture("signed_rsa.pdf");
    data.extend_from_slice(
        b"8 0 obj\n<< /FT /Sig /T (Broken) /V 9 0 R >>\nendobj\n\
          9 0 obj\n<< /Type /Sig /ByteRange [0 10 20 5] /Reason (No envelope) >>\nendobj\n%%EOF\n",
    );

    let doc = verifier().verify_document(&data);
    assert_eq!(doc.signatures.len(), 2);
    assert_eq!(doc.signatures[0].overall_status(), OverallStatus::Valid);

    let broken = &doc.signatures[1];
    assert_eq!(broken.field_name, "Broken");
    assert_eq!(broken.reason.as_deref(), Some("No envelope"));
    assert!(broken.errors.iter().any(|e| e.contains("/Contents")));
    assert_eq!(broken.overall_status(), OverallStatus::Invalid);
    assert_eq!(doc.status(), OverallStatus::Invalid);
}

#[test]
fn test_document_timestamp() {
    let doc = verifier().verify_document(&fixture("timestamped.pdf"));
    assert_eq!(doc.signatures.len(), 1);

    let sig = &doc.signatures[0];
    assert_eq!(sig.field_name, "DocumentTimestamp");
    assert!(sig.errors.is_empty(), "unexpected errors: {:?}", sig.errors);
    assert!(sig.integrity_valid);
    assert_eq!(sig.signer_name.as_deref(), Some("Oxide Test TSA"));
    assert_eq!(sig.signing_time, Some(Utc.with_ymd_and_hms(2026, 10, 18, 19, 35, 1).unwrap()));
    assert_eq!(sig.overall_status(), OverallStatus::Valid);
    assert_eq!(doc.status(), OverallStatus::Valid);
}

#[test]
fn test_tampered_document_timestamp() {
    let tampered = patch(&fixture("timestamped.pdf"), b"612 792", b"613 792");
    let sig = &verifier().verify_document(&tampered).signatures[0];
    assert!(!sig.integrity_valid);
    assert!(sig.errors.is_empty(), "unexpected errors: {:?}", sig.errors);
    assert!(sig.warnings.iter().any(|w| w.contains("message imprint")));
    assert_eq!(sig.overall_status(), OverallStatus::Tampered);
}

#[test]
fn test_detached_signature_relabelled_as_timestamp() {
    // A CMS signature over the raw bytes carries no TSTInfo
    let data = patch(&fixture("signed_rsa.pdf"), b"/adbe.pkcs7.detached", b"/ETSI.RFC3161\n\n\n\n\n\n\n");
    let sig = &verifier().verify_document(&data).signatures[0];
    assert!(!sig.integrity_valid);
    assert!(sig.errors.iter().any(|e| e.contains("TSTInfo")));
    assert_eq!(sig.overall_status(), OverallStatus::Invalid);
}

#[test]
fn test_unsigned_document() {
    let doc = verifier().verify_document(&fixture("unsigned.pdf"));
    assert!(!doc.has_signatures);
    assert!(doc.signatures.is_empty());
    assert_eq!(doc.num_pages, 2);
    assert_eq!(doc.status(), OverallStatus::None);
    assert_eq!(doc.message, "No signatures found in this document");
}

#[test]
fn test_verification_is_deterministic() {
    let data = fixture("signed_ec.pdf");
    let verifier = verifier();
    let a = verifier.verify_document(&data);
    let b = verifier.verify_document(&data);
    assert_eq!(a.signatures[0].integrity_valid, b.signatures[0].integrity_valid);
    assert_eq!(a.signatures[0].certificates[0].fingerprint, b.signatures[0].certificates[0].fingerprint);
}

#[test]
fn test_batch_resolves_documents_independently() {
    let tampered = patch(&fixture("signed_rsa.pdf"), b"612 792", b"613 792");
    let documents = vec![
        ("tampered.pdf".to_string(), tampered),
        ("unsigned.pdf".to_string(), fixture("unsigned.pdf")),
        ("valid.pdf".to_string(), fixture("signed_ec.pdf")),
    ];

    let results = verifier().verify_batch(&documents);
    let statuses: Vec<(&str, OverallStatus)> = results
        .iter()
        .map(|(name, doc)| (name.as_str(), doc.status()))
        .collect();
    assert_eq!(
        statuses,
        vec![
            ("tampered.pdf", OverallStatus::Tampered),
            ("unsigned.pdf", OverallStatus::None),
            ("valid.pdf", OverallStatus::Valid),
        ]
    );
}

#[test]
fn test_verify_file_reports_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(verifier().verify_file(dir.path().join("missing.pdf")).is_err());

    let path = dir.path().join("signed.pdf");
    std::fs::write(&path, fixture("signed_rsa.pdf")).unwrap();
    let doc = verifier().verify_file(&path).unwrap();
    assert_eq!(doc.status(), OverallStatus::Valid);
}
