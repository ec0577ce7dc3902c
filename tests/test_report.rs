//! Report generation from real verifications.

use chrono::{TimeZone, Utc};
use pdfsig_oxide::{OverallStatus, Report, SignatureVerifier, VerifyConfig};
use std::path::PathBuf;

fn fixture(name: &str) -> Vec<u8> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read(path).unwrap()
}

fn verifier() -> SignatureVerifier {
    SignatureVerifier::new(VerifyConfig::new().with_reference_time(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()))
}

#[test]
fn test_report_for_two_signatures() {
    let generated_at = Utc.with_ymd_and_hms(2026, 6, 1, 9, 30, 0).unwrap();
    let doc = verifier().verify_document(&fixture("signed_twice.pdf"));
    let report = Report::new("signed_twice.pdf", &doc, generated_at);
    assert_eq!(report.overall_status(), OverallStatus::Valid);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["reportGeneratedAt"], "2026-06-01T09:30:00Z");
    assert_eq!(json["file"], "signed_twice.pdf");
    assert_eq!(json["numPages"], 1);
    assert_eq!(json["signaturesFound"], 2);

    let first = &json["signatures"][0];
    assert_eq!(first["fieldName"], "Signature1");
    assert_eq!(first["signerName"], "Alice Example");
    assert_eq!(first["signerEmail"], "alice@example.com");
    assert_eq!(first["reason"], "Author");
    assert_eq!(first["integrityValid"], true);
    assert_eq!(first["certTrustValid"], true);
    assert_eq!(first["overallStatus"], "valid");
    assert_eq!(first["certificates"][0]["serialNumber"], "1a2b3c4d");
    assert_eq!(first["certificates"][1]["subject"], "Oxide Test Root CA");
    assert_eq!(first["certificates"][0]["isExpired"], false);

    assert_eq!(json["signatures"][1]["signerName"], "Erin Curve");
}

#[test]
fn test_report_statuses_mirror_results() {
    let doc = verifier().verify_document(&fixture("signed_self.pdf"));
    let report = Report::new("signed_self.pdf", &doc, Utc::now());
    assert_eq!(report.signatures[0].overall_status, doc.signatures[0].overall_status());

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["signatures"][0]["overallStatus"], "self-signed");
    assert_eq!(json["signatures"][0]["isSelfSigned"], true);
}

#[test]
fn test_report_for_unsigned_document() {
    let doc = verifier().verify_document(&fixture("unsigned.pdf"));
    let report = Report::new("unsigned.pdf", &doc, Utc::now());
    assert_eq!(report.signatures_found, 0);
    assert_eq!(report.num_pages, 2);
    assert_eq!(report.overall_status(), OverallStatus::None);

    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["signatures"], serde_json::json!([]));
    assert!(report.to_text().contains("Signatures: 0 (none)"));
}

#[test]
fn test_report_written_to_disk() {
    let doc = verifier().verify_document(&fixture("signed_ec.pdf"));
    let report = Report::new("signed_ec.pdf", &doc, Utc::now());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    std::fs::write(&path, report.to_json().unwrap()).unwrap();

    let back: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(back["signatures"][0]["overallStatus"], "valid");
    assert_eq!(back["signatures"][0]["location"], "Bern");
}
