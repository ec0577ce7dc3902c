//! Verification reports.
//!
//! A report is a display-shaped projection of a [`DocumentVerification`]: it
//! adds a generation timestamp, the file name and each signature's status,
//! and never recomputes any trust fact.

use crate::document::DocumentVerification;
use crate::error::Result;
use crate::signatures::{OverallStatus, VerificationResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fmt::Write as _;

/// One signature entry of a report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSignature {
    /// The verification result, flattened into the entry
    #[serde(flatten)]
    pub result: VerificationResult,
    /// Status derived from the result
    pub overall_status: OverallStatus,
}

/// Exportable verification report for one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// When the report was generated
    pub report_generated_at: DateTime<Utc>,
    /// Name of the verified file
    pub file: String,
    /// Number of pages
    pub num_pages: usize,
    /// Number of signature fields found
    pub signatures_found: usize,
    /// Per-signature entries, in document order
    pub signatures: Vec<ReportSignature>,
}

impl Report {
    /// Build a report stamped with `generated_at`.
    pub fn new(file: impl Into<String>, verification: &DocumentVerification, generated_at: DateTime<Utc>) -> Self {
        let signatures: Vec<ReportSignature> = verification
            .signatures
            .iter()
            .map(|result| ReportSignature {
                overall_status: result.overall_status(),
                result: result.clone(),
            })
            .collect();
        Self {
            report_generated_at: generated_at,
            file: file.into(),
            num_pages: verification.num_pages,
            signatures_found: signatures.len(),
            signatures,
        }
    }

    /// Document status over all entries.
    pub fn overall_status(&self) -> OverallStatus {
        crate::signatures::reduce(self.signatures.iter().map(|sig| sig.overall_status))
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain-text summary for terminals.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "File: {}", self.file);
        let _ = writeln!(out, "Pages: {}", self.num_pages);
        let _ = writeln!(out, "Signatures: {} ({})", self.signatures_found, self.overall_status());

        for sig in &self.signatures {
            let result = &sig.result;
            let _ = writeln!(out);
            let _ = writeln!(out, "[{}] {}", sig.overall_status, result.field_name);
            if let Some(name) = &result.signer_name {
                match &result.signer_email {
                    Some(email) => {
                        let _ = writeln!(out, "  Signer:   {} <{}>", name, email);
                    },
                    None => {
                        let _ = writeln!(out, "  Signer:   {}", name);
                    },
                }
            }
            if let Some(time) = result.signing_time {
                let _ = writeln!(out, "  Signed:   {}", time.to_rfc3339_opts(SecondsFormat::Secs, true));
            }
            if let Some(reason) = &result.reason {
                let _ = writeln!(out, "  Reason:   {}", reason);
            }
            if let Some(location) = &result.location {
                let _ = writeln!(out, "  Location: {}", location);
            }
            let _ = writeln!(
                out,
                "  Integrity: {}  Trust: {}",
                if result.integrity_valid { "ok" } else { "FAILED" },
                if result.cert_trust_valid { "ok" } else { "no" }
            );
            for cert in &result.certificates {
                let _ = writeln!(out, "  Certificate: {} (issued by {})", cert.subject, cert.issuer);
            }
            for error in &result.errors {
                let _ = writeln!(out, "  error: {}", error);
            }
            for warning in &result.warnings {
                let _ = writeln!(out, "  warning: {}", warning);
            }
        }
        out
    }
}
