//! Status classification.
//!
//! Maps verification results to a single user-facing label with a strict
//! precedence order, and reduces a document's results to one label.

use super::types::VerificationResult;
use serde::Serialize;

/// Overall status of a signature or document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverallStatus {
    /// Integrity and local trust checks passed
    Valid,
    /// Structural or cryptographic errors
    Invalid,
    /// The signed bytes no longer match the signature
    Tampered,
    /// Signer certificate is self-signed
    SelfSigned,
    /// Signer certificate has expired
    Expired,
    /// Signer certificate is not trusted locally
    Untrusted,
    /// No signatures present
    None,
}

impl OverallStatus {
    /// Severity rank: higher is worse.
    ///
    /// `invalid` and `tampered` share the top rank; `expired`, `self-signed`
    /// and `untrusted` share the middle one.
    pub fn severity(&self) -> u8 {
        match self {
            OverallStatus::None => 0,
            OverallStatus::Valid => 1,
            OverallStatus::Expired | OverallStatus::SelfSigned | OverallStatus::Untrusted => 2,
            OverallStatus::Invalid | OverallStatus::Tampered => 3,
        }
    }

    /// Label as shown in reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallStatus::Valid => "valid",
            OverallStatus::Invalid => "invalid",
            OverallStatus::Tampered => "tampered",
            OverallStatus::SelfSigned => "self-signed",
            OverallStatus::Expired => "expired",
            OverallStatus::Untrusted => "untrusted",
            OverallStatus::None => "none",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one result; the first matching rule wins.
pub fn classify(result: &VerificationResult) -> OverallStatus {
    if !result.errors.is_empty() {
        OverallStatus::Invalid
    } else if result.is_expired {
        OverallStatus::Expired
    } else if result.is_self_signed {
        OverallStatus::SelfSigned
    } else if !result.integrity_valid {
        OverallStatus::Tampered
    } else if !result.cert_trust_valid {
        OverallStatus::Untrusted
    } else {
        OverallStatus::Valid
    }
}

/// Reduce per-signature statuses to a document status.
///
/// Zero signatures yield `none`. Otherwise the most severe status wins; among
/// equally severe statuses the first in document order is kept.
pub fn reduce<I>(statuses: I) -> OverallStatus
where
    I: IntoIterator<Item = OverallStatus>,
{
    statuses
        .into_iter()
        .fold(None, |worst: Option<OverallStatus>, status| match worst {
            Some(current) if current.severity() >= status.severity() => Some(current),
            _ => Some(status),
        })
        .unwrap_or(OverallStatus::None)
}
