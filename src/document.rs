//! Document-level verification output.

use crate::objects::ObjectIndex;
use crate::signatures::{reduce, OverallStatus, VerificationResult};
use lazy_static::lazy_static;
use regex::bytes::Regex;
use serde::Serialize;

lazy_static! {
    /// `/Type /Page` but not `/Type /Pages`
    static ref RE_PAGE: Regex = Regex::new(r"(?-u)/Type\s*/Page(?:[^A-Za-z0-9#]|$)").unwrap();
    static ref RE_PAGES_COUNT: Regex = Regex::new(r"(?-u)/Count\s+(\d+)").unwrap();
    static ref RE_PAGES: Regex = Regex::new(r"(?-u)/Type\s*/Pages\b").unwrap();
}

/// Count the pages of a document by scanning for page dictionaries.
///
/// Page dictionaries hidden in compressed object streams are invisible to the
/// scan; the largest `/Count` found next to a `/Type /Pages` node is used
/// instead in that case. Redefined pages from incremental updates are counted
/// once per object number.
pub fn count_pages(data: &[u8]) -> usize {
    let index = ObjectIndex::scan(data);
    let structural = index
        .in_file_order()
        .into_iter()
        .filter(|indexed| {
            indexed
                .object
                .as_dict()
                .and_then(|dict| dict.get("Type"))
                .and_then(|t| t.as_name())
                == Some("Page")
        })
        .count();
    if structural > 0 {
        return structural;
    }

    let scanned = RE_PAGE.find_iter(data).count();
    if scanned > 0 {
        return scanned;
    }

    let count = RE_PAGES
        .find_iter(data)
        .filter_map(|m| {
            let window = &data[m.start()..data.len().min(m.start() + 512)];
            RE_PAGES_COUNT
                .captures(window)
                .and_then(|caps| std::str::from_utf8(&caps[1]).ok()?.parse::<usize>().ok())
        })
        .max()
        .unwrap_or(0);
    log::debug!("No page dictionary visible, using /Count {}", count);
    count
}

/// Verification output for a whole document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVerification {
    /// Number of pages
    pub num_pages: usize,
    /// One result per signature field, in document order
    pub signatures: Vec<VerificationResult>,
    /// At least one signature field was found
    pub has_signatures: bool,
    /// Human-readable summary
    pub message: String,
}

impl DocumentVerification {
    /// Assemble the output from per-field results.
    pub fn new(num_pages: usize, signatures: Vec<VerificationResult>) -> Self {
        let message = match signatures.len() {
            0 => "No signatures found in this document".to_string(),
            1 => "Found 1 signature".to_string(),
            n => format!("Found {} signatures", n),
        };
        Self {
            num_pages,
            has_signatures: !signatures.is_empty(),
            signatures,
            message,
        }
    }

    /// Document status: the most severe signature status, `none` when unsigned.
    pub fn status(&self) -> OverallStatus {
        reduce(self.signatures.iter().map(VerificationResult::overall_status))
    }
}
