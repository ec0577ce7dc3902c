//! Positional marker scanning.
//!
//! Scans the raw file for `/ByteRange`, `/Contents`, `/Reason` and
//! `/Location` markers and pairs the i-th match of each by index.
//!
//! This is a known limitation rather than a feature: nothing in the file
//! format guarantees that the four markers appear in the same relative order,
//! so metadata can be attached to the wrong signature when fields are
//! interleaved. It is only used when no signature dictionary can be resolved
//! through the object graph, or when explicitly requested.

use super::types::SignatureFieldDescriptor;
use crate::object::Object;
use crate::parser::parse_object;
use lazy_static::lazy_static;
use regex::bytes::Regex;

lazy_static! {
    static ref RE_BYTE_RANGE: Regex = Regex::new(r"(?-u)/ByteRange\s*\[([^\]]*)\]").unwrap();
    static ref RE_CONTENTS: Regex = Regex::new(r"(?-u)/Contents\s*<([0-9A-Fa-f\s]*)>").unwrap();
    static ref RE_REASON: Regex = Regex::new(r"(?-u)/Reason\s*[(<]").unwrap();
    static ref RE_LOCATION: Regex = Regex::new(r"(?-u)/Location\s*[(<]").unwrap();
}

/// Marker matches, each list in file order with the match offset.
#[derive(Debug, Default)]
pub struct MarkerScan {
    /// /ByteRange arrays
    pub byte_ranges: Vec<(Vec<i64>, usize)>,
    /// /Contents hex strings (digits only)
    pub contents: Vec<(String, usize)>,
    /// /Reason text
    pub reasons: Vec<(String, usize)>,
    /// /Location text
    pub locations: Vec<(String, usize)>,
}

/// Collect every marker match in `data`.
pub fn scan_markers(data: &[u8]) -> MarkerScan {
    let byte_ranges = RE_BYTE_RANGE
        .captures_iter(data)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let body = String::from_utf8_lossy(caps.get(1)?.as_bytes()).into_owned();
            let numbers: Option<Vec<i64>> =
                body.split_whitespace().map(|token| token.parse().ok()).collect();
            let numbers = numbers.unwrap_or_else(|| {
                log::warn!("Non-numeric /ByteRange at offset {}", whole.start());
                Vec::new()
            });
            Some((numbers, whole.start()))
        })
        .collect();

    let contents = RE_CONTENTS
        .captures_iter(data)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let digits: String = caps
                .get(1)?
                .as_bytes()
                .iter()
                .filter(|c| !c.is_ascii_whitespace())
                .map(|&c| c as char)
                .collect();
            Some((digits, whole.start()))
        })
        .collect();

    let scan = MarkerScan {
        byte_ranges,
        contents,
        reasons: text_markers(&RE_REASON, data),
        locations: text_markers(&RE_LOCATION, data),
    };
    log::debug!(
        "Marker scan: {} /ByteRange, {} /Contents, {} /Reason, {} /Location",
        scan.byte_ranges.len(),
        scan.contents.len(),
        scan.reasons.len(),
        scan.locations.len()
    );
    scan
}

/// String values following a marker; the value starts at the last byte of the match.
fn text_markers(pattern: &Regex, data: &[u8]) -> Vec<(String, usize)> {
    pattern
        .find_iter(data)
        .filter_map(|m| match parse_object(&data[m.end() - 1..]) {
            Ok((_, obj @ (Object::String(_) | Object::HexString(_)))) => {
                obj.as_text().map(|text| (text, m.start()))
            },
            _ => None,
        })
        .collect()
}

/// Pair markers by index into descriptors.
///
/// One descriptor is produced per /ByteRange match. Missing /Contents,
/// /Reason or /Location entries are left empty. `names` supplies field names
/// in the same positional manner; indices beyond it get "Signature N".
pub fn correlate(scan: &MarkerScan, names: &[String]) -> Vec<SignatureFieldDescriptor> {
    scan.byte_ranges
        .iter()
        .enumerate()
        .map(|(idx, (numbers, offset))| SignatureFieldDescriptor {
            field_name: names
                .get(idx)
                .cloned()
                .unwrap_or_else(|| format!("Signature {}", idx + 1)),
            byte_range: Some(numbers.clone()),
            contents: scan.contents.get(idx).map(|(hex, _)| hex.clone()),
            reason: scan.reasons.get(idx).map(|(text, _)| text.clone()),
            location: scan.locations.get(idx).map(|(text, _)| text.clone()),
            offset: Some(*offset),
            ..Default::default()
        })
        .collect()
}
