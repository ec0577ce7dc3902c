//! Signature field locator.
//!
//! The structural strategy resolves each signature dictionary through the
//! object graph, so /ByteRange, /Contents and the auxiliary text entries are
//! always read from the same dictionary. Field names come from the form
//! fields (`/FT /Sig`) whose `/V` points at that dictionary.
//!
//! A signature dictionary is any `/Type /Sig` or `/Type /DocTimeStamp`
//! dictionary, any dictionary with a /ByteRange, and any dictionary that is
//! the value of a signature field. Dictionaries missing /ByteRange or
//! /Contents are still reported; verification turns them into errors.
//!
//! When no signature dictionary can be resolved (for example, because the
//! dictionaries live in compressed object streams), the positional scanner in
//! [`super::scanner`] is used instead.

use super::scanner::{correlate, scan_markers};
use super::types::{SignatureFieldDescriptor, SignatureSubFilter};
use crate::config::LocatorStrategy;
use crate::object::{Dictionary, Object};
use crate::objects::ObjectIndex;
use crate::parser::parse_pdf_date;
use std::collections::HashMap;

/// Maximum depth of the /Parent chain walked to build qualified names.
const MAX_FIELD_DEPTH: usize = 16;

/// Finds signature fields in a document.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureFieldLocator {
    strategy: LocatorStrategy,
}

/// Where a signature dictionary lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SigKey {
    /// An indirect object of its own
    Indirect(u32),
    /// Inline as the /V of a field object
    InlineIn(u32),
}

impl SignatureFieldLocator {
    /// Create a locator using the given strategy.
    pub fn new(strategy: LocatorStrategy) -> Self {
        Self { strategy }
    }

    /// Find all signature fields, in document order.
    ///
    /// Never fails: a document without recognizable signatures yields an
    /// empty list.
    pub fn locate(&self, data: &[u8]) -> Vec<SignatureFieldDescriptor> {
        let index = ObjectIndex::scan(data);

        if self.strategy == LocatorStrategy::Structural {
            let fields = locate_structural(&index);
            if !fields.is_empty() {
                log::debug!("Located {} signature dictionaries structurally", fields.len());
                return fields;
            }
            log::debug!("No signature dictionaries resolved, falling back to marker scan");
        }

        let names: Vec<String> = signature_fields(&index)
            .into_iter()
            .map(|field| field.name)
            .collect();
        correlate(&scan_markers(data), &names)
    }
}

/// A form field of type /Sig.
#[derive(Debug)]
struct SigField {
    name: String,
    value: Option<SigKey>,
}

/// Enumerate signature form fields in file order.
fn signature_fields(index: &ObjectIndex) -> Vec<SigField> {
    index
        .in_file_order()
        .into_iter()
        .filter_map(|entry| {
            let dict = entry.object.as_dict()?;
            if field_type(index, dict).as_deref() != Some("Sig") {
                return None;
            }
            let name = qualified_name(index, dict)?;
            let value = match dict.get("V") {
                Some(Object::Reference(r)) => Some(SigKey::Indirect(r.id)),
                Some(Object::Dictionary(_)) => Some(SigKey::InlineIn(entry.id.id)),
                _ => None,
            };
            Some(SigField { name, value })
        })
        .collect()
}

/// /FT of a field, inherited from its ancestors when absent.
fn field_type(index: &ObjectIndex, dict: &Dictionary) -> Option<String> {
    let mut current = dict;
    for _ in 0..MAX_FIELD_DEPTH {
        if let Some(ft) = current.get("FT").and_then(|obj| index.resolve(obj)) {
            return ft.as_name().map(|s| s.to_string());
        }
        current = current
            .get("Parent")
            .and_then(|obj| index.resolve(obj))
            .and_then(|obj| obj.as_dict())?;
    }
    None
}

/// Fully qualified field name: partial /T names joined with '.'.
fn qualified_name(index: &ObjectIndex, dict: &Dictionary) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = Some(dict);
    let mut depth = 0;
    while let Some(field) = current {
        if depth == MAX_FIELD_DEPTH {
            break;
        }
        if let Some(partial) = field.get("T").and_then(|obj| index.resolve(obj)).and_then(|obj| obj.as_text()) {
            parts.push(partial);
        }
        current = field
            .get("Parent")
            .and_then(|obj| index.resolve(obj))
            .and_then(|obj| obj.as_dict());
        depth += 1;
    }
    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

/// Check whether a dictionary announces itself as a signature value.
///
/// A /Contents string alone does not count: annotations carry text there.
fn is_signature_dict(index: &ObjectIndex, dict: &Dictionary) -> bool {
    let typed = matches!(
        dict.get("Type").and_then(|obj| index.resolve(obj)).and_then(|obj| obj.as_name()),
        Some("Sig" | "DocTimeStamp")
    );
    let has_range = dict
        .get("ByteRange")
        .and_then(|obj| index.resolve(obj))
        .and_then(|obj| obj.as_array())
        .is_some();
    typed || has_range
}

fn locate_structural(index: &ObjectIndex) -> Vec<SignatureFieldDescriptor> {
    let names: HashMap<SigKey, String> = signature_fields(index)
        .into_iter()
        .filter_map(|field| field.value.map(|key| (key, field.name)))
        .collect();

    // Signature dictionaries with the offset that orders them.
    let mut found: Vec<(SigKey, usize, &Dictionary)> = Vec::new();
    for entry in index.in_file_order() {
        let Some(dict) = entry.object.as_dict() else {
            continue;
        };
        let key = SigKey::Indirect(entry.id.id);
        if is_signature_dict(index, dict) || names.contains_key(&key) {
            found.push((key, entry.offset, dict));
        } else if let Some(inline) = dict.get("V").and_then(|obj| obj.as_dict()) {
            let key = SigKey::InlineIn(entry.id.id);
            if is_signature_dict(index, inline) || names.contains_key(&key) {
                found.push((key, entry.offset, inline));
            }
        }
    }
    found.sort_by_key(|(_, offset, _)| *offset);

    found
        .into_iter()
        .enumerate()
        .map(|(idx, (key, offset, dict))| {
            let field_name = names
                .get(&key)
                .cloned()
                .unwrap_or_else(|| format!("Signature {}", idx + 1));
            descriptor_from_dict(index, dict, field_name, offset)
        })
        .collect()
}

/// Read a signature dictionary into a descriptor.
fn descriptor_from_dict(
    index: &ObjectIndex,
    dict: &Dictionary,
    field_name: String,
    offset: usize,
) -> SignatureFieldDescriptor {
    let get = |key: &str| dict.get(key).and_then(|obj| index.resolve(obj));
    let text = |key: &str| get(key).and_then(|obj| obj.as_text());

    // Non-integer entries leave an empty range, rejected by the extractor
    let byte_range = get("ByteRange").and_then(|obj| obj.as_array()).map(|items| {
        items
            .iter()
            .map(|item| item.as_integer())
            .collect::<Option<Vec<i64>>>()
            .unwrap_or_default()
    });

    // Binary literal strings are converted to hex so both forms decode alike
    let contents = get("Contents").and_then(|obj| match obj {
        Object::HexString(hex) => Some(hex.clone()),
        Object::String(bytes) => Some(bytes.iter().map(|b| format!("{:02X}", b)).collect()),
        _ => None,
    });

    let sub_filter = get("SubFilter").and_then(|obj| obj.as_name()).and_then(|name| {
        let parsed = SignatureSubFilter::from_pdf_name(name);
        if parsed.is_none() {
            log::debug!("Unrecognized /SubFilter {}", name);
        }
        parsed
    });

    SignatureFieldDescriptor {
        field_name,
        byte_range,
        contents,
        reason: text("Reason"),
        location: text("Location"),
        signer_name: text("Name"),
        contact_info: text("ContactInfo"),
        claimed_signing_time: text("M").and_then(|m| parse_pdf_date(&m)),
        sub_filter,
        offset: Some(offset),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two signatures whose dictionaries list /Reason before /ByteRange in
    /// one case and after it in the other, plus a stray /Reason in an
    /// annotation, so that positional pairing goes wrong.
    const INTERLEAVED: &[u8] = b"%PDF-1.7\n\
        1 0 obj << /Type /Catalog /AcroForm << /Fields [2 0 R 3 0 R] >> >> endobj\n\
        2 0 obj << /FT /Sig /T (Author) /V 4 0 R >> endobj\n\
        3 0 obj << /FT /Sig /T (Reviewer) /V 5 0 R >> endobj\n\
        6 0 obj << /Type /Annot /Subtype /Text /Reason (Note) >> endobj\n\
        4 0 obj << /Type /Sig /SubFilter /adbe.pkcs7.detached /ByteRange [0 10 20 5] \
        /Contents <AA> /Reason (Authored) /M (D:20240102030405Z) >> endobj\n\
        5 0 obj << /Type /Sig /ByteRange [0 30 40 5] /Contents <BB> \
        /Reason (Reviewed) /Location (Bern) >> endobj\n";

    #[test]
    fn test_structural_reads_metadata_from_owning_dictionary() {
        let fields = SignatureFieldLocator::new(LocatorStrategy::Structural).locate(INTERLEAVED);
        assert_eq!(fields.len(), 2);

        assert_eq!(fields[0].field_name, "Author");
        assert_eq!(fields[0].byte_range, Some(vec![0, 10, 20, 5]));
        assert_eq!(fields[0].contents.as_deref(), Some("AA"));
        assert_eq!(fields[0].reason.as_deref(), Some("Authored"));
        assert!(fields[0].location.is_none());
        assert_eq!(fields[0].sub_filter, Some(SignatureSubFilter::Pkcs7Detached));
        assert!(fields[0].claimed_signing_time.is_some());

        assert_eq!(fields[1].field_name, "Reviewer");
        assert_eq!(fields[1].reason.as_deref(), Some("Reviewed"));
        assert_eq!(fields[1].location.as_deref(), Some("Bern"));
    }

    #[test]
    fn test_positional_pairs_by_index() {
        let fields = SignatureFieldLocator::new(LocatorStrategy::Positional).locate(INTERLEAVED);
        assert_eq!(fields.len(), 2);
        // The annotation's /Reason comes first in the file
        assert_eq!(fields[0].reason.as_deref(), Some("Note"));
        assert_eq!(fields[1].reason.as_deref(), Some("Authored"));
        assert_eq!(fields[0].location.as_deref(), Some("Bern"));
        assert_eq!(fields[0].field_name, "Author");
    }

    #[test]
    fn test_unnamed_and_inline_signatures() {
        let data = b"1 0 obj << /FT /Sig /V << /ByteRange [0 1 2 3] /Contents <00> >> >> endobj\n\
            2 0 obj << /ByteRange [0 4 5 6] /Contents <01> >> endobj\n";
        let fields = SignatureFieldLocator::default().locate(data);
        assert_eq!(fields.len(), 2);
        // Field 1 has no /T, so it is unnamed
        assert_eq!(fields[0].field_name, "Signature 1");
        assert_eq!(fields[0].byte_range, Some(vec![0, 1, 2, 3]));
        assert_eq!(fields[1].field_name, "Signature 2");
    }

    #[test]
    fn test_qualified_names_and_inherited_type() {
        let data = b"1 0 obj << /FT /Sig /T (sigs) /Kids [2 0 R] >> endobj\n\
            2 0 obj << /Parent 1 0 R /T (approval) /V 3 0 R >> endobj\n\
            3 0 obj << /ByteRange [0 4 5 6] /Contents <01> >> endobj\n";
        let fields = SignatureFieldLocator::default().locate(data);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].field_name, "sigs.approval");
    }

    #[test]
    fn test_incomplete_signature_dictionaries_are_reported() {
        let data = b"1 0 obj << /FT /Sig /T (NoContents) /V 2 0 R >> endobj\n\
            2 0 obj << /Type /Sig /ByteRange [0 10 20 5] /Reason (Pending) >> endobj\n\
            3 0 obj << /FT /Sig /T (Untyped) /V 4 0 R >> endobj\n\
            4 0 obj << /Contents <3000> >> endobj\n\
            5 0 obj << /FT /Sig /T (Inline) /V << /Filter /Adobe.PPKLite >> >> endobj\n\
            6 0 obj << /Type /Annot /Subtype /Text /Contents (A note) >> endobj\n\
            7 0 obj << /FT /Sig /T (Empty) >> endobj\n";
        let fields = SignatureFieldLocator::default().locate(data);
        let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
        assert_eq!(names, vec!["NoContents", "Untyped", "Inline"]);

        assert_eq!(fields[0].byte_range, Some(vec![0, 10, 20, 5]));
        assert!(fields[0].contents.is_none());
        assert_eq!(fields[0].reason.as_deref(), Some("Pending"));
        assert!(fields[1].byte_range.is_none());
        assert_eq!(fields[1].contents.as_deref(), Some("3000"));
        assert!(fields[2].byte_range.is_none() && fields[2].contents.is_none());
    }

    #[test]
    fn test_doc_time_stamp_dictionary() {
        let data = b"1 0 obj << /Type /DocTimeStamp /SubFilter /ETSI.RFC3161 \
            /ByteRange [0 4 5 6] /Contents <01> >> endobj\n";
        let fields = SignatureFieldLocator::default().locate(data);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].sub_filter, Some(SignatureSubFilter::Rfc3161));
    }

    #[test]
    fn test_falls_back_to_markers() {
        // Unbalanced dictionary: no object parses, but markers are visible
        let data = b"7 0 obj << /ByteRange [0 4 9 2] /Contents <0A0B> /Reason (x) ";
        let fields = SignatureFieldLocator::default().locate(data);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].contents.as_deref(), Some("0A0B"));
        assert_eq!(fields[0].reason.as_deref(), Some("x"));
    }

    #[test]
    fn test_no_signatures() {
        assert!(SignatureFieldLocator::default().locate(b"%PDF-1.4\n%%EOF").is_empty());
    }
}
