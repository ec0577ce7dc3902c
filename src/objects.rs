//! Indirect object index built by scanning for object headers.
//!
//! Signature verification only needs to read a handful of dictionaries, so
//! instead of walking the cross-reference chain the whole file is scanned for
//! `N G obj` headers and each body is parsed in place. When an object number
//! is defined more than once (incremental updates), the definition that
//! appears last in the file wins, which is what an xref chain would resolve
//! to for well-formed updates.

use crate::object::{Object, ObjectRef};
use crate::parser::parse_object_body;
use lazy_static::lazy_static;
use std::collections::BTreeMap;

lazy_static! {
    /// Regex for finding "N G obj" headers
    static ref RE_OBJ_HEADER: regex::bytes::Regex =
        regex::bytes::Regex::new(r"(?-u)(\d+)\s+(\d+)\s+obj\b").unwrap();
}

/// Maximum length of a reference chain followed by [`ObjectIndex::resolve`].
const MAX_RESOLVE_DEPTH: usize = 32;

/// An indirect object located in the file.
#[derive(Debug, Clone)]
pub struct IndexedObject {
    /// Object number and generation
    pub id: ObjectRef,
    /// Byte offset of the `N G obj` header
    pub offset: usize,
    /// Parsed object body
    pub object: Object,
}

/// Index of all indirect objects found in a file.
#[derive(Debug, Default)]
pub struct ObjectIndex {
    objects: BTreeMap<u32, IndexedObject>,
}

impl ObjectIndex {
    /// Scan `data` for object headers and parse each body.
    ///
    /// Bodies that fail to parse are skipped with a warning; scanning never
    /// fails as a whole.
    pub fn scan(data: &[u8]) -> Self {
        let mut objects = BTreeMap::new();
        let mut skipped = 0usize;

        for capture in RE_OBJ_HEADER.captures_iter(data) {
            let (Some(full_match), Some(id_bytes), Some(gen_bytes)) =
                (capture.get(0), capture.get(1), capture.get(2))
            else {
                continue;
            };

            let id: Option<u32> = std::str::from_utf8(id_bytes.as_bytes())
                .ok()
                .and_then(|s| s.parse().ok());
            let gen: Option<u16> = std::str::from_utf8(gen_bytes.as_bytes())
                .ok()
                .and_then(|s| s.parse().ok());
            let (Some(id), Some(gen)) = (id, gen) else {
                log::warn!("Unparsable object header at offset {}", full_match.start());
                skipped += 1;
                continue;
            };

            match parse_object_body(&data[full_match.end()..], full_match.end()) {
                Ok(object) => {
                    if objects.contains_key(&id) {
                        log::debug!("Object {} redefined at offset {}", id, full_match.start());
                    }
                    objects.insert(
                        id,
                        IndexedObject {
                            id: ObjectRef::new(id, gen),
                            offset: full_match.start(),
                            object,
                        },
                    );
                },
                Err(e) => {
                    log::warn!("Skipping object {} {} at offset {}: {}", id, gen, full_match.start(), e);
                    skipped += 1;
                },
            }
        }

        log::debug!("Indexed {} objects ({} skipped)", objects.len(), skipped);
        Self { objects }
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Check whether any object was found.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Look up an object by reference.
    ///
    /// The generation number is not enforced; the latest definition of the
    /// object number is returned.
    pub fn get(&self, obj_ref: ObjectRef) -> Option<&IndexedObject> {
        let entry = self.objects.get(&obj_ref.id)?;
        if entry.id.gen != obj_ref.gen {
            log::debug!("Generation mismatch for {}: found {}", obj_ref, entry.id.gen);
        }
        Some(entry)
    }

    /// Follow references until a direct object is reached.
    ///
    /// Dangling references and reference cycles resolve to `None`.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        let mut current = obj;
        for _ in 0..MAX_RESOLVE_DEPTH {
            match current {
                Object::Reference(r) => current = &self.get(*r)?.object,
                other => return Some(other),
            }
        }
        log::warn!("Reference chain too deep, giving up");
        None
    }

    /// All indexed objects ordered by their position in the file.
    pub fn in_file_order(&self) -> Vec<&IndexedObject> {
        let mut entries: Vec<&IndexedObject> = self.objects.values().collect();
        entries.sort_by_key(|entry| entry.offset);
        entries
    }
}
