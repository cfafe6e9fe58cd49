//! Canonical and conflict serialization of a [`MetadataDocument`].
//!
//! A document is written as two trees:
//!
//! | tree | content | size |
//! |------|---------|------|
//! | canonical | every field as `canonical_value()`, groups as arrays | whole schema |
//! | conflict report | every disputed field with all of its values | one entry per conflict |
//!
//! Both trees nest objects by element path. The canonical tree carries
//! [`CONFLICT_SENTINEL`] wherever a field is in dispute; the conflict report
//! holds the values needed to restore it (see [`MetadataDocument::from_canonical`]).

mod read;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::MetadataDocument;
use crate::model::{CONFLICT_SENTINEL, CompositeRecord, ElementPath, ScalarField};

/// Root element of [`ConflictReport::to_tree`].
pub const CONFLICT_ROOT: &str = "Conflict";

/// Canonical-tree key marking a draft document.
pub const STATUS_KEY: &str = "status";

/// Canonical-tree value of [`STATUS_KEY`] for drafts.
pub const STATUS_DRAFT: &str = "draft";

// ---------------------------------------------------------------------------
// ConflictReport
// ---------------------------------------------------------------------------

/// One disputed field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    /// Root-first element path of the field.
    pub path: Vec<String>,
    /// Identity of the owning record (identifier name to value); empty for
    /// plain scalar fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub record: BTreeMap<String, String>,
    /// Every distinct value, in first-seen order.
    pub values: Vec<String>,
}

/// Every conflict of one document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub entries: Vec<ConflictEntry>,
}

impl ConflictReport {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// The entry for `path` owned by the record with identity `record`
    /// (empty for scalar fields).
    #[must_use]
    pub fn find(&self, path: &[&str], record: &BTreeMap<String, String>) -> Option<&ConflictEntry> {
        self.entries
            .iter()
            .find(|e| e.path.iter().map(String::as_str).eq(path.iter().copied()) && e.record == *record)
    }

    /// The report as a nested tree under a [`CONFLICT_ROOT`] element.
    ///
    /// Scalar conflicts become arrays of values at their path. Record
    /// conflicts become an array of objects at the record path, one per
    /// record, holding its identity plus an array of values per disputed entry.
    #[must_use]
    pub fn to_tree(&self) -> Value {
        let mut body = Map::new();
        for entry in &self.entries {
            let values = Value::Array(entry.values.iter().cloned().map(Value::String).collect());
            if entry.record.is_empty() {
                insert_at(&mut body, &entry.path, values);
                continue;
            }
            let Some((entry_name, record_path)) = entry.path.split_last() else {
                continue;
            };
            let Some(Value::Array(records)) = slot_at(&mut body, record_path, || {
                Value::Array(Vec::new())
            }) else {
                continue;
            };
            let matches_identity = |v: &Value| {
                entry
                    .record
                    .iter()
                    .all(|(k, id)| v.get(k).and_then(Value::as_str) == Some(id.as_str()))
            };
            let idx = records.iter().position(matches_identity).unwrap_or_else(|| {
                let identity = entry
                    .record
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                records.push(Value::Object(identity));
                records.len() - 1
            });
            if let Some(Value::Object(obj)) = records.get_mut(idx) {
                obj.insert(entry_name.clone(), values);
            }
        }

        let mut root = Map::new();
        root.insert(CONFLICT_ROOT.to_owned(), Value::Object(body));
        Value::Object(root)
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

impl MetadataDocument {
    /// The best current answer: one resolved value per field.
    #[must_use]
    pub fn to_canonical(&self) -> Value {
        let mut root = Map::new();

        let canonical = |f: &ScalarField| Value::String(f.canonical_value().to_owned());
        insert_at(&mut root, &self.cruise_id().path().segments(), canonical(self.cruise_id()));
        for (_, field) in self.scalar_fields() {
            insert_at(&mut root, &field.path().segments(), canonical(field));
        }

        for (spec, records) in self.groups() {
            let rendered = records
                .iter()
                .map(|r| {
                    let obj: Map<String, Value> = r
                        .entries()
                        .iter()
                        .map(|f| (f.name().to_owned(), canonical(f)))
                        .collect();
                    Value::Object(obj)
                })
                .collect();
            insert_at(&mut root, spec.path, Value::Array(rendered));
        }

        if self.is_draft() {
            root.insert(STATUS_KEY.to_owned(), Value::String(STATUS_DRAFT.to_owned()));
        }
        Value::Object(root)
    }

    /// Every disputed field with all of its values, in document order.
    #[must_use]
    pub fn to_conflict_report(&self) -> ConflictReport {
        let scalar = |f: &ScalarField| ConflictEntry {
            path: f.path().to_segments(),
            record: BTreeMap::new(),
            values: f.all_values().to_vec(),
        };

        let mut entries: Vec<ConflictEntry> = std::iter::once(self.cruise_id())
            .chain(self.scalar_fields().map(|(_, f)| f))
            .filter(|f| f.has_conflict())
            .map(scalar)
            .collect();

        for (_, records) in self.groups() {
            for record in records {
                let identity = identity_map(record);
                entries.extend(record.conflicted_entries().map(|f| ConflictEntry {
                    record: identity.clone(),
                    ..scalar(f)
                }));
            }
        }

        ConflictReport { entries }
    }
}

/// Identifier name to canonical value, absent identifiers as `""`.
pub(crate) fn identity_map(record: &CompositeRecord) -> BTreeMap<String, String> {
    record
        .shape()
        .identifiers()
        .iter()
        .cloned()
        .zip(record.identity_key())
        .collect()
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

/// Place `value` at `path`, creating intermediate objects.
fn insert_at<S: AsRef<str>>(root: &mut Map<String, Value>, path: &[S], value: Value) {
    if let Some(slot) = slot_at(root, path, || Value::Null) {
        *slot = value;
    }
}

/// The slot at `path`, created with `init` if missing. `None` if an
/// intermediate element exists and is not an object, or `path` is empty.
fn slot_at<'a, S: AsRef<str>>(
    root: &'a mut Map<String, Value>,
    path: &[S],
    init: impl FnOnce() -> Value,
) -> Option<&'a mut Value> {
    let (last, parents) = path.split_last()?;
    let mut node = root;
    for seg in parents {
        let next = node
            .entry(seg.as_ref())
            .or_insert_with(|| Value::Object(Map::new()));
        node = next.as_object_mut()?;
    }
    Some(node.entry(last.as_ref()).or_insert_with(init))
}

/// The value at `path`, if every step exists.
pub(crate) fn get_at<'a>(root: &'a Value, path: &ElementPath) -> Option<&'a Value> {
    path.segments()
        .into_iter()
        .try_fold(root, |node, seg| node.get(seg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> MetadataDocument {
        let mut doc = MetadataDocument::with_cruise_id("EXPO123");
        doc.add_value("vessel_name", "Healy").unwrap();
        doc.add_value("platform_type", "Ship").unwrap();
        doc.add_value("platform_type", "Research Vessel").unwrap();

        let mut inv = MetadataDocument::new_record("investigator").unwrap();
        inv.add_entry("name", "J. Doe").unwrap();
        inv.add_entry("email", "j@x.org").unwrap();
        inv.add_entry("phone", "555-1111").unwrap();
        inv.add_entry("phone", "555-2222").unwrap();
        doc.push_record("investigator", inv).unwrap();
        doc
    }

    #[test]
    fn canonical_tree_nests_by_path() {
        let tree = sample().to_canonical();
        assert_eq!(tree["Cruise_Info"]["Experiment"]["Cruise"]["Cruise_ID"], "EXPO123");
        assert_eq!(tree["Cruise_Info"]["Vessel"]["Vessel_Name"], "Healy");
        assert_eq!(tree["Cruise_Info"]["Experiment"]["Platform_Type"], CONFLICT_SENTINEL);
        assert_eq!(tree["Cruise_Info"]["Vessel"]["Country"], "");
        assert_eq!(
            tree["Investigator"],
            json!([{ "name": "J. Doe", "email": "j@x.org", "phone": CONFLICT_SENTINEL }])
        );
        assert!(tree.get(STATUS_KEY).is_none());
    }

    #[test]
    fn draft_documents_carry_status() {
        let mut doc = sample();
        doc.set_draft(true);
        assert_eq!(doc.to_canonical()[STATUS_KEY], STATUS_DRAFT);
    }

    #[test]
    fn conflict_report_lists_only_disputes() {
        let report = sample().to_conflict_report();
        assert_eq!(report.len(), 2);

        let platform = &report.entries[0];
        assert_eq!(platform.path, ["Cruise_Info", "Experiment", "Platform_Type"]);
        assert!(platform.record.is_empty());
        assert_eq!(platform.values, ["Ship", "Research Vessel"]);

        let phone = &report.entries[1];
        assert_eq!(phone.path, ["Investigator", "phone"]);
        assert_eq!(phone.record["name"], "J. Doe");
        assert_eq!(phone.record["email"], "j@x.org");
        assert_eq!(phone.values, ["555-1111", "555-2222"]);
    }

    #[test]
    fn conflict_free_document_has_empty_report() {
        let doc = MetadataDocument::with_cruise_id("EXPO1");
        assert!(doc.to_conflict_report().is_empty());
        assert_eq!(doc.to_conflict_report().to_tree(), json!({ "Conflict": {} }));
    }

    #[test]
    fn report_tree_groups_record_conflicts() {
        let tree = sample().to_conflict_report().to_tree();
        assert_eq!(
            tree,
            json!({
                "Conflict": {
                    "Cruise_Info": { "Experiment": { "Platform_Type": ["Ship", "Research Vessel"] } },
                    "Investigator": [
                        { "name": "J. Doe", "email": "j@x.org", "phone": ["555-1111", "555-2222"] }
                    ]
                }
            })
        );
    }

    #[test]
    fn report_serializes_without_empty_identity() {
        let report = sample().to_conflict_report();
        let text = serde_json::to_string(&report).unwrap();
        let back: ConflictReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
        let first = serde_json::to_value(&report.entries[0]).unwrap();
        assert!(first.get("record").is_none());
    }

    #[test]
    fn find_matches_path_and_identity() {
        let report = sample().to_conflict_report();
        let identity: BTreeMap<String, String> = [
            ("email".to_owned(), "j@x.org".to_owned()),
            ("name".to_owned(), "J. Doe".to_owned()),
        ]
        .into();
        assert!(report.find(&["Investigator", "phone"], &identity).is_some());
        assert!(report.find(&["Investigator", "phone"], &BTreeMap::new()).is_none());
    }
}
