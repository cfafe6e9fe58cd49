//! Reading a document back from its canonical tree and conflict report.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::document::MetadataDocument;
use crate::error::MergeError;
use crate::model::{CONFLICT_SENTINEL, ElementPath, ScalarField};
use crate::schema::RECORD_GROUPS;

use super::{ConflictReport, STATUS_DRAFT, STATUS_KEY, get_at};

impl MetadataDocument {
    /// Rebuild a document from [`to_canonical`](Self::to_canonical) output.
    ///
    /// Empty and whitespace-only values are treated as absent. Every field
    /// holding [`CONFLICT_SENTINEL`] is restored from the matching entry of
    /// `report`.
    ///
    /// # Errors
    /// - [`MergeError::InvalidConflict`] if the sentinel appears on the cruise
    ///   id or a record identifier, or `report` has no values for it.
    /// - [`MergeError::UnknownEntry`] for record entries outside the group's shape.
    ///
    /// Records repeating an identity are folded together, as by
    /// [`push_record`](Self::push_record).
    pub fn from_canonical(tree: &Value, report: Option<&ConflictReport>) -> Result<Self, MergeError> {
        let empty = ConflictReport::default();
        let report = report.unwrap_or(&empty);
        let mut doc = Self::new();
        let no_record = BTreeMap::new();

        if let Some(id) = text_at(tree, doc.cruise_id().path()) {
            if id == CONFLICT_SENTINEL {
                return Err(invalid(doc.cruise_id().path(), "the cruise id cannot be in conflict"));
            }
            doc.cruise_id_mut().add_value(id.to_uppercase());
        }

        for field in doc.scalar_fields_mut() {
            if let Some(text) = text_at(tree, field.path()) {
                restore(field, &text, report, &no_record)?;
            }
        }

        for spec in RECORD_GROUPS {
            let Some(items) = get_at_slice(tree, spec.path).and_then(Value::as_array) else {
                continue;
            };
            for item in items {
                let Some(obj) = item.as_object() else {
                    tracing::warn!(group = spec.key, "skipping non-object record");
                    continue;
                };
                let mut record = Self::new_record(spec.key)?;

                let identity: BTreeMap<String, String> = record
                    .shape()
                    .identifiers()
                    .iter()
                    .map(|id| {
                        let value = obj.get(id).and_then(as_text).unwrap_or_default();
                        (id.clone(), value)
                    })
                    .collect();
                if let Some((id, _)) = identity.iter().find(|(_, v)| *v == CONFLICT_SENTINEL) {
                    let path = record.path().child(id.as_str());
                    return Err(invalid(&path, "a record identifier cannot be in conflict"));
                }

                for (name, value) in obj {
                    let Some(text) = as_text(value) else {
                        continue;
                    };
                    if text == CONFLICT_SENTINEL {
                        let path = record.path().child(name.as_str());
                        let entry = report
                            .find(&path.segments(), &identity)
                            .ok_or_else(|| invalid(&path, "no conflict values reported"))?;
                        for v in &entry.values {
                            record.add_entry(name, v.clone())?;
                        }
                    } else {
                        record.add_entry(name, text)?;
                    }
                }

                if !record.is_empty() {
                    doc.push_record(spec.key, record)?;
                }
            }
        }

        if tree.get(STATUS_KEY).and_then(Value::as_str) == Some(STATUS_DRAFT) {
            doc.set_draft(true);
        }
        Ok(doc)
    }
}

fn restore(
    field: &mut ScalarField,
    text: &str,
    report: &ConflictReport,
    record: &BTreeMap<String, String>,
) -> Result<(), MergeError> {
    if text != CONFLICT_SENTINEL {
        field.add_value(text);
        return Ok(());
    }
    let entry = report
        .find(&field.path().segments(), record)
        .ok_or_else(|| invalid(field.path(), "no conflict values reported"))?;
    if entry.values.len() < 2 {
        return Err(invalid(field.path(), "fewer than two conflicting values reported"));
    }
    field.add_values(entry.values.iter().cloned());
    Ok(())
}

fn invalid(path: &ElementPath, reason: &str) -> MergeError {
    MergeError::InvalidConflict {
        path: path.to_string(),
        reason: reason.to_owned(),
    }
}

/// Scalar JSON as trimmed text; `None` for nulls, containers and blanks.
fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn text_at(tree: &Value, path: &ElementPath) -> Option<String> {
    get_at(tree, path).and_then(as_text)
}

fn get_at_slice<'a>(tree: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(tree, |node, seg| node.get(*seg))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conflicted() -> MetadataDocument {
        let mut doc = MetadataDocument::with_cruise_id("EXPO123");
        doc.add_value("vessel_name", "Healy").unwrap();
        doc.add_value("platform_type", "Ship").unwrap();
        doc.add_value("platform_type", "Research Vessel").unwrap();
        let mut inv = MetadataDocument::new_record("investigator").unwrap();
        inv.add_entry("name", "J. Doe").unwrap();
        inv.add_entry("email", "j@x.org").unwrap();
        inv.add_entry("phone", "1").unwrap();
        inv.add_entry("phone", "2").unwrap();
        doc.push_record("investigator", inv).unwrap();
        doc.set_draft(true);
        doc
    }

    #[test]
    fn canonical_and_report_restore_the_document() {
        let doc = conflicted();
        let tree = doc.to_canonical();
        let report = doc.to_conflict_report();
        let back = MetadataDocument::from_canonical(&tree, Some(&report)).unwrap();

        assert_eq!(back.value("cruise_id"), "EXPO123");
        assert_eq!(
            back.field("platform_type").unwrap().all_values(),
            ["Ship", "Research Vessel"]
        );
        let inv = &back.records("investigator").unwrap()[0];
        assert_eq!(inv.field("phone").unwrap().all_values(), ["1", "2"]);
        assert!(back.is_draft());
        assert_eq!(back.to_canonical(), tree);
        assert_eq!(back.to_conflict_report(), report);
    }

    #[test]
    fn sentinel_without_report_is_invalid() {
        let tree = conflicted().to_canonical();
        let err = MetadataDocument::from_canonical(&tree, None).unwrap_err();
        assert!(matches!(err, MergeError::InvalidConflict { .. }));
    }

    #[test]
    fn sentinel_on_cruise_id_is_invalid() {
        let tree = json!({ "Cruise_Info": { "Experiment": { "Cruise": { "Cruise_ID": "%%CONFLICT%%" } } } });
        let err = MetadataDocument::from_canonical(&tree, None).unwrap_err();
        assert!(
            matches!(err, MergeError::InvalidConflict { ref path, .. } if path.ends_with("Cruise_ID"))
        );
    }

    #[test]
    fn sentinel_on_record_identifier_is_invalid() {
        let tree = json!({ "Investigator": [{ "name": "%%CONFLICT%%" }] });
        let err = MetadataDocument::from_canonical(&tree, None).unwrap_err();
        assert!(
            matches!(err, MergeError::InvalidConflict { ref path, .. } if path == "Investigator/name")
        );
    }

    #[test]
    fn blanks_are_absent_and_numbers_are_text() {
        let tree = json!({
            "Cruise_Info": {
                "Vessel": { "Vessel_Name": "  ", "Vessel_ID": 33 },
                "Experiment": { "Cruise": { "Cruise_ID": "expo7" } }
            }
        });
        let doc = MetadataDocument::from_canonical(&tree, None).unwrap();
        assert!(doc.field("vessel_name").unwrap().is_empty());
        assert_eq!(doc.value("vessel_id"), "33");
        assert_eq!(doc.value("cruise_id"), "EXPO7");
        assert!(!doc.is_draft());
    }

    #[test]
    fn repeated_record_identity_is_folded() {
        let tree = json!({ "Investigator": [
            { "name": "X", "phone": "2" },
            { "name": "X", "email": "", "phone": "3" }
        ] });
        let doc = MetadataDocument::from_canonical(&tree, None).unwrap();
        let records = doc.records("investigator").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("phone").unwrap().all_values(), ["2", "3"]);
    }

    #[test]
    fn repeated_header_records_survive_the_round_trip() {
        let a = crate::parse_header("expocode=EXPO1\ninvestigator[\nname=X\nphone=1\n]\n").unwrap();
        let b = crate::parse_header(
            "expocode=EXPO1\ninvestigator[\nname=X\nphone=2\n]\ninvestigator[\nname=X\nphone=3\n]\n",
        )
        .unwrap();
        let merged = MetadataDocument::merge(&[a, b]).unwrap();
        let records = merged.records("investigator").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].field("phone").unwrap().all_values(), ["1", "2", "3"]);

        let report = merged.to_conflict_report();
        let back = MetadataDocument::from_canonical(&merged.to_canonical(), Some(&report)).unwrap();
        assert_eq!(back.to_conflict_report(), report);
        assert_eq!(
            report.to_tree()["Conflict"]["Investigator"][0]["phone"],
            json!(["1", "2", "3"])
        );
    }

    #[test]
    fn unknown_record_entry_is_rejected() {
        let tree = json!({ "Investigator": [{ "name": "J. Doe", "fax": "0" }] });
        let err = MetadataDocument::from_canonical(&tree, None).unwrap_err();
        assert!(matches!(err, MergeError::UnknownEntry { .. }));
    }
}
