//! Composite records: one instance of a repeating group (an investigator, a
//! variable, a sensor).
//!
//! Every record carries a shared [`RecordShape`] naming its element path, the
//! entries it may hold and which of those entries identify it. Identifier
//! entries are single-valued at all times: a second distinct value is a hard
//! [`MergeError::IdentityAmbiguous`], because later identity matching would be
//! undefined. Every other entry accumulates values like a [`ScalarField`].

use std::sync::Arc;

use crate::error::MergeError;

use super::field::ScalarField;
use super::path::ElementPath;

// ---------------------------------------------------------------------------
// RecordShape
// ---------------------------------------------------------------------------

/// The layout shared by every record of one repeating group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordShape {
    path: ElementPath,
    identifiers: Vec<String>,
    entries: Vec<String>,
}

impl RecordShape {
    /// Declare a shape with the given identifier fields.
    ///
    /// Any entry name is accepted until [`with_entries`](Self::with_entries)
    /// narrows the set.
    ///
    /// # Errors
    /// [`MergeError::NoIdentifiers`] if `identifiers` is empty.
    pub fn new<I, S>(path: ElementPath, identifiers: I) -> Result<Self, MergeError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for id in identifiers {
            let id = id.into();
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        if ids.is_empty() {
            return Err(MergeError::NoIdentifiers {
                record: path.to_string(),
            });
        }
        Ok(Self {
            path,
            identifiers: ids,
            entries: Vec::new(),
        })
    }

    /// Shape from static declarations whose identifier list is known to be
    /// non-empty and contained in `entries`.
    pub(crate) fn declared(path: ElementPath, identifiers: &[&str], entries: &[&str]) -> Self {
        debug_assert!(!identifiers.is_empty());
        Self {
            path,
            identifiers: identifiers.iter().map(|s| (*s).to_owned()).collect(),
            entries: entries.iter().map(|s| (*s).to_owned()).collect(),
        }
    }

    /// Restrict the entry names a record may hold. Identifiers stay allowed.
    #[must_use]
    pub fn with_entries<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries = entries.into_iter().map(Into::into).collect();
        for id in &self.identifiers {
            if !self.entries.contains(id) {
                self.entries.push(id.clone());
            }
        }
        self
    }

    #[must_use]
    pub const fn path(&self) -> &ElementPath {
        &self.path
    }

    /// Identifier field names, in identity-key order.
    #[must_use]
    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    /// Allowed entry names (empty when unrestricted).
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    #[must_use]
    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifiers.iter().any(|id| id == name)
    }

    #[must_use]
    pub fn allows(&self, name: &str) -> bool {
        self.entries.is_empty() || self.entries.iter().any(|e| e == name)
    }
}

// ---------------------------------------------------------------------------
// CompositeRecord
// ---------------------------------------------------------------------------

/// One record of a repeating group: named scalar entries plus identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompositeRecord {
    shape: Arc<RecordShape>,
    entries: Vec<ScalarField>,
}

impl CompositeRecord {
    /// An empty record of the given shape.
    #[must_use]
    pub const fn new(shape: Arc<RecordShape>) -> Self {
        Self {
            shape,
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn shape(&self) -> &RecordShape {
        &self.shape
    }

    #[must_use]
    pub fn path(&self) -> &ElementPath {
        self.shape.path()
    }

    /// Entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> &[ScalarField] {
        &self.entries
    }

    #[must_use]
    pub fn field(&self, name: &str) -> Option<&ScalarField> {
        self.entries.iter().find(|f| f.name() == name)
    }

    /// Canonical value of entry `name`, or `""` if the entry is absent.
    #[must_use]
    pub fn value(&self, name: &str) -> &str {
        self.field(name).map_or("", ScalarField::canonical_value)
    }

    /// Add one value to entry `name`, creating the entry if needed.
    ///
    /// # Errors
    /// - [`MergeError::UnknownEntry`] if the shape does not allow `name`.
    /// - [`MergeError::IdentityAmbiguous`] if `name` is an identifier that
    ///   already holds a different value. The value is not added.
    pub fn add_entry(&mut self, name: &str, value: impl Into<String>) -> Result<(), MergeError> {
        self.merge_field(name, &[value.into()])
    }

    /// Merge every entry of another record into this one, field by field.
    ///
    /// A failure on one field leaves the fields merged before it in place.
    ///
    /// # Errors
    /// As [`add_entry`](Self::add_entry), for the first offending field.
    pub fn add_entries(&mut self, entries: &[ScalarField]) -> Result<(), MergeError> {
        for entry in entries {
            self.merge_field(entry.name(), entry.all_values())?;
        }
        Ok(())
    }

    fn merge_field(&mut self, name: &str, values: &[String]) -> Result<(), MergeError> {
        if !self.shape.allows(name) {
            return Err(MergeError::UnknownEntry {
                entry: name.to_owned(),
                record: self.path().to_string(),
            });
        }

        if self.shape.is_identifier(name) {
            let mut union: Vec<String> = self
                .field(name)
                .map(|f| f.all_values().to_vec())
                .unwrap_or_default();
            for v in values {
                if !union.contains(v) {
                    union.push(v.clone());
                }
            }
            if union.len() > 1 {
                return Err(MergeError::IdentityAmbiguous {
                    field: name.to_owned(),
                    record: self.path().to_string(),
                    identity: self.identity_label(),
                    values: union,
                });
            }
        }

        let idx = match self.entries.iter().position(|f| f.name() == name) {
            Some(idx) => idx,
            None => {
                let path = self.path().child(name);
                self.entries.push(ScalarField::new(path));
                self.entries.len() - 1
            }
        };
        self.entries[idx].add_values(values.iter().cloned());
        Ok(())
    }

    /// Identifier values in shape order. Absent and empty compare equal.
    #[must_use]
    pub fn identity_key(&self) -> Vec<String> {
        self.shape
            .identifiers()
            .iter()
            .map(|id| self.value(id).to_owned())
            .collect()
    }

    /// Human-readable identity, e.g. `name=J. Doe, email=j@x.org`.
    #[must_use]
    pub fn identity_label(&self) -> String {
        self.shape
            .identifiers()
            .iter()
            .map(|id| format!("{id}={}", self.value(id)))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// `true` if any non-identifier entry holds more than one value.
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.conflicted_entries().next().is_some()
    }

    /// Non-identifier entries currently in dispute.
    pub fn conflicted_entries(&self) -> impl Iterator<Item = &ScalarField> {
        let shape = &self.shape;
        self.entries
            .iter()
            .filter(move |f| !shape.is_identifier(f.name()) && f.has_conflict())
    }

    /// `true` if every entry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(ScalarField::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn investigator_shape() -> Arc<RecordShape> {
        let shape = RecordShape::new(ElementPath::root("Investigator"), ["name", "email"])
            .unwrap()
            .with_entries(["name", "organization", "address", "phone", "email"]);
        Arc::new(shape)
    }

    fn doe() -> CompositeRecord {
        let mut r = CompositeRecord::new(investigator_shape());
        r.add_entry("name", "J. Doe").unwrap();
        r.add_entry("email", "j@x.org").unwrap();
        r
    }

    #[test]
    fn shape_requires_identifiers() {
        let err = RecordShape::new(ElementPath::root("Sensor"), Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, MergeError::NoIdentifiers { .. }));
    }

    #[test]
    fn identifier_rejects_second_value() {
        let mut r = doe();
        let err = r.add_entry("email", "jdoe@y.org").unwrap_err();
        assert!(matches!(
            err,
            MergeError::IdentityAmbiguous { ref field, .. } if field == "email"
        ));
        assert_eq!(r.field("email").unwrap().all_values(), ["j@x.org"]);
    }

    #[test]
    fn identifier_accepts_same_value_again() {
        let mut r = doe();
        r.add_entry("email", "j@x.org").unwrap();
        assert_eq!(r.field("email").unwrap().len(), 1);
    }

    #[test]
    fn non_identifier_accumulates_conflict() {
        let mut r = doe();
        r.add_entry("organization", "NOAA").unwrap();
        r.add_entry("organization", "PMEL").unwrap();
        assert!(r.has_conflict());
        assert_eq!(r.value("organization"), crate::model::CONFLICT_SENTINEL);
        assert_eq!(r.conflicted_entries().count(), 1);
    }

    #[test]
    fn unknown_entry_is_rejected() {
        let mut r = doe();
        let err = r.add_entry("shoe_size", "44").unwrap_err();
        assert!(matches!(err, MergeError::UnknownEntry { .. }));
    }

    #[test]
    fn identity_key_treats_absent_as_empty() {
        let mut with_empty = CompositeRecord::new(investigator_shape());
        with_empty.add_entry("name", "A. Smith").unwrap();
        with_empty.add_entry("email", "").unwrap();

        let mut without = CompositeRecord::new(investigator_shape());
        without.add_entry("name", "A. Smith").unwrap();

        assert_eq!(with_empty.identity_key(), without.identity_key());
        assert_eq!(without.identity_key(), vec!["A. Smith".to_owned(), String::new()]);
    }

    #[test]
    fn add_entries_keeps_fields_applied_before_failure() {
        let mut target = doe();

        let mut other = CompositeRecord::new(investigator_shape());
        other.add_entry("phone", "555-1111").unwrap();
        other.add_entry("email", "other@x.org").unwrap();

        let err = target.add_entries(other.entries()).unwrap_err();
        assert!(matches!(err, MergeError::IdentityAmbiguous { .. }));
        assert_eq!(target.value("phone"), "555-1111");
        assert_eq!(target.field("email").unwrap().all_values(), ["j@x.org"]);
    }

    #[test]
    fn entry_paths_hang_off_record_path() {
        let r = doe();
        let email = r.field("email").unwrap();
        assert_eq!(email.path().segments(), vec!["Investigator", "email"]);
    }

    #[test]
    fn identity_label_lists_identifiers() {
        assert_eq!(doe().identity_label(), "name=J. Doe, email=j@x.org");
    }
}
