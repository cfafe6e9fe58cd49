//! The metadata document: every schema field plus every repeating group.
//!
//! A [`MetadataDocument`] is created once per submission (by a reader such as
//! [`crate::header::parse_header`] or [`MetadataDocument::from_canonical`]) and
//! then only ever combined through [`MetadataDocument::merge`], which clones
//! its inputs and never mutates them.
//!
//! Fields are stored in a vector parallel to [`SCALAR_FIELDS`] and groups in a
//! vector parallel to [`RECORD_GROUPS`], so the field set is fixed by the
//! schema tables and iteration follows document order.

use crate::error::MergeError;
use crate::model::{CompositeRecord, ScalarField};
use crate::schema::{
    self, CRUISE_ID, FieldRef, FieldSpec, GroupSpec, RECORD_GROUPS, SCALAR_FIELDS,
};

// ---------------------------------------------------------------------------
// AcceptancePolicy
// ---------------------------------------------------------------------------

/// What a document needs before it can leave draft status.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptancePolicy {
    /// Field keys that must hold a value.
    pub required_fields: Vec<String>,
    /// Require at least one investigator record.
    pub require_investigator: bool,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            required_fields: vec![CRUISE_ID.key.to_owned(), "vessel_name".to_owned()],
            require_investigator: true,
        }
    }
}

// ---------------------------------------------------------------------------
// MetadataDocument
// ---------------------------------------------------------------------------

/// One cruise's metadata: the identity field, every scalar field and every
/// repeating group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataDocument {
    cruise_id: ScalarField,
    fields: Vec<ScalarField>,
    groups: Vec<Vec<CompositeRecord>>,
    draft: bool,
}

impl Default for MetadataDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataDocument {
    /// An empty document: every field present with no value, every group empty.
    #[must_use]
    pub fn new() -> Self {
        let s = schema::schema();
        let fields = (0..SCALAR_FIELDS.len())
            .filter_map(|i| s.field_path(i).cloned().map(ScalarField::new))
            .collect();
        Self {
            cruise_id: ScalarField::new(s.cruise_id_path().clone()),
            fields,
            groups: vec![Vec::new(); RECORD_GROUPS.len()],
            draft: false,
        }
    }

    /// An empty document seeded with an (upper-cased) cruise id.
    #[must_use]
    pub fn with_cruise_id(cruise_id: &str) -> Self {
        let mut doc = Self::new();
        let id = cruise_id.trim().to_uppercase();
        if !id.is_empty() {
            doc.cruise_id.add_value(id);
        }
        doc
    }

    #[must_use]
    pub const fn cruise_id(&self) -> &ScalarField {
        &self.cruise_id
    }

    #[must_use]
    pub const fn is_draft(&self) -> bool {
        self.draft
    }

    pub const fn set_draft(&mut self, draft: bool) {
        self.draft = draft;
    }

    // -- scalar fields ------------------------------------------------------

    /// Look up a field by key (including `cruise_id` / `expocode`).
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&ScalarField> {
        match schema::lookup_field(key)? {
            FieldRef::CruiseId => Some(&self.cruise_id),
            FieldRef::Scalar(i) => self.fields.get(i),
        }
    }

    /// The field named `key` together with `value` as that field stores it.
    /// Cruise ids are trimmed and upper-cased.
    fn field_for_write(
        &mut self,
        key: &str,
        value: String,
    ) -> Result<(&mut ScalarField, String), MergeError> {
        let unknown = || MergeError::UnknownField {
            key: key.to_owned(),
        };
        match schema::lookup_field(key).ok_or_else(unknown)? {
            FieldRef::CruiseId => Ok((&mut self.cruise_id, value.trim().to_uppercase())),
            FieldRef::Scalar(i) => self
                .fields
                .get_mut(i)
                .map(|field| (field, value))
                .ok_or_else(unknown),
        }
    }

    /// Canonical value of `key`, or `""` for unknown keys.
    #[must_use]
    pub fn value(&self, key: &str) -> &str {
        self.field(key).map_or("", ScalarField::canonical_value)
    }

    /// Add a candidate value to the field named `key`.
    ///
    /// # Errors
    /// [`MergeError::UnknownField`] if the schema has no such key.
    pub fn add_value(&mut self, key: &str, value: impl Into<String>) -> Result<(), MergeError> {
        let (field, value) = self.field_for_write(key, value.into())?;
        field.add_value(value);
        Ok(())
    }

    /// Replace every value of the field named `key` with `value`.
    ///
    /// # Errors
    /// [`MergeError::UnknownField`] if the schema has no such key.
    pub fn replace_value(&mut self, key: &str, value: impl Into<String>) -> Result<(), MergeError> {
        let (field, value) = self.field_for_write(key, value.into())?;
        field.replace_value(value);
        Ok(())
    }

    /// Non-identity scalar fields with their declarations, in document order.
    pub fn scalar_fields(&self) -> impl Iterator<Item = (&'static FieldSpec, &ScalarField)> {
        SCALAR_FIELDS.iter().zip(&self.fields)
    }

    pub(crate) fn scalar_fields_mut(&mut self) -> impl Iterator<Item = &mut ScalarField> {
        self.fields.iter_mut()
    }

    pub(crate) const fn cruise_id_mut(&mut self) -> &mut ScalarField {
        &mut self.cruise_id
    }

    // -- repeating groups ---------------------------------------------------

    /// Records of the group named `group`.
    #[must_use]
    pub fn records(&self, group: &str) -> Option<&[CompositeRecord]> {
        let idx = schema::lookup_group(group)?;
        self.groups.get(idx).map(Vec::as_slice)
    }

    /// Every group with its declaration, in document order.
    pub fn groups(&self) -> impl Iterator<Item = (&'static GroupSpec, &[CompositeRecord])> {
        RECORD_GROUPS
            .iter()
            .zip(&self.groups)
            .map(|(spec, records)| (spec, records.as_slice()))
    }

    pub(crate) fn groups_mut(&mut self) -> impl Iterator<Item = &mut Vec<CompositeRecord>> {
        self.groups.iter_mut()
    }

    fn group_index(group: &str) -> Result<usize, MergeError> {
        schema::lookup_group(group).ok_or_else(|| MergeError::UnknownGroup {
            group: group.to_owned(),
        })
    }

    /// A new, empty record shaped for `group`. Not yet part of the document.
    ///
    /// # Errors
    /// [`MergeError::UnknownGroup`] if the schema has no such group.
    pub fn new_record(group: &str) -> Result<CompositeRecord, MergeError> {
        let idx = Self::group_index(group)?;
        schema::schema()
            .shape(idx)
            .map(|shape| CompositeRecord::new(shape.clone()))
            .ok_or_else(|| MergeError::UnknownGroup {
                group: group.to_owned(),
            })
    }

    /// Append `record` to `group`.
    ///
    /// A group holds at most one record per identity: a record whose
    /// [`identity_key`](CompositeRecord::identity_key) matches one already in
    /// the group is folded into it instead of appended.
    ///
    /// # Errors
    /// [`MergeError::UnknownGroup`] if the schema has no such group, or the
    /// record was shaped for a different group.
    pub fn push_record(&mut self, group: &str, record: CompositeRecord) -> Result<(), MergeError> {
        let idx = Self::group_index(group)?;
        let expected = schema::schema().shape(idx).map(|s| s.path());
        if expected != Some(record.path()) {
            return Err(MergeError::UnknownGroup {
                group: format!("{group} (record shaped for `{}`)", record.path()),
            });
        }
        let records = &mut self.groups[idx];
        let key = record.identity_key();
        match records.iter_mut().find(|r| r.identity_key() == key) {
            Some(existing) => {
                tracing::debug!(group, identity = %existing.identity_label(), "folding repeated record");
                existing.add_entries(record.entries())
            }
            None => {
                records.push(record);
                Ok(())
            }
        }
    }

    // -- conflicts & acceptance ---------------------------------------------

    /// `true` if any field or record holds an unresolved disagreement.
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.conflict_count() > 0
    }

    /// Number of conflicted scalar fields plus conflicted record entries.
    #[must_use]
    pub fn conflict_count(&self) -> usize {
        let scalars = std::iter::once(&self.cruise_id)
            .chain(&self.fields)
            .filter(|f| f.has_conflict())
            .count();
        let records: usize = self
            .groups
            .iter()
            .flatten()
            .map(|r| r.conflicted_entries().count())
            .sum();
        scalars + records
    }

    /// Acceptable under the default policy.
    #[must_use]
    pub fn is_acceptable(&self) -> bool {
        self.is_acceptable_with(&AcceptancePolicy::default())
    }

    #[must_use]
    pub fn is_acceptable_with(&self, policy: &AcceptancePolicy) -> bool {
        self.acceptance_issues(policy).is_empty()
    }

    /// Every reason the document is not acceptable under `policy`.
    #[must_use]
    pub fn acceptance_issues(&self, policy: &AcceptancePolicy) -> Vec<String> {
        let mut issues = Vec::new();

        let conflicts = self.conflict_count();
        if conflicts > 0 {
            issues.push(format!("{conflicts} unresolved conflict(s)"));
        }

        for key in &policy.required_fields {
            match self.field(key) {
                Some(f) if f.is_empty() => issues.push(format!("required field `{key}` is empty")),
                Some(_) => {}
                None => issues.push(format!("required field `{key}` is not a known field")),
            }
        }

        if policy.require_investigator && self.records("investigator").is_none_or(<[_]>::is_empty) {
            issues.push("at least one investigator is required".to_owned());
        }

        issues
    }
}
