//! N-way document merge.
//!
//! Documents are folded left to right into a clone of the first one:
//!
//! 1. The cruise identity is combined first. Two different identities abort
//!    the merge with [`MergeError::IdentityMismatch`] and nothing is returned.
//! 2. Every other scalar field accumulates the union of its values. A
//!    disagreement becomes a soft conflict on the field.
//! 3. Every repeating group is combined with [`merge_lists`].
//!
//! Input documents are never modified.

mod lists;

pub use lists::merge_lists;

use tracing::instrument;

use crate::document::MetadataDocument;
use crate::error::MergeError;

impl MetadataDocument {
    /// Merge `docs` into one document.
    ///
    /// A single document comes back as an unchanged clone. For two or more,
    /// the result is marked draft unless it is acceptable.
    ///
    /// # Errors
    /// - [`MergeError::NoDocuments`] if `docs` is empty.
    /// - [`MergeError::IdentityMismatch`] if the documents name different cruises.
    /// - [`MergeError::IdentityAmbiguous`] if a record identifier cannot be combined.
    #[instrument(skip_all, fields(documents = docs.len()))]
    pub fn merge(docs: &[Self]) -> Result<Self, MergeError> {
        let (first, rest) = docs.split_first().ok_or(MergeError::NoDocuments)?;
        if rest.is_empty() {
            tracing::debug!("single document, nothing to merge");
            return Ok(first.clone());
        }

        let mut merged = first.clone();
        for (i, doc) in rest.iter().enumerate() {
            merged.copy_values_in(doc).inspect_err(|e| {
                tracing::warn!(document = i + 1, error = %e, "merge aborted");
            })?;
        }

        merged.set_draft(!merged.is_acceptable());
        tracing::info!(
            conflicts = merged.conflict_count(),
            draft = merged.is_draft(),
            "documents merged"
        );
        Ok(merged)
    }

    /// Fold every value of `src` into `self`.
    ///
    /// On error `self` may be partially updated. [`merge`](Self::merge) only
    /// ever calls this on its own accumulator and drops it on failure.
    fn copy_values_in(&mut self, src: &Self) -> Result<(), MergeError> {
        let cruise_id = self.cruise_id_mut();
        cruise_id.add_values(src.cruise_id().all_values().iter().cloned());
        if cruise_id.has_conflict() {
            return Err(MergeError::IdentityMismatch {
                path: cruise_id.path().to_string(),
                values: cruise_id.all_values().to_vec(),
            });
        }

        for (field, (_, incoming)) in self.scalar_fields_mut().zip(src.scalar_fields()) {
            field.add_values(incoming.all_values().iter().cloned());
        }

        for (records, (spec, incoming)) in self.groups_mut().zip(src.groups()) {
            let combined = merge_lists(records, incoming)?;
            tracing::debug!(
                group = spec.key,
                before = records.len(),
                incoming = incoming.len(),
                after = combined.len(),
                "records merged"
            );
            *records = combined;
        }
        Ok(())
    }
}
