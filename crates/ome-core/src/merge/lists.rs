//! Identity-matched merge of two record lists of the same group.

use crate::error::MergeError;
use crate::model::CompositeRecord;

/// Merge `incoming` into `dest`, matching records by [`CompositeRecord::identity_key`].
///
/// Result order: every record of `incoming` in its own order (merged with its
/// first `dest` match, or cloned as new), then every `dest` record that no
/// `incoming` record matched, in `dest` order. Neither input is modified.
///
/// # Errors
/// [`MergeError::IdentityAmbiguous`] from the first matched pair whose entries
/// cannot be combined.
pub fn merge_lists(
    dest: &[CompositeRecord],
    incoming: &[CompositeRecord],
) -> Result<Vec<CompositeRecord>, MergeError> {
    let dest_keys: Vec<Vec<String>> = dest.iter().map(CompositeRecord::identity_key).collect();
    let mut matched = vec![false; dest.len()];
    let mut merged = Vec::with_capacity(dest.len() + incoming.len());

    for record in incoming {
        let key = record.identity_key();
        match dest_keys.iter().position(|k| *k == key) {
            Some(idx) => {
                tracing::debug!(record = %record.identity_label(), "matched existing record");
                matched[idx] = true;
                let mut combined = dest[idx].clone();
                combined.add_entries(record.entries())?;
                merged.push(combined);
            }
            None => {
                tracing::debug!(record = %record.identity_label(), "new record");
                merged.push(record.clone());
            }
        }
    }

    merged.extend(
        dest.iter()
            .zip(&matched)
            .filter(|(_, seen)| !**seen)
            .map(|(record, _)| {
                tracing::debug!(record = %record.identity_label(), "kept unmatched record");
                record.clone()
            }),
    );
    Ok(merged)
}
