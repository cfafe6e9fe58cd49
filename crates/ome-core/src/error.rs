//! Error types for the metadata merge engine.
//!
//! [`MergeError`] covers the two fatal merge outcomes (a cruise identity veto
//! and an ambiguous record identifier) plus the structural errors raised when
//! callers address fields, entries or groups the schema does not know.
//!
//! Soft conflicts are never errors. They stay inside the merged document and
//! are discovered through `has_conflict()` / `all_values()` and the conflict
//! report.

use thiserror::Error;

/// Errors returned by document construction, merge and the codecs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    /// The cruise identity field disagrees across the documents being merged.
    ///
    /// Fatal: the whole merge is abandoned and no document is returned.
    #[error(
        "cruise identity mismatch at `{path}`: {values:?}; these submissions describe different cruises"
    )]
    IdentityMismatch {
        /// Path of the identity field, e.g. `Cruise_Info/Experiment/Cruise/Cruise_ID`.
        path: String,
        /// Every distinct identity value seen.
        values: Vec<String>,
    },

    /// An identifier field of a repeating record would hold a second value.
    #[error(
        "identifier `{field}` of record `{record}` ({identity}) would hold more than one value: {values:?}"
    )]
    IdentityAmbiguous {
        /// The identifier field name.
        field: String,
        /// Path of the record element.
        record: String,
        /// Identity of the record before the failed update.
        identity: String,
        /// Held values followed by the rejected incoming ones.
        values: Vec<String>,
    },

    /// A logical field key that the schema does not define.
    #[error("unknown metadata field `{key}`")]
    UnknownField {
        /// The key that was looked up.
        key: String,
    },

    /// An entry name outside a record's allowed entry list.
    #[error("cannot add entry `{entry}` to record `{record}`")]
    UnknownEntry {
        /// The rejected entry name.
        entry: String,
        /// Path of the record element.
        record: String,
    },

    /// A repeating-group key that the schema does not define.
    #[error("unknown record group `{group}`")]
    UnknownGroup {
        /// The group key that was looked up.
        group: String,
    },

    /// A record shape was declared without identifier fields.
    #[error("record `{record}` declares no identifier fields")]
    NoIdentifiers {
        /// Path of the record element.
        record: String,
    },

    /// `merge` was called with an empty document list.
    #[error("nothing to merge: no documents given")]
    NoDocuments,

    /// Conflict data could not be restored from a conflict report.
    #[error("invalid conflict at `{path}`: {reason}")]
    InvalidConflict {
        /// Path of the field carrying the conflict sentinel.
        path: String,
        /// Why the conflict could not be restored.
        reason: String,
    },

    /// Header text cannot be produced while a field is still in dispute.
    #[error("cannot render header: `{key}` has a conflict")]
    HeaderConflict {
        /// Header key of the conflicted field or record group.
        key: String,
    },

    /// Malformed header text.
    #[error("header line {line}: {message}")]
    Header {
        /// 1-based line number (0 when the error concerns the whole text).
        line: usize,
        /// What is wrong with the line.
        message: String,
    },
}

impl MergeError {
    /// `true` for the errors that abort a merge outright.
    #[must_use]
    pub const fn is_identity_error(&self) -> bool {
        matches!(
            self,
            Self::IdentityMismatch { .. } | Self::IdentityAmbiguous { .. }
        )
    }

    pub(crate) fn header(line: usize, message: impl Into<String>) -> Self {
        Self::Header {
            line,
            message: message.into(),
        }
    }
}
