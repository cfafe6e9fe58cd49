//! Conflict-tracking merge engine for OME cruise metadata.
//!
//! Several independent submissions describing the same cruise are parsed into
//! [`MetadataDocument`]s and folded into one with [`MetadataDocument::merge`].
//! Disagreements are never resolved silently: every scalar field keeps each
//! distinct value it was given and reports a conflict once it holds more than
//! one. The merged document serializes to a canonical tree (one value per
//! field, [`CONFLICT_SENTINEL`] where disputed) plus a [`ConflictReport`]
//! listing every disputed value.
//!
//! Two disagreements are fatal instead of soft:
//!
//! | error | cause |
//! |-------|-------|
//! | [`MergeError::IdentityMismatch`] | the documents name different cruises |
//! | [`MergeError::IdentityAmbiguous`] | a record identifier would hold two values |
//!
//! ```
//! use ome_core::MetadataDocument;
//!
//! let mut a = MetadataDocument::with_cruise_id("33HQ20110517");
//! a.add_value("platform_type", "Ship")?;
//! let mut b = MetadataDocument::with_cruise_id("33HQ20110517");
//! b.add_value("platform_type", "Research Vessel")?;
//!
//! let merged = MetadataDocument::merge(&[a, b])?;
//! assert!(merged.field("platform_type").is_some_and(|f| f.has_conflict()));
//! assert_eq!(merged.to_conflict_report().len(), 1);
//! # Ok::<(), ome_core::MergeError>(())
//! ```

pub mod document;
pub mod error;
pub mod header;
pub mod merge;
pub mod model;
pub mod report;
pub mod schema;

pub use document::{AcceptancePolicy, MetadataDocument};
pub use error::MergeError;
pub use header::{parse_header, render_header};
pub use merge::merge_lists;
pub use model::{CONFLICT_SENTINEL, CompositeRecord, ElementPath, RecordShape, ScalarField};
pub use report::{ConflictEntry, ConflictReport};
