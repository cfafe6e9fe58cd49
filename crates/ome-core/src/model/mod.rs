//! Metadata data model: paths, scalar fields and composite records.

pub mod field;
pub mod path;
pub mod record;

pub use field::{CONFLICT_SENTINEL, ScalarField};
pub use path::ElementPath;
pub use record::{CompositeRecord, RecordShape};
