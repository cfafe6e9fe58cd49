//! Scalar fields: one leaf value slot with every candidate value kept.
//!
//! A [`ScalarField`] never resolves a disagreement by itself. It keeps each
//! distinct value it has been given, in first-seen order, and derives its
//! canonical value from how many there are:
//!
//! | values | `canonical_value()` | `has_conflict()` |
//! |--------|---------------------|------------------|
//! | none   | `""`                | `false`          |
//! | one    | that value          | `false`          |
//! | two+   | [`CONFLICT_SENTINEL`] | `true`         |

use serde::Serialize;

use super::path::ElementPath;

/// Canonical text rendered for any field still in dispute.
pub const CONFLICT_SENTINEL: &str = "%%CONFLICT%%";

// ---------------------------------------------------------------------------
// ScalarField
// ---------------------------------------------------------------------------

/// A named, deduplicated list of candidate values for one leaf field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ScalarField {
    path: ElementPath,
    values: Vec<String>,
}

impl ScalarField {
    /// An empty field at `path`.
    #[must_use]
    pub const fn new(path: ElementPath) -> Self {
        Self {
            path,
            values: Vec::new(),
        }
    }

    /// A field seeded with zero or one source value.
    #[must_use]
    pub fn with_value(path: ElementPath, value: Option<&str>) -> Self {
        let mut field = Self::new(path);
        if let Some(v) = value {
            field.add_value(v);
        }
        field
    }

    #[must_use]
    pub const fn path(&self) -> &ElementPath {
        &self.path
    }

    /// Element name of this field (last path segment).
    #[must_use]
    pub fn name(&self) -> &str {
        self.path.name()
    }

    /// Append `value` unless an equal value is already held.
    pub fn add_value(&mut self, value: impl Into<String>) {
        let value = value.into();
        if !self.contains(&value) {
            self.values.push(value);
        }
    }

    /// [`add_value`](Self::add_value) for each element, in order.
    pub fn add_values<I, S>(&mut self, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for value in values {
            self.add_value(value);
        }
    }

    /// Drop every held value and keep only `value`.
    pub fn replace_value(&mut self, value: impl Into<String>) {
        self.values.clear();
        self.values.push(value.into());
    }

    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// The resolved value: empty, the sole value, or [`CONFLICT_SENTINEL`].
    #[must_use]
    pub fn canonical_value(&self) -> &str {
        match self.values.as_slice() {
            [] => "",
            [only] => only.as_str(),
            _ => CONFLICT_SENTINEL,
        }
    }

    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.values.len() > 1
    }

    /// Every distinct value held, in first-seen order.
    #[must_use]
    pub fn all_values(&self) -> &[String] {
        &self.values
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }
}


// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------
