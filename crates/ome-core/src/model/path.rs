//! Element paths: where a field lives in the nested metadata document.
//!
//! An [`ElementPath`] is an immutable parent chain: each node holds one element
//! name and a link to its parent's path. Nodes are reference-counted, so
//! cloning a path is a pointer bump and sibling fields built from the same
//! parent share that parent's node. Nothing can mutate a node once it is
//! built, which means one field's path can never disturb another's.
//!
//! ```text
//! Cruise_Info ─► Experiment ─► Platform_Type
//!                         └──► Experiment_Name
//! ```
//!
//! Both leaf paths above share the `Cruise_Info/Experiment` prefix node.

use std::fmt;
use std::sync::Arc;

use serde::{Serialize, Serializer};

// ---------------------------------------------------------------------------
// ElementPath
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Hash)]
struct Node {
    name: String,
    parent: Option<ElementPath>,
}

/// Location of an element in the metadata tree, as a root-first chain.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ElementPath(Arc<Node>);

impl ElementPath {
    /// A top-level element (no parent).
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self(Arc::new(Node {
            name: name.into(),
            parent: None,
        }))
    }

    /// A child of this path. `self` is shared, not copied.
    #[must_use]
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self(Arc::new(Node {
            name: name.into(),
            parent: Some(self.clone()),
        }))
    }

    /// Build a path from root-first segments.
    ///
    /// Returns `None` for an empty segment list.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut iter = segments.into_iter();
        let mut path = Self::root(iter.next()?);
        for segment in iter {
            path = path.child(segment);
        }
        Some(path)
    }

    /// Element name of the last segment.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// The enclosing path, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        self.0.parent.as_ref()
    }

    /// Number of segments (a root path has depth 1).
    #[must_use]
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// Iterate from this element up to the root (leaf-first).
    pub fn ancestors(&self) -> impl Iterator<Item = &Self> {
        std::iter::successors(Some(self), |p| p.parent())
    }

    /// Element names, root-first.
    #[must_use]
    pub fn segments(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.ancestors().map(Self::name).collect();
        names.reverse();
        names
    }

    /// Owned root-first segments, for reports that outlive the document.
    #[must_use]
    pub fn to_segments(&self) -> Vec<String> {
        self.segments().into_iter().map(str::to_owned).collect()
    }

    /// `true` if `self` and `other` point at the same node.
    #[must_use]
    pub fn shares_node(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Display for ElementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments().join("/"))
    }
}

impl Serialize for ElementPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.segments())
    }
}
