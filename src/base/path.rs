//! Field paths.
//!
//! A [`FieldPath`] is the stable address of a field: the ordered segments
//! from the tree root, with [`PathSegment::Index`] entries for array items.
//! Two fields with equal paths are the same logical field for lookup and
//! diffing.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::PATH_SEPARATOR;

/// One step of a [`FieldPath`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Mapping key (element, attribute or JSON member name).
    Key(String),
    /// Position inside an array value.
    Index(usize),
}

impl PathSegment {
    /// The key, if this is a key segment.
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }

    /// The index, if this is an index segment.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            PathSegment::Key(_) => None,
            PathSegment::Index(i) => Some(*i),
        }
    }

    /// Parse a raw UI segment. All-digit segments are array indices.
    fn from_raw(raw: &str) -> Self {
        if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(i) = raw.parse() {
                return PathSegment::Index(i);
            }
        }
        PathSegment::Key(raw.to_string())
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(s: &str) -> Self {
        PathSegment::Key(s.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(i: usize) -> Self {
        PathSegment::Index(i)
    }
}

/// Address of a field from the root of its tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path (tree root).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build from explicit segments.
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    /// Build from UI-style string segments (`["Domain", "0", "Id"]`).
    ///
    /// All-digit segments become indices; XML tag names cannot start with a
    /// digit, so this only misreads numeric JSON member names.
    pub fn from_strs<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            segments
                .into_iter()
                .map(|s| PathSegment::from_raw(s.as_ref()))
                .collect(),
        )
    }

    /// Parse a `/`-separated path (`"Domain/General/Interfaces"`).
    pub fn parse(path: &str) -> Self {
        Self::from_strs(path.split(PATH_SEPARATOR).filter(|s| !s.is_empty()))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by a key.
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Key(key.to_string()));
        Self(segments)
    }

    /// This path extended by an array index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// This path extended by every segment of `other`.
    pub fn join(&self, other: &FieldPath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The final key segment, if the path ends in one.
    pub fn last_key(&self) -> Option<&str> {
        self.0.last().and_then(PathSegment::as_key)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The remainder of this path after `prefix`, if it is one.
    pub fn strip_prefix(&self, prefix: &FieldPath) -> Option<Self> {
        self.0
            .strip_prefix(prefix.0.as_slice())
            .map(|rest| Self(rest.to_vec()))
    }

    /// Position of the first index segment.
    pub fn first_index_position(&self) -> Option<usize> {
        self.0
            .iter()
            .position(|s| matches!(s, PathSegment::Index(_)))
    }

    /// The path with index segments removed, joined with `/`.
    ///
    /// Schema annotations are keyed this way so that a template child and
    /// every realized item child resolve to the same entry.
    pub fn schema_key(&self) -> String {
        let mut out = String::new();
        for key in self.0.iter().filter_map(PathSegment::as_key) {
            if !out.is_empty() {
                out.push(PATH_SEPARATOR);
            }
            out.push_str(key);
        }
        out
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "{PATH_SEPARATOR}")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

impl<'a> IntoIterator for &'a FieldPath {
    type Item = &'a PathSegment;
    type IntoIter = std::slice::Iter<'a, PathSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
