//! Property keys.

use std::fmt;
use std::sync::Arc;

/// The key half of a `(target, key)` pair.
///
/// Interception layers usually observe named properties, but indexed reads
/// and whole-collection iteration need their own keys too.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    /// A named property.
    Name(Arc<str>),

    /// A positional element of an array-like target.
    Index(u64),

    /// Iteration over the target as a whole (length, keys, entries).
    Iterate,

    /// A collaborator-defined key with no textual name.
    Symbol(u64),
}

impl PropertyKey {
    /// Get the property name, if this is a named key.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            _ => None,
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(name: &str) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<String> for PropertyKey {
    fn from(name: String) -> Self {
        Self::Name(Arc::from(name))
    }
}

impl From<Arc<str>> for PropertyKey {
    fn from(name: Arc<str>) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for PropertyKey {
    fn from(index: usize) -> Self {
        Self::Index(index as u64)
    }
}

impl From<u64> for PropertyKey {
    fn from(index: u64) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "[{index}]"),
            Self::Iterate => f.write_str("<iterate>"),
            Self::Symbol(sym) => write!(f, "<symbol {sym}>"),
        }
    }
}
