//! Connector and processor identifiers.
//!
//! Every [`Chainable`](crate::Chainable) carries a [`Name`] used for error
//! [`path`](crate::Error::path) attribution and for lookups in [`Sequence`](crate::connectors::Sequence)
//! and [`Switch`](crate::connectors::Switch). Names are opaque, cheap to clone, and compared by
//! string equality.

use std::fmt;
use std::sync::Arc;

/// A short textual identifier attached to a connector or processor instance.
///
/// `Name` wraps an `Arc<str>` so cloning a node (or its error path) never
/// allocates. Uniqueness within a [`Sequence`](crate::connectors::Sequence) is recommended but not
/// enforced — the library performs a linear first-match lookup by equality.
///
/// # Examples
///
/// ```
/// use flow_rail::Name;
///
/// let a = Name::new("validate-input");
/// let b = a.clone();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "validate-input");
/// ```
#[derive(Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Name(Arc<str>);

impl Name {
    /// Creates a new `Name` from any string-like value.
    #[inline]
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Name {
    #[inline]
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Name {
    #[inline]
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for Name {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl AsRef<str> for Name {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Name {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Name {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

/// The reserved route name [`Switch`](crate::connectors::Switch) falls back to when the key
/// function's output has no explicit route.
pub const DEFAULT_ROUTE: &str = "default";

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let name = Name::new("validate-input");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"validate-input\"");
        let back: Name = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
