//! Hierarchical actor path addressing.

// Layer 1: Standard library imports
use std::fmt::{self, Display};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

/// A slash-separated hierarchical actor path rooted at the system name.
///
/// Spec §3: "Logical path (a slash-separated hierarchical name rooted at
/// the system name), a short local name". `ActorPath` owns both: the full
/// path string is the authoritative key in the system's registry
/// (spec §9: "maintain the path-keyed registry as the single source of
/// truth"), and [`ActorPath::local_name`] derives the short name from it
/// rather than storing it redundantly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorPath(String);

impl ActorPath {
    /// Constructs the root path for a system, e.g. `root("orders")` yields
    /// `"/orders"`.
    pub fn root(system_name: &str) -> Self {
        Self(format!("/{system_name}"))
    }

    /// Composes a child path from this path and a local name, e.g.
    /// `parent.child("worker-1")` yields `"<parent>/worker-1"`.
    pub fn child(&self, local_name: &str) -> Self {
        Self(format!("{}/{}", self.0, local_name))
    }

    /// The full path string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The short local name: the path segment after the last `/`.
    pub fn local_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// The parent path, if this path is not a root.
    pub fn parent(&self) -> Option<ActorPath> {
        let (parent, _) = self.0.rsplit_once('/')?;
        if parent.is_empty() {
            None
        } else {
            Some(ActorPath(parent.to_string()))
        }
    }
}

impl Display for ActorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_path_is_slash_prefixed() {
        let root = ActorPath::root("orders");
        assert_eq!(root.as_str(), "/orders");
        assert_eq!(root.local_name(), "orders");
    }

    #[test]
    fn child_composes_parent_and_local_name() {
        let root = ActorPath::root("orders");
        let child = root.child("ingest");
        assert_eq!(child.as_str(), "/orders/ingest");
        assert_eq!(child.local_name(), "ingest");
    }

    #[test]
    fn grandchild_path_resolves_parent() {
        let root = ActorPath::root("orders");
        let child = root.child("ingest");
        let grandchild = child.child("worker-1");

        assert_eq!(grandchild.as_str(), "/orders/ingest/worker-1");
        assert_eq!(grandchild.parent(), Some(child));
    }

    #[test]
    fn root_has_no_parent() {
        let root = ActorPath::root("orders");
        assert_eq!(root.parent(), None);
    }
}
