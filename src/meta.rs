//! Identity types for managed cluster objects.
//!
//! `GroupVersionKind` keys the watch map, `GroupKind` scopes bulk conflict
//! clearing, and `ObjectId` identifies a single live object. Equality is
//! structural everywhere.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

/// A resource type identified by API group and kind, version elided.
///
/// Conflicts are recorded per object but cleared per `GroupKind`, because a
/// kind dropped from the declared set stops being remediated across all of
/// its versions at once.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKind {
    pub group: String,
    pub kind: String,
}

impl GroupKind {
    pub fn new(
        group: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        GroupKind {
            group: group.into(),
            kind: kind.into(),
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.kind)
        } else {
            write!(f, "{}.{}", self.kind, self.group)
        }
    }
}

/// A fully-qualified resource type: API group, version and kind.
///
/// This is the key of the watch manager's map; exactly one watch stream
/// exists per `GroupVersionKind` at any time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

impl GroupVersionKind {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        GroupVersionKind {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Projects away the version.
    pub fn group_kind(&self) -> GroupKind {
        GroupKind {
            group: self.group.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl fmt::Display for GroupVersionKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}/{}", self.version, self.kind)
        } else {
            write!(f, "{}/{}/{}", self.group, self.version, self.kind)
        }
    }
}

/// Identity of a single managed object: its group+kind plus namespace and
/// name. Cluster-scoped objects use an empty namespace.
///
/// `Ord` is derived so conflict snapshots can be reported in a stable order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    pub fn new(
        gk: GroupKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        ObjectId {
            group: gk.group,
            kind: gk.kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    pub fn group_kind(&self) -> GroupKind {
        GroupKind {
            group: self.group.clone(),
            kind: self.kind.clone(),
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}, {}/{}",
            self.group_kind(),
            self.namespace,
            self.name
        )
    }
}
