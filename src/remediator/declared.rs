//! Snapshot of the objects declared by the currently-synced commit.
//!
//! Shared read-mostly between the hydration pipeline (writer) and every
//! watcher task (readers), so live objects can be diffed against what the
//! source of truth declares.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::meta::ObjectId;

#[derive(Debug, Default)]
struct DeclaredSnapshot {
    commit: String,
    objects: HashSet<ObjectId>,
}

#[derive(Debug, Default)]
pub struct DeclaredResources {
    inner: RwLock<DeclaredSnapshot>,
}

impl DeclaredResources {
    /// Replaces the snapshot wholesale. Called by the hydration pipeline
    /// once a commit's rendered objects are known.
    pub fn update(
        &self,
        commit: &str,
        objects: HashSet<ObjectId>,
    ) {
        let mut inner = self.inner.write();
        inner.commit = commit.to_string();
        inner.objects = objects;
    }

    /// Whether the current commit declares the given object.
    pub fn declares(
        &self,
        id: &ObjectId,
    ) -> bool {
        self.inner.read().objects.contains(id)
    }

    /// The commit the current snapshot was rendered from.
    pub fn commit(&self) -> String {
        self.inner.read().commit.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().objects.is_empty()
    }
}
