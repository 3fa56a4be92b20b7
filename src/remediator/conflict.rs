//! Registry of per-object management conflicts.
//!
//! Watch-stream tasks record a conflict when they find a foreign manager
//! mutating an object this reconciler owns; the status reporter snapshots
//! them; the watch manager clears them in bulk when a kind leaves the
//! declared set. The registry owns its own synchronization and never calls
//! back into the watch manager, so the two can never deadlock on each other.

use dashmap::DashMap;

#[cfg(test)]
use mockall::automock;

use crate::errors::ManagementConflictError;
use crate::meta::GroupKind;
use crate::meta::ObjectId;

#[cfg_attr(test, automock)]
pub trait ConflictHandler: Send + Sync + 'static {
    /// Records or replaces the conflict for one object. At most one conflict
    /// is outstanding per object.
    fn add_conflict_error(
        &self,
        id: ObjectId,
        err: ManagementConflictError,
    );

    fn has_conflict_error(
        &self,
        id: &ObjectId,
    ) -> bool;

    /// Clears one object's conflict, e.g. once the foreign manager stops
    /// touching it.
    fn remove_conflict_error(
        &self,
        id: &ObjectId,
    );

    /// Removes every recorded conflict for objects of the given group+kind.
    /// Called when the kind is dropped from the declared set: those objects
    /// are no longer remediated, so stale conflicts must not linger.
    fn clear_conflict_errors_with_kind(
        &self,
        gk: &GroupKind,
    );

    /// Stable-order snapshot of all recorded conflicts, for status reporting.
    fn conflict_errors(&self) -> Vec<ManagementConflictError>;

    fn has_conflict_errors(&self) -> bool;
}

/// The real registry.
#[derive(Debug, Default)]
pub struct ConflictTracker {
    conflicts: DashMap<ObjectId, ManagementConflictError>,
}

impl ConflictTracker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConflictHandler for ConflictTracker {
    fn add_conflict_error(
        &self,
        id: ObjectId,
        err: ManagementConflictError,
    ) {
        self.conflicts.insert(id, err);
    }

    fn has_conflict_error(
        &self,
        id: &ObjectId,
    ) -> bool {
        self.conflicts.contains_key(id)
    }

    fn remove_conflict_error(
        &self,
        id: &ObjectId,
    ) {
        self.conflicts.remove(id);
    }

    fn clear_conflict_errors_with_kind(
        &self,
        gk: &GroupKind,
    ) {
        self.conflicts.retain(|id, _| id.group_kind() != *gk);
    }

    fn conflict_errors(&self) -> Vec<ManagementConflictError> {
        let mut errs: Vec<ManagementConflictError> =
            self.conflicts.iter().map(|entry| entry.value().clone()).collect();
        errs.sort_by(|a, b| a.id.cmp(&b.id));
        errs
    }

    fn has_conflict_errors(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// Conflict handler that records nothing. For reconcilers that do not
/// remediate (and for tests that do not care about conflicts).
#[derive(Debug, Default)]
pub struct NoOpConflictHandler;

impl ConflictHandler for NoOpConflictHandler {
    fn add_conflict_error(
        &self,
        _id: ObjectId,
        _err: ManagementConflictError,
    ) {
    }

    fn has_conflict_error(
        &self,
        _id: &ObjectId,
    ) -> bool {
        false
    }

    fn remove_conflict_error(
        &self,
        _id: &ObjectId,
    ) {
    }

    fn clear_conflict_errors_with_kind(
        &self,
        _gk: &GroupKind,
    ) {
    }

    fn conflict_errors(&self) -> Vec<ManagementConflictError> {
        Vec::new()
    }

    fn has_conflict_errors(&self) -> bool {
        false
    }
}
