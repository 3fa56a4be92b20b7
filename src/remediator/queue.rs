//! Boundary to the external remediation work queue.
//!
//! Watchers only append; dedup and dequeue are the queue's concern and are
//! implemented elsewhere.

use crate::meta::ObjectId;

#[cfg(test)]
use mockall::automock;

/// What the remediator should do to bring a drifted object back in line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemediationAction {
    /// Re-apply the declared state over the live object
    Update,
    /// Delete an object that is live but no longer declared
    Delete,
}

/// One unit of remediation work, attributed to the source commit whose
/// declared state the drift was observed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationEvent {
    pub id: ObjectId,
    pub action: RemediationAction,
    pub commit: String,
}

/// Append-only sink for remediation events. Must not block the watch path.
#[cfg_attr(test, automock)]
pub trait ObjectQueue: Send + Sync + 'static {
    fn add(
        &self,
        event: RemediationEvent,
    );
}
