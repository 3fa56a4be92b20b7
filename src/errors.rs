//! Drift-Remediation Error Hierarchy
//!
//! Defines error types for the remediation core, categorized by where they
//! surface: watch lifecycle, management conflicts, fights, and configuration.
//! Per-kind failures from one reconciliation pass are gathered into a
//! [`MultiError`] so a single kind never blocks the rest.

use std::fmt;

use crate::meta::GroupVersionKind;
use crate::meta::ObjectId;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration loading failures
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    /// Configuration validation failures
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Watch lifecycle failures (kind-mapping lookups, stream startup,
    /// stream death)
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// An object owned by this reconciler is being mutated by a foreign
    /// manager
    #[error(transparent)]
    Conflict(#[from] ManagementConflictError),

    /// An object keeps flapping between declared and actual state
    #[error(transparent)]
    Fight(#[from] FightError),

    /// Several per-kind failures gathered from one reconciliation pass
    #[error(transparent)]
    Multiple(#[from] MultiError),

    /// Unrecoverable failures requiring operator attention
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// The resource kind is not (yet) served by the API server.
    ///
    /// Expected before the first successful apply: a CRD and its custom
    /// resources may land in the same apply set.
    #[error("No mapping on the API server for resource kind {gvk}")]
    NoSuchKind { gvk: GroupVersionKind },

    /// A resource kind that a successful sync already established is gone
    /// from the API server. Something else deleted a resource type this
    /// reconciler still manages.
    #[error("Expected resource kind {gvk} no longer exists on the API server")]
    ResourceDoesNotExist { gvk: GroupVersionKind },

    /// Any other API server failure during a kind-mapping lookup
    #[error("API server error for {gvk}: {reason}")]
    ApiServer { gvk: GroupVersionKind, reason: String },

    /// The watcher factory refused to build a stream for this kind
    #[error("Failed to start watch for {gvk}: {reason}")]
    StartFailed { gvk: GroupVersionKind, reason: String },

    /// A running watch stream failed
    #[error("Watch stream for {gvk} failed: {reason}")]
    Stream { gvk: GroupVersionKind, reason: String },

    /// Cooperative shutdown; benign
    #[error("Watch cancelled")]
    Cancelled,
}

impl WatchError {
    /// True for the distinguished expected-absence condition. The only
    /// lookup failure `add_watches` treats as benign.
    pub fn is_no_such_kind(&self) -> bool {
        matches!(self, WatchError::NoSuchKind { .. })
    }

    /// True when the watch exited because it was told to.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WatchError::Cancelled)
    }
}

/// An object expected to be owned by this reconciler is being mutated by a
/// different manager. At most one of these is outstanding per object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The object {id} is managed by this reconciler but is being updated by manager {foreign_manager}")]
pub struct ManagementConflictError {
    pub id: ObjectId,
    pub foreign_manager: String,
}

impl ManagementConflictError {
    pub fn new(
        id: ObjectId,
        foreign_manager: impl Into<String>,
    ) -> Self {
        ManagementConflictError {
            id,
            foreign_manager: foreign_manager.into(),
        }
    }
}

/// An object is being repeatedly updated by this reconciler and at least one
/// other controller. Transient status, retracted once the writes stop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("The object {id} is being repeatedly updated by this reconciler and another controller")]
pub struct FightError {
    pub id: ObjectId,
}

impl FightError {
    pub fn new(id: ObjectId) -> Self {
        FightError { id }
    }
}

/// Ordered collection of independent failures from one reconciliation pass.
///
/// The watch manager never short-circuits: every declared kind is attempted
/// even after earlier kinds fail, and the failures are returned together so
/// the outer loop can decide whether to retry the whole pass.
#[derive(Debug, Default)]
pub struct MultiError {
    errors: Vec<Error>,
}

impl MultiError {
    pub fn push(
        &mut self,
        err: impl Into<Error>,
    ) {
        self.errors.push(err.into());
    }

    pub fn append(
        &mut self,
        mut other: MultiError,
    ) {
        self.errors.append(&mut other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// `Ok(())` when nothing was collected, otherwise the aggregate.
    pub fn into_result(self) -> std::result::Result<(), MultiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let formatted: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{} error(s): {}", self.errors.len(), formatted.join("; "))
    }
}

impl std::error::Error for MultiError {}

impl From<Error> for MultiError {
    fn from(err: Error) -> Self {
        MultiError { errors: vec![err] }
    }
}
