//! Checkpoint and per-commit cache state for the outer reconcile loop.
//!
//! Across sync attempts the loop has to decide whether prior progress can be
//! trusted, must be retried, or must be discarded wholesale. The transitions
//! here encode that decision; they are driven by the loop, never by the
//! watchers.

use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use tracing::error;
use tracing::info;

use crate::errors::FightError;
use crate::errors::ManagementConflictError;
use crate::errors::MultiError;
use crate::meta::GroupVersionKind;

/// The rendered source a sync attempt works from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSnapshot {
    pub commit: String,
    /// Rendered source directory for the commit
    pub sync_dir: PathBuf,
}

/// Progress made by the reconciler for one source commit.
#[derive(Debug, Default)]
pub struct CacheForCommit {
    /// Result of reading the source files; kept across partial resets so a
    /// resync does not re-read them
    pub source: Option<SourceSnapshot>,

    /// True once the declared objects have been parsed out of `sync_dir`
    pub parsed: bool,

    /// Kinds declared by the parsed source
    pub declared_kinds: HashSet<GroupVersionKind>,

    /// True when the next pass should retry soon instead of assuming no
    /// work is needed; kept across partial resets so backoff is not reset
    pub need_to_retry: bool,
}

/// Status fields surfaced to the sync's externally-owned status. Shape is
/// owned by the surrounding system; only what the core reports lives here.
#[derive(Debug, Default)]
pub struct ReconcilerStatus {
    pub synced_commit: String,
    pub conflict_errors: Vec<ManagementConflictError>,
    pub fight_errors: Vec<FightError>,
}

#[derive(Debug, Default)]
pub struct ReconcilerState {
    /// The last source directory that was fully, successfully applied.
    /// Empty when no apply can be trusted.
    last_applied: PathBuf,

    pub status: ReconcilerStatus,

    /// Progress for the current source commit
    pub cache: CacheForCommit,
}

impl ReconcilerState {
    /// Records a successful apply of the cached source directory. Idempotent
    /// when the same directory is checkpointed twice.
    pub fn checkpoint(&mut self) {
        let applied = match &self.cache.source {
            Some(source) => source.sync_dir.clone(),
            None => return,
        };
        if applied == self.last_applied {
            return;
        }
        info!("reconciler checkpoint updated to {}", applied.display());
        self.last_applied = applied;
        self.cache.need_to_retry = false;
    }

    /// Sets the reconciler to retry soon because the rendering status is not
    /// available yet.
    pub fn reset(&mut self) {
        info!("resetting reconciler checkpoint: rendering status is not available yet");
        self.reset_cache();
        self.last_applied = PathBuf::new();
        self.cache.need_to_retry = true;
    }

    /// Logs the errors and clears the checkpoint. Does NOT clean up the
    /// per-commit cache: the error may be transient and the already-read
    /// source state remains valid to reuse.
    pub fn invalidate(
        &mut self,
        errs: &MultiError,
    ) {
        error!("invalidating reconciler checkpoint: {}", errs);
        // The error could be the result of switching branches or some other
        // operation whose inverse would repeat a previously checkpointed
        // state, so the checkpoint itself cannot be trusted.
        self.last_applied = PathBuf::new();
        self.cache.need_to_retry = true;
    }

    /// Resets the whole cache. Called when a new source commit is detected.
    pub fn reset_cache(&mut self) {
        self.cache = CacheForCommit::default();
    }

    /// Resets the whole cache except the cached source read and the retry
    /// flag. The source is kept to avoid re-reading all source files; the
    /// retry flag is kept to avoid resetting backoff.
    ///
    /// Called on a force-resync, or when a watcher notices a management
    /// conflict.
    pub fn reset_partial_cache(&mut self) {
        let source = self.cache.source.take();
        let need_to_retry = self.cache.need_to_retry;
        self.cache = CacheForCommit::default();
        self.cache.source = source;
        self.cache.need_to_retry = need_to_retry;
    }

    pub fn last_applied(&self) -> &Path {
        &self.last_applied
    }
}
