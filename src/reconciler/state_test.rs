use std::path::Path;
use std::path::PathBuf;

use super::*;
use crate::errors::MultiError;
use crate::errors::WatchError;
use crate::test_utils::deployment_gvk;

fn state_with_source(
    commit: &str,
    sync_dir: &str,
) -> ReconcilerState {
    let mut state = ReconcilerState::default();
    state.cache.source = Some(SourceSnapshot {
        commit: commit.to_string(),
        sync_dir: PathBuf::from(sync_dir),
    });
    state
}

fn some_errors() -> MultiError {
    let mut errs = MultiError::default();
    errs.push(WatchError::Stream {
        gvk: deployment_gvk(),
        reason: "watch expired".to_string(),
    });
    errs
}

#[test]
fn test_checkpoint_records_applied_dir() {
    let mut state = state_with_source("c1", "/repo/rendered/c1");
    state.cache.need_to_retry = true;

    state.checkpoint();
    assert_eq!(state.last_applied(), Path::new("/repo/rendered/c1"));
    assert!(!state.cache.need_to_retry);
}

#[test]
fn test_checkpoint_is_idempotent() {
    let mut state = state_with_source("c1", "/repo/rendered/c1");
    state.checkpoint();

    // A repeated checkpoint of the same dir must not touch state, including
    // a retry flag raised in between.
    state.cache.need_to_retry = true;
    state.checkpoint();
    assert_eq!(state.last_applied(), Path::new("/repo/rendered/c1"));
    assert!(state.cache.need_to_retry);
}

#[test]
fn test_checkpoint_without_source_is_noop() {
    let mut state = ReconcilerState::default();
    state.checkpoint();
    assert_eq!(state.last_applied(), Path::new(""));
}

#[test]
fn test_reset_discards_everything_and_forces_retry() {
    let mut state = state_with_source("c1", "/repo/rendered/c1");
    state.cache.parsed = true;
    state.cache.declared_kinds.insert(deployment_gvk());
    state.checkpoint();

    state.reset();
    assert_eq!(state.last_applied(), Path::new(""));
    assert!(state.cache.source.is_none());
    assert!(!state.cache.parsed);
    assert!(state.cache.declared_kinds.is_empty());
    assert!(state.cache.need_to_retry);
}

#[test]
fn test_invalidate_preserves_cache() {
    let mut state = state_with_source("c1", "/repo/rendered/c1");
    state.cache.parsed = true;
    state.checkpoint();

    state.invalidate(&some_errors());
    assert_eq!(state.last_applied(), Path::new(""));
    assert!(state.cache.need_to_retry);
    // The per-commit cache survives: the error may be transient
    assert!(state.cache.source.is_some());
    assert!(state.cache.parsed);
}

#[test]
fn test_reset_cache_replaces_wholesale() {
    let mut state = state_with_source("c1", "/repo/rendered/c1");
    state.cache.parsed = true;
    state.cache.need_to_retry = true;

    state.reset_cache();
    assert!(state.cache.source.is_none());
    assert!(!state.cache.parsed);
    assert!(!state.cache.need_to_retry);
}

#[test]
fn test_reset_partial_cache_keeps_source_and_retry() {
    let mut state = state_with_source("c1", "/repo/rendered/c1");
    state.cache.parsed = true;
    state.cache.declared_kinds.insert(deployment_gvk());
    state.cache.need_to_retry = true;

    state.reset_partial_cache();
    // Kept: the source read and the backoff flag
    assert_eq!(
        state.cache.source,
        Some(SourceSnapshot {
            commit: "c1".to_string(),
            sync_dir: PathBuf::from("/repo/rendered/c1"),
        })
    );
    assert!(state.cache.need_to_retry);
    // Cleared: everything else
    assert!(!state.cache.parsed);
    assert!(state.cache.declared_kinds.is_empty());
}
