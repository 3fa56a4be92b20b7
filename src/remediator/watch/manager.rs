//! The watch-lifecycle manager.
//!
//! ## Key Responsibilities
//! - Keeps one running watcher per declared resource kind
//! - Reconciles the running set against the declared set on every pass
//! - Supervises watcher tasks and flags crashed kinds for the next pass
//! - Clears stale management conflicts when a kind leaves the declared set

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::KindMapper;
use super::Watcher;
use super::WatcherConfig;
use super::WatcherFactory;
use crate::config::RemediatorConfig;
use crate::errors::MultiError;
use crate::errors::WatchError;
use crate::meta::GroupVersionKind;
use crate::metrics;
use crate::remediator::conflict::ConflictHandler;
use crate::remediator::declared::DeclaredResources;
use crate::remediator::queue::ObjectQueue;

/// A started watcher together with the token that stops it.
struct WatchHandle {
    watcher: Arc<dyn Watcher>,
    cancel: CancellationToken,
}

/// Fields guarded by the manager's lock. Mutation happens only under a write
/// lock; `watching`/`needs_update` queries take a read lock.
#[derive(Default)]
struct WatchState {
    /// True once add_watches/update_watches has run
    watching: bool,
    /// Maps kinds to their running watchers; one live task per key
    watcher_map: HashMap<GroupVersionKind, WatchHandle>,
    /// Set when a watcher exits asynchronously and its kind must be
    /// reconsidered on the next pass
    needs_update: bool,
}

/// Accepts the declared resource kinds parsed from the source of truth and
/// converges the set of running watch streams on them.
pub struct WatchManager {
    /// Declared objects of the current commit, shared with every watcher
    resources: Arc<DeclaredResources>,

    /// Work queue the watchers feed remediation events into
    queue: Arc<dyn ObjectQueue>,

    watcher_factory: WatcherFactory,

    /// Kind-mapping lookup used before starting a watch
    mapper: Arc<dyn KindMapper>,

    /// Restricts watches to objects applied by this reconciler's sync
    label_selector: String,

    conflict_handler: Arc<dyn ConflictHandler>,

    /// Shared with the supervisor task of every spawned watcher
    inner: Arc<RwLock<WatchState>>,
}

impl WatchManager {
    pub fn new(
        config: &RemediatorConfig,
        resources: Arc<DeclaredResources>,
        queue: Arc<dyn ObjectQueue>,
        watcher_factory: WatcherFactory,
        mapper: Arc<dyn KindMapper>,
        conflict_handler: Arc<dyn ConflictHandler>,
    ) -> Self {
        WatchManager {
            resources,
            queue,
            watcher_factory,
            mapper,
            label_selector: config.label_selector(),
            conflict_handler,
            inner: Arc::new(RwLock::new(WatchState::default())),
        }
    }

    /// True once add_watches/update_watches has run. Threadsafe.
    pub fn watching(&self) -> bool {
        self.inner.read().watching
    }

    /// True if a previously-started watcher has exited and its kind needs
    /// reconciling. Threadsafe.
    pub fn needs_update(&self) -> bool {
        self.inner.read().needs_update
    }

    /// Kinds currently backed by a running watcher. Threadsafe.
    pub fn watched_kinds(&self) -> HashSet<GroupVersionKind> {
        self.inner.read().watcher_map.keys().cloned().collect()
    }

    /// Additive reconciliation: starts watchers for declared kinds that are
    /// not yet watched and refreshes the latest commit on those that are.
    /// Never stops anything.
    ///
    /// A kind the API server does not serve yet is skipped silently; the
    /// watch will be started by [`Self::update_watches`] after the sync that
    /// establishes it succeeds. Threadsafe.
    pub fn add_watches(
        &self,
        declared: &HashSet<GroupVersionKind>,
        commit: &str,
    ) -> std::result::Result<(), MultiError> {
        let mut state = self.inner.write();
        state.watching = true;

        debug!("add_watches({:?})", declared);

        let mut errs = MultiError::default();
        let mut started: u64 = 0;
        for gvk in declared {
            if let Some(handle) = state.watcher_map.get(gvk) {
                handle.watcher.set_latest_commit(commit);
                continue;
            }
            if let Err(err) = self.mapper.lookup(&gvk.group_kind(), &gvk.version) {
                if err.is_no_such_kind() {
                    // Expected before a sync attempt: a CR and its CRD may
                    // be in the same apply set. No error, no conflict metric.
                    debug!(
                        "remediator skipped starting watch for {}: the watch will start after the sync has succeeded",
                        gvk
                    );
                } else {
                    errs.push(err);
                }
                continue;
            }
            if let Err(err) = self.start_watcher(&mut state, gvk, commit) {
                errs.push(err);
                continue;
            }
            started += 1;
        }

        if started > 0 {
            info!("remediator started {} new watches", started);
        } else {
            debug!("remediator watches unchanged");
        }
        errs.into_result()
    }

    /// Full reconciliation, called after a sync has been accepted as
    /// authoritative: stops watchers for kinds no longer declared (clearing
    /// their recorded conflicts), then starts watchers for newly declared
    /// kinds.
    ///
    /// Unlike [`Self::add_watches`], a kind missing from the API server is
    /// now a conflict: every declared kind should exist after a successful
    /// apply. Threadsafe.
    pub fn update_watches(
        &self,
        declared: &HashSet<GroupVersionKind>,
        commit: &str,
    ) -> std::result::Result<(), MultiError> {
        let mut state = self.inner.write();
        state.watching = true;

        debug!("update_watches({:?})", declared);

        state.needs_update = false;

        let mut stopped: u64 = 0;
        let obsolete: Vec<GroupVersionKind> = state
            .watcher_map
            .keys()
            .filter(|gvk| !declared.contains(*gvk))
            .cloned()
            .collect();
        for gvk in obsolete {
            self.stop_watcher(&mut state, &gvk);
            stopped += 1;
            // The kind's objects are no longer remediated; their recorded
            // conflicts must not linger in the status. Same lock
            // acquisition as the removal.
            self.conflict_handler
                .clear_conflict_errors_with_kind(&gvk.group_kind());
        }

        let mut errs = MultiError::default();
        let mut started: u64 = 0;
        for gvk in declared {
            if let Some(handle) = state.watcher_map.get(gvk) {
                handle.watcher.set_latest_commit(commit);
                continue;
            }
            if let Err(err) = self.mapper.lookup(&gvk.group_kind(), &gvk.version) {
                if err.is_no_such_kind() {
                    // Unexpected after a successful sync: some other
                    // controller deleted a managed resource type shortly
                    // after it was applied.
                    let conflict = WatchError::ResourceDoesNotExist { gvk: gvk.clone() };
                    warn!(
                        "remediator encountered a resource conflict: {}; a resync will restart the watch after the next successful sync",
                        conflict
                    );
                    metrics::RESOURCE_CONFLICTS_METRIC
                        .with_label_values(&[commit])
                        .inc();
                    errs.push(conflict);
                } else {
                    errs.push(err);
                }
                continue;
            }
            if let Err(err) = self.start_watcher(&mut state, gvk, commit) {
                errs.push(err);
                continue;
            }
            started += 1;
        }

        if started > 0 || stopped > 0 {
            info!(
                "remediator started {} new watches and stopped {} watches",
                started, stopped
            );
        } else {
            debug!("remediator watches unchanged");
        }
        errs.into_result()
    }

    /// Stops every running watcher and clears their recorded conflicts.
    /// Called when the manager itself is shutting down. Threadsafe.
    pub fn stop(&self) {
        let mut state = self.inner.write();
        let kinds: Vec<GroupVersionKind> = state.watcher_map.keys().cloned().collect();
        for gvk in &kinds {
            self.stop_watcher(&mut state, gvk);
            self.conflict_handler
                .clear_conflict_errors_with_kind(&gvk.group_kind());
        }
        if !kinds.is_empty() {
            info!("remediator stopped {} watches", kinds.len());
        }
    }

    /// Starts a watcher for a kind. NOT threadsafe; caller holds the write
    /// lock.
    fn start_watcher(
        &self,
        state: &mut WatchState,
        gvk: &GroupVersionKind,
        commit: &str,
    ) -> std::result::Result<(), WatchError> {
        if state.watcher_map.contains_key(gvk) {
            // The watcher is already started.
            return Ok(());
        }
        let config = WatcherConfig {
            gvk: gvk.clone(),
            label_selector: self.label_selector.clone(),
            resources: Arc::clone(&self.resources),
            queue: Arc::clone(&self.queue),
            conflict_handler: Arc::clone(&self.conflict_handler),
            commit: commit.to_string(),
        };
        let watcher = (self.watcher_factory)(config)?;

        let cancel = CancellationToken::new();
        state.watcher_map.insert(
            gvk.clone(),
            WatchHandle {
                watcher: Arc::clone(&watcher),
                cancel: cancel.clone(),
            },
        );
        metrics::REMEDIATE_WATCHES_METRIC
            .with_label_values(&[&gvk.kind])
            .inc();

        let inner = Arc::clone(&self.inner);
        let gvk = gvk.clone();
        tokio::spawn(async move {
            Self::run_watcher(inner, watcher, cancel, gvk).await;
        });
        Ok(())
    }

    /// Blocks until the given watcher finishes running, then records the
    /// outcome. Runs on the watcher's own task; takes the lock only after
    /// the stream has returned. Threadsafe.
    async fn run_watcher(
        inner: Arc<RwLock<WatchState>>,
        watcher: Arc<dyn Watcher>,
        cancel: CancellationToken,
        gvk: GroupVersionKind,
    ) {
        if let Err(err) = watcher.run(cancel).await {
            if err.is_cancelled() {
                info!("watcher stopped for {}: cancelled", gvk);
                return;
            }
            warn!("watcher errored for {}: {}", gvk, err);
            let mut state = inner.write();
            // A replacement may already be running for this kind; only the
            // crashed instance removes itself.
            let is_current = state
                .watcher_map
                .get(&gvk)
                .map(|handle| Arc::ptr_eq(&handle.watcher, &watcher))
                .unwrap_or(false);
            if is_current {
                state.watcher_map.remove(&gvk);
                state.needs_update = true;
                metrics::REMEDIATE_WATCHES_METRIC
                    .with_label_values(&[&gvk.kind])
                    .dec();
            }
        }
    }

    /// Stops a watcher for a kind. NOT threadsafe; caller holds the write
    /// lock.
    fn stop_watcher(
        &self,
        state: &mut WatchState,
        gvk: &GroupVersionKind,
    ) {
        if let Some(handle) = state.watcher_map.remove(gvk) {
            handle.cancel.cancel();
            handle.watcher.stop();
            metrics::REMEDIATE_WATCHES_METRIC
                .with_label_values(&[&gvk.kind])
                .dec();
        }
    }
}
