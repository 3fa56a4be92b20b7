//! Hand-rolled doubles for the consumed watch interfaces. The automock
//! variants (`MockWatcher`, `MockKindMapper`, `MockObjectQueue`) cover
//! expectation-style tests; these stubs cover lifecycle tests that need real
//! tasks, cancellation and identity checks.

use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::GroupKind;
use crate::GroupVersionKind;
use crate::KindMapper;
use crate::ObjectQueue;
use crate::RemediationEvent;
use crate::WatchError;
use crate::Watcher;
use crate::WatcherConfig;
use crate::WatcherFactory;

/// Watcher whose `run` blocks until cancelled or until the test injects a
/// failure through the paired sender.
pub struct StubWatcher {
    latest_commit: Mutex<String>,
    stopped: AtomicBool,
    fail_rx: Mutex<Option<oneshot::Receiver<WatchError>>>,
}

impl StubWatcher {
    pub fn new(commit: &str) -> (Arc<Self>, oneshot::Sender<WatchError>) {
        let (fail_tx, fail_rx) = oneshot::channel();
        let watcher = Arc::new(StubWatcher {
            latest_commit: Mutex::new(commit.to_string()),
            stopped: AtomicBool::new(false),
            fail_rx: Mutex::new(Some(fail_rx)),
        });
        (watcher, fail_tx)
    }

    pub fn latest_commit(&self) -> String {
        self.latest_commit.lock().clone()
    }

    pub fn was_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Watcher for StubWatcher {
    async fn run(
        &self,
        token: CancellationToken,
    ) -> std::result::Result<(), WatchError> {
        let fail_rx = self.fail_rx.lock().take();
        match fail_rx {
            Some(fail_rx) => {
                tokio::select! {
                    _ = token.cancelled() => Err(WatchError::Cancelled),
                    res = fail_rx => match res {
                        Ok(err) => Err(err),
                        // Sender dropped without a failure; keep running
                        // until cancelled like a healthy stream would.
                        Err(_) => {
                            token.cancelled().await;
                            Err(WatchError::Cancelled)
                        }
                    },
                }
            }
            None => Err(WatchError::Cancelled),
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    fn set_latest_commit(
        &self,
        commit: &str,
    ) {
        *self.latest_commit.lock() = commit.to_string();
    }
}

/// Builds stub watchers and remembers every instance so tests can assert on
/// identity, stop flags and injected failures per kind.
#[derive(Default)]
pub struct WatcherHarness {
    pub watchers: DashMap<GroupVersionKind, Arc<StubWatcher>>,
    senders: DashMap<GroupVersionKind, oneshot::Sender<WatchError>>,
    pub starts: AtomicUsize,
}

impl WatcherHarness {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn factory(harness: Arc<Self>) -> WatcherFactory {
        Arc::new(move |config: WatcherConfig| {
            let (watcher, fail_tx) = StubWatcher::new(&config.commit);
            harness.watchers.insert(config.gvk.clone(), Arc::clone(&watcher));
            harness.senders.insert(config.gvk.clone(), fail_tx);
            harness.starts.fetch_add(1, Ordering::SeqCst);
            Ok(watcher as Arc<dyn Watcher>)
        })
    }

    pub fn watcher(
        &self,
        gvk: &GroupVersionKind,
    ) -> Arc<StubWatcher> {
        let entry = self.watchers.get(gvk).expect("watcher should have been started");
        Arc::clone(entry.value())
    }

    /// Makes the kind's running watcher exit with the given error.
    pub fn fail(
        &self,
        gvk: &GroupVersionKind,
        err: WatchError,
    ) {
        let (_, fail_tx) = self
            .senders
            .remove(gvk)
            .expect("watcher should have a pending failure channel");
        let _ = fail_tx.send(err);
    }
}

/// Mapper that serves a fixed, mutable set of kinds.
#[derive(Default)]
pub struct StaticKindMapper {
    known: DashMap<GroupKind, ()>,
}

impl StaticKindMapper {
    pub fn serving(kinds: &[GroupVersionKind]) -> Arc<Self> {
        let mapper = StaticKindMapper::default();
        for gvk in kinds {
            mapper.known.insert(gvk.group_kind(), ());
        }
        Arc::new(mapper)
    }

    pub fn add(
        &self,
        gvk: &GroupVersionKind,
    ) {
        self.known.insert(gvk.group_kind(), ());
    }

    pub fn remove(
        &self,
        gvk: &GroupVersionKind,
    ) {
        self.known.remove(&gvk.group_kind());
    }
}

impl KindMapper for StaticKindMapper {
    fn lookup(
        &self,
        gk: &GroupKind,
        version: &str,
    ) -> std::result::Result<(), WatchError> {
        if self.known.contains_key(gk) {
            Ok(())
        } else {
            Err(WatchError::NoSuchKind {
                gvk: GroupVersionKind::new(gk.group.clone(), version, gk.kind.clone()),
            })
        }
    }
}

/// Queue that records everything appended to it.
#[derive(Default)]
pub struct RecordingQueue {
    pub events: Mutex<Vec<RemediationEvent>>,
}

impl ObjectQueue for RecordingQueue {
    fn add(
        &self,
        event: RemediationEvent,
    ) {
        self.events.lock().push(event);
    }
}
