//! Watch lifecycle: one watch stream per declared resource kind.
//!
//! The low-level list+watch implementation lives outside this crate and is
//! consumed through the [`Watcher`] trait; this module owns starting,
//! stopping and supervising those streams so the running set always
//! converges on the declared set.

mod manager;
pub use manager::*;


use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio_util::sync::CancellationToken;

use crate::errors::WatchError;
use crate::meta::GroupKind;
use crate::meta::GroupVersionKind;
use crate::remediator::conflict::ConflictHandler;
use crate::remediator::declared::DeclaredResources;
use crate::remediator::queue::ObjectQueue;

/// One running watch stream bound to a resource kind.
///
/// Owned exclusively by the watch manager once started; runs on its own
/// task until it fails or is cancelled. A `Cancelled` exit is benign.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Watcher: Send + Sync + 'static {
    /// Blocks until the stream fails or the token is cancelled.
    async fn run(
        &self,
        token: CancellationToken,
    ) -> std::result::Result<(), WatchError>;

    /// Idempotent, asynchronous stop request.
    fn stop(&self);

    /// Updates which commit newly observed drift should be attributed to.
    /// Non-blocking.
    fn set_latest_commit(
        &self,
        commit: &str,
    );
}

/// Everything a watcher needs to watch one kind on behalf of this
/// reconciler's sync.
pub struct WatcherConfig {
    pub gvk: GroupVersionKind,
    /// Restricts the watch to objects applied by this reconciler
    pub label_selector: String,
    pub resources: Arc<DeclaredResources>,
    pub queue: Arc<dyn ObjectQueue>,
    pub conflict_handler: Arc<dyn ConflictHandler>,
    /// Latest known source commit at start time
    pub commit: String,
}

/// Builds a watcher for one kind. Must return independent instances when
/// called repeatedly for the same kind.
pub type WatcherFactory = Arc<
    dyn Fn(WatcherConfig) -> std::result::Result<Arc<dyn Watcher>, WatchError> + Send + Sync,
>;

/// Kind-mapping lookup against the API server's discovery state (cached, so
/// bounded). `NoSuchKind` is the only failure callers treat as expected.
#[cfg_attr(test, automock)]
pub trait KindMapper: Send + Sync + 'static {
    fn lookup(
        &self,
        gk: &GroupKind,
        version: &str,
    ) -> std::result::Result<(), WatchError>;
}
