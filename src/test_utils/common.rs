use std::time::Duration;

use crate::meta::GroupKind;
use crate::meta::GroupVersionKind;
use crate::meta::ObjectId;

pub fn gvk(
    group: &str,
    version: &str,
    kind: &str,
) -> GroupVersionKind {
    GroupVersionKind::new(group, version, kind)
}

pub fn deployment_gvk() -> GroupVersionKind {
    gvk("apps", "v1", "Deployment")
}

pub fn config_map_gvk() -> GroupVersionKind {
    gvk("", "v1", "ConfigMap")
}

pub fn secret_gvk() -> GroupVersionKind {
    gvk("", "v1", "Secret")
}

pub fn object_id(
    gvk: &GroupVersionKind,
    namespace: &str,
    name: &str,
) -> ObjectId {
    ObjectId::new(GroupKind::new(gvk.group.clone(), gvk.kind.clone()), namespace, name)
}

/// Polls a condition until it holds, yielding to background tasks in
/// between. Panics after ~2s of wall time so a broken test fails fast.
pub async fn wait_for<F>(
    what: &str,
    mut condition: F,
) where
    F: FnMut() -> bool,
{
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}
