// -
// Fight detection defaults

/// Width of the sliding window used to count rapid writes to one object.
pub(crate) const DEFAULT_FIGHT_WINDOW_MS: u64 = 1000;

/// Writes within the window beyond which an object is classified as fighting.
pub(crate) const DEFAULT_FIGHT_THRESHOLD: usize = 5;

/// Quiet period after which a fighting object is reclassified as settled.
pub(crate) const DEFAULT_FIGHT_COOLDOWN_MS: u64 = 10_000;

// -
// Remediator defaults

pub(crate) const DEFAULT_SYNC_NAME: &str = "root-sync";
pub(crate) const DEFAULT_SYNC_SCOPE: &str = ":root";
pub(crate) const DEFAULT_RESYNC_PERIOD_SECS: u64 = 3600;

/// Label applied to every object in this reconciler's apply set; watches are
/// restricted to this selector so foreign objects are never remediated.
pub(crate) const APPLY_SET_PART_OF_LABEL: &str = "applyset.kubernetes.io/part-of";
