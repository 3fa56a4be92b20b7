//! The drift-remediation core: watch lifecycle, conflict tracking, fight
//! detection, and the queue/declared-state boundaries the watchers feed on.

mod conflict;
mod declared;
mod fight;
mod queue;
pub mod watch;

pub use conflict::*;
pub use declared::*;
pub use fight::*;
pub use queue::*;
pub use watch::*;
