mod config;
mod constants;
mod errors;
mod meta;
mod metrics;
mod reconciler;
mod remediator;

pub use config::*;
pub use errors::*;
pub use meta::*;
pub use metrics::*;
pub use reconciler::*;
pub use remediator::*;

//-----------------------------------------------------------
// Test utils

#[cfg(test)]
pub mod test_utils;
