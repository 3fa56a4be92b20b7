mod state;
pub use state::*;

#[cfg(test)]
mod state_test;
