//! Common, shared types.

pub mod clock;
pub mod config;
pub mod events;
pub mod layers;
pub mod pool;
pub mod rng;
pub mod state;
pub mod tunables;

#[cfg(test)]
pub mod test_utils;
