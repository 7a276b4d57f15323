//! Seeded randomness for the simulation.
//!
//! All gameplay rolls (spread jitter, spawn sides, enemy type draws, drops)
//! go through this resource so a run is reproducible from its seed.

use bevy::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Resource, Debug, Deref, DerefMut)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::seeded(0x5EED)
    }
}
