//! Command-line surface of the binary.

use std::path::PathBuf;

use bevy::prelude::*;
use clap::Parser;

use crate::common::config::{Difficulty, RunConfig};

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "neon-survivor", version, about = "Arcade survival shooter")]
pub struct Cli {
    /// RON file with a run configuration; missing fields keep their defaults.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum)]
    pub difficulty: Option<Difficulty>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Spawn only this enemy type (chaser, sprinter, shooter, kamikaze, asteroid).
    #[arg(long, value_name = "NAME")]
    pub spawn_only: Option<String>,

    /// Run without a window, driven by the autopilot.
    #[arg(long)]
    pub headless: bool,

    /// Number of simulation ticks for `--headless`.
    #[arg(long, default_value_t = 3600)]
    pub ticks: u64,
}

impl Cli {
    /// Defaults, overlaid by the config file (if readable), overlaid by flags.
    ///
    /// Call this after logging is installed so a fallback is visible.
    pub fn resolve_config(&self) -> RunConfig {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path).unwrap_or_else(|e| {
                warn!("{e}; using the default run configuration");
                RunConfig::default()
            }),
            None => RunConfig::default(),
        };

        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(name) = &self.spawn_only {
            config.spawn_only = Some(name.clone());
        }
        config
    }
}
