//! Run configuration.
//!
//! A [`RunConfig`] is built once per process (defaults, optionally overlaid by
//! a RON file and CLI flags) and inserted as a resource. Everything that used
//! to be ambient global state in a browser game (difficulty, high score,
//! volume, language) travels through it.
//!
//! ```ron
//! (
//!     difficulty: hardcore,
//!     seed: 42,
//!     capacities: (enemies: 150),
//! )
//! ```

use std::path::{Path, PathBuf};

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hardcore,
}

/// Scalars picked at run start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyProfile {
    /// Applied to damage the player receives.
    pub damage_mult: f32,
    /// Starting value of the global enemy speed multiplier.
    pub speed_mult: f32,
    pub score_mult: f32,
}

impl Difficulty {
    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                damage_mult: 0.5,
                speed_mult: 0.8,
                score_mult: 0.5,
            },
            Difficulty::Normal => DifficultyProfile {
                damage_mult: 1.0,
                speed_mult: 1.0,
                score_mult: 1.0,
            },
            Difficulty::Hardcore => DifficultyProfile {
                damage_mult: 2.0,
                speed_mult: 1.3,
                score_mult: 2.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolCapacities {
    pub enemies: usize,
    pub player_shots: usize,
    pub enemy_shots: usize,
    pub pickups: usize,
    pub drones: usize,
}

impl Default for PoolCapacities {
    fn default() -> Self {
        Self {
            enemies: 100,
            player_shots: 50,
            enemy_shots: 100,
            pickups: 120,
            drones: 30,
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub difficulty: Difficulty,
    pub seed: u64,
    /// Width and height of the playable arena, centred on the origin.
    pub arena_size: [f32; 2],
    /// Width and height of the camera view; enemies spawn just outside it.
    pub view_size: [f32; 2],
    pub capacities: PoolCapacities,
    pub combo_decay_ms: u64,
    /// Best score from earlier runs, owned by the caller's persistence layer.
    pub high_score: u64,
    pub volume: u8,
    pub language: String,
    /// Practice mode: every regular spawn is this enemy type instead of a
    /// weighted draw. Names are matched case-insensitively.
    pub spawn_only: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Normal,
            seed: 0x5EED,
            arena_size: [1600.0, 1200.0],
            view_size: [1280.0, 720.0],
            capacities: PoolCapacities::default(),
            combo_decay_ms: 2000,
            high_score: 0,
            volume: 50,
            language: "en".into(),
            spawn_only: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ron::error::SpannedError,
    },
}

impl RunConfig {
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[inline]
    pub fn profile(&self) -> DifficultyProfile {
        self.difficulty.profile()
    }

    #[inline]
    pub fn arena_half_extents(&self) -> Vec2 {
        Vec2::from(self.arena_size) * 0.5
    }

    #[inline]
    pub fn view_half_extents(&self) -> Vec2 {
        Vec2::from(self.view_size) * 0.5
    }
}
