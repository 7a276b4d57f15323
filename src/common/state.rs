//! Global state machine.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Playing,
    Paused,
    /// Waiting for the player to pick an upgrade.
    LevelUp,
    GameOver,
}

/// Marker for every entity that belongs to the current run.
///
/// Restarting a run despawns all of them in one sweep.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct RunScoped;
