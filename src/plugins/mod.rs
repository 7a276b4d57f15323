//! Feature plugins.

use bevy::prelude::*;

use crate::plugins::projectiles::ProjectilesPlugin;

pub mod abilities;
pub mod combat;
pub mod combo;
pub mod core;
pub mod director;
pub mod drones;
pub mod enemies;
pub mod physics;
pub mod pickups;
pub mod player;
pub mod projectiles;
pub mod world;

// Render-only
pub mod camera;
pub mod lighting;

/// Register gameplay plugins that work in headless tests.
pub fn register_gameplay(app: &mut App) {
    core::plugin(app);
    physics::plugin(app);
    world::plugin(app);
    player::plugin(app);
    enemies::plugin(app);
    combat::plugin(app);
    combo::plugin(app);
    director::plugin(app);
    abilities::plugin(app);
    pickups::plugin(app);
    drones::plugin(app);
    app.add_plugins(ProjectilesPlugin);
}

/// Register render-only plugins (requires DefaultPlugins / render infra).
pub fn register_render(app: &mut App) {
    lighting::plugin(app);
    camera::plugin(app);
    world::render_plugin(app);
}
