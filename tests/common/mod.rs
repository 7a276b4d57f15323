//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides core ECS runtime.
//! - we then call `neon_survivor::game::configure_headless` to install gameplay plugins.
//!
//! Real time never advances: `App::update` only runs the frame schedules
//! (state transitions, level-up picks, restarts). Simulation ticks are driven
//! explicitly with [`tick`].

#![allow(dead_code)]

use std::time::Duration;

use bevy::asset::AssetPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use neon_survivor::common::config::RunConfig;
use neon_survivor::common::state::GameState;
use neon_survivor::plugins::player::Player;

pub fn app_headless() -> App {
    app_with(RunConfig::default())
}

pub fn app_with(config: RunConfig) -> App {
    let mut app = App::new();

    // Add AssetPlugin + ScenePlugin so SceneSpawner exists.
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::ZERO));
    app.insert_resource(config);

    neon_survivor::game::configure_headless(&mut app);

    // Startup: player spawn, initial state.
    app.update();
    app
}

/// Run `n` simulation ticks.
pub fn tick(app: &mut App, n: usize) {
    for _ in 0..n {
        app.world_mut().run_schedule(FixedUpdate);
    }
}

pub fn state(app: &App) -> GameState {
    *app.world().resource::<State<GameState>>().get()
}

pub fn player_entity(app: &mut App) -> Entity {
    app.world_mut()
        .query_filtered::<Entity, With<Player>>()
        .single(app.world())
        .expect("exactly one player")
}

pub fn player(app: &mut App) -> Player {
    let e = player_entity(app);
    app.world().get::<Player>(e).expect("player").clone()
}

pub fn with_player(app: &mut App, f: impl FnOnce(&mut Player)) {
    let e = player_entity(app);
    let mut player = app.world_mut().get_mut::<Player>(e).expect("player");
    f(&mut player);
}
