//! Game composition root.
//!
//! - `configure_full`: gameplay plus render plugins, on top of `DefaultPlugins`.
//! - `configure_headless`: gameplay only. Integration tests and `--headless` use it.
//!
//! A [`RunConfig`](crate::common::config::RunConfig) must be inserted before
//! either is called; the plugins read it while they are built.

pub mod autopilot;
pub mod cli;
pub mod restart;

use bevy::asset::AssetPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::scene::ScenePlugin;
use bevy::state::app::StatesPlugin;
use bevy::time::TimeUpdateStrategy;
use bevy::window::WindowResolution;

use crate::common::clock::GameClock;
use crate::common::state::GameState;
use crate::plugins;
use crate::plugins::combat::Scoreboard;
use crate::plugins::player::Player;

use cli::Cli;

pub fn run(cli: Cli) -> AppExit {
    let mut app = App::new();

    if cli.headless {
        app.add_plugins(LogPlugin::default());
        headless_runtime(&mut app);
        app.insert_resource(cli.resolve_config());
        configure_headless(&mut app);
        autopilot::plugin(&mut app);

        let report = run_ticks(&mut app, cli.ticks);
        info!(
            ticks = report.ticks,
            elapsed_ms = report.elapsed_ms,
            score = report.score,
            level = report.level,
            kills = report.kills,
            game_over = report.game_over,
            "headless run finished"
        );
        return AppExit::Success;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(Window {
            title: "Neon Survivor".into(),
            resolution: WindowResolution::new(1280, 720),
            ..default()
        }),
        ..default()
    }));
    app.insert_resource(cli.resolve_config());
    configure_full(&mut app);
    app.run()
}

/// Gameplay and render plugins. Expects `DefaultPlugins` to be installed.
pub fn configure_full(app: &mut App) {
    configure_game(app);
    plugins::register_render(app);
}

/// Headless configuration.
///
/// Notes:
/// - Do NOT add DefaultPlugins.
/// - Do NOT add render-only plugins (Firefly/camera).
pub fn configure_headless(app: &mut App) {
    configure_game(app);
}

/// Configuration shared by both full and headless apps.
fn configure_game(app: &mut App) {
    app.init_state::<GameState>();
    plugins::register_gameplay(app);
    restart::plugin(app);
}

/// Windowless runtime where every `App::update` runs exactly one fixed tick.
pub fn headless_runtime(app: &mut App) {
    app.add_plugins((
        MinimalPlugins,
        StatesPlugin,
        AssetPlugin::default(),
        ScenePlugin,
    ));
    let step = Time::<Fixed>::default().timestep();
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
}

/// Outcome of a headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub ticks: u64,
    pub elapsed_ms: u64,
    pub score: u64,
    pub level: u32,
    pub kills: u32,
    pub game_over: bool,
}

/// Update `app` up to `ticks` times, stopping early at game over.
pub fn run_ticks(app: &mut App, ticks: u64) -> RunReport {
    app.finish();
    app.cleanup();

    let mut ran = 0;
    while ran < ticks {
        app.update();
        ran += 1;
        if *app.world().resource::<State<GameState>>().get() == GameState::GameOver {
            break;
        }
    }
    report(app.world_mut(), ran)
}

fn report(world: &mut World, ticks: u64) -> RunReport {
    let (level, kills) = world
        .query::<&Player>()
        .iter(world)
        .next()
        .map_or((0, 0), |p| (p.level, p.stats.kills));

    RunReport {
        ticks,
        elapsed_ms: world.resource::<GameClock>().now().millis(),
        score: world.resource::<Scoreboard>().floored(),
        level,
        kills,
        game_over: *world.resource::<State<GameState>>().get() == GameState::GameOver,
    }
}
