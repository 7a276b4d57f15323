//! Starting a new run after a game over.
//!
//! Every run-owned entity carries [`RunScoped`]; restarting despawns them all,
//! forgets every pool slot and rebuilds the per-run resources from the
//! unchanged [`RunConfig`].

use bevy::ecs::message::Messages;
use bevy::prelude::*;

use crate::common::clock::{GameClock, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::pool::{Drones, Enemies, EnemyShots, EntityPool, Pickups, PlayerShots};
use crate::common::state::{GameState, RunScoped};
use crate::common::tunables::Tunables;
use crate::plugins::abilities::TimeDilation;
use crate::plugins::combat::Scoreboard;
use crate::plugins::combo::ComboState;
use crate::plugins::director::DifficultyState;
use crate::plugins::player::intent::PlayerIntent;
use crate::plugins::player::player_bundle;
use crate::plugins::player::upgrades::UpgradeOffer;

/// Ask for a fresh run. Only honoured in `GameState::GameOver`.
#[derive(Message, Clone, Copy, Debug, Default)]
pub struct RestartRun;

pub fn plugin(app: &mut App) {
    app.add_message::<RestartRun>().add_systems(
        Update,
        (restart_from_keyboard, restart_run)
            .chain()
            .run_if(in_state(GameState::GameOver)),
    );
}

fn restart_from_keyboard(
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut out: MessageWriter<RestartRun>,
) {
    if keys.is_some_and(|k| k.just_pressed(KeyCode::Enter)) {
        out.write(RestartRun);
    }
}

pub(crate) fn restart_run(world: &mut World) {
    if world.resource_mut::<Messages<RestartRun>>().drain().count() == 0 {
        return;
    }

    let doomed: Vec<Entity> = world
        .query_filtered::<Entity, With<RunScoped>>()
        .iter(world)
        .collect();
    for entity in doomed {
        world.despawn(entity);
    }

    world.resource_mut::<EntityPool<Enemies>>().reset();
    world.resource_mut::<EntityPool<PlayerShots>>().reset();
    world.resource_mut::<EntityPool<EnemyShots>>().reset();
    world.resource_mut::<EntityPool<Pickups>>().reset();
    world.resource_mut::<EntityPool<Drones>>().reset();

    let config = world.resource::<RunConfig>().clone();
    let tunables = world.resource::<Tunables>().clone();
    world.insert_resource(GameClock::default());
    world.insert_resource(TimerQueue::default());
    world.insert_resource(Scoreboard::default());
    world.insert_resource(ComboState::new(config.combo_decay_ms));
    world.insert_resource(DifficultyState::new(&config, &tunables));
    world.insert_resource(TimeDilation::default());
    world.insert_resource(PlayerIntent::default());
    world.insert_resource(UpgradeOffer::default());

    world.spawn(player_bundle(&tunables));
    world
        .resource_mut::<NextState<GameState>>()
        .set(GameState::Playing);
    info!(difficulty = ?config.difficulty, "run restarted");
}
