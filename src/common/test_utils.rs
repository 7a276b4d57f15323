//! Test helpers.
//!
//! Bevy provides `World::run_system_once` (via the `RunSystemOnce` trait) for quickly
//! executing a system in tests without building a full schedule.
//!
//! Systems that use `Commands` enqueue structural changes; we call `world.flush()` after
//! running so queued commands are applied before assertions.

use std::time::Duration;

use bevy::ecs::message::{Message, Messages};
use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

use crate::common::clock::{GameClock, TimerElapsed, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::events::{FeedbackCue, GameEvent};
use crate::common::pool::{Drones, Enemies, EnemyShots, EntityPool, Pickups, PlayerShots};
use crate::common::rng::SimRng;
use crate::common::tunables::Tunables;
use crate::plugins::abilities::TimeDilation;
use crate::plugins::combat::Scoreboard;
use crate::plugins::combo::ComboState;
use crate::plugins::director::DifficultyState;
use crate::plugins::drones::SpawnDrone;
use crate::plugins::enemies::EnemyDown;
use crate::plugins::physics::Overlap;
use crate::plugins::pickups::SpawnPickup;
use crate::plugins::player::PlayerHit;
use crate::plugins::player::intent::PlayerIntent;
use crate::plugins::player::upgrades::{ChooseUpgrade, UpgradeOffer};
use crate::plugins::projectiles::messages::SpawnBulletRequest;
use crate::plugins::world::ArenaBounds;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}

/// A world holding every simulation resource and message buffer, with default config.
pub fn sim_world() -> World {
    let mut world = World::new();
    let config = RunConfig::default();
    let tunables = Tunables::default();

    world.insert_resource(Time::<Fixed>::default());
    world.insert_resource(GameClock::default());
    world.insert_resource(TimerQueue::default());
    world.insert_resource(SimRng::seeded(7));
    world.insert_resource(ArenaBounds::from_config(&config));
    world.insert_resource(DifficultyState::new(&config, &tunables));
    world.insert_resource(ComboState::new(config.combo_decay_ms));
    world.insert_resource(Scoreboard::default());
    world.insert_resource(TimeDilation::default());
    world.insert_resource(PlayerIntent::default());
    world.insert_resource(UpgradeOffer::default());
    world.insert_resource(EntityPool::<Enemies>::new(config.capacities.enemies));
    world.insert_resource(EntityPool::<PlayerShots>::new(config.capacities.player_shots));
    world.insert_resource(EntityPool::<EnemyShots>::new(config.capacities.enemy_shots));
    world.insert_resource(EntityPool::<Pickups>::new(config.capacities.pickups));
    world.insert_resource(EntityPool::<Drones>::new(config.capacities.drones));
    world.insert_resource(config);
    world.insert_resource(tunables);

    world.init_resource::<Messages<GameEvent>>();
    world.init_resource::<Messages<FeedbackCue>>();
    world.init_resource::<Messages<TimerElapsed>>();
    world.init_resource::<Messages<Overlap>>();
    world.init_resource::<Messages<SpawnBulletRequest>>();
    world.init_resource::<Messages<EnemyDown>>();
    world.init_resource::<Messages<PlayerHit>>();
    world.init_resource::<Messages<SpawnPickup>>();
    world.init_resource::<Messages<SpawnDrone>>();
    world.init_resource::<Messages<ChooseUpgrade>>();
    world
}

/// Move the game clock forward without running any system.
pub fn advance_clock(world: &mut World, ms: u64) {
    world
        .resource_mut::<GameClock>()
        .advance(Duration::from_millis(ms));
}

/// Take every message of type `T` currently buffered.
pub fn drain_messages<T: Message>(world: &mut World) -> Vec<T> {
    world.resource_mut::<Messages<T>>().drain().collect()
}

/// Count `GameEvent`s matching `pred` without consuming them.
pub fn count_events(world: &World, pred: impl Fn(&GameEvent) -> bool) -> usize {
    world
        .resource::<Messages<GameEvent>>()
        .iter_current_update_messages()
        .filter(|e| pred(e))
        .count()
}
