//! Difficulty and spawn director.
//!
//! Three clocks run off the tick delta:
//! - escalation: every interval the spawn delay shrinks (down to a floor) and
//!   enemies get faster, without bound
//! - regular spawns: one weighted draw every `spawn_delay_ms`, paused while a
//!   boss is alive
//! - boss milestones: one boss per qualifying player level, tracked in a ledger

use std::collections::BTreeSet;

use bevy::platform::collections::HashSet;
use bevy::prelude::*;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::common::clock::GameClock;
use crate::common::config::RunConfig;
use crate::common::events::GameEvent;
use crate::common::pool::{Enemies, EntityPool, PoolHandle};
use crate::common::rng::SimRng;
use crate::common::tunables::Tunables;
use crate::plugins::core::SimSet;
use crate::plugins::enemies::template::{EnemyKind, SPAWN_TABLE};
use crate::plugins::enemies::{EnemySpawn, spawn_enemy};
use crate::plugins::player::Player;

#[derive(Resource, Debug, Clone)]
pub struct DifficultyState {
    pub spawn_delay_ms: f64,
    pub speed_multiplier: f32,
    pub escalations: u32,
    escalation_acc_ms: u64,
    spawn_acc_ms: u64,
    boss_ledger: BTreeSet<u32>,
    /// Replaces the weighted draw for regular spawns when set.
    pub spawn_override: Option<EnemyKind>,
    /// Regular spawns are paused while any of these is alive.
    active_bosses: HashSet<PoolHandle<Enemies>>,

    escalation_interval_ms: u64,
    delay_factor: f64,
    delay_floor_ms: f64,
    speed_growth: f32,
    boss_every: u32,
}

impl DifficultyState {
    pub fn new(config: &RunConfig, tunables: &Tunables) -> Self {
        Self {
            spawn_delay_ms: tunables.initial_spawn_delay_ms as f64,
            speed_multiplier: config.profile().speed_mult,
            escalations: 0,
            escalation_acc_ms: 0,
            spawn_acc_ms: 0,
            boss_ledger: BTreeSet::new(),
            spawn_override: config.spawn_only.as_deref().and_then(spawn_override),
            active_bosses: HashSet::new(),
            escalation_interval_ms: tunables.escalation_interval_ms,
            delay_factor: tunables.spawn_delay_factor,
            delay_floor_ms: tunables.spawn_delay_floor_ms as f64,
            speed_growth: tunables.speed_growth,
            boss_every: tunables.boss_level_interval,
        }
    }

    /// Current spawn delay rounded to whole milliseconds.
    #[inline]
    pub fn spawn_delay(&self) -> u64 {
        self.spawn_delay_ms.round() as u64
    }

    pub fn escalate(&mut self) {
        self.spawn_delay_ms = (self.spawn_delay_ms * self.delay_factor).max(self.delay_floor_ms);
        self.speed_multiplier *= self.speed_growth;
        self.escalations += 1;
    }

    /// Feed elapsed time into the escalation clock. Returns how many escalations fired.
    pub fn advance_escalation(&mut self, dt_ms: u64) -> u32 {
        if self.escalation_interval_ms == 0 {
            return 0;
        }
        self.escalation_acc_ms += dt_ms;
        let mut fired = 0;
        while self.escalation_acc_ms >= self.escalation_interval_ms {
            self.escalation_acc_ms -= self.escalation_interval_ms;
            self.escalate();
            fired += 1;
        }
        fired
    }

    /// Feed elapsed time into the spawn clock. True when a regular spawn is due.
    ///
    /// At most one spawn per tick; the clock does not run during a boss fight.
    pub fn advance_spawn(&mut self, dt_ms: u64) -> bool {
        if self.has_active_boss() {
            return false;
        }
        self.spawn_acc_ms += dt_ms;
        let delay = self.spawn_delay().max(1);
        if self.spawn_acc_ms < delay {
            return false;
        }
        self.spawn_acc_ms = (self.spawn_acc_ms - delay).min(delay - 1);
        true
    }

    /// True if `level` is a boss milestone that has not produced a boss yet.
    pub fn is_boss_due(&self, level: u32) -> bool {
        self.boss_every > 0
            && level > 0
            && level % self.boss_every == 0
            && !self.boss_ledger.contains(&level)
    }

    #[inline]
    pub fn has_active_boss(&self) -> bool {
        !self.active_bosses.is_empty()
    }

    pub fn record_boss(&mut self, level: u32, handle: PoolHandle<Enemies>) {
        self.boss_ledger.insert(level);
        self.active_bosses.insert(handle);
    }

    /// Forget `handle` if it is a live boss. Returns true if it was one.
    ///
    /// Regular spawns resume only once the last boss is down.
    pub fn boss_down(&mut self, handle: PoolHandle<Enemies>) -> bool {
        self.active_bosses.remove(&handle)
    }
}

pub fn plugin(app: &mut App) {
    let state = DifficultyState::new(
        app.world().resource::<RunConfig>(),
        app.world().resource::<Tunables>(),
    );
    app.insert_resource(state).add_systems(
        FixedUpdate,
        (escalate_difficulty, spawn_regular_enemies, spawn_boss_on_milestone)
            .chain()
            .in_set(SimSet::Director),
    );
}

/// Resolve a configured spawn-only name. Bosses stay milestone-only.
fn spawn_override(name: &str) -> Option<EnemyKind> {
    match EnemyKind::parse_or_default(name) {
        EnemyKind::Boss => {
            warn!("bosses only spawn on level milestones; ignoring spawn override");
            None
        }
        kind => Some(kind),
    }
}

/// Weighted draw over the regular spawn table.
pub fn draw_kind(rng: &mut impl Rng) -> EnemyKind {
    SPAWN_TABLE
        .choose_weighted(rng, |(_, weight)| *weight)
        .map_or(EnemyKind::Chaser, |(kind, _)| *kind)
}

/// A point just outside the view centred on `center`, on a random side.
pub fn spawn_point(center: Vec2, view_half: Vec2, padding: f32, rng: &mut impl Rng) -> Vec2 {
    let reach = view_half + Vec2::splat(padding);
    let along_x = rng.gen_range(-reach.x..=reach.x);
    let along_y = rng.gen_range(-reach.y..=reach.y);
    let offset = match rng.gen_range(0..4) {
        0 => Vec2::new(along_x, reach.y),
        1 => Vec2::new(reach.x, along_y),
        2 => Vec2::new(along_x, -reach.y),
        _ => Vec2::new(-reach.x, along_y),
    };
    center + offset
}

pub(crate) fn escalate_difficulty(
    clock: Res<GameClock>,
    mut difficulty: ResMut<DifficultyState>,
    mut events: MessageWriter<GameEvent>,
) {
    for _ in 0..difficulty.advance_escalation(clock.delta_millis()) {
        info!(
            spawn_delay_ms = difficulty.spawn_delay(),
            speed_multiplier = difficulty.speed_multiplier,
            "difficulty escalated"
        );
        events.write(GameEvent::DifficultyEscalated {
            spawn_delay_ms: difficulty.spawn_delay(),
            speed_multiplier: difficulty.speed_multiplier,
        });
    }
}

pub(crate) fn spawn_regular_enemies(
    mut commands: Commands,
    clock: Res<GameClock>,
    config: Res<RunConfig>,
    tunables: Res<Tunables>,
    mut difficulty: ResMut<DifficultyState>,
    mut pool: ResMut<EntityPool<Enemies>>,
    mut rng: ResMut<SimRng>,
    player: Single<(Entity, &Transform), With<Player>>,
) {
    if !difficulty.advance_spawn(clock.delta_millis()) {
        return;
    }
    let (target, tf) = player.into_inner();
    let player_pos = tf.translation.truncate();

    let kind = match difficulty.spawn_override {
        Some(kind) => kind,
        None => draw_kind(&mut rng.0),
    };
    let position = spawn_point(
        player_pos,
        config.view_half_extents(),
        tunables.spawn_padding,
        &mut rng.0,
    );
    // Rocks cross the view roughly through the player's position.
    let heading = Vec2::from_angle(rng.0.gen_range(-0.5..=0.5)).rotate(player_pos - position);

    let spawn = EnemySpawn {
        kind,
        position,
        heading,
        target: Some(target),
        speed_multiplier: difficulty.speed_multiplier,
    };
    if let Err(e) = spawn_enemy(&mut commands, &mut pool, spawn, clock.now()) {
        debug!("regular spawn skipped: {e}");
    }
}

pub(crate) fn spawn_boss_on_milestone(
    mut commands: Commands,
    clock: Res<GameClock>,
    config: Res<RunConfig>,
    tunables: Res<Tunables>,
    mut difficulty: ResMut<DifficultyState>,
    mut pool: ResMut<EntityPool<Enemies>>,
    mut rng: ResMut<SimRng>,
    mut events: MessageWriter<GameEvent>,
    player: Single<(Entity, &Player, &Transform)>,
) {
    let (target, player, tf) = player.into_inner();
    let level = player.level;
    if !difficulty.is_boss_due(level) {
        return;
    }

    let position = spawn_point(
        tf.translation.truncate(),
        config.view_half_extents(),
        tunables.spawn_padding,
        &mut rng.0,
    );
    let spawn = EnemySpawn {
        kind: EnemyKind::Boss,
        position,
        heading: Vec2::X,
        target: Some(target),
        speed_multiplier: difficulty.speed_multiplier,
    };
    match spawn_enemy(&mut commands, &mut pool, spawn, clock.now()) {
        Ok((handle, _)) => {
            difficulty.record_boss(level, handle);
            info!(level, "boss spawned");
            events.write(GameEvent::BossWarning { level });
        }
        // Not recorded: the milestone is retried next tick.
        Err(e) => debug!("boss spawn deferred: {e}"),
    }
}
