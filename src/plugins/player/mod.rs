//! Player plugin.
//!
//! Pipeline:
//! - Update: sample devices into [`intent::PlayerIntent`] (full app only)
//! - FixedUpdate / Timers: reload, dash, invulnerability and magnet deadlines
//! - FixedUpdate / Behavior: movement, dash, recoil/knockback impulse
//! - FixedUpdate / Fire: manual reload
//! - FixedUpdate / Resolve: every [`PlayerHit`] of the tick
//! - FixedUpdate / Cleanup: game over, level-up offers
//!
//! All damage to the player funnels through [`PlayerHit`]. A hit is either
//! regular (blocked by invulnerability, grants a fresh window, resets the
//! combo) or silent (environmental: ignores invulnerability and grants nothing).

pub mod intent;
pub mod upgrades;

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::clock::{GameClock, GameTime, TimerAction, TimerElapsed, TimerHandle, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::events::{FeedbackCue, GameEvent, SoundCue};
use crate::common::layers::player_layers;
use crate::common::pool::{Drones, PoolHandle};
use crate::common::state::{GameState, RunScoped};
use crate::common::tunables::Tunables;
use crate::plugins::abilities::Ability;
use crate::plugins::combat::Scoreboard;
use crate::plugins::combo::ComboState;
use crate::plugins::core::{SimSet, fire_due_timers};
use crate::plugins::physics::{OverlapConsumers, OverlapSource, sensor_body};
use crate::plugins::projectiles::weapon::{Weapon, WeaponId};

use intent::PlayerIntent;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStats {
    pub speed_mult: f32,
    /// Scales the weapon's fire interval (lower fires faster).
    pub fire_rate_mult: f32,
    pub damage_mult: f32,
    pub xp_gain_mult: f32,
    pub vampirism: bool,
    pub kills: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        Self {
            speed_mult: 1.0,
            fire_rate_mult: 1.0,
            damage_mult: 1.0,
            xp_gain_mult: 1.0,
            vampirism: false,
            kills: 0,
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Player {
    pub hp: f32,
    pub max_hp: f32,

    pub xp: f32,
    pub level: u32,
    pub xp_to_next: f32,
    /// Level-ups whose upgrade has not been picked yet.
    pub pending_level_ups: u32,

    pub ammo: u32,
    pub max_ammo: u32,
    pub reloading: bool,

    pub invulnerable: bool,
    pub invulnerable_until: GameTime,
    invuln_timer: Option<TimerHandle>,

    pub dashing: bool,
    pub dash_ready: bool,
    dash_velocity: Vec2,

    /// Recoil and knockback, added on top of steering and decayed every tick.
    pub impulse: Vec2,
    pub aim: Vec2,

    pub weapon: Weapon,
    pub ability: Option<Ability>,
    pub stats: PlayerStats,
    pub drones: Vec<PoolHandle<Drones>>,

    pub magnet: bool,
    magnet_timer: Option<TimerHandle>,

    pub in_danger_zone: bool,
}

impl Player {
    pub fn new(tunables: &Tunables) -> Self {
        Self {
            hp: tunables.player_hp,
            max_hp: tunables.player_hp,
            xp: 0.0,
            level: 1,
            xp_to_next: tunables.xp_base,
            pending_level_ups: 0,
            ammo: tunables.max_ammo,
            max_ammo: tunables.max_ammo,
            reloading: false,
            invulnerable: false,
            invulnerable_until: GameTime::ZERO,
            invuln_timer: None,
            dashing: false,
            dash_ready: true,
            dash_velocity: Vec2::ZERO,
            impulse: Vec2::ZERO,
            aim: Vec2::Y,
            weapon: Weapon::new(WeaponId::Pistol),
            ability: None,
            stats: PlayerStats::default(),
            drones: Vec::new(),
            magnet: false,
            magnet_timer: None,
            in_danger_zone: false,
        }
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    /// Apply raw damage. Returns false if invulnerability absorbed it.
    pub fn take_hit(&mut self, amount: f32, silent: bool) -> bool {
        if self.invulnerable && !silent {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        true
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }

    /// Add XP, rolling over into as many levels as it covers. Returns the number of levels gained.
    pub fn gain_xp(&mut self, amount: f32, growth: f32) -> u32 {
        self.xp += amount;
        let mut gained = 0;
        while self.xp >= self.xp_to_next {
            self.xp -= self.xp_to_next;
            self.level += 1;
            self.xp_to_next = (self.xp_to_next * growth).floor();
            gained += 1;
        }
        self.pending_level_ups += gained;
        gained
    }

    /// Count a rewarded kill. Returns true if vampirism healed.
    pub fn register_kill(&mut self, every: u32, heal: f32) -> bool {
        self.stats.kills += 1;
        if self.stats.vampirism && every > 0 && self.stats.kills % every == 0 {
            self.heal(heal);
            return true;
        }
        false
    }

    /// Extend (never shorten) the invulnerability window.
    pub fn grant_invulnerability(&mut self, now: GameTime, ms: u64, queue: &mut TimerQueue) {
        let until = now.after(ms);
        if self.invulnerable && until <= self.invulnerable_until {
            return;
        }
        if let Some(old) = self.invuln_timer.take() {
            queue.cancel(old);
        }
        self.invulnerable = true;
        self.invulnerable_until = until;
        self.invuln_timer = Some(queue.schedule(until, TimerAction::InvulnerabilityEnd));
    }

    /// Start a reload unless one is running or the magazine is full.
    pub fn begin_reload(&mut self, now: GameTime, reload_ms: u64, queue: &mut TimerQueue) -> bool {
        if self.reloading || self.ammo >= self.max_ammo {
            return false;
        }
        self.reloading = true;
        queue.schedule(now.after(reload_ms), TimerAction::ReloadComplete);
        true
    }

    pub fn activate_magnet(&mut self, now: GameTime, ms: u64, queue: &mut TimerQueue) {
        if let Some(old) = self.magnet_timer.take() {
            queue.cancel(old);
        }
        self.magnet = true;
        self.magnet_timer = Some(queue.schedule(now.after(ms), TimerAction::MagnetEnd));
    }

    pub fn hp_event(&self) -> GameEvent {
        GameEvent::HpChanged {
            hp: self.hp,
            max: self.max_hp,
        }
    }

    pub fn ammo_event(&self) -> GameEvent {
        GameEvent::AmmoChanged {
            ammo: self.ammo,
            max: self.max_ammo,
        }
    }

    pub fn xp_event(&self) -> GameEvent {
        GameEvent::XpChanged {
            level: self.level,
            xp: self.xp,
            next: self.xp_to_next,
        }
    }
}

/// Damage dealt to the player this tick.
#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct PlayerHit {
    pub amount: f32,
    /// Environmental damage: ignores invulnerability, grants no window.
    pub silent: bool,
    /// Pushed onto the player even if the damage is absorbed.
    pub impulse: Vec2,
}

impl PlayerHit {
    pub fn regular(amount: f32) -> Self {
        Self {
            amount,
            silent: false,
            impulse: Vec2::ZERO,
        }
    }

    pub fn silent(amount: f32) -> Self {
        Self {
            amount,
            silent: true,
            impulse: Vec2::ZERO,
        }
    }

    pub fn with_impulse(mut self, impulse: Vec2) -> Self {
        self.impulse = impulse;
        self
    }
}

/// Award XP (scaled by the player's XP-gain multiplier) and report it.
pub fn award_xp(
    player: &mut Player,
    base_amount: f32,
    growth: f32,
    events: &mut MessageWriter<GameEvent>,
) {
    let gained = player.gain_xp(base_amount * player.stats.xp_gain_mult, growth);
    if gained > 0 {
        info!(level = player.level, "level up");
        events.write(GameEvent::LevelUp {
            level: player.level,
        });
    }
    events.write(player.xp_event());
}

pub fn plugin(app: &mut App) {
    app.add_message::<PlayerHit>()
        .add_systems(Startup, spawn_player);

    intent::plugin(app);
    upgrades::plugin(app);

    app.add_systems(
        FixedUpdate,
        handle_player_timers
            .in_set(SimSet::Timers)
            .after(fire_due_timers),
    )
    .add_systems(FixedUpdate, drive_player.in_set(SimSet::Behavior))
    .add_systems(FixedUpdate, reload_on_request.in_set(SimSet::Fire))
    .add_systems(
        FixedUpdate,
        apply_player_hits
            .in_set(SimSet::Resolve)
            .after(OverlapConsumers),
    )
    .add_systems(
        FixedUpdate,
        check_game_over
            .in_set(SimSet::Cleanup)
            .before(upgrades::open_level_up_offer),
    );
}

pub fn player_bundle(tunables: &Tunables) -> impl Bundle {
    (
        Name::new("Player"),
        Player::new(tunables),
        Sprite {
            color: Color::srgb(0.2, 0.95, 1.0),
            custom_size: Some(Vec2::splat(tunables.player_radius * 2.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 1.0),
        sensor_body(tunables.player_radius, player_layers()),
        OverlapSource,
        CollidingEntities::default(),
        RunScoped,
    )
}

pub(crate) fn spawn_player(mut commands: Commands, tunables: Res<Tunables>) {
    commands.spawn(player_bundle(&tunables));
    info!("player spawned");
}

pub(crate) fn handle_player_timers(
    mut fired: MessageReader<TimerElapsed>,
    player: Single<&mut Player>,
    mut events: MessageWriter<GameEvent>,
) {
    let mut player = player.into_inner();
    for TimerElapsed(action) in fired.read() {
        match action {
            TimerAction::ReloadComplete => {
                player.ammo = player.max_ammo;
                player.reloading = false;
                events.write(player.ammo_event());
            }
            TimerAction::DashEnd => player.dashing = false,
            TimerAction::DashReady => player.dash_ready = true,
            TimerAction::InvulnerabilityEnd => {
                player.invulnerable = false;
                player.invuln_timer = None;
            }
            TimerAction::MagnetEnd => {
                player.magnet = false;
                player.magnet_timer = None;
            }
            _ => {}
        }
    }
}

pub(crate) fn drive_player(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    intent: Res<PlayerIntent>,
    mut queue: ResMut<TimerQueue>,
    mut cues: MessageWriter<FeedbackCue>,
    player: Single<(&mut Player, &mut LinearVelocity, &mut Transform)>,
) {
    let (mut player, mut vel, mut tf) = player.into_inner();
    let now = clock.now();

    let aim = intent.aim.try_normalize().unwrap_or(player.aim);
    player.aim = aim;
    tf.rotation = Quat::from_rotation_z(aim.to_angle());

    if intent.dash && player.dash_ready && !player.dashing {
        player.dashing = true;
        player.dash_ready = false;
        player.dash_velocity = aim * tunables.dash_speed;
        queue.schedule(now.after(tunables.dash_ms), TimerAction::DashEnd);
        queue.schedule(now.after(tunables.dash_cooldown_ms), TimerAction::DashReady);
        cues.write(FeedbackCue::Sound(SoundCue::Dash));
    }

    let steer = if player.dashing {
        player.dash_velocity
    } else {
        intent.move_axis.normalize_or_zero() * tunables.player_speed * player.stats.speed_mult
    };
    vel.0 = steer + player.impulse;

    let decay = (-tunables.impulse_decay * clock.delta_secs()).exp();
    player.impulse *= decay;
}

pub(crate) fn reload_on_request(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    mut intent: ResMut<PlayerIntent>,
    mut queue: ResMut<TimerQueue>,
    mut events: MessageWriter<GameEvent>,
    mut cues: MessageWriter<FeedbackCue>,
    player: Single<&mut Player>,
) {
    if !std::mem::take(&mut intent.reload) {
        return;
    }
    let mut player = player.into_inner();
    if player.begin_reload(clock.now(), tunables.reload_ms, &mut queue) {
        events.write(GameEvent::ReloadStarted);
        cues.write(FeedbackCue::Sound(SoundCue::Reload));
    }
}

pub(crate) fn apply_player_hits(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    mut hits: MessageReader<PlayerHit>,
    mut queue: ResMut<TimerQueue>,
    mut combo: ResMut<ComboState>,
    mut events: MessageWriter<GameEvent>,
    mut cues: MessageWriter<FeedbackCue>,
    player: Single<&mut Player>,
) {
    let mut player = player.into_inner();
    let now = clock.now();

    for hit in hits.read() {
        player.impulse += hit.impulse;

        if !player.is_alive() || !player.take_hit(hit.amount, hit.silent) {
            continue;
        }
        events.write(player.hp_event());

        if hit.silent {
            continue;
        }
        events.write(GameEvent::DamageTaken { amount: hit.amount });
        cues.write(FeedbackCue::CameraShake {
            duration_ms: 100,
            intensity: 0.01,
        });
        player.grant_invulnerability(now, tunables.invulnerability_ms, &mut queue);
        if combo.reset() {
            events.write(combo.event());
        }
    }
}

pub(crate) fn check_game_over(
    config: Res<RunConfig>,
    mut scoreboard: ResMut<Scoreboard>,
    mut next: ResMut<NextState<GameState>>,
    mut events: MessageWriter<GameEvent>,
    player: Single<&Player>,
) {
    if player.is_alive() || scoreboard.finished {
        return;
    }
    scoreboard.finished = true;

    let score = scoreboard.floored();
    let new_high_score = score > config.high_score;
    info!(score, level = player.level, new_high_score, "game over");
    events.write(GameEvent::GameOver {
        score,
        level: player.level,
        new_high_score,
    });
    next.set(GameState::GameOver);
}

#[cfg(test)]
mod tests;
