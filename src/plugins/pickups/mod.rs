//! Pickups: powerups dropped by kills and XP orbs scattered by bosses.
//!
//! ```text
//! SpawnPickup ─► spawn_requested_pickups ─► on the floor ──┬─► player overlap ─► collect_pickups (once)
//!                  (schedules PickupExpired)               └─► PickupExpired ──► expire_pickups
//! ```
//!
//! Both exits release the slot. Whichever comes first wins: collecting cancels
//! the expiry timer, and an expiry for a recycled slot fails the generation check.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::clock::{GameClock, TimerAction, TimerElapsed, TimerHandle, TimerQueue};
use crate::common::events::{FeedbackCue, GameEvent, SoundCue};
use crate::common::layers::{Layer, dormant_layers, pickup_layers};
use crate::common::pool::{EntityPool, Pickups, Pooled, release_and_park};
use crate::common::state::RunScoped;
use crate::common::tunables::Tunables;
use crate::plugins::core::{SimSet, fire_due_timers};
use crate::plugins::physics::{Overlap, OverlapConsumers, sensor_body};
use crate::plugins::player::{Player, award_xp};

const PICKUP_RADIUS: f32 = 10.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PowerupKind {
    Heal,
    Shield,
    Ammo,
    Magnet,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 4] = [
        PowerupKind::Heal,
        PowerupKind::Shield,
        PowerupKind::Ammo,
        PowerupKind::Magnet,
    ];

    fn tint(self) -> Color {
        match self {
            PowerupKind::Heal => Color::srgb(0.2, 1.0, 0.3),
            PowerupKind::Shield => Color::srgb(0.3, 0.6, 1.0),
            PowerupKind::Ammo => Color::srgb(1.0, 0.9, 0.2),
            PowerupKind::Magnet => Color::srgb(1.0, 0.3, 0.9),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PickupKind {
    XpOrb { value: f32 },
    Powerup(PowerupKind),
}

impl PickupKind {
    fn tint(self) -> Color {
        match self {
            PickupKind::XpOrb { .. } => Color::srgb(0.4, 1.0, 1.0),
            PickupKind::Powerup(kind) => kind.tint(),
        }
    }

    fn lifetime_ms(self, tunables: &Tunables) -> u64 {
        match self {
            PickupKind::XpOrb { .. } => tunables.orb_lifetime_ms,
            PickupKind::Powerup(_) => tunables.powerup_lifetime_ms,
        }
    }
}

#[derive(Component, Debug, Clone)]
pub struct Pickup {
    pub kind: PickupKind,
    pub collected: bool,
    expiry: Option<TimerHandle>,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct SpawnPickup {
    pub kind: PickupKind,
    pub position: Vec2,
}

pub fn plugin(app: &mut App) {
    let cap = app
        .world()
        .resource::<crate::common::config::RunConfig>()
        .capacities
        .pickups;
    app.insert_resource(EntityPool::<Pickups>::new(cap))
        .add_message::<SpawnPickup>();

    app.add_systems(
        FixedUpdate,
        expire_pickups.in_set(SimSet::Timers).after(fire_due_timers),
    )
    .add_systems(FixedUpdate, magnetize_pickups.in_set(SimSet::Behavior))
    .add_systems(FixedUpdate, collect_pickups.in_set(OverlapConsumers))
    .add_systems(
        FixedUpdate,
        spawn_requested_pickups
            .in_set(SimSet::Cleanup)
            .after(crate::plugins::combat::settle_enemy_deaths),
    );
}

fn pickup_shell() -> impl Bundle {
    (
        Name::new("Pickup(Pooled)"),
        Sprite {
            color: Color::WHITE,
            custom_size: Some(Vec2::splat(PICKUP_RADIUS * 2.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 0.5),
        Visibility::Hidden,
        sensor_body(PICKUP_RADIUS, dormant_layers(Layer::Pickup)),
        RunScoped,
    )
}

pub(crate) fn spawn_requested_pickups(
    mut commands: Commands,
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    mut pool: ResMut<EntityPool<Pickups>>,
    mut queue: ResMut<TimerQueue>,
    mut requests: MessageReader<SpawnPickup>,
) {
    let now = clock.now();
    for req in requests.read() {
        let (handle, e) = match pool.acquire(|| commands.spawn(pickup_shell()).id()) {
            Ok(slot) => slot,
            Err(err) => {
                debug!("pickup dropped: {err}");
                continue;
            }
        };
        let expiry = queue.schedule(
            now.after(req.kind.lifetime_ms(&tunables)),
            TimerAction::PickupExpired(handle),
        );
        commands.entity(e).insert((
            Pooled::new(handle),
            Pickup {
                kind: req.kind,
                collected: false,
                expiry: Some(expiry),
            },
            Sprite {
                color: req.kind.tint(),
                custom_size: Some(Vec2::splat(PICKUP_RADIUS * 2.0)),
                ..default()
            },
            Transform::from_translation(req.position.extend(0.5)),
            Visibility::Visible,
            LinearVelocity::ZERO,
            pickup_layers(),
        ));
    }
}

pub(crate) fn expire_pickups(
    mut commands: Commands,
    mut fired: MessageReader<TimerElapsed>,
    mut pool: ResMut<EntityPool<Pickups>>,
    mut q: Query<&mut Pickup>,
) {
    for TimerElapsed(action) in fired.read() {
        let TimerAction::PickupExpired(handle) = *action else {
            continue;
        };
        let Ok(e) = pool.resolve(handle) else {
            debug!(?handle, "expiry for a recycled pickup ignored");
            continue;
        };
        let Ok(mut pickup) = q.get_mut(e) else {
            continue;
        };
        if pickup.collected {
            continue;
        }
        pickup.expiry = None;
        if let Err(err) = release_and_park(&mut commands, &mut pool, handle, Layer::Pickup) {
            debug!("pickup expiry skipped: {err}");
        }
    }
}

/// While the magnet runs, nearby pickups drift to the player.
pub(crate) fn magnetize_pickups(
    tunables: Res<Tunables>,
    pool: Res<EntityPool<Pickups>>,
    player: Single<(&Player, &Transform)>,
    mut q: Query<(&Pooled<Pickups>, &Transform, &mut LinearVelocity), (With<Pickup>, Without<Player>)>,
) {
    let (player, player_tf) = player.into_inner();
    let target = player_tf.translation.truncate();

    for (pooled, tf, mut vel) in &mut q {
        if !pool.is_live(pooled.handle) {
            continue;
        }
        let to_player = target - tf.translation.truncate();
        vel.0 = if player.magnet && to_player.length() <= tunables.magnet_radius {
            to_player.normalize_or_zero() * tunables.magnet_speed
        } else {
            Vec2::ZERO
        };
    }
}

pub(crate) fn collect_pickups(
    mut commands: Commands,
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    mut pool: ResMut<EntityPool<Pickups>>,
    mut queue: ResMut<TimerQueue>,
    mut overlaps: MessageReader<Overlap>,
    mut events: MessageWriter<GameEvent>,
    mut cues: MessageWriter<FeedbackCue>,
    player: Single<(Entity, &mut Player)>,
    mut q: Query<(&mut Pickup, &Pooled<Pickups>)>,
) {
    let (player_e, mut player) = player.into_inner();
    let now = clock.now();

    for overlap in overlaps.read() {
        if overlap.a != player_e {
            continue;
        }
        let Ok((mut pickup, pooled)) = q.get_mut(overlap.b) else {
            continue;
        };
        if pickup.collected || !pool.is_live(pooled.handle) || !player.is_alive() {
            continue;
        }
        pickup.collected = true;
        if let Some(expiry) = pickup.expiry.take() {
            queue.cancel(expiry);
        }
        if let Err(err) = release_and_park(&mut commands, &mut pool, pooled.handle, Layer::Pickup) {
            debug!("pickup release skipped: {err}");
        }

        match pickup.kind {
            PickupKind::XpOrb { value } => {
                award_xp(&mut player, value, tunables.xp_growth, &mut events);
            }
            PickupKind::Powerup(kind) => {
                match kind {
                    PowerupKind::Heal => {
                        player.heal(tunables.heal_amount);
                        events.write(player.hp_event());
                    }
                    PowerupKind::Shield => {
                        player.grant_invulnerability(now, tunables.shield_ms, &mut queue);
                    }
                    PowerupKind::Ammo => {
                        player.ammo = player.max_ammo;
                        events.write(player.ammo_event());
                    }
                    PowerupKind::Magnet => {
                        player.activate_magnet(now, tunables.magnet_ms, &mut queue);
                    }
                }
                debug!(?kind, "powerup collected");
                events.write(GameEvent::PowerupCollected(kind));
                cues.write(FeedbackCue::Sound(SoundCue::Powerup));
            }
        }
    }
}
