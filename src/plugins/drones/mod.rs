//! Support drones.
//!
//! A drone circles its owner and shoots at the nearest enemy in range through
//! the player bullet pool. The owner is a plain `Entity`: if it is gone the
//! drone just idles.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::common::clock::{GameClock, GameTime};
use crate::common::config::RunConfig;
use crate::common::pool::{Drones, Enemies, EntityPool, Pooled};
use crate::common::state::RunScoped;
use crate::common::tunables::Tunables;
use crate::plugins::core::SimSet;
use crate::plugins::enemies::Enemy;
use crate::plugins::player::Player;
use crate::plugins::projectiles::messages::SpawnBulletRequest;

const DRONE_SIZE: f32 = 10.0;
const DRONE_TINT: Color = Color::srgb(0.0, 1.0, 1.0);

#[derive(Component, Debug, Clone)]
pub struct Drone {
    pub owner: Entity,
    pub orbit_angle: f32,
    pub last_fired_at: Option<GameTime>,
}

impl Drone {
    pub fn can_fire(&self, now: GameTime, interval_ms: u64) -> bool {
        self.last_fired_at
            .is_none_or(|last| now.since(last) >= interval_ms)
    }
}

/// Attach one more drone to `owner`.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnDrone {
    pub owner: Entity,
}

pub fn plugin(app: &mut App) {
    let cap = app.world().resource::<RunConfig>().capacities.drones;
    app.insert_resource(EntityPool::<Drones>::new(cap))
        .add_message::<SpawnDrone>()
        .add_systems(
            FixedUpdate,
            (spawn_requested_drones, orbit_and_fire)
                .chain()
                .in_set(SimSet::Behavior),
        );
}

fn drone_shell() -> impl Bundle {
    (
        Name::new("Drone(Pooled)"),
        Sprite {
            color: DRONE_TINT,
            custom_size: Some(Vec2::splat(DRONE_SIZE)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 1.5),
        Visibility::Hidden,
        RunScoped,
    )
}

pub(crate) fn spawn_requested_drones(
    mut commands: Commands,
    tunables: Res<Tunables>,
    mut pool: ResMut<EntityPool<Drones>>,
    mut requests: MessageReader<SpawnDrone>,
    mut q_owners: Query<(&mut Player, &Transform)>,
    mut q_drones: Query<&mut Drone>,
) {
    for req in requests.read() {
        let Ok((mut player, owner_tf)) = q_owners.get_mut(req.owner) else {
            debug!(owner = ?req.owner, "drone owner is gone");
            continue;
        };
        if player.drones.len() >= tunables.max_drones {
            debug!("drone limit reached");
            continue;
        }
        let (handle, e) = match pool.acquire(|| commands.spawn(drone_shell()).id()) {
            Ok(slot) => slot,
            Err(err) => {
                debug!("drone spawn skipped: {err}");
                continue;
            }
        };
        player.drones.push(handle);

        // Spread the whole formation evenly again.
        let n = player.drones.len();
        let spacing = TAU / n as f32;
        for (i, existing) in player.drones.iter().take(n - 1).enumerate() {
            let Ok(de) = pool.resolve(*existing) else {
                continue;
            };
            if let Ok(mut drone) = q_drones.get_mut(de) {
                drone.orbit_angle = spacing * i as f32;
            }
        }

        let angle = spacing * (n - 1) as f32;
        let at = owner_tf.translation.truncate() + Vec2::from_angle(angle) * tunables.drone_orbit_radius;
        commands.entity(e).insert((
            Pooled::new(handle),
            Drone {
                owner: req.owner,
                orbit_angle: angle,
                last_fired_at: None,
            },
            Transform::from_translation(at.extend(1.5)),
            Visibility::Visible,
        ));
        info!(drones = n, "support drone online");
    }
}

pub(crate) fn orbit_and_fire(
    clock: Res<GameClock>,
    tunables: Res<Tunables>,
    drones: Res<EntityPool<Drones>>,
    enemies: Res<EntityPool<Enemies>>,
    mut q_drones: Query<(&mut Drone, &Pooled<Drones>, &mut Transform), (Without<Player>, Without<Enemy>)>,
    q_owners: Query<&Transform, (With<Player>, Without<Drone>)>,
    q_enemies: Query<(&Enemy, &Pooled<Enemies>, &Transform), (Without<Drone>, Without<Player>)>,
    mut shots: MessageWriter<SpawnBulletRequest>,
) {
    let now = clock.now();
    let dt_ms = clock.delta_millis() as f32;

    for (mut drone, pooled, mut tf) in &mut q_drones {
        if !drones.is_live(pooled.handle) {
            continue;
        }
        let Ok(owner_tf) = q_owners.get(drone.owner) else {
            continue;
        };

        drone.orbit_angle = (drone.orbit_angle + tunables.drone_angular_speed * dt_ms) % TAU;
        let pos = owner_tf.translation.truncate()
            + Vec2::from_angle(drone.orbit_angle) * tunables.drone_orbit_radius;
        tf.translation.x = pos.x;
        tf.translation.y = pos.y;

        if !drone.can_fire(now, tunables.drone_fire_ms) {
            continue;
        }
        let nearest = q_enemies
            .iter()
            .filter(|(enemy, p, _)| !enemy.is_dead && enemies.is_live(p.handle))
            .map(|(_, _, etf)| etf.translation.truncate())
            .filter(|epos| epos.distance(pos) <= tunables.drone_range)
            .min_by(|a, b| a.distance_squared(pos).total_cmp(&b.distance_squared(pos)));
        let Some(target) = nearest else {
            continue;
        };

        let dir = (target - pos).normalize_or(Vec2::X);
        shots.write(SpawnBulletRequest::player(
            pos,
            dir * tunables.drone_bullet_speed,
            tunables.drone_damage,
            DRONE_TINT,
        ));
        drone.last_fired_at = Some(now);
    }
}

#[cfg(test)]
mod tests;
