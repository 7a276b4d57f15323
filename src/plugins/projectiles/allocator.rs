//! Spawn consumer: activate bullets from the pools.
//!
//! Capacity is the only branch here: when a pool is exhausted the request is
//! dropped with a debug log. The shooter has already paid for the shot.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::pool::{EnemyShots, EntityPool, PlayerShots, PoolError, Pooled};
use crate::plugins::physics::OverlapSource;

use super::components::{Bullet, BulletState};
use super::messages::{BulletKind, SpawnBulletRequest};
use super::pool::{BULLET_RADIUS, ShotPool, bullet_shell};

pub fn allocate_bullets_from_pool(
    mut commands: Commands,
    mut player_pool: ResMut<EntityPool<PlayerShots>>,
    mut enemy_pool: ResMut<EntityPool<EnemyShots>>,
    mut reader: MessageReader<SpawnBulletRequest>,
) {
    for req in reader.read() {
        let placed = match req.kind {
            BulletKind::Player => {
                activate(&mut commands, &mut player_pool, req).map(|e| {
                    // Player shots report their own overlaps.
                    commands
                        .entity(e)
                        .insert((OverlapSource, CollidingEntities::default()));
                })
            }
            BulletKind::Enemy => activate(&mut commands, &mut enemy_pool, req).map(|_| ()),
        };

        if let Err(e) = placed {
            debug!("bullet request dropped: {e}");
        }
    }
}

fn activate<K: ShotPool>(
    commands: &mut Commands,
    pool: &mut EntityPool<K>,
    req: &SpawnBulletRequest,
) -> Result<Entity, PoolError> {
    let (handle, e) = pool.acquire(|| commands.spawn(bullet_shell::<K>()).id())?;

    let heading = req.vel.try_normalize().unwrap_or(Vec2::X);
    commands.entity(e).insert((
        Pooled::new(handle),
        Bullet::from_request(req),
        BulletState::Active,
        Transform::from_translation(req.pos.extend(2.0))
            .with_rotation(Quat::from_rotation_z(heading.to_angle()))
            .with_scale(req.scale.extend(1.0)),
        LinearVelocity(req.vel),
        Visibility::Visible,
        Sprite {
            color: req.tint,
            custom_size: Some(Vec2::splat(BULLET_RADIUS * 2.0)),
            ..default()
        },
        K::active_layers(),
    ));
    Ok(e)
}
