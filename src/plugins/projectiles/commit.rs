//! Arena edge handling and return commit.
//!
//! `confine_bullets` decides which bullets are spent because they left the
//! arena (or reflects bouncing ones). `return_to_pool_commit` is the "owner"
//! of the *Inactive invariants*: every spent bullet is released and parked
//! hidden, motionless and collision-free in one place.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::pool::{EntityPool, Pooled, release_and_park};
use crate::plugins::world::ArenaBounds;

use super::components::{Bullet, BulletState};
use super::pool::ShotPool;

pub fn confine_bullets(
    bounds: Res<ArenaBounds>,
    mut q: Query<(
        &mut Bullet,
        &mut BulletState,
        &mut Transform,
        &mut LinearVelocity,
    )>,
) {
    let h = bounds.half_extents;

    for (mut bullet, mut state, mut tf, mut vel) in &mut q {
        if *state != BulletState::Active {
            continue;
        }
        let mut p = tf.translation.truncate();

        if !bullet.collide_bounds {
            if !bounds.contains(p) {
                *state = BulletState::PendingReturn;
            }
            continue;
        }

        let mut bounced = false;
        if p.x.abs() > h.x && p.x * vel.x > 0.0 {
            vel.x = -vel.x;
            p.x = p.x.clamp(-h.x, h.x);
            bounced = true;
        }
        if p.y.abs() > h.y && p.y * vel.y > 0.0 {
            vel.y = -vel.y;
            p.y = p.y.clamp(-h.y, h.y);
            bounced = true;
        }
        if bounced {
            tf.translation.x = p.x;
            tf.translation.y = p.y;
            bullet.spend_bounce();
        }
    }
}

pub fn return_to_pool_commit<K: ShotPool>(
    mut commands: Commands,
    mut pool: ResMut<EntityPool<K>>,
    mut q: Query<(&Pooled<K>, &mut BulletState)>,
) {
    for (pooled, mut state) in &mut q {
        if *state != BulletState::PendingReturn {
            continue;
        }
        *state = BulletState::Inactive;

        if let Err(e) = release_and_park(&mut commands, &mut pool, pooled.handle, K::LAYER) {
            debug!("bullet return skipped: {e}");
        }
    }
}
