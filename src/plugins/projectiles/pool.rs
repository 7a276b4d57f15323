//! Bullet pools.
//!
//! Two pools share one entity layout: player shots and enemy shots. A slot's
//! entity is created the first time the slot is handed out and from then on
//! only has component values rewritten; the allocator and the commit step are
//! the only writers.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::config::RunConfig;
use crate::common::layers::{
    Layer, dormant_layers, enemy_bullet_layers, player_bullet_layers,
};
use crate::common::pool::{EnemyShots, EntityPool, PlayerShots, PoolKind};
use crate::common::state::RunScoped;
use crate::plugins::physics::sensor_body;

use super::components::BulletState;

pub const BULLET_RADIUS: f32 = 4.0;

/// A pool that holds bullets.
pub trait ShotPool: PoolKind {
    const LAYER: Layer;

    fn active_layers() -> CollisionLayers;
}

impl ShotPool for PlayerShots {
    const LAYER: Layer = Layer::PlayerBullet;

    fn active_layers() -> CollisionLayers {
        player_bullet_layers()
    }
}

impl ShotPool for EnemyShots {
    const LAYER: Layer = Layer::EnemyBullet;

    fn active_layers() -> CollisionLayers {
        enemy_bullet_layers()
    }
}

pub(super) fn insert_pools(app: &mut App) {
    let caps = app.world().resource::<RunConfig>().capacities;
    app.insert_resource(EntityPool::<PlayerShots>::new(caps.player_shots))
        .insert_resource(EntityPool::<EnemyShots>::new(caps.enemy_shots));
}

/// Layout of a freshly created bullet slot, before the first activation.
pub fn bullet_shell<K: ShotPool>() -> impl Bundle {
    (
        Name::new(format!("Bullet({})", K::NAME)),
        BulletState::Inactive,
        Sprite {
            color: Color::WHITE,
            custom_size: Some(Vec2::splat(BULLET_RADIUS * 2.0)),
            ..default()
        },
        Transform::from_xyz(0.0, 0.0, 2.0),
        Visibility::Hidden,
        sensor_body(BULLET_RADIUS, dormant_layers(K::LAYER)),
        RunScoped,
    )
}
