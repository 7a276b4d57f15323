//! Collision layers.
//!
//! Every gameplay body is a sensor: avian only answers "who overlaps whom",
//! the combat rules decide what an overlap means.

use avian2d::prelude::*;

#[derive(PhysicsLayer, Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layer {
    #[default]
    Default,
    Player,
    Enemy,
    PlayerBullet,
    EnemyBullet,
    Pickup,
}

#[inline]
pub fn player_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Player, [Layer::Enemy, Layer::EnemyBullet, Layer::Pickup])
}

#[inline]
pub fn enemy_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Enemy, [Layer::Player, Layer::PlayerBullet])
}

#[inline]
pub fn player_bullet_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::PlayerBullet, [Layer::Enemy])
}

#[inline]
pub fn enemy_bullet_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::EnemyBullet, [Layer::Player])
}

#[inline]
pub fn pickup_layers() -> CollisionLayers {
    CollisionLayers::new(Layer::Pickup, [Layer::Player])
}

/// "Disabled" without structural changes: empty filters means we collide with nothing.
#[inline]
pub fn dormant_layers(membership: Layer) -> CollisionLayers {
    CollisionLayers::new(membership, [] as [Layer; 0])
}
