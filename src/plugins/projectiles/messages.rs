//! Buffered spawn requests.
//!
//! We use Bevy **Messages** here instead of direct pool access.
//! Weapons, enemy guns and drones only create *intent*; the allocator is the
//! single writer of both bullet pools.

use bevy::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulletKind {
    Player,
    Enemy,
}

#[derive(Message, Clone, Copy, Debug, PartialEq)]
pub struct SpawnBulletRequest {
    pub kind: BulletKind,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub piercing: bool,
    /// Bounce off the arena edge instead of leaving it.
    pub bounces: bool,
    pub scale: Vec2,
    pub tint: Color,
}

impl SpawnBulletRequest {
    /// A plain enemy shot.
    pub fn enemy(pos: Vec2, vel: Vec2, damage: f32) -> Self {
        Self {
            kind: BulletKind::Enemy,
            pos,
            vel,
            damage,
            piercing: false,
            bounces: false,
            scale: Vec2::ONE,
            tint: Color::srgb(1.0, 0.2, 0.2),
        }
    }

    /// A plain player-side shot (drones).
    pub fn player(pos: Vec2, vel: Vec2, damage: f32, tint: Color) -> Self {
        Self {
            kind: BulletKind::Player,
            pos,
            vel,
            damage,
            piercing: false,
            bounces: false,
            scale: Vec2::ONE,
            tint,
        }
    }
}
