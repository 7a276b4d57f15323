//! World plugin: arena bounds and the danger zone around them.
//!
//! The arena has no walls. Leaving it is allowed, but the player standing in
//! the danger zone takes continuous damage that bypasses invulnerability and
//! is shoved back toward the centre.

use bevy::prelude::*;

use crate::common::clock::GameClock;
use crate::common::config::RunConfig;
use crate::common::events::GameEvent;
use crate::common::tunables::Tunables;
use crate::plugins::core::SimSet;
use crate::plugins::player::{Player, PlayerHit};

const TILE: f32 = 64.0;

/// Axis-aligned arena centred on the origin.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub half_extents: Vec2,
}

impl ArenaBounds {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            half_extents: config.arena_half_extents(),
        }
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.x.abs() <= self.half_extents.x && p.y.abs() <= self.half_extents.y
    }

    /// True if `p` is farther than `margin` outside the arena on either axis.
    #[inline]
    pub fn is_far_outside(&self, p: Vec2, margin: f32) -> bool {
        p.x.abs() > self.half_extents.x + margin || p.y.abs() > self.half_extents.y + margin
    }
}

pub fn plugin(app: &mut App) {
    let bounds = ArenaBounds::from_config(app.world().resource::<RunConfig>());
    app.insert_resource(bounds);
    app.add_systems(FixedUpdate, apply_danger_zone.in_set(SimSet::Behavior));
}

/// Render-only: a checkerboard floor covering the arena.
pub fn render_plugin(app: &mut App) {
    app.add_systems(Startup, spawn_floor);
}

pub(crate) fn apply_danger_zone(
    clock: Res<GameClock>,
    bounds: Res<ArenaBounds>,
    tunables: Res<Tunables>,
    player: Single<(&mut Player, &Transform)>,
    mut hits: MessageWriter<PlayerHit>,
    mut events: MessageWriter<GameEvent>,
) {
    let (mut player, tf) = player.into_inner();
    let pos = tf.translation.truncate();
    let outside = !bounds.contains(pos);

    if outside != player.in_danger_zone {
        player.in_danger_zone = outside;
        events.write(GameEvent::DangerZone(outside));
    }
    if !outside {
        return;
    }

    let dt_ms = clock.delta_millis() as f32;
    hits.write(PlayerHit::silent(tunables.danger_damage_per_sec * dt_ms / 1000.0));

    // Gentle shove, scaled to a 16 ms reference frame.
    let home = (-pos).normalize_or_zero();
    player.impulse += home * tunables.danger_push * 0.1 * (dt_ms / 16.0);
}

fn spawn_floor(mut commands: Commands, bounds: Res<ArenaBounds>) {
    let cols = (bounds.half_extents.x / TILE).ceil() as i32;
    let rows = (bounds.half_extents.y / TILE).ceil() as i32;

    (-rows..=rows)
        .flat_map(|y| (-cols..=cols).map(move |x| (x, y)))
        .for_each(|(x, y)| {
            let world_pos = Vec3::new(x as f32 * TILE, y as f32 * TILE, 0.0);
            let color = if (x + y) % 2 == 0 {
                Color::srgb(0.06, 0.05, 0.12)
            } else {
                Color::srgb(0.05, 0.04, 0.10)
            };

            commands.spawn((
                Name::new("FloorTile"),
                Sprite::from_color(color, Vec2::splat(TILE)),
                Transform::from_translation(world_pos),
            ));
        });
}
