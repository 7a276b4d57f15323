//! Physics plugin: avian integration plus the overlap bridge.
//!
//! Avian integrates velocities and answers "who touches whom". Gameplay never
//! reads avian's contact data directly; `collect_overlaps` republishes the
//! current overlap set as plain [`Overlap`] messages once per tick.
//!
//! ```text
//! FixedPostUpdate (avian step) ──► CollidingEntities
//! FixedUpdate / Resolve:  collect_overlaps ──► Overlap { a: sensor owner, b: other }
//! ```
//!
//! Only player shots and the player carry `CollidingEntities`, so every pair
//! is reported once, from the side that reacts to it.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::tunables::Tunables;
use crate::plugins::core::SimSet;

/// `a` is the entity that listens for contacts, `b` the entity it touches.
#[derive(Message, Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlap {
    pub a: Entity,
    pub b: Entity,
}

/// Marker for entities whose overlaps are republished.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct OverlapSource;

pub fn plugin(app: &mut App) {
    let ppm = app.world().resource::<Tunables>().pixels_per_meter;
    app.add_plugins(PhysicsPlugins::default().with_length_unit(ppm));
    app.insert_resource(Gravity(Vec2::ZERO));

    app.add_message::<Overlap>();
    app.add_systems(
        FixedUpdate,
        collect_overlaps.in_set(SimSet::Resolve).before(OverlapConsumers),
    );
    app.configure_sets(FixedUpdate, OverlapConsumers.in_set(SimSet::Resolve));
}

/// Systems that read [`Overlap`] messages run in this set.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlapConsumers;

/// Sensor body shared by every gameplay entity.
///
/// Sensors never push each other; movement is fully driven by the velocities
/// the gameplay systems write.
pub fn sensor_body(radius: f32, layers: CollisionLayers) -> impl Bundle {
    (
        RigidBody::Dynamic,
        Sensor,
        Collider::circle(radius),
        Mass(1.0),
        layers,
        LinearVelocity::ZERO,
    )
}

fn collect_overlaps(
    q: Query<(Entity, &CollidingEntities), With<OverlapSource>>,
    mut out: MessageWriter<Overlap>,
) {
    for (a, touching) in &q {
        for &b in touching.iter() {
            out.write(Overlap { a, b });
        }
    }
}
