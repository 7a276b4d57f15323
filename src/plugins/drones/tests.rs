use super::*;

use crate::common::test_utils::{advance_clock, drain_messages, run_system_once, sim_world};
use crate::plugins::enemies::template::EnemyKind;
use crate::plugins::enemies::{EnemySpawn, spawn_enemy};
use crate::plugins::projectiles::messages::BulletKind;

fn spawn_player(world: &mut World) -> Entity {
    world
        .spawn((Player::new(&Tunables::default()), Transform::default()))
        .id()
}

fn request_drones(world: &mut World, owner: Entity, count: usize) {
    for _ in 0..count {
        world.write_message(SpawnDrone { owner });
        run_system_once(world, spawn_requested_drones);
        drain_messages::<SpawnDrone>(world);
    }
}

fn spawn_enemy_at(world: &mut World, at: Vec2) {
    run_system_once(
        world,
        move |mut commands: Commands, mut pool: ResMut<EntityPool<Enemies>>| {
            spawn_enemy(
                &mut commands,
                &mut pool,
                EnemySpawn {
                    kind: EnemyKind::Chaser,
                    position: at,
                    heading: Vec2::X,
                    target: None,
                    speed_multiplier: 1.0,
                },
                GameTime::ZERO,
            )
            .expect("pool has room");
        },
    );
}

#[test]
fn drones_are_capped_and_evenly_spaced() {
    let mut world = sim_world();
    let owner = spawn_player(&mut world);

    request_drones(&mut world, owner, 6);

    assert_eq!(world.get::<Player>(owner).expect("player").drones.len(), 4);
    let mut angles: Vec<f32> = world
        .query::<&Drone>()
        .iter(&world)
        .map(|d| d.orbit_angle)
        .collect();
    angles.sort_by(f32::total_cmp);
    for (i, angle) in angles.iter().enumerate() {
        assert!((angle - TAU / 4.0 * i as f32).abs() < 1e-5, "drone {i} at {angle}");
    }
}

#[test]
fn drones_orbit_their_owner() {
    let mut world = sim_world();
    let owner = spawn_player(&mut world);
    world.get_mut::<Transform>(owner).expect("transform").translation = Vec3::new(100.0, 50.0, 1.0);
    request_drones(&mut world, owner, 1);

    advance_clock(&mut world, 500);
    run_system_once(&mut world, orbit_and_fire);

    let (drone, tf) = world
        .query::<(&Drone, &Transform)>()
        .single(&world)
        .expect("one drone");
    assert!((drone.orbit_angle - 1.0).abs() < 1e-5);
    let offset = tf.translation.truncate() - Vec2::new(100.0, 50.0);
    assert!((offset.length() - 60.0).abs() < 1e-3);
}

#[test]
fn drones_shoot_the_nearest_enemy_in_range() {
    let mut world = sim_world();
    let owner = spawn_player(&mut world);
    request_drones(&mut world, owner, 1);
    spawn_enemy_at(&mut world, Vec2::new(300.0, 0.0));
    spawn_enemy_at(&mut world, Vec2::new(-150.0, 0.0));

    advance_clock(&mut world, 16);
    run_system_once(&mut world, orbit_and_fire);

    let shots = drain_messages::<SpawnBulletRequest>(&mut world);
    assert_eq!(shots.len(), 1);
    assert_eq!(shots[0].kind, BulletKind::Player);
    assert_eq!(shots[0].damage, 2.0);
    assert!(shots[0].vel.x < 0.0, "aimed at the closer enemy");
    assert!((shots[0].vel.length() - 400.0).abs() < 1e-3);
}

#[test]
fn drones_respect_their_fire_interval_and_range() {
    let mut world = sim_world();
    let owner = spawn_player(&mut world);
    request_drones(&mut world, owner, 1);
    spawn_enemy_at(&mut world, Vec2::new(100.0, 0.0));

    advance_clock(&mut world, 16);
    run_system_once(&mut world, orbit_and_fire);
    advance_clock(&mut world, 16);
    run_system_once(&mut world, orbit_and_fire);
    assert_eq!(drain_messages::<SpawnBulletRequest>(&mut world).len(), 1);

    advance_clock(&mut world, 1_000);
    run_system_once(&mut world, orbit_and_fire);
    assert_eq!(drain_messages::<SpawnBulletRequest>(&mut world).len(), 1);

    let lonely = spawn_player(&mut world);
    request_drones(&mut world, lonely, 1);
    world.get_mut::<Transform>(lonely).expect("transform").translation = Vec3::new(0.0, 2_000.0, 1.0);
    advance_clock(&mut world, 1_000);
    run_system_once(&mut world, orbit_and_fire);
    assert_eq!(
        drain_messages::<SpawnBulletRequest>(&mut world).len(),
        1,
        "only the drone near the enemy fires"
    );
}
