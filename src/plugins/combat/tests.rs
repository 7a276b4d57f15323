use super::*;

use crate::common::clock::GameTime;
use crate::common::pool::PoolHandle;
use crate::common::test_utils::{count_events, drain_messages, run_system_once, sim_world};
use crate::plugins::enemies::template::EnemyKind;
use crate::plugins::enemies::{EnemySpawn, spawn_enemy};
use crate::plugins::projectiles::messages::SpawnBulletRequest;

fn spawn_player(world: &mut World) -> Entity {
    world
        .spawn((Player::new(&Tunables::default()), Transform::default()))
        .id()
}

fn spawn_at(world: &mut World, kind: EnemyKind, at: Vec2) -> (PoolHandle<Enemies>, Entity) {
    run_system_once(
        world,
        move |mut commands: Commands, mut pool: ResMut<EntityPool<Enemies>>| {
            spawn_enemy(
                &mut commands,
                &mut pool,
                EnemySpawn {
                    kind,
                    position: at,
                    heading: Vec2::X,
                    target: None,
                    speed_multiplier: 1.0,
                },
                GameTime::ZERO,
            )
            .expect("pool has room")
        },
    )
}

fn player_shot(world: &mut World, req: SpawnBulletRequest) -> Entity {
    let e = world
        .spawn((
            Bullet::from_request(&req),
            BulletState::Active,
            Transform::from_translation(req.pos.extend(2.0)),
        ))
        .id();
    let (handle, _) = world
        .resource_mut::<EntityPool<PlayerShots>>()
        .acquire(|| e)
        .expect("room");
    world.entity_mut(e).insert(Pooled::new(handle));
    e
}

fn enemy_shot(world: &mut World, damage: f32) -> Entity {
    let req = SpawnBulletRequest::enemy(Vec2::ZERO, Vec2::X, damage);
    let e = world
        .spawn((Bullet::from_request(&req), BulletState::Active, Transform::default()))
        .id();
    let (handle, _) = world
        .resource_mut::<EntityPool<EnemyShots>>()
        .acquire(|| e)
        .expect("room");
    world.entity_mut(e).insert(Pooled::new(handle));
    e
}

fn pistol_round(world: &mut World) -> Entity {
    player_shot(
        world,
        SpawnBulletRequest::player(Vec2::new(-20.0, 0.0), Vec2::X * 600.0, 1.0, Color::WHITE),
    )
}

fn hit(world: &mut World, a: Entity, b: Entity) {
    world.write_message(Overlap { a, b });
    run_system_once(world, resolve_bullet_hits);
    drain_messages::<Overlap>(world);
}

#[test]
fn chaser_needs_exactly_three_pistol_rounds() {
    let mut world = sim_world();
    let (_, chaser) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::ZERO);

    for _ in 0..2 {
        let round = pistol_round(&mut world);
        hit(&mut world, round, chaser);
        assert_eq!(world.get::<BulletState>(round), Some(&BulletState::PendingReturn));
    }
    assert!(!world.get::<Enemy>(chaser).expect("enemy").is_dead);
    assert!(drain_messages::<EnemyDown>(&mut world).is_empty());

    let round = pistol_round(&mut world);
    hit(&mut world, round, chaser);

    let downs = drain_messages::<EnemyDown>(&mut world);
    assert_eq!(downs.len(), 1);
    assert!(downs[0].rewarded);
    assert_eq!(downs[0].score_value, 100.0);
}

#[test]
fn surviving_a_hit_knocks_the_enemy_back() {
    let mut world = sim_world();
    let (_, chaser) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::ZERO);
    let round = pistol_round(&mut world);

    hit(&mut world, round, chaser);

    let enemy = world.get::<Enemy>(chaser).expect("enemy");
    assert!(enemy.knocked_back);
    let vel = world.get::<LinearVelocity>(chaser).expect("velocity").0;
    assert!((vel - Vec2::new(150.0, 0.0)).length() < 1e-3);
    assert_eq!(world.resource::<TimerQueue>().len(), 1);
}

#[test]
fn a_spent_round_cannot_hit_twice_in_one_tick() {
    let mut world = sim_world();
    let (_, first) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::ZERO);
    let (_, second) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::new(5.0, 0.0));
    let round = pistol_round(&mut world);

    world.write_message(Overlap { a: round, b: first });
    world.write_message(Overlap { a: round, b: second });
    run_system_once(&mut world, resolve_bullet_hits);

    assert_eq!(world.get::<Enemy>(first).expect("enemy").hp, 2.0);
    assert_eq!(world.get::<Enemy>(second).expect("enemy").hp, 3.0);
}

#[test]
fn piercing_rounds_damage_each_enemy_once() {
    let mut world = sim_world();
    let (_, a) = spawn_at(&mut world, EnemyKind::Boss, Vec2::ZERO);
    let (_, b) = spawn_at(&mut world, EnemyKind::Boss, Vec2::new(40.0, 0.0));
    let beam = player_shot(
        &mut world,
        SpawnBulletRequest {
            piercing: true,
            ..SpawnBulletRequest::player(Vec2::ZERO, Vec2::X * 1200.0, 5.0, Color::WHITE)
        },
    );

    // The same pair overlaps for several ticks.
    for _ in 0..3 {
        hit(&mut world, beam, a);
    }
    hit(&mut world, beam, b);
    hit(&mut world, beam, b);

    assert_eq!(world.get::<Enemy>(a).expect("enemy").hp, 145.0);
    assert_eq!(world.get::<Enemy>(b).expect("enemy").hp, 145.0);
    assert_eq!(world.get::<BulletState>(beam), Some(&BulletState::Active));
    assert_eq!(world.get::<Bullet>(beam).expect("bullet").hit_count(), 2);
}

#[test]
fn chaser_contact_hurts_and_bounces() {
    let mut world = sim_world();
    let player = spawn_player(&mut world);
    let (_, chaser) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::new(0.0, 20.0));

    world.write_message(Overlap { a: player, b: chaser });
    run_system_once(&mut world, resolve_player_contacts);

    assert_eq!(drain_messages::<PlayerHit>(&mut world), vec![PlayerHit::regular(10.0)]);
    let vel = world.get::<LinearVelocity>(chaser).expect("velocity").0;
    assert!((vel - Vec2::new(0.0, 200.0)).length() < 1e-3);
    assert!(world.get::<Enemy>(chaser).expect("enemy").knocked_back);
}

#[test]
fn hardcore_scales_contact_damage() {
    let mut world = sim_world();
    world.resource_mut::<RunConfig>().difficulty = crate::common::config::Difficulty::Hardcore;
    let player = spawn_player(&mut world);
    let (_, chaser) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::new(20.0, 0.0));

    world.write_message(Overlap { a: player, b: chaser });
    run_system_once(&mut world, resolve_player_contacts);

    assert_eq!(drain_messages::<PlayerHit>(&mut world), vec![PlayerHit::regular(20.0)]);
}

#[test]
fn asteroid_contact_shoves_the_player_not_the_rock() {
    let mut world = sim_world();
    let player = spawn_player(&mut world);
    let (_, rock) = spawn_at(&mut world, EnemyKind::Asteroid, Vec2::new(-30.0, 0.0));

    for _ in 0..2 {
        world.write_message(Overlap { a: player, b: rock });
        run_system_once(&mut world, resolve_player_contacts);
        drain_messages::<Overlap>(&mut world);
    }

    let hits = drain_messages::<PlayerHit>(&mut world);
    assert_eq!(hits.len(), 2, "contact repeats");
    assert_eq!(hits[0], PlayerHit::regular(15.0).with_impulse(Vec2::new(400.0, 0.0)));
    let enemy = world.get::<Enemy>(rock).expect("enemy");
    assert!(!enemy.knocked_back);
    assert!(!enemy.is_dead);
}

#[test]
fn enemy_rounds_hit_the_player_and_are_spent() {
    let mut world = sim_world();
    let player = spawn_player(&mut world);
    let shot = enemy_shot(&mut world, 10.0);

    world.write_message(Overlap { a: player, b: shot });
    world.write_message(Overlap { a: player, b: shot });
    run_system_once(&mut world, resolve_player_contacts);

    assert_eq!(drain_messages::<PlayerHit>(&mut world), vec![PlayerHit::regular(10.0)]);
    assert_eq!(world.get::<BulletState>(shot), Some(&BulletState::PendingReturn));
}

#[test]
fn settling_a_kill_pays_out_once() {
    let mut world = sim_world();
    let player = spawn_player(&mut world);
    let (handle, e) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::new(50.0, 50.0));
    let down = EnemyDown {
        handle,
        entity: e,
        kind: EnemyKind::Chaser,
        position: Vec2::new(50.0, 50.0),
        score_value: 100.0,
        rewarded: true,
    };

    world.write_message(down);
    world.write_message(down);
    run_system_once(&mut world, settle_enemy_deaths);

    assert_eq!(world.resource::<Scoreboard>().floored(), 100);
    assert_eq!(world.resource::<ComboState>().combo, 1);
    let p = world.get::<Player>(player).expect("player");
    assert_eq!(p.xp, 20.0);
    assert_eq!(p.stats.kills, 1);
    assert_eq!(count_events(&world, |ev| matches!(ev, GameEvent::EnemyKilled { .. })), 1);
    assert!(!world.resource::<EntityPool<Enemies>>().is_live(handle));
}

#[test]
fn combo_multiplies_score_and_xp() {
    let mut world = sim_world();
    let player = spawn_player(&mut world);
    {
        let mut combo = world.resource_mut::<ComboState>();
        for _ in 0..4 {
            combo.register_kill(GameTime::ZERO);
        }
    }
    let (handle, e) = spawn_at(&mut world, EnemyKind::Sprinter, Vec2::ZERO);

    world.write_message(EnemyDown {
        handle,
        entity: e,
        kind: EnemyKind::Sprinter,
        position: Vec2::ZERO,
        score_value: 150.0,
        rewarded: true,
    });
    run_system_once(&mut world, settle_enemy_deaths);

    // The fifth kill scores at the old multiplier and earns XP at the new one.
    assert_eq!(world.resource::<Scoreboard>().floored(), 150);
    assert_eq!(world.resource::<ComboState>().multiplier, 2);
    assert_eq!(world.get::<Player>(player).expect("player").xp, 40.0);
}

#[test]
fn self_destructs_free_the_slot_without_reward() {
    let mut world = sim_world();
    spawn_player(&mut world);
    let (handle, e) = spawn_at(&mut world, EnemyKind::Kamikaze, Vec2::ZERO);

    world.write_message(EnemyDown {
        handle,
        entity: e,
        kind: EnemyKind::Kamikaze,
        position: Vec2::ZERO,
        score_value: 120.0,
        rewarded: false,
    });
    run_system_once(&mut world, settle_enemy_deaths);

    assert_eq!(world.resource::<Scoreboard>().score, 0.0);
    assert_eq!(world.resource::<ComboState>().combo, 0);
    assert!(!world.resource::<EntityPool<Enemies>>().is_live(handle));
}

#[test]
fn boss_kill_resumes_spawns_and_scatters_orbs() {
    let mut world = sim_world();
    spawn_player(&mut world);
    let (handle, e) = spawn_at(&mut world, EnemyKind::Boss, Vec2::ZERO);
    world.resource_mut::<DifficultyState>().record_boss(5, handle);

    world.write_message(EnemyDown {
        handle,
        entity: e,
        kind: EnemyKind::Boss,
        position: Vec2::ZERO,
        score_value: 2000.0,
        rewarded: true,
    });
    run_system_once(&mut world, settle_enemy_deaths);

    assert!(!world.resource::<DifficultyState>().has_active_boss());
    let orbs = drain_messages::<SpawnPickup>(&mut world)
        .into_iter()
        .filter(|p| matches!(p.kind, PickupKind::XpOrb { value } if value == 20.0))
        .count();
    assert_eq!(orbs, 8);
}

#[test]
fn overlapping_bosses_each_pay_out_on_death() {
    let mut world = sim_world();
    spawn_player(&mut world);
    let (first, e1) = spawn_at(&mut world, EnemyKind::Boss, Vec2::ZERO);
    let (second, e2) = spawn_at(&mut world, EnemyKind::Boss, Vec2::new(300.0, 0.0));
    {
        let mut d = world.resource_mut::<DifficultyState>();
        d.record_boss(5, first);
        d.record_boss(10, second);
    }
    let boss_orbs = |world: &mut World| {
        drain_messages::<SpawnPickup>(world)
            .into_iter()
            .filter(|p| matches!(p.kind, PickupKind::XpOrb { .. }))
            .count()
    };

    for (handle, entity) in [(second, e2), (first, e1)] {
        world.write_message(EnemyDown {
            handle,
            entity,
            kind: EnemyKind::Boss,
            position: Vec2::ZERO,
            score_value: 2000.0,
            rewarded: true,
        });
        run_system_once(&mut world, settle_enemy_deaths);
        assert_eq!(boss_orbs(&mut world), 8);

        let still_fighting = handle == second;
        assert_eq!(
            world.resource::<DifficultyState>().has_active_boss(),
            still_fighting
        );
    }
}

#[test]
fn drops_follow_the_powerup_chance() {
    let mut world = sim_world();
    spawn_player(&mut world);
    world.resource_mut::<Tunables>().powerup_chance = 1.0;
    let (handle, e) = spawn_at(&mut world, EnemyKind::Chaser, Vec2::new(7.0, 7.0));

    world.write_message(EnemyDown {
        handle,
        entity: e,
        kind: EnemyKind::Chaser,
        position: Vec2::new(7.0, 7.0),
        score_value: 100.0,
        rewarded: true,
    });
    run_system_once(&mut world, settle_enemy_deaths);

    let drops = drain_messages::<SpawnPickup>(&mut world);
    assert_eq!(drops.len(), 1);
    assert!(matches!(drops[0].kind, PickupKind::Powerup(_)));
    assert_eq!(drops[0].position, Vec2::new(7.0, 7.0));
}

#[test]
fn score_is_reported_floored() {
    let board = Scoreboard {
        score: 1234.9,
        finished: false,
    };
    assert_eq!(board.floored(), 1234);
}
