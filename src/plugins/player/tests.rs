use avian2d::prelude::*;
use bevy::prelude::*;

use crate::common::clock::{GameTime, TimerAction, TimerElapsed, TimerQueue};
use crate::common::config::RunConfig;
use crate::common::events::{FeedbackCue, GameEvent, SoundCue};
use crate::common::rng::SimRng;
use crate::common::state::GameState;
use crate::common::test_utils::{advance_clock, count_events, drain_messages, run_system_once, sim_world};
use crate::common::tunables::Tunables;
use crate::plugins::abilities::{Ability, AbilityId};
use crate::plugins::combat::Scoreboard;
use crate::plugins::combo::ComboState;
use crate::plugins::drones::SpawnDrone;
use crate::plugins::projectiles::weapon::{Weapon, WeaponId};

use super::intent::PlayerIntent;
use super::upgrades::{
    ChooseUpgrade, UpgradeKind, UpgradeOffer, apply_chosen_upgrade, apply_upgrade, draw_offer,
    open_level_up_offer,
};
use super::*;

fn fresh() -> Player {
    Player::new(&Tunables::default())
}

fn spawn_player(world: &mut World) -> Entity {
    world
        .spawn((fresh(), LinearVelocity::ZERO, Transform::default()))
        .id()
}

fn player(world: &World, e: Entity) -> &Player {
    world.get::<Player>(e).expect("player")
}

fn pending_state(world: &World) -> Option<GameState> {
    match world.resource::<NextState<GameState>>() {
        NextState::Pending(s) => Some(*s),
        _ => None,
    }
}

// --------------------------------------------------------------------------------------
// Player state
// --------------------------------------------------------------------------------------

#[test]
fn invulnerability_blocks_regular_hits_only() {
    let mut p = fresh();
    p.invulnerable = true;

    assert!(!p.take_hit(30.0, false));
    assert_eq!(p.hp, 100.0);
    assert!(p.take_hit(30.0, true));
    assert_eq!(p.hp, 70.0);
}

#[test]
fn hp_never_goes_negative_or_over_max() {
    let mut p = fresh();
    p.take_hit(250.0, false);
    assert_eq!(p.hp, 0.0);
    assert!(!p.is_alive());

    p.heal(500.0);
    assert_eq!(p.hp, p.max_hp);
}

#[test]
fn xp_rolls_over_through_several_levels() {
    let mut p = fresh();

    let gained = p.gain_xp(250.0, 1.2);

    assert_eq!(gained, 2);
    assert_eq!(p.level, 3);
    assert_eq!(p.xp, 30.0);
    assert_eq!(p.xp_to_next, 144.0);
    assert_eq!(p.pending_level_ups, 2);

    p.gain_xp(114.0, 1.2);
    assert_eq!(p.level, 4);
    assert_eq!(p.xp_to_next, 172.0, "thresholds are floored");
}

#[test]
fn vampirism_heals_every_fifth_kill() {
    let mut p = fresh();
    p.hp = 50.0;
    assert!(!p.register_kill(5, 1.0), "no vampirism yet");

    p.stats.vampirism = true;
    let heals: Vec<bool> = (0..4).map(|_| p.register_kill(5, 1.0)).collect();

    assert_eq!(heals, vec![false, false, false, true]);
    assert_eq!(p.hp, 51.0);
    assert_eq!(p.stats.kills, 5);
}

#[test]
fn invulnerability_is_extended_never_shortened() {
    let mut p = fresh();
    let mut queue = TimerQueue::default();

    p.grant_invulnerability(GameTime(0), 1000, &mut queue);
    p.grant_invulnerability(GameTime(100), 500, &mut queue);
    assert_eq!(p.invulnerable_until, GameTime(1000));
    assert_eq!(queue.len(), 1);

    p.grant_invulnerability(GameTime(800), 1000, &mut queue);
    assert_eq!(p.invulnerable_until, GameTime(1800));
    assert_eq!(queue.len(), 1, "the old deadline is cancelled");
}

#[test]
fn reload_needs_a_partial_magazine() {
    let mut p = fresh();
    let mut queue = TimerQueue::default();

    assert!(!p.begin_reload(GameTime(0), 1000, &mut queue));
    p.ammo = 12;
    assert!(p.begin_reload(GameTime(0), 1000, &mut queue));
    assert!(!p.begin_reload(GameTime(10), 1000, &mut queue));
    assert_eq!(queue.len(), 1);
}

// --------------------------------------------------------------------------------------
// Systems
// --------------------------------------------------------------------------------------

#[test]
fn movement_is_normalised_and_scaled() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    world.resource_mut::<PlayerIntent>().move_axis = Vec2::new(3.0, 4.0);

    run_system_once(&mut world, drive_player);

    let vel = world.get::<LinearVelocity>(e).expect("velocity").0;
    assert!((vel - Vec2::new(180.0, 240.0)).length() < 1e-3);
}

#[test]
fn dash_locks_velocity_and_schedules_both_deadlines() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    {
        let mut intent = world.resource_mut::<PlayerIntent>();
        intent.dash = true;
        intent.aim = Vec2::X;
        intent.move_axis = Vec2::Y;
    }

    run_system_once(&mut world, drive_player);

    let p = player(&world, e);
    assert!(p.dashing);
    assert!(!p.dash_ready);
    assert_eq!(world.get::<LinearVelocity>(e).map(|v| v.0), Some(Vec2::new(600.0, 0.0)));
    assert_eq!(world.resource::<TimerQueue>().len(), 2);

    world.write_message(TimerElapsed(TimerAction::DashEnd));
    run_system_once(&mut world, handle_player_timers);
    assert!(!player(&world, e).dashing);
    assert!(!player(&world, e).dash_ready);
}

#[test]
fn impulse_is_applied_then_decays() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").impulse = Vec2::new(100.0, 0.0);
    advance_clock(&mut world, 100);

    run_system_once(&mut world, drive_player);

    assert_eq!(world.get::<LinearVelocity>(e).map(|v| v.0), Some(Vec2::new(100.0, 0.0)));
    let left = player(&world, e).impulse.x;
    assert!((left - 100.0 * (-0.6f32).exp()).abs() < 1e-3);
}

#[test]
fn reload_completion_refills_the_magazine() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    {
        let mut p = world.get_mut::<Player>(e).expect("player");
        p.ammo = 0;
        p.reloading = true;
    }

    world.write_message(TimerElapsed(TimerAction::ReloadComplete));
    run_system_once(&mut world, handle_player_timers);

    let p = player(&world, e);
    assert_eq!(p.ammo, 30);
    assert!(!p.reloading);
    assert_eq!(count_events(&world, |ev| *ev == GameEvent::AmmoChanged { ammo: 30, max: 30 }), 1);
}

#[test]
fn reload_request_is_consumed() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").ammo = 3;
    world.resource_mut::<PlayerIntent>().reload = true;

    run_system_once(&mut world, reload_on_request);

    assert!(player(&world, e).reloading);
    assert!(!world.resource::<PlayerIntent>().reload);
    assert_eq!(count_events(&world, |ev| *ev == GameEvent::ReloadStarted), 1);
}

#[test]
fn a_regular_hit_opens_a_window_and_breaks_the_combo() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    {
        let mut combo = world.resource_mut::<ComboState>();
        for _ in 0..6 {
            combo.register_kill(GameTime::ZERO);
        }
    }

    world.write_message(PlayerHit::regular(10.0));
    world.write_message(PlayerHit::regular(10.0).with_impulse(Vec2::new(0.0, 50.0)));
    world.write_message(PlayerHit::silent(2.5));
    run_system_once(&mut world, apply_player_hits);

    let p = player(&world, e);
    assert_eq!(p.hp, 87.5, "second regular hit is absorbed, silent damage is not");
    assert!(p.invulnerable);
    assert_eq!(p.impulse, Vec2::new(0.0, 50.0), "absorbed hits still shove");
    assert_eq!(world.resource::<ComboState>().combo, 0);
    assert_eq!(count_events(&world, |ev| matches!(ev, GameEvent::DamageTaken { .. })), 1);
    assert_eq!(
        count_events(&world, |ev| *ev == GameEvent::ComboChanged { combo: 0, multiplier: 1 }),
        1
    );
}

#[test]
fn invulnerability_expires_on_its_timer() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    world.write_message(PlayerHit::regular(5.0));
    run_system_once(&mut world, apply_player_hits);
    assert!(player(&world, e).invulnerable);

    world.write_message(TimerElapsed(TimerAction::InvulnerabilityEnd));
    run_system_once(&mut world, handle_player_timers);

    assert!(!player(&world, e).invulnerable);
}

#[test]
fn death_ends_the_run_once() {
    let mut world = sim_world();
    world.init_resource::<NextState<GameState>>();
    world.resource_mut::<RunConfig>().high_score = 1000;
    world.resource_mut::<Scoreboard>().score = 1234.9;
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").hp = 0.0;

    run_system_once(&mut world, check_game_over);
    run_system_once(&mut world, check_game_over);

    assert_eq!(
        count_events(&world, |ev| *ev
            == GameEvent::GameOver {
                score: 1234,
                level: 1,
                new_high_score: true,
            }),
        1
    );
    assert!(world.resource::<Scoreboard>().finished);
    assert_eq!(pending_state(&world), Some(GameState::GameOver));
}

#[test]
fn a_living_player_keeps_playing() {
    let mut world = sim_world();
    world.init_resource::<NextState<GameState>>();
    spawn_player(&mut world);

    run_system_once(&mut world, check_game_over);

    assert_eq!(pending_state(&world), None);
    assert!(!world.resource::<Scoreboard>().finished);
}

// --------------------------------------------------------------------------------------
// Upgrades
// --------------------------------------------------------------------------------------

#[test]
fn offers_skip_what_the_player_already_has() {
    let mut p = fresh();
    p.stats.vampirism = true;
    p.weapon = Weapon::new(WeaponId::Shotgun);
    p.ability = Some(Ability::new(AbilityId::NovaBlast));
    let mut rng = SimRng::seeded(3);

    for _ in 0..40 {
        let offer = draw_offer(&p, 0, &mut rng);
        assert_eq!(offer.len(), 3);
        for u in &offer {
            assert!(!matches!(
                u,
                UpgradeKind::Vampirism
                    | UpgradeKind::SupportDrone
                    | UpgradeKind::Weapon(WeaponId::Shotgun)
                    | UpgradeKind::Ability(AbilityId::NovaBlast)
            ));
        }
        assert!(offer[0] != offer[1] && offer[1] != offer[2] && offer[0] != offer[2]);
    }
}

#[test]
fn stat_upgrades_stack_multiplicatively() {
    let mut world = sim_world();
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").hp = 50.0;

    run_system_once(
        &mut world,
        |player: Single<&mut Player>, mut events: MessageWriter<GameEvent>| {
            let mut player = player.into_inner();
            for upgrade in [
                UpgradeKind::RapidFire,
                UpgradeKind::RapidFire,
                UpgradeKind::HeavyRounds,
                UpgradeKind::TitanHealth,
                UpgradeKind::Weapon(WeaponId::Laser),
                UpgradeKind::Ability(AbilityId::TimeSlow),
            ] {
                apply_upgrade(&mut player, upgrade, &mut events);
            }
        },
    );

    let p = player(&world, e);
    assert!((p.stats.fire_rate_mult - 0.7225).abs() < 1e-6);
    assert_eq!(p.stats.damage_mult, 1.25);
    assert_eq!(p.max_hp, 120.0);
    assert_eq!(p.hp, 70.0);
    assert_eq!(p.weapon.id, WeaponId::Laser);
    assert_eq!(p.ability.map(|a| a.id), Some(AbilityId::TimeSlow));
    assert_eq!(count_events(&world, |ev| *ev == GameEvent::WeaponEquipped(WeaponId::Laser)), 1);
}

#[test]
fn pending_level_ups_open_an_offer() {
    let mut world = sim_world();
    world.init_resource::<NextState<GameState>>();
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").pending_level_ups = 1;

    run_system_once(&mut world, open_level_up_offer);

    assert_eq!(world.resource::<UpgradeOffer>().choices.len(), 3);
    assert_eq!(pending_state(&world), Some(GameState::LevelUp));
    assert_eq!(
        drain_messages::<FeedbackCue>(&mut world),
        vec![FeedbackCue::Sound(SoundCue::LevelUp)]
    );

    // An offer already on screen is not re-announced.
    run_system_once(&mut world, open_level_up_offer);
    assert!(drain_messages::<FeedbackCue>(&mut world).is_empty());
}

#[test]
fn choosing_the_last_pending_upgrade_resumes_play() {
    let mut world = sim_world();
    world.init_resource::<NextState<GameState>>();
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").pending_level_ups = 1;
    world.resource_mut::<UpgradeOffer>().choices = vec![
        UpgradeKind::SupportDrone,
        UpgradeKind::Scholar,
        UpgradeKind::SpeedBoots,
    ];

    world.write_message(ChooseUpgrade { index: 7 });
    world.write_message(ChooseUpgrade { index: 0 });
    run_system_once(&mut world, apply_chosen_upgrade);

    assert_eq!(drain_messages::<SpawnDrone>(&mut world), vec![SpawnDrone { owner: e }]);
    assert_eq!(player(&world, e).pending_level_ups, 0);
    assert!(world.resource::<UpgradeOffer>().choices.is_empty());
    assert_eq!(pending_state(&world), Some(GameState::Playing));
}

#[test]
fn more_pending_level_ups_redraw_the_offer() {
    let mut world = sim_world();
    world.init_resource::<NextState<GameState>>();
    let e = spawn_player(&mut world);
    world.get_mut::<Player>(e).expect("player").pending_level_ups = 2;
    world.resource_mut::<UpgradeOffer>().choices = vec![UpgradeKind::Scholar];

    world.write_message(ChooseUpgrade { index: 0 });
    run_system_once(&mut world, apply_chosen_upgrade);

    let p = player(&world, e);
    assert_eq!(p.pending_level_ups, 1);
    assert!((p.stats.xp_gain_mult - 1.2).abs() < 1e-6);
    assert_eq!(world.resource::<UpgradeOffer>().choices.len(), 3);
    assert_eq!(pending_state(&world), None);
}
